//! 测试结果读取
//!
//! 结果文件由外部生成器写入，本服务只读不写。读取失败在内部有类型区分
//! （文件不存在 / JSON 损坏 / 最近一次试验未通过），对外统一折叠为“不可用”。

// 子模块声明
mod artifact;
mod store;

// 重新导出公共接口
pub use artifact::{ArtifactError, PASS_SENTINEL, PortStats, TrialResult};
pub use store::{Availability, ResultStore};
