//! 流描述模块
//!
//! 把地址范围、帧长与 VLAN 标签组合成 `FlowSpec`，交给外部的报文构造/发送工具。

// 子模块声明
mod spec;
mod tag;

// 重新导出公共接口
pub use spec::{
    BASE_HEADER_OVERHEAD, FlowBuilder, FlowOptions, FlowSpec, MAX_RANGE_VALUES, SendMode,
    header_overhead, payload_len,
};
pub use tag::{MAX_PRIORITY, MAX_VLAN_ID, TagSpec};
