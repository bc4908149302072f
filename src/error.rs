//! 参数错误
//!
//! 构造流描述或生成器参数时的失败，在触碰任何进程之前立即返回给调用方。

use thiserror::Error;

use crate::addr::FormatError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// 地址/端口/标签字符串格式错误
    #[error(transparent)]
    Format(#[from] FormatError),
    /// 互斥选项同时被设置
    #[error("configuration error: {0}")]
    Configuration(String),
    /// 取值不满足约束（例如帧长放不下报文头）
    #[error("validation error: {0}")]
    Validation(String),
}
