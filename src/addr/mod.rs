//! 地址序列模块
//!
//! 由基准值和数量确定性地生成 IPv4 / MAC / 端口序列，溢出时按位宽回绕。

// 子模块声明
mod range;
mod value;

use thiserror::Error;

// 重新导出公共接口
pub use range::{AddressIter, AddressRange, generate, parse_list};
pub use value::{AddressValue, Ipv4Value, MacValue, PortValue};

/// 范围描述中基准值与数量之间的分隔符，例如 `1.1.1.1,3`
pub const RANGE_SEPARATOR: char = ',';

/// 地址/端口/标签描述字符串格式错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid {kind} `{input}`")]
    Address { kind: &'static str, input: String },
    #[error("invalid count `{input}`: expected a positive integer")]
    Count { input: String },
    #[error("invalid {what} `{input}`")]
    Value { what: &'static str, input: String },
}

impl FormatError {
    pub(crate) fn address(kind: &'static str, input: &str) -> Self {
        Self::Address {
            kind,
            input: input.to_string(),
        }
    }

    pub(crate) fn value(what: &'static str, input: &str) -> Self {
        Self::Value {
            what,
            input: input.to_string(),
        }
    }
}
