//! 远程控制接口
//!
//! TCP 上逐行 JSON 的请求/应答；控制逻辑只依赖 `ControlApi`，不关心编码。

// 子模块声明
mod client;
mod message;
mod server;

use thiserror::Error;

// 重新导出公共接口
pub use client::RpcClient;
pub use message::{
    AvailabilityStatus, GetMacListParams, GetResultParams, IsResultAvailableParams,
    IsRunningParams, MacListResult, Request, Response, RunningStatus, StatusParams, StopParams,
    Success,
};
pub use server::{ControlApi, DEFAULT_IDLE_TIMEOUT, MAX_REQUEST_LINE, RpcServer, dispatch};
pub(crate) use server::accept_error_is_fatal;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Remote(String),
    #[error("expected a `{expected}` response, got {got}")]
    Unexpected { expected: &'static str, got: String },
    #[error("connection closed before a response arrived")]
    Closed,
}

impl RpcError {
    pub(crate) fn unexpected(expected: &'static str, got: &Response) -> Self {
        Self::Unexpected {
            expected,
            got: format!("{got:?}"),
        }
    }
}
