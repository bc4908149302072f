//! 请求/应答消息
//!
//! 每条消息一行 JSON。请求以 `method` 区分，参数放在 `params`；
//! 应答以 `kind` 区分，内容放在 `body`。

use serde::{Deserialize, Serialize};

use crate::result::TrialResult;
use crate::service::{ServiceStatus, StartParams};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopParams {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsRunningParams {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsResultAvailableParams {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusParams {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResultParams {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMacListParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Request {
    Start(StartParams),
    Stop(StopParams),
    IsRunning(IsRunningParams),
    IsResultAvailable(IsResultAvailableParams),
    Status(StatusParams),
    GetResult(GetResultParams),
    GetMacList(GetMacListParams),
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::Start(_) => "start",
            Request::Stop(_) => "stop",
            Request::IsRunning(_) => "is_running",
            Request::IsResultAvailable(_) => "is_result_available",
            Request::Status(_) => "status",
            Request::GetResult(_) => "get_result",
            Request::GetMacList(_) => "get_mac_list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningStatus {
    pub is_running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityStatus {
    pub is_result_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacListResult {
    pub mac_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Response {
    Success(Success),
    RunningStatus(RunningStatus),
    AvailabilityStatus(AvailabilityStatus),
    Status(ServiceStatus),
    TrialResult(TrialResult),
    /// 结果不可用（区别于空的 `TrialResult`）
    ResultUnavailable,
    MacList(MacListResult),
    /// 请求无法解析或参数校验失败
    Error { message: String },
}
