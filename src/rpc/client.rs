//! RPC 客户端：每次调用新建一条连接，发一行请求、读一行应答

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::result::TrialResult;
use crate::service::{ServiceStatus, StartParams};

use super::RpcError;
use super::message::{
    AvailabilityStatus, GetMacListParams, GetResultParams, IsResultAvailableParams,
    IsRunningParams, MacListResult, Request, Response, RunningStatus, StatusParams, StopParams,
    Success,
};

#[derive(Debug, Clone)]
pub struct RpcClient {
    addr: String,
    timeout: Option<Duration>,
}

impl RpcClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn call(&self, request: &Request) -> Result<Response, RpcError> {
        let mut stream = TcpStream::connect(&self.addr)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        let mut out = serde_json::to_vec(request)?;
        out.push(b'\n');
        stream.write_all(&out)?;
        stream.flush()?;

        let mut line = String::new();
        if BufReader::new(stream).read_line(&mut line)? == 0 {
            return Err(RpcError::Closed);
        }
        match serde_json::from_str::<Response>(&line)? {
            Response::Error { message } => Err(RpcError::Remote(message)),
            response => Ok(response),
        }
    }

    pub fn start(&self, params: StartParams) -> Result<bool, RpcError> {
        match self.call(&Request::Start(params))? {
            Response::Success(Success { success }) => Ok(success),
            other => Err(RpcError::unexpected("success", &other)),
        }
    }

    pub fn stop(&self) -> Result<bool, RpcError> {
        match self.call(&Request::Stop(StopParams {}))? {
            Response::Success(Success { success }) => Ok(success),
            other => Err(RpcError::unexpected("success", &other)),
        }
    }

    pub fn is_running(&self) -> Result<bool, RpcError> {
        match self.call(&Request::IsRunning(IsRunningParams {}))? {
            Response::RunningStatus(RunningStatus { is_running }) => Ok(is_running),
            other => Err(RpcError::unexpected("running_status", &other)),
        }
    }

    pub fn is_result_available(&self) -> Result<bool, RpcError> {
        match self.call(&Request::IsResultAvailable(IsResultAvailableParams {}))? {
            Response::AvailabilityStatus(AvailabilityStatus {
                is_result_available,
            }) => Ok(is_result_available),
            other => Err(RpcError::unexpected("availability_status", &other)),
        }
    }

    pub fn status(&self) -> Result<ServiceStatus, RpcError> {
        match self.call(&Request::Status(StatusParams {}))? {
            Response::Status(status) => Ok(status),
            other => Err(RpcError::unexpected("status", &other)),
        }
    }

    /// `None` 表示服务端报告结果不可用
    pub fn get_result(&self) -> Result<Option<TrialResult>, RpcError> {
        match self.call(&Request::GetResult(GetResultParams {}))? {
            Response::TrialResult(result) => Ok(Some(result)),
            Response::ResultUnavailable => Ok(None),
            other => Err(RpcError::unexpected("trial_result", &other)),
        }
    }

    pub fn get_mac_list(&self) -> Result<Vec<String>, RpcError> {
        match self.call(&Request::GetMacList(GetMacListParams {}))? {
            Response::MacList(MacListResult { mac_list }) => Ok(mac_list),
            other => Err(RpcError::unexpected("mac_list", &other)),
        }
    }
}
