//! 通过 TRex 的 JSON-RPC 端点查询端口 MAC
//!
//! 先 `api_sync_v2` 换取 API 句柄，再用 `get_system_info` 读取各端口的
//! `hw_macaddr`。每次查询新建连接，查询完即断开。

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::addr::MacValue;
use crate::config::DEFAULT_TREX_ADDR;

use super::ports::{PortIntrospector, PortQueryError};
use super::zmtp::ReqSocket;

pub const DEFAULT_TREX_TIMEOUT: Duration = Duration::from_secs(2);

/// STL API 版本，与 TRex 服务端握手时声明
const API_NAME: &str = "STL";
const API_MAJOR: u32 = 5;
const API_MINOR: u32 = 1;

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct PortInfo {
    index: u32,
    hw_macaddr: String,
}

#[derive(Debug, Deserialize)]
struct SystemInfo {
    ports: Vec<PortInfo>,
}

/// TRex 端口 MAC 查询
#[derive(Debug, Clone)]
pub struct TrexPortMacs {
    addr: String,
    ports: Vec<u32>,
    timeout: Duration,
}

impl Default for TrexPortMacs {
    fn default() -> Self {
        Self::new(DEFAULT_TREX_ADDR, vec![0, 1])
    }
}

impl TrexPortMacs {
    pub fn new(addr: impl Into<String>, ports: Vec<u32>) -> Self {
        Self {
            addr: addr.into(),
            ports,
            timeout: DEFAULT_TREX_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn call(
        socket: &mut ReqSocket,
        id: u64,
        method: &str,
        params: Value,
    ) -> Result<Value, PortQueryError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let raw = socket.request(&serde_json::to_vec(&request)?)?;
        let reply: RpcReply = serde_json::from_slice(&raw)?;
        if let Some(err) = reply.error {
            return Err(PortQueryError::Rpc {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }
        reply
            .result
            .ok_or_else(|| PortQueryError::Protocol(format!("{method} reply has no result")))
    }
}

impl PortIntrospector for TrexPortMacs {
    #[tracing::instrument(skip(self), fields(addr = %self.addr))]
    fn port_macs(&self) -> Result<Vec<MacValue>, PortQueryError> {
        if self.ports.is_empty() {
            return Err(PortQueryError::NoPorts);
        }
        let mut socket = ReqSocket::connect(&self.addr, self.timeout)?;

        let sync = Self::call(
            &mut socket,
            1,
            "api_sync_v2",
            json!({ "name": API_NAME, "major": API_MAJOR, "minor": API_MINOR }),
        )?;
        let api_h = sync
            .get("api_h")
            .and_then(Value::as_str)
            .ok_or_else(|| PortQueryError::Protocol("api_sync_v2 returned no api_h".into()))?
            .to_string();

        let info = Self::call(&mut socket, 2, "get_system_info", json!({ "api_h": api_h }))?;
        let info: SystemInfo = serde_json::from_value(info)?;
        debug!(ports = info.ports.len(), "已读取 TRex 系统信息");

        self.ports
            .iter()
            .map(|&index| -> Result<MacValue, PortQueryError> {
                let port = info
                    .ports
                    .iter()
                    .find(|p| p.index == index)
                    .ok_or(PortQueryError::MissingPort(index))?;
                Ok(port.hw_macaddr.trim().parse::<MacValue>()?)
            })
            .collect()
    }
}
