//! 生成器端口 MAC 查询

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::addr::{FormatError, MacValue};
use crate::config::{MacSource, ServiceConfig};

use super::trex::TrexPortMacs;

#[derive(Debug, Error)]
pub enum PortQueryError {
    #[error("no generator ports configured")]
    NoPorts,
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("port query transport failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed port query reply: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("port query protocol error: {0}")]
    Protocol(String),
    #[error("{method} failed with code {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
    #[error("port {0} not reported by the generator")]
    MissingPort(u32),
}

/// 查询生成器各端口的硬件地址
pub trait PortIntrospector: Send + Sync {
    fn port_macs(&self) -> Result<Vec<MacValue>, PortQueryError>;
}

impl<T: PortIntrospector + ?Sized> PortIntrospector for Box<T> {
    fn port_macs(&self) -> Result<Vec<MacValue>, PortQueryError> {
        (**self).port_macs()
    }
}

/// 从 `/sys/class/net/<iface>/address` 读取网卡 MAC
#[derive(Debug, Clone)]
pub struct SysfsPortMacs {
    root: PathBuf,
    interfaces: Vec<String>,
}

impl SysfsPortMacs {
    pub fn new(root: impl Into<PathBuf>, interfaces: Vec<String>) -> Self {
        Self {
            root: root.into(),
            interfaces,
        }
    }
}

impl PortIntrospector for SysfsPortMacs {
    fn port_macs(&self) -> Result<Vec<MacValue>, PortQueryError> {
        if self.interfaces.is_empty() {
            return Err(PortQueryError::NoPorts);
        }
        self.interfaces
            .iter()
            .map(|iface| -> Result<MacValue, PortQueryError> {
                let path = self.root.join(iface).join("address");
                let raw = fs::read_to_string(&path)
                    .map_err(|source| PortQueryError::Read { path, source })?;
                Ok(raw.trim().parse::<MacValue>()?)
            })
            .collect()
    }
}

/// 按配置选择 MAC 来源
pub fn port_introspector(config: &ServiceConfig) -> Box<dyn PortIntrospector> {
    match config.mac_source {
        MacSource::Trex => Box::new(TrexPortMacs::new(
            config.trex_addr.clone(),
            config.trex_ports.clone(),
        )),
        MacSource::Sysfs => Box::new(SysfsPortMacs::new(
            config.sysfs_net_root.clone(),
            config.port_interfaces.clone(),
        )),
    }
}
