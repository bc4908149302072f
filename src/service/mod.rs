//! 控制服务模块
//!
//! 面向 RPC 的编排层：组合进程监管、结果读取与参数构造，提供
//! start / stop / status / get-result / get-mac-list 五个操作。

// 子模块声明
mod control;
mod params;
mod ports;
mod trex;
mod zmtp;

// 重新导出公共接口
pub use control::{ControlService, ResultReply, ServiceStatus};
pub use params::{DestinationMode, GeneratorCommand, StartParams};
pub use ports::{PortIntrospector, PortQueryError, SysfsPortMacs, port_introspector};
pub use trex::{DEFAULT_TREX_TIMEOUT, TrexPortMacs};
pub use zmtp::ReqSocket;

#[cfg(test)]
pub(crate) use zmtp::{check_greeting, greeting, handshake, read_frame, read_message, write_frame};
