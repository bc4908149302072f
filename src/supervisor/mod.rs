//! 外部进程监管
//!
//! 不缓存任何进程句柄：每次生命周期操作都重新扫描进程表，
//! 以进程名的大小写不敏感子串匹配识别被监管的进程。
//! 名字里恰好包含目标子串的无关进程也会被当作被监管进程。

// 子模块声明
mod host;
mod lifecycle;

use thiserror::Error;

// 重新导出公共接口
pub use host::{ProcState, ProcessEntry, ProcessHost, SystemHost};
pub use lifecycle::{LaunchOutcome, LifecycleState, ProcessSupervisor};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to signal pid {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("empty argument vector")]
    EmptyArgv,
}
