//! 操作系统进程表访问
//!
//! `ProcessHost` 把进程枚举、回收、终止、派生四个动作抽象出来，
//! 生命周期逻辑因此可以在内存进程表上测试。

use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitPidFlag, waitpid};
use nix::unistd::Pid;
use sysinfo::{ProcessStatus, ProcessesToUpdate, System};
use tracing::{debug, trace};

use super::ProcessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Alive,
    /// 已退出但尚未被父进程回收
    Zombie,
}

/// 进程表中的一行 (pid, name, status)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub state: ProcState,
}

pub trait ProcessHost: Send + Sync {
    /// 当前进程表快照
    fn processes(&self) -> Vec<ProcessEntry>;
    /// 非阻塞地回收一个僵尸进程
    fn reap(&self, pid: u32);
    /// 发送终止信号
    fn terminate(&self, pid: u32) -> Result<(), ProcessError>;
    /// 派生一个不等待其结束的子进程，返回 pid
    fn spawn_detached(&self, argv: &[String]) -> Result<u32, ProcessError>;
}

/// 真实操作系统：sysinfo 枚举进程，nix 发信号/回收
#[derive(Debug, Clone, Default)]
pub struct SystemHost {
    work_dir: Option<PathBuf>,
}

impl SystemHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// 子进程在此目录下运行（生成器把结果写到自己的工作目录）
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: Some(work_dir.into()),
        }
    }
}

impl ProcessHost for SystemHost {
    fn processes(&self) -> Vec<ProcessEntry> {
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);
        sys.processes()
            .iter()
            .map(|(pid, p)| ProcessEntry {
                pid: pid.as_u32(),
                name: p.name().to_string_lossy().into_owned(),
                state: match p.status() {
                    ProcessStatus::Zombie | ProcessStatus::Dead => ProcState::Zombie,
                    _ => ProcState::Alive,
                },
            })
            .collect()
    }

    fn reap(&self, pid: u32) {
        // 只有自己派生的子进程才能被回收，其余情况返回 ECHILD
        match waitpid(Pid::from_raw(pid as i32), Some(WaitPidFlag::WNOHANG)) {
            Ok(status) => trace!(pid, ?status, "回收僵尸进程"),
            Err(e) => trace!(pid, error = %e, "无法回收僵尸进程"),
        }
    }

    fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
            .map_err(|source| ProcessError::Signal { pid, source })
    }

    fn spawn_detached(&self, argv: &[String]) -> Result<u32, ProcessError> {
        let (program, args) = argv.split_first().ok_or(ProcessError::EmptyArgv)?;
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).process_group(0);
        if let Some(dir) = &self.work_dir {
            cmd.current_dir(dir);
        }
        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;
        let pid = child.id();
        debug!(pid, program = %program, "子进程已派生");
        Ok(pid)
    }
}
