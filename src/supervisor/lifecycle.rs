//! 生命周期：NotRunning → Starting → Running → NotRunning
//!
//! 状态每次调用都从进程表重新推导，不做缓存。

use serde::Serialize;
use tracing::{debug, info, warn};

use super::ProcState;
use super::host::{ProcessEntry, ProcessHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    NotRunning,
    Starting,
    Running,
}

/// `start` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// 派生成功且立即复查时仍在运行
    Started { pid: u32 },
    /// 已有实例无法终止，未派生新进程
    StaleNotStopped,
    /// 派生失败
    SpawnFailed,
    /// 派生后复查时已不在运行（启动即崩溃）
    ExitedEarly { pid: u32 },
}

impl LaunchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LaunchOutcome::Started { .. })
    }
}

/// 按名字监管一个外部进程
#[derive(Debug)]
pub struct ProcessSupervisor<H> {
    host: H,
    name: String,
    needle: String,
}

impl<H: ProcessHost> ProcessSupervisor<H> {
    pub fn new(host: H, name: impl Into<String>) -> Self {
        let name = name.into();
        let needle = name.to_lowercase();
        Self { host, name, needle }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn matches(&self, entry: &ProcessEntry) -> bool {
        entry.name.to_lowercase().contains(&self.needle)
    }

    /// 是否有匹配的存活进程；匹配到的僵尸进程会被回收并排除
    pub fn is_running(&self) -> bool {
        let mut running = false;
        for entry in self.host.processes() {
            if !self.matches(&entry) {
                continue;
            }
            match entry.state {
                ProcState::Zombie => self.host.reap(entry.pid),
                ProcState::Alive => running = true,
            }
        }
        running
    }

    pub fn state(&self) -> LifecycleState {
        if self.is_running() {
            LifecycleState::Running
        } else {
            LifecycleState::NotRunning
        }
    }

    /// 向所有匹配进程发送终止信号
    ///
    /// 任一目标无法发送（权限不足、扫描期间已消失）时返回 false；
    /// 没有匹配进程时返回 true。
    #[tracing::instrument(skip(self), fields(name = %self.name))]
    pub fn stop(&self) -> bool {
        let mut ok = true;
        for entry in self.host.processes().iter().filter(|e| self.matches(e)) {
            match self.host.terminate(entry.pid) {
                Ok(()) => debug!(pid = entry.pid, proc_name = %entry.name, "已发送终止信号"),
                Err(e) => {
                    warn!(pid = entry.pid, error = %e, "终止进程失败");
                    ok = false;
                }
            }
        }
        ok
    }

    /// 先清理旧实例，再派生新实例并复查
    #[tracing::instrument(skip(self, argv), fields(name = %self.name, program = argv.first().map(String::as_str).unwrap_or("")))]
    pub fn start(&self, argv: &[String]) -> LaunchOutcome {
        if self.is_running() {
            info!("发现已在运行的实例，先终止");
            if !self.stop() {
                warn!("旧实例无法终止，放弃启动");
                return LaunchOutcome::StaleNotStopped;
            }
        }

        debug!(state = ?LifecycleState::Starting, args = ?argv, "派生生成器");
        let pid = match self.host.spawn_detached(argv) {
            Ok(pid) => pid,
            Err(e) => {
                warn!(error = %e, "派生失败");
                return LaunchOutcome::SpawnFailed;
            }
        };

        if self.is_running() {
            info!(pid, state = ?LifecycleState::Running, "✅ 生成器已启动");
            LaunchOutcome::Started { pid }
        } else {
            warn!(pid, "生成器启动后立即退出");
            LaunchOutcome::ExitedEarly { pid }
        }
    }
}
