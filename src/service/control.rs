//! 控制服务
//!
//! 查询类操作直接读取进程表/结果文件；`start`/`stop` 共用一把生命周期锁，
//! 彼此串行执行。

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::ParamError;
use crate::result::{ResultStore, TrialResult};
use crate::supervisor::{LaunchOutcome, ProcessHost, ProcessSupervisor};

use super::params::{GeneratorCommand, StartParams};
use super::ports::PortIntrospector;

/// 运行状态与结果可用性，两者互不排斥
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub result_available: bool,
}

/// `get_result` 的应答：不可用与空结果是两回事
#[derive(Debug, Clone, PartialEq)]
pub enum ResultReply {
    Unavailable,
    Available(TrialResult),
}

pub struct ControlService<H, P> {
    supervisor: ProcessSupervisor<H>,
    results: ResultStore,
    ports: P,
    command: GeneratorCommand,
    lifecycle: Mutex<()>,
}

impl<H: ProcessHost, P: PortIntrospector> ControlService<H, P> {
    pub fn new(config: &ServiceConfig, host: H, ports: P) -> Self {
        Self {
            supervisor: ProcessSupervisor::new(host, config.process_name.clone()),
            results: ResultStore::new(config.result_path()),
            ports,
            command: GeneratorCommand::from_config(config),
            lifecycle: Mutex::new(()),
        }
    }

    pub fn supervisor(&self) -> &ProcessSupervisor<H> {
        &self.supervisor
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// 校验参数、拼出命令行并（重新）启动生成器
    ///
    /// 参数错误在触碰任何进程之前返回。
    #[tracing::instrument(skip(self, params), fields(frame_size = params.frame_size, num_flows = params.num_flows))]
    pub fn start(&self, params: &StartParams) -> Result<LaunchOutcome, ParamError> {
        let argv = self.command.argv(params)?;
        let _guard = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = self.supervisor.start(&argv);
        info!(?outcome, "start 完成");
        Ok(outcome)
    }

    pub fn stop(&self) -> bool {
        let _guard = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let ok = self.supervisor.stop();
        if !ok {
            warn!("部分生成器进程未能终止");
        }
        ok
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    pub fn is_result_available(&self) -> bool {
        self.results.is_result_available()
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            running: self.is_running(),
            result_available: self.is_result_available(),
        }
    }

    pub fn get_result(&self) -> ResultReply {
        if !self.results.is_result_available() {
            return ResultReply::Unavailable;
        }
        ResultReply::Available(self.results.get_result())
    }

    /// 生成器端口的 MAC 列表；查询失败返回空列表
    pub fn get_mac_list(&self) -> Vec<String> {
        match self.ports.port_macs() {
            Ok(macs) => macs.iter().map(ToString::to_string).collect(),
            Err(e) => {
                debug!(error = %e, "查询端口 MAC 失败");
                Vec::new()
            }
        }
    }
}
