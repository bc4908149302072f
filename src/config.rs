//! 服务配置
//!
//! 可选的 JSON 配置文件提供基础值（缺省字段取默认值），命令行参数再覆盖。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_RPC_PORT: u16 = 50051;
pub const DEFAULT_TREX_ADDR: &str = "localhost:4501";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 端口 MAC 的来源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MacSource {
    /// 向 TRex 的 JSON-RPC 端点查询
    #[default]
    Trex,
    /// 读取本机网卡的 sysfs 地址文件
    Sysfs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// RPC 监听地址（不含端口）
    pub bind: String,
    pub port: u16,
    /// 生成器的工作目录，结果文件也在这里
    pub generator_dir: PathBuf,
    pub generator_program: String,
    /// 传给 `--traffic-generator` 的后端类型
    pub traffic_generator: String,
    /// 进程表中用于识别生成器的名字子串
    pub process_name: String,
    pub result_file: String,
    /// 追加在生成器参数末尾的额外选项
    pub extra_args: Vec<String>,
    pub mac_source: MacSource,
    /// TRex JSON-RPC 端点（host:port）
    pub trex_addr: String,
    /// 要查询的 TRex 端口序号，按输出顺序
    pub trex_ports: Vec<u32>,
    /// 生成器端口对应的网卡，仅 sysfs 来源使用
    pub port_interfaces: Vec<String>,
    pub sysfs_net_root: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "[::]".to_string(),
            port: DEFAULT_RPC_PORT,
            generator_dir: PathBuf::from("."),
            generator_program: "./binary-search.py".to_string(),
            traffic_generator: "trex-txrx".to_string(),
            process_name: "binary-search".to_string(),
            result_file: "binary-search.json".to_string(),
            extra_args: Vec::new(),
            mac_source: MacSource::Trex,
            trex_addr: DEFAULT_TREX_ADDR.to_string(),
            trex_ports: vec![0, 1],
            port_interfaces: Vec::new(),
            sysfs_net_root: PathBuf::from("/sys/class/net"),
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn result_path(&self) -> PathBuf {
        self.generator_dir.join(&self.result_file)
    }
}

/// 把 `--extra-opts` 的原始字符串拆成参数：去掉两端引号后按空白切分
pub fn split_extra_opts(raw: &str) -> Vec<String> {
    raw.trim_matches(|c| c == '"' || c == '\'')
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
