//! 结果文件格式
//!
//! ```json
//! {"trials": [{"result": "pass", "stats": {"0": {"tx_l1_bps": ..., "rx_latency_average": ...}}}]}
//! ```
//!
//! `stats` 里除端口号之外还可能有其它元数据键，只有纯数字键才是端口。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// 试验通过时 `result` 字段的取值
pub const PASS_SENTINEL: &str = "pass";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("result artifact {} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("result artifact {} unreadable: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("result artifact is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("result artifact contains no trials")]
    NoTrials,
    #[error("latest trial has no `{0}` field")]
    MissingField(&'static str),
    #[error("invalid statistics for port `{port}`: {source}")]
    BadPortStats {
        port: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtifact {
    pub trials: Vec<RawTrial>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrial {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub stats: Option<Map<String, Value>>,
}

impl RawTrial {
    pub fn passed(&self) -> bool {
        self.result.as_ref().and_then(Value::as_str) == Some(PASS_SENTINEL)
    }

    /// `result` 字段的文本形式，用于日志
    pub fn result_text(&self) -> Option<String> {
        self.result.as_ref().map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawPortStats {
    tx_l1_bps: f64,
    tx_l2_bps: f64,
    tx_pps: f64,
    rx_l1_bps: f64,
    rx_l2_bps: f64,
    rx_pps: f64,
    rx_latency_minimum: f64,
    rx_latency_maximum: f64,
    rx_latency_average: f64,
}

/// 单个端口的统计
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortStats {
    pub port_id: u32,
    pub tx_l1_bps: f64,
    pub tx_l2_bps: f64,
    pub tx_pps: f64,
    pub rx_l1_bps: f64,
    pub rx_l2_bps: f64,
    pub rx_pps: f64,
    pub rx_latency_min: f64,
    pub rx_latency_max: f64,
    pub rx_latency_avg: f64,
}

impl PortStats {
    fn from_raw(port_id: u32, raw: RawPortStats) -> Self {
        Self {
            port_id,
            tx_l1_bps: raw.tx_l1_bps,
            tx_l2_bps: raw.tx_l2_bps,
            tx_pps: raw.tx_pps,
            rx_l1_bps: raw.rx_l1_bps,
            rx_l2_bps: raw.rx_l2_bps,
            rx_pps: raw.rx_pps,
            rx_latency_min: raw.rx_latency_minimum,
            rx_latency_max: raw.rx_latency_maximum,
            rx_latency_avg: raw.rx_latency_average,
        }
    }
}

/// 最近一次试验的结果；零值（空统计、未通过）表示结论未定
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialResult {
    pub pass: bool,
    pub stats: Vec<PortStats>,
}

impl TrialResult {
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn port(&self, port_id: u32) -> Option<&PortStats> {
        self.stats.iter().find(|s| s.port_id == port_id)
    }
}

fn is_port_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

impl TryFrom<&RawTrial> for TrialResult {
    type Error = ArtifactError;

    fn try_from(trial: &RawTrial) -> Result<Self, Self::Error> {
        let stats = trial
            .stats
            .as_ref()
            .ok_or(ArtifactError::MissingField("stats"))?;

        let mut ports = Vec::new();
        for (key, value) in stats.iter().filter(|(k, _)| is_port_key(k)) {
            let bad = |source: serde_json::Error| ArtifactError::BadPortStats {
                port: key.clone(),
                source,
            };
            let port_id = key
                .parse::<u32>()
                .map_err(|_| bad(serde::de::Error::custom("port id out of range")))?;
            let raw = RawPortStats::deserialize(value).map_err(bad)?;
            ports.push(PortStats::from_raw(port_id, raw));
        }
        ports.sort_by_key(|p| p.port_id);

        Ok(Self {
            pass: trial.passed(),
            stats: ports,
        })
    }
}
