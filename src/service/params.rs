//! `start` 的请求参数与生成器命令行构造

use serde::{Deserialize, Serialize};

use crate::addr::{FormatError, MacValue};
use crate::config::ServiceConfig;
use crate::error::ParamError;
use crate::flow::{TagSpec, payload_len};

/// 二层目的地址模式
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DestinationMode {
    /// 由生成器按范围推导目的 MAC
    #[default]
    Ranged,
    /// 显式给出网关 MAC 列表（三层转发场景）
    Explicit { macs: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartParams {
    /// `A:B[,C:D]...`
    pub device_pairs: String,
    /// 每轮搜索时长（秒）
    pub search_runtime: u32,
    /// 最终验证时长（秒）
    pub validation_runtime: u32,
    pub num_flows: u32,
    /// 二层帧长（字节）
    pub frame_size: u32,
    pub max_loss_pct: f64,
    pub sniff_runtime: u32,
    pub search_granularity: f64,
    pub destination: DestinationMode,
}

impl Default for StartParams {
    fn default() -> Self {
        Self {
            device_pairs: "0:1".to_string(),
            search_runtime: 10,
            validation_runtime: 30,
            num_flows: 1,
            frame_size: 64,
            max_loss_pct: 0.002,
            sniff_runtime: 0,
            search_granularity: 5.0,
            destination: DestinationMode::Ranged,
        }
    }
}

fn check_device_pairs(pairs: &str) -> Result<(), FormatError> {
    let valid = pairs.split(',').all(|pair| match pair.split_once(':') {
        Some((a, b)) => a.trim().parse::<u32>().is_ok() && b.trim().parse::<u32>().is_ok(),
        None => false,
    });
    if valid {
        Ok(())
    } else {
        Err(FormatError::value("device pairs", pairs))
    }
}

impl StartParams {
    /// 校验参数；显式模式下返回规范化后的 MAC 列表
    pub fn validate(&self) -> Result<Option<Vec<MacValue>>, ParamError> {
        check_device_pairs(&self.device_pairs)?;
        if self.num_flows == 0 {
            return Err(ParamError::Validation("num_flows must be at least 1".into()));
        }
        payload_len(self.frame_size, &TagSpec::None)?;
        if !self.max_loss_pct.is_finite() || !(0.0..=100.0).contains(&self.max_loss_pct) {
            return Err(ParamError::Validation(format!(
                "max_loss_pct {} must be within 0..=100",
                self.max_loss_pct
            )));
        }
        if !self.search_granularity.is_finite() || self.search_granularity < 0.0 {
            return Err(ParamError::Validation(format!(
                "search_granularity {} must be a non-negative number",
                self.search_granularity
            )));
        }

        match &self.destination {
            DestinationMode::Ranged => Ok(None),
            DestinationMode::Explicit { macs } if macs.is_empty() => Err(
                ParamError::Configuration("explicit destination mode needs at least one MAC".into()),
            ),
            DestinationMode::Explicit { macs } => {
                let parsed = macs
                    .iter()
                    .map(|m| m.parse::<MacValue>())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(parsed))
            }
        }
    }
}

/// 生成器命令行的固定部分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommand {
    program: String,
    traffic_generator: String,
    extra_args: Vec<String>,
}

impl GeneratorCommand {
    pub fn new(program: impl Into<String>, traffic_generator: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            traffic_generator: traffic_generator.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.generator_program, &config.traffic_generator)
            .with_extra_args(config.extra_args.clone())
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// 校验参数并拼出完整的 argv
    pub fn argv(&self, params: &StartParams) -> Result<Vec<String>, ParamError> {
        let dst_macs = params.validate()?;

        let mut argv = vec![
            self.program.clone(),
            format!("--traffic-generator={}", self.traffic_generator),
            format!("--device-pairs={}", params.device_pairs),
        ];
        if let Some(macs) = dst_macs {
            let joined = macs
                .iter()
                .map(MacValue::to_string)
                .collect::<Vec<_>>()
                .join(",");
            argv.push(format!("--dst-macs={joined}"));
        }
        argv.extend([
            format!("--search-runtime={}", params.search_runtime),
            format!("--validation-runtime={}", params.validation_runtime),
            format!("--num-flows={}", params.num_flows),
            format!("--frame-size={}", params.frame_size),
            format!("--max-loss-pct={:.6}", params.max_loss_pct),
            format!("--sniff-runtime={}", params.sniff_runtime),
            format!("--search-granularity={:.6}", params.search_granularity),
            "--rate-tolerance=50".to_string(),
            "--runtime-tolerance=50".to_string(),
            "--negative-packet-loss=fail".to_string(),
            "--rate-tolerance-failure=fail".to_string(),
        ]);
        argv.extend(self.extra_args.iter().cloned());
        Ok(argv)
    }
}
