//! 结果文件读取器
//!
//! 每次调用都重新读取文件，不做重试也不等待；生成器可能正在写入，
//! 读到的半截内容按“不可用”处理。

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::artifact::{ArtifactError, RawArtifact, RawTrial, TrialResult};

/// 结果可用性（内部类型化，对外折叠为布尔值）
#[derive(Debug)]
pub enum Availability {
    Passed,
    NotPassed { result: Option<String> },
    Unreadable(ArtifactError),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Passed)
    }
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RawArtifact, ArtifactError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ArtifactError::Missing(self.path.clone()),
            _ => ArtifactError::Unreadable {
                path: self.path.clone(),
                source,
            },
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn latest_trial(artifact: &RawArtifact) -> Result<&RawTrial, ArtifactError> {
        artifact.trials.last().ok_or(ArtifactError::NoTrials)
    }

    pub fn availability(&self) -> Availability {
        let artifact = match self.load() {
            Ok(a) => a,
            Err(e) => return Availability::Unreadable(e),
        };
        let trial = match Self::latest_trial(&artifact) {
            Ok(t) => t,
            Err(e) => return Availability::Unreadable(e),
        };
        if trial.result.is_none() {
            return Availability::Unreadable(ArtifactError::MissingField("result"));
        }
        if trial.passed() {
            Availability::Passed
        } else {
            Availability::NotPassed {
                result: trial.result_text(),
            }
        }
    }

    /// 文件存在、格式正确、至少一次试验且最近一次试验通过
    pub fn is_result_available(&self) -> bool {
        let availability = self.availability();
        debug!(path = %self.path.display(), ?availability, "结果可用性");
        availability.is_available()
    }

    /// 最近一次试验的结果，失败原因保留给调用方
    pub fn try_result(&self) -> Result<TrialResult, ArtifactError> {
        let artifact = self.load()?;
        TrialResult::try_from(Self::latest_trial(&artifact)?)
    }

    /// 最近一次试验的结果；任何失败都返回零值结果
    pub fn get_result(&self) -> TrialResult {
        self.try_result().unwrap_or_else(|e| {
            debug!(path = %self.path.display(), error = %e, "读取结果失败，返回空结果");
            TrialResult::default()
        })
    }
}
