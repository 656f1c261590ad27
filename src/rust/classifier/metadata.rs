use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use crate::TrainingConfig;

/// Timestamp format of `started` and `finished`.
pub const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Layout version of the metadata record.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub info: PathBuf,
}

/// Implementations a model was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNames {
    pub classifier: String,
    pub features: String,
    pub lemmatizer: String,
}

/// Phase durations in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub build: f64,
    pub features: f64,
    pub training: f64,
    pub validation: Option<f64>,
}

impl Timer {
    pub fn new(build: Duration, features: Duration, training: Duration, validation: Option<Duration>) -> Self {
        Self {
            build: build.as_secs_f64(),
            features: features.as_secs_f64(),
            training: training.as_secs_f64(),
            validation: validation.map(|d| d.as_secs_f64()),
        }
    }
}

/// The record written next to every model describing how it was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub schema_version: u32,
    pub started: String,
    pub finished: String,
    /// `None` when validation was skipped
    pub accuracy: Option<f64>,
    pub validated: bool,
    pub corpus: PathBuf,
    pub paths: ArtifactPaths,
    pub classes: ComponentNames,
    /// Learner settings every model of the build was trained with
    pub training: TrainingConfig,
    pub timer: Timer,
    /// SHA-256 of the model file
    pub checksum: String,
    pub labels: Vec<String>,
    /// Number of corpus rows the model was trained on
    pub examples: usize,
}

impl BuildInfo {
    pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
        timestamp.format(DATE_FORMAT).to_string()
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
