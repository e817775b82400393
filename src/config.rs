//! Tool configuration: SIMD collection, per-tile granularity, kernel-run filter.

use crate::errors::ProfilerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_DISABLE_SIMD: &str = "GIC_DisableSimd";
pub const ENV_PER_TILE_COLLECTION: &str = "GIC_PerTileCollection";
pub const ENV_KERNEL_RUN: &str = "GIC_KernelRun";
pub const ENV_CONFIG_FILE: &str = "GIC_CONFIG";

/// Static configuration loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstCountConfig {
    /// Skip SIMD active lane collection.
    pub disable_simd: bool,
    /// Keep separate counters for each tile of a multi-tile device.
    pub per_tile_collection: bool,
    /// Run indices to profile. Empty means every run.
    pub kernel_runs: Vec<u32>,
}

impl InstCountConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ProfilerError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from `GIC_*` environment variables, on top of the JSON file named
    /// by `GIC_CONFIG` if set. Environment wins over the file.
    pub fn from_env() -> Result<Self, ProfilerError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable lookup.
    pub fn from_vars<F>(get: F) -> Result<Self, ProfilerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match get(ENV_CONFIG_FILE).filter(|p| !p.is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(v) = get(ENV_DISABLE_SIMD) {
            config.disable_simd = v == "1";
        }
        if let Some(v) = get(ENV_PER_TILE_COLLECTION) {
            config.per_tile_collection = v == "1";
        }
        if let Some(v) = get(ENV_KERNEL_RUN) {
            config.kernel_runs = parse_kernel_runs(&v)?;
        }
        Ok(config)
    }
}

/// Parse a comma-separated list of run indices. Blank input is an empty list.
pub fn parse_kernel_runs(value: &str) -> Result<Vec<u32>, ProfilerError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>().map_err(|_| {
                ProfilerError::InvalidConfig(format!("{}: invalid run index '{}'", ENV_KERNEL_RUN, s))
            })
        })
        .collect()
}
