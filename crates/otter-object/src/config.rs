//! Memory accounting configuration

use crate::error::{ObjectError, ObjectResult};
use serde::Deserialize;
use std::time::Duration;

/// Default number of entries estimated exactly before sampling kicks in
pub const DEFAULT_SAMPLE_THRESHOLD: usize = 100;

/// Default nesting limit
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Limits and sampling for [`crate::memory::estimate`].
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemUsageConfig {
    /// Entries per object (or map) estimated exactly; larger objects are
    /// sampled and extrapolated
    pub sample_threshold: usize,

    /// Byte budget for one run
    pub max_bytes: Option<u64>,

    /// Wall-clock budget for one run, in milliseconds
    pub time_budget_ms: Option<u64>,

    /// Maximum object nesting depth
    pub max_depth: usize,
}

impl Default for MemUsageConfig {
    fn default() -> Self {
        Self {
            sample_threshold: DEFAULT_SAMPLE_THRESHOLD,
            max_bytes: None,
            time_budget_ms: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MemUsageConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> ObjectResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| ObjectError::InvalidConfig(e.to_string()))?;
        if config.sample_threshold == 0 {
            return Err(ObjectError::InvalidConfig(
                "sample_threshold must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Set the sampling threshold (at least 1)
    pub fn sample_threshold(mut self, threshold: usize) -> Self {
        self.sample_threshold = threshold.max(1);
        self
    }

    /// Set the byte budget
    pub fn max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes = Some(bytes);
        self
    }

    /// Set the time budget
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = Some(u64::try_from(budget.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the depth limit
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Time budget as a duration
    pub fn time_budget_duration(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}
