//! Container configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Very high confidence
pub const CONF_HIGH: f64 = 0.95;
pub const CONF_MEDIUM: f64 = 0.8;
pub const CONF_LOW: f64 = 0.5;
pub const DEFAULT_WORKERS: usize = 4;
/// Utterances with this many words or more are not matched.
pub const DEFAULT_MAX_WORDS: usize = 50;

/// Settings for an [`IntentContainer`](crate::IntentContainer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enable the fuzzy matching tier.
    pub fuzz: bool,
    /// Scoring worker threads.
    pub workers: usize,
    pub conf_high: f64,
    pub conf_med: f64,
    pub conf_low: f64,
    pub max_words: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fuzz: false,
            workers: DEFAULT_WORKERS,
            conf_high: CONF_HIGH,
            conf_med: CONF_MEDIUM,
            conf_low: CONF_LOW,
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_fuzz(mut self, fuzz: bool) -> Self {
        self.fuzz = fuzz;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Threshold a match must exceed at the given level.
    pub fn threshold(&self, level: ConfidenceLevel) -> f64 {
        match level {
            ConfidenceLevel::High => self.conf_high,
            ConfidenceLevel::Medium => self.conf_med,
            ConfidenceLevel::Low => self.conf_low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}
