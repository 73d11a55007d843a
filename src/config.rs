//! Engine configuration.
//!
//! Hosts hand this over once at engine creation and may flip flags later
//! through the mutable accessor. Every field has a serde default so partial
//! JSON from a host settings screen deserializes cleanly.

use serde::{Deserialize, Serialize};

use crate::error::AutofillResult;

/// Runtime switches and upload sampling rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Master switch. When off, suggestion queries answer with a warning
    /// row and parsing, filling and submission processing are skipped.
    #[serde(default = "default_enabled")]
    pub autofill_enabled: bool,
    /// Private browsing. Submitted forms are not analyzed or uploaded.
    #[serde(default)]
    pub off_the_record: bool,
    /// Suggested sampling rate for uploads whose form was recently
    /// autofilled. Carried on the upload payload; sampling is the
    /// consumer's job.
    #[serde(default = "default_upload_rate")]
    pub positive_upload_rate: f64,
    /// Suggested sampling rate for uploads whose form was not recently
    /// autofilled.
    #[serde(default = "default_upload_rate")]
    pub negative_upload_rate: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_upload_rate() -> f64 {
    0.01
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autofill_enabled: default_enabled(),
            off_the_record: false,
            positive_upload_rate: default_upload_rate(),
            negative_upload_rate: default_upload_rate(),
        }
    }
}

impl EngineConfig {
    /// Parses a config from a JSON string. Missing fields take defaults.
    pub fn from_json(json: &str) -> AutofillResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
