//! Configuration structures.
//!
//! Configuration is loaded from environment variables and config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Global quotawatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default warning/critical thresholds applied to every limit.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Per-service ceiling overrides: service name -> limit name -> ceiling.
    /// An override replaces the hardcoded default ceiling for that limit.
    #[serde(default)]
    pub limit_overrides: BTreeMap<String, BTreeMap<String, u64>>,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Severity thresholds, expressed as absolute margins below the ceiling.
///
/// A limit reports WARNING once observed usage reaches
/// `ceiling - warning_margin`, and CRITICAL once it reaches
/// `ceiling - critical_margin`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Margin below the ceiling at which a limit turns WARNING.
    pub warning_margin: u64,

    /// Margin below the ceiling at which a limit turns CRITICAL.
    pub critical_margin: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning_margin: 1,
            critical_margin: 0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
