//! Core types for quotawatch.
//!
//! This module provides foundational types used throughout the system:
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Threshold, override, and observability configuration

mod config;
mod errors;

pub use config::{Config, ObservabilityConfig, ThresholdConfig};
pub use errors::{Error, Result};
