//! # Quotawatch - Cloud Service Quota Auditor
//!
//! Checks a cloud account's resource consumption against provider-imposed
//! quotas:
//! - `Limit` entities hold a quota ceiling, thresholds, and observed usage
//! - Service checkers discover usage per resource family via paginated
//!   control-plane list calls
//! - A checker registry drives discovery uniformly and aggregates severity
//!   verdicts for reporting
//!
//! ## Architecture
//!
//! ```text
//!   CheckerRegistry ──► dyn ServiceChecker ──► dyn ApiConnection
//!        │                    │                 (provider pages)
//!        │                    └── Limit map (usage, severity)
//!        └── ThresholdReport / IAM permission sets
//! ```
//!
//! The provider transport itself is an external collaborator: callers inject
//! a [`provider::Connector`] and checkers only ever see paginated pages.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod checkers;
pub mod limit;
pub mod pagination;
pub mod provider;
pub mod registry;
pub mod types;

// Internal utilities
pub mod observability;

pub use limit::{Limit, Severity, UsageRecord};
pub use registry::CheckerRegistry;
pub use types::{Config, Error, Result};
