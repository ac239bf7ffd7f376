//! Quota limit entity.
//!
//! A [`Limit`] holds one quota dimension for a service: the ceiling (a
//! hardcoded default, optionally overridden by configuration), the
//! warning/critical margins, and the usage observations recorded by the
//! owning checker's last discovery cycle. Severity is derived on read, never
//! stored.

use serde::Serialize;

// =============================================================================
// Severity
// =============================================================================

/// Verdict from comparing observed usage against a limit's ceiling.
///
/// Ordered so that `Ok < Warning < Critical`; for a fixed ceiling and
/// margins the verdict is monotonically non-decreasing in usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

// =============================================================================
// Usage observations
// =============================================================================

/// One usage observation committed by a discovery cycle.
///
/// Most limits carry a single aggregate observation per cycle; limits that
/// track usage per resource class carry one observation per class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    /// Observed resource count. `u64` makes the non-negativity contract a
    /// compile-time fact rather than a runtime check.
    pub count: u64,

    /// Provider resource classification this count belongs to
    /// (e.g. `AWS::AppStream`).
    pub resource_type: String,
}

// =============================================================================
// Limit
// =============================================================================

/// A single quota record: ceiling, thresholds, and accumulated usage.
#[derive(Debug, Clone)]
pub struct Limit {
    name: String,
    /// Owning service label (back-reference only, no ownership).
    service: String,
    limit_type: String,
    default_value: u64,
    override_value: Option<u64>,
    warning_margin: u64,
    critical_margin: u64,
    usage: Vec<UsageRecord>,
}

impl Limit {
    /// Create a limit with an empty usage sequence.
    pub fn new(
        name: impl Into<String>,
        service: impl Into<String>,
        default_value: u64,
        warning_margin: u64,
        critical_margin: u64,
        limit_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            limit_type: limit_type.into(),
            default_value,
            override_value: None,
            warning_margin,
            critical_margin,
            usage: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn limit_type(&self) -> &str {
        &self.limit_type
    }

    /// Effective ceiling: the configured override if present, else the
    /// hardcoded default.
    pub fn ceiling(&self) -> u64 {
        self.override_value.unwrap_or(self.default_value)
    }

    /// Replace the default ceiling with a configured value.
    pub fn set_override(&mut self, value: u64) {
        self.override_value = Some(value);
    }

    /// Clear all usage observations. Called exactly once per discovery
    /// cycle, before any observation is added for that cycle. Idempotent.
    pub fn reset_usage(&mut self) {
        self.usage.clear();
    }

    /// Append one usage observation tagged with its resource classification.
    pub fn add_usage(&mut self, count: u64, resource_type: impl Into<String>) {
        self.usage.push(UsageRecord {
            count,
            resource_type: resource_type.into(),
        });
    }

    /// Read-only view of the usage observations from the last discovery
    /// cycle, in commit order.
    pub fn current_usage(&self) -> &[UsageRecord] {
        &self.usage
    }

    /// Whether any observation has been committed since the last reset.
    pub fn has_usage(&self) -> bool {
        !self.usage.is_empty()
    }

    /// Observed usage for threshold comparison: the maximum observation
    /// count. A limit with one aggregate observation compares that value; a
    /// per-resource limit is governed by its worst entry.
    pub fn observed(&self) -> u64 {
        self.usage.iter().map(|u| u.count).max().unwrap_or(0)
    }

    /// Derive the severity verdict from observed usage.
    ///
    /// WARNING once usage reaches `ceiling - warning_margin`, CRITICAL once
    /// it reaches `ceiling - critical_margin` (saturating, so a margin
    /// larger than the ceiling flags from zero usage upward).
    pub fn severity(&self) -> Severity {
        let observed = self.observed();
        let ceiling = self.ceiling();
        if observed >= ceiling.saturating_sub(self.critical_margin) {
            Severity::Critical
        } else if observed >= ceiling.saturating_sub(self.warning_margin) {
            Severity::Warning
        } else {
            Severity::Ok
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
