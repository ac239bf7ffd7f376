//! Checker registry — drives discovery uniformly and aggregates verdicts.
//!
//! The registry owns every service checker behind the [`ServiceChecker`]
//! contract. Checkers are independent (each owns its own connection and
//! limit mapping), so one checker's failed discovery cycle never blocks the
//! others; its limits simply keep their previous values and the failure is
//! reported alongside the results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::checkers::{AppStreamChecker, ServiceChecker, WorkspacesChecker};
use crate::limit::{Limit, Severity, UsageRecord};
use crate::provider::Connector;
use crate::types::{Config, Error, Result};

// =============================================================================
// Report types
// =============================================================================

/// Snapshot of one limit's state for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct LimitReport {
    pub service: String,
    pub name: String,
    pub limit_type: String,
    pub ceiling: u64,
    pub observed: u64,
    pub usage: Vec<UsageRecord>,
    pub severity: Severity,
}

/// Result of one threshold-evaluation pass across all checkers.
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdReport {
    pub checked_at: DateTime<Utc>,
    pub limits: Vec<LimitReport>,
}

impl ThresholdReport {
    /// Worst severity across every reported limit.
    pub fn worst_severity(&self) -> Severity {
        self.limits
            .iter()
            .map(|l| l.severity)
            .max()
            .unwrap_or(Severity::Ok)
    }

    /// Limits at or above the given severity.
    pub fn flagged(&self, at_least: Severity) -> Vec<&LimitReport> {
        self.limits.iter().filter(|l| l.severity >= at_least).collect()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Holds all service checkers and invokes them polymorphically.
pub struct CheckerRegistry {
    checkers: BTreeMap<String, Box<dyn ServiceChecker>>,
}

impl std::fmt::Debug for CheckerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckerRegistry")
            .field("services", &self.checkers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckerRegistry {
    /// Empty registry; checkers are added via [`register`](Self::register).
    pub fn new() -> Self {
        Self {
            checkers: BTreeMap::new(),
        }
    }

    /// Registry with every built-in checker, sharing one connector.
    pub fn with_default_checkers(connector: Arc<dyn Connector>, config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(
            Box::new(AppStreamChecker::new(config.thresholds, connector.clone())),
            config,
        );
        registry.register(
            Box::new(WorkspacesChecker::new(config.thresholds, connector)),
            config,
        );
        registry
    }

    /// Add a checker, building its limits and applying any configured
    /// ceiling overrides for its service.
    pub fn register(&mut self, mut checker: Box<dyn ServiceChecker>, config: &Config) {
        let service = checker.service_name().to_string();
        if let Some(overrides) = config.limit_overrides.get(&service) {
            let limits = checker.limits();
            for (name, ceiling) in overrides {
                match limits.get_mut(name) {
                    Some(lim) => lim.set_override(*ceiling),
                    None => warn!(
                        service = %service,
                        limit = %name,
                        "override names a limit this service does not track"
                    ),
                }
            }
        }
        self.checkers.insert(service, checker);
    }

    /// Registered service names, sorted.
    pub fn services(&self) -> Vec<&str> {
        self.checkers.keys().map(String::as_str).collect()
    }

    /// Access one checker's limit mapping (built on first access).
    pub fn limits(&mut self, service: &str) -> Option<&BTreeMap<String, Limit>> {
        self.checkers.get_mut(service).map(|c| &*c.limits())
    }

    /// Run one discovery cycle on every checker.
    ///
    /// Failures are collected per service rather than aborting the whole
    /// pass; a failed checker's limits retain their previous values.
    pub async fn find_usage(&mut self) -> Vec<(String, Error)> {
        let mut failures = Vec::new();
        for (service, checker) in &mut self.checkers {
            debug!(service = %service, "running usage discovery");
            if let Err(err) = checker.find_usage().await {
                warn!(service = %service, error = %err, "usage discovery failed");
                failures.push((service.clone(), err));
            }
        }
        failures
    }

    /// Evaluate every discovered limit against its thresholds.
    ///
    /// Calling this before any discovery cycle has run is a caller bug and
    /// fails fast. Checkers whose cycle aborted are skipped with a warning;
    /// their stale limits are not reported as current.
    pub fn check_thresholds(&mut self) -> Result<ThresholdReport> {
        if !self.checkers.values().any(|c| c.have_usage()) {
            return Err(Error::usage_not_checked(
                "no discovery cycle has run; call find_usage first",
            ));
        }

        let mut limits = Vec::new();
        for (service, checker) in &mut self.checkers {
            if !checker.have_usage() {
                warn!(service = %service, "skipping service without discovered usage");
                continue;
            }
            for lim in checker.limits().values() {
                limits.push(LimitReport {
                    service: service.clone(),
                    name: lim.name().to_string(),
                    limit_type: lim.limit_type().to_string(),
                    ceiling: lim.ceiling(),
                    observed: lim.observed(),
                    usage: lim.current_usage().to_vec(),
                    severity: lim.severity(),
                });
            }
        }
        Ok(ThresholdReport {
            checked_at: Utc::now(),
            limits,
        })
    }

    /// IAM action strings required per service, for policy generation.
    pub fn required_iam_permissions(&self) -> BTreeMap<String, Vec<String>> {
        self.checkers
            .iter()
            .map(|(service, checker)| {
                let mut actions: Vec<String> = checker
                    .required_iam_permissions()
                    .iter()
                    .map(|a| (*a).to_string())
                    .collect();
                actions.sort();
                (service.clone(), actions)
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
