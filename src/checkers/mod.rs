//! Service checkers — one per monitored resource family group.
//!
//! Every checker implements the same object-safe contract so the registry
//! can drive dozens of heterogeneous resource families uniformly. Shared
//! state lives in [`CheckerCore`] by composition; concrete checkers own the
//! resource-family logic (which operations to paginate, how to classify
//! items) and nothing else.

mod appstream;
mod workspaces;

pub use appstream::AppStreamChecker;
pub use workspaces::WorkspacesChecker;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::limit::Limit;
use crate::provider::{ApiConnection, Connector};
use crate::types::{Error, Result, ThresholdConfig};

/// Polymorphic contract every service checker implements.
#[async_trait]
pub trait ServiceChecker: Send {
    /// Human-readable service label, unique within a registry.
    fn service_name(&self) -> &'static str;

    /// Provider API namespace this checker connects to.
    fn api_name(&self) -> &str;

    /// The checker's limits, constructed on first call.
    ///
    /// Idempotent: repeated calls return the same `Limit` instances, never a
    /// rebuilt map — the registry and reporting layer hold severity reads
    /// against them across the run.
    fn limits(&mut self) -> &mut BTreeMap<String, Limit>;

    /// Run one full usage-discovery cycle: connect, reset every owned
    /// limit's usage once, paginate each resource family to completion, and
    /// commit the counts.
    ///
    /// Transport, authorization, and protocol failures propagate and abort
    /// the cycle; limits left uncommitted keep their previous values.
    async fn find_usage(&mut self) -> Result<()>;

    /// Static list of access-policy action strings this checker needs.
    fn required_iam_permissions(&self) -> &'static [&'static str];

    /// Whether a discovery cycle has completed since construction.
    fn have_usage(&self) -> bool;
}

/// State shared by every checker, held by composition.
pub struct CheckerCore {
    service_name: &'static str,
    api_name: &'static str,
    thresholds: ThresholdConfig,
    connector: Arc<dyn Connector>,
    conn: Option<Box<dyn ApiConnection>>,
    pub(crate) limits: BTreeMap<String, Limit>,
    have_usage: bool,
}

impl std::fmt::Debug for CheckerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckerCore")
            .field("service_name", &self.service_name)
            .field("api_name", &self.api_name)
            .field("connected", &self.conn.is_some())
            .field("limits", &self.limits.keys().collect::<Vec<_>>())
            .field("have_usage", &self.have_usage)
            .finish()
    }
}

impl CheckerCore {
    pub fn new(
        service_name: &'static str,
        api_name: &'static str,
        thresholds: ThresholdConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            service_name,
            api_name,
            thresholds,
            connector,
            conn: None,
            limits: BTreeMap::new(),
            have_usage: false,
        }
    }

    pub fn service_name(&self) -> &'static str {
        self.service_name
    }

    pub fn api_name(&self) -> &str {
        self.api_name
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.thresholds
    }

    /// Connection against this checker's own API namespace, established
    /// lazily and cached for the checker's lifetime.
    pub async fn connect(&mut self) -> Result<&dyn ApiConnection> {
        if self.conn.is_none() {
            debug!(
                service = self.service_name,
                api = self.api_name,
                "establishing provider connection"
            );
            let conn = self.connector.connect(self.api_name).await?;
            self.conn = Some(conn);
        }
        match self.conn.as_deref() {
            Some(conn) => Ok(conn),
            None => Err(Error::transport("connection not established")),
        }
    }

    /// Scoped connection against a foreign API namespace.
    ///
    /// The checker's own namespace and cached connection are never touched,
    /// so a failing foreign call cannot leave the checker pointed at the
    /// wrong API.
    pub async fn borrow_api(&self, api_name: &str) -> Result<Box<dyn ApiConnection>> {
        debug!(
            service = self.service_name,
            own_api = self.api_name,
            borrowed_api = api_name,
            "borrowing foreign API namespace"
        );
        self.connector.connect(api_name).await
    }

    /// Clear usage on every owned limit. One reset pass per discovery
    /// cycle, never per page.
    pub fn reset_all_usage(&mut self) {
        for lim in self.limits.values_mut() {
            lim.reset_usage();
        }
    }

    /// Commit one aggregated count to a named limit.
    pub fn commit_usage(&mut self, limit_name: &str, count: u64, resource_type: &str) -> Result<()> {
        let lim = self
            .limits
            .get_mut(limit_name)
            .ok_or_else(|| Error::unknown_limit(format!("{}/{limit_name}", self.service_name)))?;
        lim.add_usage(count, resource_type);
        Ok(())
    }

    pub fn mark_usage_found(&mut self) {
        self.have_usage = true;
    }

    pub fn have_usage(&self) -> bool {
        self.have_usage
    }
}

// =============================================================================
// Tests
// =============================================================================
