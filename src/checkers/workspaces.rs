//! WorkSpaces service checker.
//!
//! WorkSpaces quotas are per compute-type class (VALUE, STANDARD,
//! PERFORMANCE), but the workspace listing only carries a bundle id. The
//! cross-reference pattern applies: fully paginate the bundle catalog into a
//! bundle-id -> compute-type lookup first, then paginate the workspaces and
//! classify each through the lookup. Workspaces whose bundle is absent from
//! the catalog are in an inconsistent provider state and are excluded from
//! every count.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use super::{CheckerCore, ServiceChecker};
use crate::limit::Limit;
use crate::pagination::collect_items;
use crate::provider::{item_str, Connector};
use crate::types::{Error, Result, ThresholdConfig};

const SERVICE_NAME: &str = "WorkSpaces";
const API_NAME: &str = "workspaces";
const RESOURCE_TYPE: &str = "AWS::WorkSpaces";

/// Compute-type classes with their own quota dimension.
const COMPUTE_CLASSES: [&str; 3] = ["VALUE", "STANDARD", "PERFORMANCE"];

/// Default per-class workspace ceiling.
const DEFAULT_CEILING: u64 = 1;

#[derive(Debug)]
pub struct WorkspacesChecker {
    core: CheckerCore,
}

impl WorkspacesChecker {
    pub fn new(thresholds: ThresholdConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            core: CheckerCore::new(SERVICE_NAME, API_NAME, thresholds, connector),
        }
    }

    /// Build the bundle-id -> compute-type lookup from the fully paginated
    /// bundle catalog.
    fn bundle_lookup(bundles: &[Value]) -> Result<HashMap<String, String>> {
        let mut lookup = HashMap::with_capacity(bundles.len());
        for bundle in bundles {
            let id = item_str(bundle, "BundleId", "DescribeWorkspaceBundles")?;
            let compute = bundle
                .get("ComputeType")
                .and_then(|c| c.get("Name"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::protocol(
                        "bundle in DescribeWorkspaceBundles response missing ComputeType.Name",
                    )
                })?;
            lookup.insert(id.to_string(), compute.to_string());
        }
        Ok(lookup)
    }
}

#[async_trait]
impl ServiceChecker for WorkspacesChecker {
    fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn api_name(&self) -> &str {
        self.core.api_name()
    }

    fn limits(&mut self) -> &mut BTreeMap<String, Limit> {
        if self.core.limits.is_empty() {
            let thresholds = self.core.thresholds();
            for name in COMPUTE_CLASSES {
                self.core.limits.insert(
                    name.to_string(),
                    Limit::new(
                        name,
                        SERVICE_NAME,
                        DEFAULT_CEILING,
                        thresholds.warning_margin,
                        thresholds.critical_margin,
                        RESOURCE_TYPE,
                    ),
                );
            }
        }
        &mut self.core.limits
    }

    async fn find_usage(&mut self) -> Result<()> {
        debug!(service = SERVICE_NAME, "checking usage");
        self.limits();
        self.core.connect().await?;
        self.core.reset_all_usage();

        let bundles = {
            let conn = self.core.connect().await?;
            collect_items(conn, "DescribeWorkspaceBundles", "Bundles").await?
        };
        let lookup = Self::bundle_lookup(&bundles)?;

        let workspaces = {
            let conn = self.core.connect().await?;
            collect_items(conn, "DescribeWorkspaces", "Workspaces").await?
        };

        let mut counts: HashMap<&str, u64> =
            COMPUTE_CLASSES.iter().map(|class| (*class, 0)).collect();
        for workspace in &workspaces {
            let bundle_id = item_str(workspace, "BundleId", "DescribeWorkspaces")?;
            // workspaces with an unknown bundle, or a compute type outside
            // the quota classes, are excluded from every count
            if let Some(count) = lookup
                .get(bundle_id)
                .and_then(|class| counts.get_mut(class.as_str()))
            {
                *count += 1;
            }
        }

        for class in COMPUTE_CLASSES {
            self.core
                .commit_usage(class, counts.get(class).copied().unwrap_or(0), RESOURCE_TYPE)?;
        }

        self.core.mark_usage_found();
        debug!(service = SERVICE_NAME, "done checking usage");
        Ok(())
    }

    fn required_iam_permissions(&self) -> &'static [&'static str] {
        &[
            "workspaces:DescribeWorkspaceBundles",
            "workspaces:DescribeWorkspaces",
        ]
    }

    fn have_usage(&self) -> bool {
        self.core.have_usage()
    }
}

// =============================================================================
// Tests
// =============================================================================
