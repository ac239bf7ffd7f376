//! AppStream service checker.
//!
//! Counts stacks, fleets, images, and image builders directly from the
//! `appstream` namespace. The Users limit is special: registered users
//! mirror the registered WorkSpaces directories, so that one count comes
//! from a scoped borrow of the `workspaces` namespace.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::{CheckerCore, ServiceChecker};
use crate::limit::Limit;
use crate::pagination::{collect_items, count_items};
use crate::provider::{item_str, Connector};
use crate::types::{Result, ThresholdConfig};

const SERVICE_NAME: &str = "AppStream";
const API_NAME: &str = "appstream";
const RESOURCE_TYPE: &str = "AWS::AppStream";

/// Default ceiling shared by every AppStream limit.
const DEFAULT_CEILING: u64 = 5;

#[derive(Debug)]
pub struct AppStreamChecker {
    core: CheckerCore,
}

impl AppStreamChecker {
    pub fn new(thresholds: ThresholdConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            core: CheckerCore::new(SERVICE_NAME, API_NAME, thresholds, connector),
        }
    }

    /// Paginate one describe operation to completion and commit the total.
    async fn count_family(
        &mut self,
        limit_name: &str,
        operation: &str,
        items_field: &str,
    ) -> Result<()> {
        let count = {
            let conn = self.core.connect().await?;
            count_items(conn, operation, items_field).await?
        };
        self.core.commit_usage(limit_name, count, RESOURCE_TYPE)
    }

    /// Users are counted from the WorkSpaces directory listing: only
    /// directories in state `REGISTERED` carry AppStream users.
    ///
    /// The foreign namespace is borrowed as a scoped connection, so this
    /// checker's own namespace and cached handle survive every exit path,
    /// including a failing foreign call.
    async fn find_usage_users(&mut self) -> Result<()> {
        let conn = self.core.borrow_api("workspaces").await?;
        let directories =
            collect_items(conn.as_ref(), "DescribeWorkspaceDirectories", "Directories").await?;

        let mut count: u64 = 0;
        for directory in &directories {
            if item_str(directory, "State", "DescribeWorkspaceDirectories")? == "REGISTERED" {
                count += 1;
            }
        }
        self.core.commit_usage("Users", count, RESOURCE_TYPE)
    }
}

#[async_trait]
impl ServiceChecker for AppStreamChecker {
    fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn api_name(&self) -> &str {
        self.core.api_name()
    }

    fn limits(&mut self) -> &mut BTreeMap<String, Limit> {
        if self.core.limits.is_empty() {
            let thresholds = self.core.thresholds();
            for name in ["Stacks", "Fleets", "Images", "Image builders", "Users"] {
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

        self.count_family("Stacks", "DescribeStacks", "Stacks").await?;
        self.count_family("Fleets", "DescribeFleets", "Fleets").await?;
        self.count_family("Images", "DescribeImages", "Images").await?;
        self.count_family("Image builders", "DescribeImageBuilders", "ImageBuilders")
            .await?;
        self.find_usage_users().await?;

        self.core.mark_usage_found();
        debug!(service = SERVICE_NAME, "done checking usage");
        Ok(())
    }

    fn required_iam_permissions(&self) -> &'static [&'static str] {
        &[
            "appstream:Describe*",
            "workspaces:DescribeWorkspaceDirectories",
        ]
    }

    fn have_usage(&self) -> bool {
        self.core.have_usage()
    }
}

// =============================================================================
// Tests
// =============================================================================
