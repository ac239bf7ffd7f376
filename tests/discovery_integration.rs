//! End-to-end discovery tests — registry-driven discovery, threshold
//! evaluation, and reporting against a scripted provider.

use async_trait::async_trait;
use quotawatch::provider::{ApiConnection, Connector};
use quotawatch::{CheckerRegistry, Config, Result, Severity};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Scripted connector: maps (api, operation) to a queue of pages.
#[derive(Default)]
struct ScriptedProvider {
    routes: Arc<Mutex<HashMap<(String, String), VecDeque<Value>>>>,
}

impl ScriptedProvider {
    fn script(&self, api: &str, operation: &str, pages: Vec<Value>) {
        self.routes
            .lock()
            .unwrap()
            .insert((api.to_string(), operation.to_string()), pages.into_iter().collect());
    }

    /// One empty page for every route the built-in checkers query.
    fn script_all_empty(&self) {
        for (op, field) in [
            ("DescribeStacks", "Stacks"),
            ("DescribeFleets", "Fleets"),
            ("DescribeImages", "Images"),
            ("DescribeImageBuilders", "ImageBuilders"),
        ] {
            self.script("appstream", op, vec![json!({ field: [] })]);
        }
        for (op, field) in [
            ("DescribeWorkspaceDirectories", "Directories"),
            ("DescribeWorkspaceBundles", "Bundles"),
            ("DescribeWorkspaces", "Workspaces"),
        ] {
            self.script("workspaces", op, vec![json!({ field: [] })]);
        }
    }
}

#[async_trait]
impl Connector for ScriptedProvider {
    async fn connect(&self, api_name: &str) -> Result<Box<dyn ApiConnection>> {
        Ok(Box::new(ScriptedConnection {
            routes: self.routes.clone(),
            api: api_name.to_string(),
        }))
    }
}

struct ScriptedConnection {
    routes: Arc<Mutex<HashMap<(String, String), VecDeque<Value>>>>,
    api: String,
}

#[async_trait]
impl ApiConnection for ScriptedConnection {
    async fn list(&self, operation: &str, _next_token: Option<String>) -> Result<Value> {
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get_mut(&(self.api.clone(), operation.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| json!({})))
    }
}

/// Ceiling 5, warning margin 1, critical margin 0; three pages return
/// 2, 0, and 3 stacks with continuation tokens on the first two pages
/// only. Expected committed usage: 5. Expected severity: CRITICAL.
#[tokio::test]
async fn stack_count_at_ceiling_reports_critical() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.script_all_empty();
    provider.script(
        "appstream",
        "DescribeStacks",
        vec![
            json!({"Stacks": [{}, {}], "NextToken": "page-2"}),
            json!({"Stacks": [], "NextToken": "page-3"}),
            json!({"Stacks": [{}, {}, {}]}),
        ],
    );

    let mut registry =
        CheckerRegistry::with_default_checkers(provider.clone(), &Config::default());
    let failures = registry.find_usage().await;
    assert!(failures.is_empty(), "unexpected failures: {failures:?}");

    let report = registry.check_thresholds().unwrap();
    let stacks = report
        .limits
        .iter()
        .find(|l| l.service == "AppStream" && l.name == "Stacks")
        .unwrap();

    assert_eq!(stacks.ceiling, 5);
    assert_eq!(stacks.observed, 5);
    assert_eq!(stacks.usage.len(), 1);
    assert_eq!(stacks.severity, Severity::Critical);
    assert_eq!(report.worst_severity(), Severity::Critical);
}

#[tokio::test]
async fn full_account_audit_round_trip() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.script_all_empty();
    // four fleets against a ceiling of five: one short of the ceiling
    provider.script(
        "appstream",
        "DescribeFleets",
        vec![json!({"Fleets": [{}, {}, {}, {}]})],
    );
    // one VALUE workspace against a per-class ceiling of one
    provider.script(
        "workspaces",
        "DescribeWorkspaceBundles",
        vec![json!({"Bundles": [{"BundleId": "b-1", "ComputeType": {"Name": "VALUE"}}]})],
    );
    provider.script(
        "workspaces",
        "DescribeWorkspaces",
        vec![json!({"Workspaces": [{"BundleId": "b-1"}]})],
    );

    let mut registry =
        CheckerRegistry::with_default_checkers(provider.clone(), &Config::default());
    assert!(registry.find_usage().await.is_empty());

    let report = registry.check_thresholds().unwrap();
    let by_name: HashMap<(&str, &str), Severity> = report
        .limits
        .iter()
        .map(|l| ((l.service.as_str(), l.name.as_str()), l.severity))
        .collect();

    assert_eq!(by_name[&("AppStream", "Fleets")], Severity::Warning);
    assert_eq!(by_name[&("AppStream", "Stacks")], Severity::Ok);
    assert_eq!(by_name[&("WorkSpaces", "VALUE")], Severity::Critical);
    assert_eq!(by_name[&("WorkSpaces", "STANDARD")], Severity::Ok);

    let flagged = report.flagged(Severity::Warning);
    assert_eq!(flagged.len(), 2);
}

#[tokio::test]
async fn rediscovery_replaces_rather_than_accumulates() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.script_all_empty();
    provider.script(
        "appstream",
        "DescribeStacks",
        vec![json!({"Stacks": [{}, {}]}), json!({"Stacks": [{}]})],
    );
    // second cycle needs pages for every other route too
    for (op, field) in [
        ("DescribeFleets", "Fleets"),
        ("DescribeImages", "Images"),
        ("DescribeImageBuilders", "ImageBuilders"),
    ] {
        provider.script("appstream", op, vec![json!({ field: [] }), json!({ field: [] })]);
    }
    provider.script(
        "workspaces",
        "DescribeWorkspaceDirectories",
        vec![json!({"Directories": []}), json!({"Directories": []})],
    );
    provider.script(
        "workspaces",
        "DescribeWorkspaceBundles",
        vec![json!({"Bundles": []}), json!({"Bundles": []})],
    );
    provider.script(
        "workspaces",
        "DescribeWorkspaces",
        vec![json!({"Workspaces": []}), json!({"Workspaces": []})],
    );

    let mut registry =
        CheckerRegistry::with_default_checkers(provider.clone(), &Config::default());
    assert!(registry.find_usage().await.is_empty());
    assert!(registry.find_usage().await.is_empty());

    let report = registry.check_thresholds().unwrap();
    let stacks = report
        .limits
        .iter()
        .find(|l| l.service == "AppStream" && l.name == "Stacks")
        .unwrap();
    // second cycle observed one stack; the first cycle's two are gone
    assert_eq!(stacks.observed, 1);
    assert_eq!(stacks.usage.len(), 1);
}
