//! Provider connection abstraction.
//!
//! The actual cloud transport (credentials, signing, regions, HTTP) is an
//! external collaborator. This module defines the narrow capability checkers
//! consume: a [`Connector`] that opens a connection against one API
//! namespace, and an [`ApiConnection`] that runs single-shot list operations
//! returning raw pages.
//!
//! A page is a JSON object carrying an items array under an
//! operation-specific field, plus an optional `NextToken` continuation
//! token. Helpers here extract both; a missing items field is a fatal
//! protocol violation, never a zero count.

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Error, Result};

/// Continuation-token field on paginated provider responses.
pub const NEXT_TOKEN_FIELD: &str = "NextToken";

/// Opens connections against provider API namespaces.
///
/// Injected into each checker at construction; one connector may be shared
/// across checkers (each checker still owns its own connection handle).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a connection against the given API namespace.
    async fn connect(&self, api_name: &str) -> Result<Box<dyn ApiConnection>>;
}

/// One established connection against a single API namespace.
///
/// Calls block (await) until the provider responds; a checker never overlaps
/// two in-flight queries on the same connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiConnection: Send + Sync {
    /// Run one paginated list operation, returning one raw page.
    ///
    /// `next_token` carries the continuation token from the previous page,
    /// or `None` for the first query.
    async fn list(&self, operation: &str, next_token: Option<String>) -> Result<Value>;
}

impl std::fmt::Debug for dyn ApiConnection + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiConnection")
    }
}

/// Extract the items array from a page.
///
/// Absence of the field is a provider-contract breach and fatal to the
/// discovery cycle.
pub fn page_items<'a>(page: &'a Value, operation: &str, items_field: &str) -> Result<&'a [Value]> {
    page.get(items_field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            Error::protocol(format!(
                "response to {operation} missing items field {items_field}"
            ))
        })
}

/// Extract the continuation token from a page, if any.
pub fn next_token(page: &Value) -> Option<String> {
    page.get(NEXT_TOKEN_FIELD)
        .and_then(Value::as_str)
        .map(String::from)
}

/// Extract a required string field from one page item.
pub fn item_str<'a>(item: &'a Value, field: &str, operation: &str) -> Result<&'a str> {
    item.get(field).and_then(Value::as_str).ok_or_else(|| {
        Error::protocol(format!("item in {operation} response missing field {field}"))
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory provider shared by checker and registry tests.

    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct ProviderState {
        /// (api_name, operation) -> queued pages, replayed in order.
        routes: Mutex<HashMap<(String, String), VecDeque<Result<Value>>>>,
        connects: Mutex<Vec<String>>,
        calls: Mutex<Vec<(String, String)>>,
        fail_connect: Mutex<HashSet<String>>,
    }

    /// Connector whose connections replay scripted pages.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        state: Arc<ProviderState>,
    }

    impl std::fmt::Debug for FakeProvider {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FakeProvider").finish()
        }
    }

    impl FakeProvider {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Queue pages for one (api, operation) route.
        pub(crate) fn script(&self, api: &str, operation: &str, pages: Vec<Result<Value>>) {
            self.state
                .routes
                .lock()
                .unwrap()
                .insert((api.to_string(), operation.to_string()), pages.into_iter().collect());
        }

        /// Make `connect` against the given api fail with access denied.
        pub(crate) fn deny_api(&self, api: &str) {
            self.state.fail_connect.lock().unwrap().insert(api.to_string());
        }

        /// Number of list calls issued against one (api, operation) route.
        pub(crate) fn calls(&self, api: &str, operation: &str) -> usize {
            self.state
                .calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(a, o)| a == api && o == operation)
                .count()
        }

        /// API namespaces connected to, in order.
        pub(crate) fn connects(&self) -> Vec<String> {
            self.state.connects.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Connector for FakeProvider {
        async fn connect(&self, api_name: &str) -> Result<Box<dyn ApiConnection>> {
            if self.state.fail_connect.lock().unwrap().contains(api_name) {
                return Err(Error::access_denied(format!("no access to {api_name}")));
            }
            self.state.connects.lock().unwrap().push(api_name.to_string());
            Ok(Box::new(FakeConnection {
                state: self.state.clone(),
                api: api_name.to_string(),
            }))
        }
    }

    struct FakeConnection {
        state: Arc<ProviderState>,
        api: String,
    }

    #[async_trait]
    impl ApiConnection for FakeConnection {
        async fn list(&self, operation: &str, _next_token: Option<String>) -> Result<Value> {
            self.state
                .calls
                .lock()
                .unwrap()
                .push((self.api.clone(), operation.to_string()));
            self.state
                .routes
                .lock()
                .unwrap()
                .get_mut(&(self.api.clone(), operation.to_string()))
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    Err(Error::protocol(format!("unscripted operation {}/{operation}", self.api)))
                })
        }
    }
}
