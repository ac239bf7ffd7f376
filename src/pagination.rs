//! Exhaustive pagination and usage aggregation.
//!
//! Every resource-family count follows the same shape: issue the first list
//! query, accumulate the page's items, and keep querying while the response
//! carries a continuation token. Token presence is the sole loop-termination
//! signal — an empty page with a token continues, and only a token-less page
//! ends the loop. At least one query is always issued, so a family with zero
//! resources still produces a committable count of zero.
//!
//! A failure on any page propagates immediately and discards all progress;
//! the caller never commits a partial count.

use serde_json::Value;
use tracing::trace;

use crate::provider::{next_token, page_items, ApiConnection};
use crate::types::Result;

/// Count items across every page of a list operation.
pub async fn count_items(
    conn: &dyn ApiConnection,
    operation: &str,
    items_field: &str,
) -> Result<u64> {
    let mut count: u64 = 0;
    let mut token: Option<String> = None;
    loop {
        let page = conn.list(operation, token.take()).await?;
        let items = page_items(&page, operation, items_field)?;
        count += items.len() as u64;
        trace!(operation, page_items = items.len(), total = count, "counted page");
        token = next_token(&page);
        if token.is_none() {
            break;
        }
    }
    Ok(count)
}

/// Collect the items of every page of a list operation.
///
/// Used where per-item inspection is required: building cross-reference
/// lookups, or filtering by an item state predicate.
pub async fn collect_items(
    conn: &dyn ApiConnection,
    operation: &str,
    items_field: &str,
) -> Result<Vec<Value>> {
    let mut items: Vec<Value> = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = conn.list(operation, token.take()).await?;
        let page_slice = page_items(&page, operation, items_field)?;
        items.extend_from_slice(page_slice);
        token = next_token(&page);
        if token.is_none() {
            break;
        }
    }
    Ok(items)
}

// =============================================================================
// Tests
// =============================================================================
