//! Batch removal of items.
//!
//! Every id is looked up concurrently, the lookups are joined, and the batch is
//! authorized as a whole before one multi-row delete runs. A batch either goes
//! away entirely or not at all.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::Claims;
use crate::database::models::{owners_of, Item};
use crate::database::{ItemStore, StoreError};
use crate::error::ApiError;

/// Outcome of looking up one requested id
#[derive(Debug)]
pub struct BulkRetrieval {
    pub id: i64,
    pub result: Result<Item, StoreError>,
}

#[derive(Debug, Error)]
pub enum BulkDeleteError {
    #[error("Some or all of the items could not be retrieved")]
    NotFound,

    #[error("Not authorized to delete some or all of the items")]
    Forbidden,

    #[error("{0}")]
    Storage(#[source] StoreError),
}

impl From<BulkDeleteError> for ApiError {
    fn from(err: BulkDeleteError) -> Self {
        let text = err.to_string();
        match err {
            BulkDeleteError::NotFound => ApiError::not_found(-1, text),
            BulkDeleteError::Forbidden => ApiError::forbidden(-2, text),
            BulkDeleteError::Storage(e) => ApiError::storage(-3, "Unable to delete the items.", e),
        }
    }
}

/// Fetch every id concurrently. One entry per requested id, including duplicates.
pub async fn retrieve_items<S>(store: &Arc<S>, ids: &[i64]) -> Vec<BulkRetrieval>
where
    S: ItemStore + ?Sized,
{
    let lookups = ids.iter().map(|&id| {
        let store = Arc::clone(store);
        async move {
            BulkRetrieval {
                id,
                result: store.item_by_id(id).await,
            }
        }
    });
    join_all(lookups).await
}

/// Delete a batch of items on behalf of `claims`, returning the number removed.
pub async fn bulk_delete<S>(store: &Arc<S>, claims: &Claims, ids: &[i64]) -> Result<u64, BulkDeleteError>
where
    S: ItemStore + ?Sized,
{
    if ids.is_empty() {
        return Ok(0);
    }

    let retrieved = retrieve_items(store, ids).await;

    // Any failed lookup, not only a missing row, fails the batch as not found.
    let mut items = Vec::with_capacity(retrieved.len());
    let mut failed = false;
    for BulkRetrieval { id, result } in retrieved {
        match result {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Bulk delete lookup of item {} failed: {}", id, e);
                failed = true;
            }
        }
    }
    if failed {
        return Err(BulkDeleteError::NotFound);
    }

    let owners = owners_of(&items);
    if owners != vec![claims.user_id] {
        warn!(
            "User {} denied bulk delete of items owned by {:?}",
            claims.user_id, owners
        );
        return Err(BulkDeleteError::Forbidden);
    }

    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.id));

    let removed = store.delete_items(&items).await.map_err(BulkDeleteError::Storage)?;
    debug!("User {} bulk deleted {} items", claims.user_id, removed);
    Ok(removed)
}
