//! purge step - Delete every object in a bucket
//!
//! Walks all listing pages and deletes each page with batch requests.
//! Nothing is transactional: a failure stops the walk and leaves the
//! remaining objects in place.

use std::fmt;

use bkt_core::{MAX_DELETE_BATCH, ObjectStore, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PurgeOutput {
    pub bucket: String,
    pub deleted: usize,
}

impl fmt::Display for PurgeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Deleted {} object(s) from bucket: {}",
            self.deleted, self.bucket
        )
    }
}

/// Delete all objects in `bucket`
pub async fn delete_all(store: &dyn ObjectStore, bucket: &str) -> Result<PurgeOutput> {
    let mut deleted = 0;
    let mut continuation_token = None;

    loop {
        let page = store.list_objects(bucket, continuation_token.take()).await?;
        let keys: Vec<String> = page.items.into_iter().map(|item| item.key).collect();

        for batch in keys.chunks(MAX_DELETE_BATCH) {
            deleted += store.delete_objects(bucket, batch.to_vec()).await?.len();
            tracing::debug!(bucket, deleted, "Deleted batch");
        }

        match page.continuation_token {
            Some(token) if page.truncated => continuation_token = Some(token),
            _ => break,
        }
    }

    Ok(PurgeOutput {
        bucket: bucket.to_string(),
        deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::memory::MemoryStore;
    use bkt_core::Error;

    fn filled_store(count: usize) -> MemoryStore {
        let store = MemoryStore::new(&["bucket"]).with_page_size(2);
        for n in 0..count {
            store.insert("bucket", &format!("key-{n:02}"), b"data");
        }
        store
    }

    #[tokio::test]
    async fn test_delete_all_empties_bucket() {
        let store = filled_store(5);
        let output = delete_all(&store, "bucket").await.unwrap();

        assert_eq!(output.deleted, 5);
        assert_eq!(store.count("bucket"), 0);
        assert_eq!(output.to_string(), "Deleted 5 object(s) from bucket: bucket");
    }

    #[tokio::test]
    async fn test_delete_all_on_empty_bucket() {
        let store = filled_store(0);
        let output = delete_all(&store, "bucket").await.unwrap();
        assert_eq!(output.deleted, 0);
    }

    #[tokio::test]
    async fn test_failure_mid_way_is_not_atomic() {
        let store = filled_store(5).fail_on_delete_call(2);

        let result = delete_all(&store, "bucket").await;

        assert!(matches!(result, Err(Error::Network(_))));
        let remaining = store.count("bucket");
        assert!(remaining > 0, "failed batch must leave objects behind");
        assert!(remaining < 5, "earlier batches stay deleted");
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let store = MemoryStore::new(&[]);
        assert!(matches!(
            delete_all(&store, "ghost").await,
            Err(Error::NotFound(_))
        ));
    }
}
