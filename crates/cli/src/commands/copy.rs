//! copy step - Server-side copy between buckets
//!
//! After the copy request returns, waits until the target is visible.

use std::fmt;
use std::time::Duration;

use bkt_core::{ObjectRef, ObjectStore, Result};
use serde::Serialize;

/// Upper bound on waiting for the copied object (20 polls of 5 seconds)
pub const COPY_WAIT: Duration = Duration::from_secs(100);

#[derive(Debug, Clone, Serialize)]
pub struct CopyOutput {
    pub status: &'static str,
    pub source: ObjectRef,
    pub target: ObjectRef,
    pub size_bytes: i64,
}

impl fmt::Display for CopyOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Item {:?} successfully copied from bucket {:?} to bucket {:?} as {:?}",
            self.source.key, self.source.bucket, self.target.bucket, self.target.key
        )
    }
}

/// Randomized key for the copy of `key`
pub fn copy_name(key: &str) -> String {
    format!("copy{}-{key}", rand::random::<u32>())
}

/// Copy `source` to `target` and wait for the target to exist
pub async fn copy_between_buckets(
    store: &dyn ObjectStore,
    source: &ObjectRef,
    target: &ObjectRef,
) -> Result<CopyOutput> {
    store.copy_object(source, target).await?;
    tracing::debug!(%source, %target, "Copy requested, waiting for target");

    let info = store.wait_until_exists(target, COPY_WAIT).await?;

    Ok(CopyOutput {
        status: "success",
        source: source.clone(),
        target: target.clone(),
        size_bytes: info.size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::memory::MemoryStore;
    use bkt_core::Error;

    #[test]
    fn test_copy_name() {
        let name = copy_name("testFile1.txt");
        assert!(name.starts_with("copy"));
        assert!(name.ends_with("-testFile1.txt"));
    }

    #[tokio::test]
    async fn test_copy_then_list_shows_same_size() {
        let store = MemoryStore::new(&["first", "second"]);
        store.insert("first", "report.csv", b"a,b,c\n1,2,3\n");

        let source = ObjectRef::new("first", "report.csv");
        let target = ObjectRef::new("second", copy_name("report.csv"));
        let output = copy_between_buckets(&store, &source, &target)
            .await
            .unwrap();
        assert_eq!(output.size_bytes, 12);

        let page = store.list_objects("second", None).await.unwrap();
        let copied = page
            .items
            .iter()
            .find(|item| item.key == target.key)
            .unwrap();
        let original = store.head_object(&source).await.unwrap();
        assert_eq!(copied.size_bytes, original.size_bytes);
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let store = MemoryStore::new(&["first", "second"]);
        let result = copy_between_buckets(
            &store,
            &ObjectRef::new("first", "ghost"),
            &ObjectRef::new("second", "copy"),
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(store.count("second"), 0);
    }

    #[tokio::test]
    async fn test_copy_wait_timeout_is_error() {
        let store = MemoryStore::new(&["first", "second"]).with_invisible_copies();
        store.insert("first", "k", b"v");
        let result = copy_between_buckets(
            &store,
            &ObjectRef::new("first", "k"),
            &ObjectRef::new("second", "k2"),
        )
        .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
