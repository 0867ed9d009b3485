//! ls steps - List buckets and objects
//!
//! Object listing reads the first page only.

use std::fmt;

use bkt_core::{BucketInfo, ObjectInfo, ObjectStore, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BucketsOutput {
    pub buckets: Vec<BucketInfo>,
}

impl fmt::Display for BucketsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buckets:")?;
        for bucket in &self.buckets {
            let created = bucket
                .created
                .map(|ts| ts.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            write!(f, "\n* {} created on {created}", bucket.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectsOutput {
    pub bucket: String,
    pub items: Vec<ObjectInfo>,
    pub truncated: bool,
}

impl fmt::Display for ObjectsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Objects in {}:", self.bucket)?;
        for item in &self.items {
            let modified = item
                .last_modified
                .map(|ts| ts.to_string())
                .unwrap_or_default();
            write!(f, "\nName:          {}", item.key)?;
            write!(f, "\nLast modified: {modified}")?;
            write!(f, "\nSize:          {} ({})", item.size_bytes, item.size_human)?;
            write!(
                f,
                "\nStorage class: {}\n",
                item.storage_class.as_deref().unwrap_or("STANDARD")
            )?;
        }
        if self.truncated {
            write!(f, "\n(more objects not shown)")?;
        }
        Ok(())
    }
}

/// List all buckets of the account
pub async fn list_buckets(store: &dyn ObjectStore) -> Result<BucketsOutput> {
    let buckets = store.list_buckets().await?;
    Ok(BucketsOutput { buckets })
}

/// List the first page of objects in `bucket`
pub async fn list_objects(store: &dyn ObjectStore, bucket: &str) -> Result<ObjectsOutput> {
    let page = store.list_objects(bucket, None).await?;
    Ok(ObjectsOutput {
        bucket: bucket.to_string(),
        items: page.items,
        truncated: page.truncated,
    })
}
