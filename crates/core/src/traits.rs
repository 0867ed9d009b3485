//! ObjectStore trait definition
//!
//! This trait defines the storage operations the run sequence needs.
//! It allows the CLI to be decoupled from the specific S3 SDK implementation.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;

use crate::error::Result;

/// Largest number of keys accepted by one batch delete request
pub const MAX_DELETE_BATCH: usize = 1000;

/// A fully qualified object location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Renders as `bucket/key`, the form used as a copy source
impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Metadata for an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: i64,

    /// Human-readable size
    pub size_human: String,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Storage class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object of the given size
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: size,
            size_human: humansize::format_size(size.max(0) as u64, humansize::BINARY),
            last_modified: None,
            etag: None,
            storage_class: None,
            content_type: None,
        }
    }
}

/// Metadata for a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
}

/// One page of a list operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResult {
    /// Listed objects
    pub items: Vec<ObjectInfo>,

    /// Whether the result is truncated (more items available)
    pub truncated: bool,

    /// Continuation token for the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Canned ACL applied on upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CannedAcl {
    #[default]
    Private,
    PublicRead,
}

impl CannedAcl {
    pub const fn as_str(self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
        }
    }
}

/// Options for a single-request upload
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub acl: CannedAcl,
    /// Request AES256 server-side encryption
    pub encrypt: bool,
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and by in-memory stores in tests.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` as one object
    async fn put_object(
        &self,
        target: &ObjectRef,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<ObjectInfo>;

    /// List buckets of the account
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;

    /// List one page of objects in a bucket
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ListResult>;

    /// Get object metadata
    async fn head_object(&self, object: &ObjectRef) -> Result<ObjectInfo>;

    /// Stream object content into `dst`, returning the number of bytes written
    async fn download_object(
        &self,
        object: &ObjectRef,
        dst: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;

    /// Server-side copy
    async fn copy_object(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()>;

    /// Block until `object` exists, giving up after `max_wait`
    async fn wait_until_exists(&self, object: &ObjectRef, max_wait: Duration)
    -> Result<ObjectInfo>;

    /// Delete up to [`MAX_DELETE_BATCH`] keys with one request
    ///
    /// Returns the deleted keys; any per-key failure is an error.
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<Vec<String>>;
}
