//! In-memory ObjectStore for step tests

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bkt_core::{
    BucketInfo, Error, ListResult, ObjectInfo, ObjectRef, ObjectStore, PutOptions, Result,
};
use jiff::Timestamp;
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone)]
struct Stored {
    data: Vec<u8>,
    content_type: Option<String>,
    modified: Timestamp,
}

#[derive(Debug)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, Stored>>>,
    puts: Mutex<Vec<PutOptions>>,
    page_size: usize,
    fail_delete_call: Option<usize>,
    delete_calls: AtomicUsize,
    invisible_copies: bool,
}

impl MemoryStore {
    pub fn new(buckets: &[&str]) -> Self {
        let buckets = buckets
            .iter()
            .map(|name| (name.to_string(), BTreeMap::new()))
            .collect();
        Self {
            buckets: Mutex::new(buckets),
            puts: Mutex::new(Vec::new()),
            page_size: 1000,
            fail_delete_call: None,
            delete_calls: AtomicUsize::new(0),
            invisible_copies: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Make the nth delete_objects call (1-based) fail
    pub fn fail_on_delete_call(mut self, call: usize) -> Self {
        self.fail_delete_call = Some(call);
        self
    }

    /// Copies succeed but never become visible
    pub fn with_invisible_copies(mut self) -> Self {
        self.invisible_copies = true;
        self
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        let mut buckets = self.buckets.lock().unwrap();
        buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            Stored {
                data: data.to_vec(),
                content_type: None,
                modified: Timestamp::now(),
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        let buckets = self.buckets.lock().unwrap();
        buckets.get(bucket)?.get(key).map(|s| s.data.clone())
    }

    pub fn count(&self, bucket: &str) -> usize {
        let buckets = self.buckets.lock().unwrap();
        buckets.get(bucket).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn last_put_options(&self) -> Option<PutOptions> {
        self.puts.lock().unwrap().last().cloned()
    }

    fn stored(&self, object: &ObjectRef) -> Result<Stored> {
        let buckets = self.buckets.lock().unwrap();
        let bucket = buckets
            .get(&object.bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket {}", object.bucket)))?;
        bucket
            .get(&object.key)
            .cloned()
            .ok_or_else(|| Error::NotFound(object.to_string()))
    }

    fn info(key: &str, stored: &Stored) -> ObjectInfo {
        let mut info = ObjectInfo::new(key, stored.data.len() as i64);
        info.last_modified = Some(stored.modified);
        info.content_type = stored.content_type.clone();
        info.storage_class = Some("STANDARD".to_string());
        info
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        target: &ObjectRef,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<ObjectInfo> {
        let stored = Stored {
            data,
            content_type: options.content_type.clone(),
            modified: Timestamp::now(),
        };
        let info = Self::info(&target.key, &stored);

        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets
            .get_mut(&target.bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket {}", target.bucket)))?;
        bucket.insert(target.key.clone(), stored);
        self.puts.lock().unwrap().push(options.clone());

        Ok(info)
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let buckets = self.buckets.lock().unwrap();
        Ok(buckets
            .keys()
            .map(|name| BucketInfo {
                name: name.clone(),
                created: Some(Timestamp::UNIX_EPOCH),
            })
            .collect())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ListResult> {
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket {bucket}")))?;

        let mut remaining = objects
            .iter()
            .filter(|(key, _)| continuation_token.as_ref().is_none_or(|token| *key > token));
        let items: Vec<ObjectInfo> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(key, stored)| Self::info(key, stored))
            .collect();
        let truncated = remaining.next().is_some();

        Ok(ListResult {
            continuation_token: if truncated {
                items.last().map(|item| item.key.clone())
            } else {
                None
            },
            items,
            truncated,
        })
    }

    async fn head_object(&self, object: &ObjectRef) -> Result<ObjectInfo> {
        let stored = self.stored(object)?;
        Ok(Self::info(&object.key, &stored))
    }

    async fn download_object(
        &self,
        object: &ObjectRef,
        dst: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let stored = self.stored(object)?;
        dst.write_all(&stored.data).await?;
        dst.flush().await?;
        Ok(stored.data.len() as u64)
    }

    async fn copy_object(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()> {
        let stored = self.stored(src)?;
        if self.invisible_copies {
            return Ok(());
        }

        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets
            .get_mut(&dst.bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket {}", dst.bucket)))?;
        bucket.insert(dst.key.clone(), stored);
        Ok(())
    }

    async fn wait_until_exists(
        &self,
        object: &ObjectRef,
        max_wait: Duration,
    ) -> Result<ObjectInfo> {
        self.head_object(object).await.map_err(|_| {
            Error::Timeout(format!("{object} not visible after {}s", max_wait.as_secs()))
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<Vec<String>> {
        let call = self.delete_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_delete_call == Some(call) {
            return Err(Error::Network(format!("injected failure on delete call {call}")));
        }

        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NotFound(format!("bucket {bucket}")))?;
        Ok(keys
            .into_iter()
            .filter(|key| objects.remove(key).is_some())
            .collect())
    }
}
