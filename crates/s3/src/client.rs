//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from bkt-core.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::client::Waiters;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectCannedAcl, ObjectIdentifier, ServerSideEncryption};
use aws_smithy_types::retry::RetryConfig;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use bkt_core::{
    BucketInfo, Error, ListResult, ObjectInfo, ObjectRef, ObjectStore, PutOptions, Result,
    StorageSettings,
};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from the storage settings
    ///
    /// Credentials come from the default AWS provider chain.
    pub async fn new(settings: &StorageSettings) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()))
            .retry_config(retry_config(settings.retries));

        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;

        // Custom endpoints are usually S3-compatible servers without virtual-host routing
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(settings.endpoint.is_some())
            .build();

        tracing::debug!(
            region = %settings.region,
            endpoint = settings.endpoint.as_deref().unwrap_or("default"),
            "S3 client created"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

/// SDK retry policy for the configured retry count
///
/// The count is the number of retries after the first attempt.
pub fn retry_config(retries: u32) -> RetryConfig {
    RetryConfig::standard().with_max_attempts(retries.saturating_add(1))
}

/// Map an SDK error to a bkt error by its S3 error code
fn map_sdk_error<E, R>(err: SdkError<E, R>, context: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = format!("{context}: {}", DisplayErrorContext(&err));
    classify(code.as_deref(), message)
}

fn classify(code: Option<&str>, message: String) -> Error {
    match code {
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => Error::NotFound(message),
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch") => {
            Error::Auth(message)
        }
        _ => Error::Network(message),
    }
}

fn to_timestamp(value: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(value.secs(), value.subsec_nanos() as i32).ok()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(
        &self,
        target: &ObjectRef,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<ObjectInfo> {
        let size = data.len() as i64;

        let mut request = self
            .inner
            .put_object()
            .bucket(&target.bucket)
            .key(&target.key)
            .acl(ObjectCannedAcl::from(options.acl.as_str()))
            .content_length(size)
            .body(ByteStream::from(data));

        if let Some(ct) = &options.content_type {
            request = request.content_type(ct);
        }

        if let Some(cd) = &options.content_disposition {
            request = request.content_disposition(cd);
        }

        if options.encrypt {
            request = request.server_side_encryption(ServerSideEncryption::Aes256);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("put {target}")))?;

        let mut info = ObjectInfo::new(&target.key, size);
        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }
        info.content_type = options.content_type.clone();
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "list buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| BucketInfo {
                name: b.name().unwrap_or_default().to_string(),
                created: b.creation_date().and_then(to_timestamp),
            })
            .collect();

        Ok(buckets)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ListResult> {
        let response = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("list objects in {bucket}")))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let mut info =
                    ObjectInfo::new(object.key().unwrap_or_default(), object.size().unwrap_or(0));
                info.last_modified = object.last_modified().and_then(to_timestamp);
                info.etag = object.e_tag().map(|e| e.trim_matches('"').to_string());
                info.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
                info
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn head_object(&self, object: &ObjectRef) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("head {object}")))?;

        let mut info = ObjectInfo::new(&object.key, response.content_length().unwrap_or(0));
        info.last_modified = response.last_modified().and_then(to_timestamp);
        info.etag = response.e_tag().map(|e| e.trim_matches('"').to_string());
        info.content_type = response.content_type().map(|ct| ct.to_string());
        info.storage_class = response.storage_class().map(|sc| sc.as_str().to_string());

        Ok(info)
    }

    async fn download_object(
        &self,
        object: &ObjectRef,
        dst: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let mut response = self
            .inner
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("get {object}")))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .body
            .try_next()
            .await
            .map_err(|e| Error::Network(format!("read {object}: {e}")))?
        {
            dst.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        dst.flush().await?;

        Ok(written)
    }

    async fn copy_object(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(src.to_string())
            .bucket(&dst.bucket)
            .key(&dst.key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("copy {src} to {dst}")))?;

        Ok(())
    }

    async fn wait_until_exists(
        &self,
        object: &ObjectRef,
        max_wait: Duration,
    ) -> Result<ObjectInfo> {
        self.inner
            .wait_until_object_exists()
            .bucket(&object.bucket)
            .key(&object.key)
            .wait(max_wait)
            .await
            .map_err(|e| {
                Error::Timeout(format!(
                    "waiting for {object} to exist: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        self.head_object(object).await
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Ok(vec![]);
        }

        let objects = keys
            .iter()
            .map(|k| ObjectIdentifier::builder().key(k).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::General(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("delete objects in {bucket}")))?;

        let deleted: Vec<String> = response
            .deleted()
            .iter()
            .filter_map(|d| d.key().map(|k| k.to_string()))
            .collect();

        if !response.errors().is_empty() {
            let failed: Vec<String> = response
                .errors()
                .iter()
                .map(|e| {
                    format!(
                        "{} ({})",
                        e.key().unwrap_or_default(),
                        e.code().unwrap_or("unknown")
                    )
                })
                .collect();
            tracing::warn!(
                bucket,
                deleted = deleted.len(),
                failed = failed.len(),
                "Batch delete incomplete"
            );
            return Err(Error::PartialDelete {
                bucket: bucket.to_string(),
                failed,
            });
        }

        Ok(deleted)
    }
}
