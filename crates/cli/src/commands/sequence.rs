//! The fixed run sequence
//!
//! upload -> list buckets -> list objects -> download -> copy -> purge.
//! Every step works from the same config snapshot, and the first failing
//! step ends the run.

use std::fmt;
use std::path::PathBuf;

use bkt_core::{Config, Error, ObjectRef, ObjectStore};

use super::copy::{CopyOutput, copy_between_buckets, copy_name};
use super::download::{DownloadOutput, download_file, download_name};
use super::ls::{list_buckets, list_objects};
use super::purge::{PurgeOutput, delete_all};
use super::upload::{UploadOutput, upload_file};
use crate::output::Formatter;

/// Local inputs of a run
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// File uploaded in the first step
    pub upload_file: PathBuf,
    /// Directory receiving the downloaded copy
    pub download_dir: PathBuf,
}

/// Results of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub upload: UploadOutput,
    pub download: DownloadOutput,
    pub copy: CopyOutput,
    pub purged: Vec<PurgeOutput>,
}

/// The step that stopped a run and why
#[derive(Debug)]
pub struct StepFailure {
    pub step: &'static str,
    pub error: Error,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to {}: {}", self.step, self.error)
    }
}

impl std::error::Error for StepFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

trait StepContext<T> {
    fn step(self, step: &'static str) -> Result<T, StepFailure>;
}

impl<T> StepContext<T> for bkt_core::Result<T> {
    fn step(self, step: &'static str) -> Result<T, StepFailure> {
        self.map_err(|error| StepFailure { step, error })
    }
}

fn require_bucket<'a>(name: &'a str, field: &str) -> Result<&'a str, StepFailure> {
    if name.is_empty() {
        return Err(StepFailure {
            step: "start run",
            error: Error::Config(format!("{field} is not set")),
        });
    }
    Ok(name)
}

/// Run every step once against `store`
pub async fn run(
    store: &dyn ObjectStore,
    config: &Config,
    plan: &RunPlan,
    formatter: &Formatter,
) -> Result<RunReport, StepFailure> {
    let bucket = require_bucket(&config.s3_bucket, "S3Bucket")?;
    let bucket2 = require_bucket(&config.s3_bucket2, "S3Bucket2")?;

    tracing::info!(bucket, bucket2, file = %plan.upload_file.display(), "Starting run");

    let upload = upload_file(store, &plan.upload_file, bucket)
        .await
        .step("upload file")?;
    formatter.output(&upload);

    let buckets = list_buckets(store).await.step("list buckets")?;
    formatter.output(&buckets);

    let objects = list_objects(store, bucket).await.step("list objects")?;
    formatter.output(&objects);

    let target = plan.download_dir.join(download_name(&upload.target.key));
    let download = download_file(store, &upload.target, &target, formatter.config())
        .await
        .step("download item")?;
    formatter.output(&download);

    let copy_target = ObjectRef::new(bucket2, copy_name(&upload.target.key));
    let copy = copy_between_buckets(store, &upload.target, &copy_target)
        .await
        .step("copy item")?;
    formatter.output(&copy);

    let mut purged = Vec::with_capacity(2);
    for name in [bucket2, bucket] {
        let output = delete_all(store, name)
            .await
            .step("delete objects from bucket")?;
        formatter.output(&output);
        purged.push(output);
    }

    tracing::info!("Run finished");
    Ok(RunReport {
        upload,
        download,
        copy,
        purged,
    })
}
