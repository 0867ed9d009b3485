//! download step - Stream an object to a local file

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use bkt_core::{ObjectRef, ObjectStore, Result};
use serde::Serialize;
use tokio::io::{AsyncWrite, BufWriter};

use crate::output::{OutputConfig, ProgressBar};

#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutput {
    pub status: &'static str,
    pub source: ObjectRef,
    pub target: PathBuf,
    pub size_bytes: u64,
}

impl fmt::Display for DownloadOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downloaded {} {} bytes",
            self.target.display(),
            self.size_bytes
        )
    }
}

/// Randomized local file name for a downloaded key
pub fn download_name(key: &str) -> String {
    let base = key.rsplit('/').next().unwrap_or(key);
    format!("download{}-{base}", rand::random::<u32>())
}

/// Stream `source` into a newly created file at `target`
pub async fn download_file(
    store: &dyn ObjectStore,
    source: &ObjectRef,
    target: &Path,
    output: &OutputConfig,
) -> Result<DownloadOutput> {
    let file = tokio::fs::File::create(target).await?;

    let spinner = ProgressBar::spinner(output, &format!("Downloading {source}"));
    let mut writer = CountingWriter {
        inner: BufWriter::new(file),
        progress: &spinner,
    };
    let result = store.download_object(source, &mut writer).await;
    spinner.finish_and_clear();
    let size_bytes = result?;

    Ok(DownloadOutput {
        status: "success",
        source: source.clone(),
        target: target.to_path_buf(),
        size_bytes,
    })
}

/// Forwards writes and reports written bytes to the spinner
struct CountingWriter<'a, W> {
    inner: W,
    progress: &'a ProgressBar,
}

impl<W: AsyncWrite + Unpin> AsyncWrite for CountingWriter<'_, W> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &poll {
            self.progress.inc(*n as u64);
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
