//! Time-based log file rotation
//!
//! Log lines go to `<prefix><timestamp>`, where the timestamp is the current
//! local time rendered with a strftime format. A new file is opened once the
//! rotation period has elapsed since the current one was opened. On Unix an
//! optional symlink at `<prefix>` always points at the current file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use jiff::fmt::strtime;
use jiff::{SignedDuration, Zoned};

use crate::error::{Error, Result};

/// Parse a rotation period such as `1h`, `24h` or `30m`
///
/// An empty string disables rotation.
pub fn parse_period(raw: &str) -> Result<Option<Duration>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let period: SignedDuration = raw
        .parse()
        .map_err(|e| Error::Config(format!("invalid rotation period {raw:?}: {e}")))?;

    if !period.is_positive() {
        return Err(Error::Config(format!(
            "rotation period must be positive, got {raw:?}"
        )));
    }

    Ok(Some(period.unsigned_abs()))
}

/// Shared handle to a rotating log file
///
/// Cloning is cheap; all clones write to the same file.
#[derive(Clone, Debug)]
pub struct RotatingFile {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    prefix: PathBuf,
    time_format: String,
    period: Option<Duration>,
    symlink: bool,
    file: File,
    current: PathBuf,
    opened_at: Instant,
}

impl RotatingFile {
    /// Open the first log file
    pub fn open(
        prefix: impl Into<PathBuf>,
        time_format: &str,
        rotation_period: &str,
        symlink: bool,
    ) -> Result<Self> {
        let prefix = prefix.into();
        let period = parse_period(rotation_period)?;

        let current = file_name(&prefix, time_format)?;
        let file = open_append(&current)?;
        let inner = Inner {
            prefix,
            time_format: time_format.to_string(),
            period,
            symlink,
            file,
            current,
            opened_at: Instant::now(),
        };
        inner.update_symlink()?;

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        match self.inner.lock() {
            Ok(inner) => inner.current.clone(),
            Err(poisoned) => poisoned.into_inner().current.clone(),
        }
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))
    }
}

impl Inner {
    fn rotate_if_due(&mut self) -> io::Result<()> {
        let Some(period) = self.period else {
            return Ok(());
        };
        if self.opened_at.elapsed() < period {
            return Ok(());
        }

        let next = file_name(&self.prefix, &self.time_format).map_err(io::Error::other)?;
        self.file.flush()?;
        self.file = open_append(&next)?;
        self.current = next;
        self.opened_at = Instant::now();
        self.update_symlink()
    }

    #[cfg(unix)]
    fn update_symlink(&self) -> io::Result<()> {
        if !self.symlink || self.current == self.prefix {
            return Ok(());
        }
        match std::fs::remove_file(&self.prefix) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        std::os::unix::fs::symlink(&self.current, &self.prefix)
    }

    #[cfg(not(unix))]
    fn update_symlink(&self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock()?;
        inner.rotate_if_due()?;
        inner.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.file.flush()
    }
}

fn file_name(prefix: &Path, time_format: &str) -> Result<PathBuf> {
    if time_format.is_empty() {
        return Ok(prefix.to_path_buf());
    }
    let stamp = strtime::format(time_format, &Zoned::now())
        .map_err(|e| Error::Config(format!("invalid log time format {time_format:?}: {e}")))?;

    let mut name = prefix.as_os_str().to_os_string();
    name.push(stamp);
    Ok(PathBuf::from(name))
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}
