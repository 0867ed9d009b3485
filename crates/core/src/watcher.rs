//! Configuration file watcher
//!
//! A [`ConfigWatcher`] observes one file and runs a callback once for every
//! write event, without debouncing. Two tasks cooperate:
//!
//! - the forwarder receives raw notify events, keeps write events and
//!   republishes them as signals; watch errors are logged as warnings
//! - the dispatcher receives signals and invokes the callback synchronously
//!
//! Both tasks live until the watcher is dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Callback invoked with the watched path after each write
pub type OnWrite = Arc<dyn Fn(&Path) + Send + Sync>;

/// Whether a notify event kind counts as a write to the file
pub fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

/// Watches a configuration file and triggers reloads
///
/// Must be started from within a tokio runtime.
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    forwarder: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Start watching `path`, calling `on_write` for each write event
    pub fn start<F>(path: impl Into<PathBuf>, on_write: F) -> Result<Self>
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        let path = path.into();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |event: notify::Result<Event>| {
                // Receiver gone means the watcher is shutting down.
                let _ = event_tx.send(event);
            },
            notify::Config::default(),
        )
        .map_err(|e| Error::Watch(format!("failed to create watcher: {e}")))?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watch(format!("failed to watch {}: {e}", path.display())))?;

        let (forwarder, dispatcher) = spawn_listeners(path.clone(), event_rx, Arc::new(on_write));

        info!(path = %path.display(), "Config watcher started");

        Ok(Self {
            path,
            _watcher: watcher,
            forwarder,
            dispatcher,
        })
    }

    /// Path being watched
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop watching and release the OS watch
    pub fn close(self) {
        debug!(path = %self.path.display(), "Closing config watcher");
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.forwarder.abort();
        self.dispatcher.abort();
    }
}

/// Spawn the forwarder and dispatcher tasks over a raw event stream
pub fn spawn_listeners(
    path: PathBuf,
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    on_write: OnWrite,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let (write_tx, mut write_rx) = mpsc::unbounded_channel::<()>();

    let forwarder = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                Ok(event) if is_write(&event.kind) => {
                    if write_tx.send(()).is_err() {
                        break;
                    }
                }
                Ok(event) => debug!(kind = ?event.kind, "Ignoring config file event"),
                Err(e) => warn!(error = %e, "Config file watch error"),
            }
        }
    });

    let dispatcher = tokio::spawn(async move {
        while write_rx.recv().await.is_some() {
            on_write(&path);
        }
    });

    (forwarder, dispatcher)
}
