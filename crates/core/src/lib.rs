//! bkt-core: Core library for the bkt S3 runner
//!
//! This crate provides the core functionality for bkt, including:
//! - Configuration loading
//! - Logger construction, file rotation and live replacement
//! - Config file watching and reload
//! - ObjectStore trait for S3 operations
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing against in-memory stores.

pub mod config;
pub mod error;
pub mod logging;
pub mod reload;
pub mod rotate;
pub mod traits;
pub mod watcher;

pub use config::{Config, ConfigManager, DEFAULT_CONFIG_PATH, Logs, StorageSettings};
pub use error::{Error, Result};
pub use logging::{LogSettings, LogSwitch, Logger};
pub use reload::{ConfigStore, ReloadOutcome};
pub use traits::{
    BucketInfo, CannedAcl, ListResult, MAX_DELETE_BATCH, ObjectInfo, ObjectRef, ObjectStore,
    PutOptions,
};
pub use watcher::ConfigWatcher;
