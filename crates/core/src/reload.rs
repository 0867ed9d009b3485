//! Live configuration store
//!
//! Holds the current [`Config`] and [`Logger`] behind atomic pointer swaps.
//! Readers take cheap snapshots; a reload replaces the whole configuration,
//! and rebuilds the logger only when its settings changed.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::config::{Config, ConfigManager};
use crate::error::Result;
use crate::logging::{LogSwitch, Logger};

/// What a successful reload changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub logger_rebuilt: bool,
}

/// Process configuration shared between the watcher and the run sequence
#[derive(Debug)]
pub struct ConfigStore {
    manager: ConfigManager,
    config: ArcSwap<Config>,
    logger: ArcSwap<Logger>,
    switch: LogSwitch,
}

impl ConfigStore {
    pub fn new(
        manager: ConfigManager,
        config: Config,
        logger: Arc<Logger>,
        switch: LogSwitch,
    ) -> Self {
        Self {
            manager,
            config: ArcSwap::from_pointee(config),
            logger: ArcSwap::new(logger),
            switch,
        }
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Handle to the current logger
    pub fn logger(&self) -> Arc<Logger> {
        self.logger.load_full()
    }

    /// Path of the configuration file
    pub fn path(&self) -> &std::path::Path {
        self.manager.config_path()
    }

    /// Re-read the configuration file and swap it in
    ///
    /// On error the current configuration and logger stay in place.
    pub fn reload(&self) -> Result<ReloadOutcome> {
        info!("Reloading config...");

        let next = self.manager.load()?;
        let current = self.config.load();

        let logger_rebuilt = current.logs.common != next.logs.common;
        if logger_rebuilt {
            let logger = Arc::new(Logger::new(next.logs.common.as_ref())?);
            self.switch.apply(&logger)?;
            self.logger.store(logger);
        }

        self.config.store(Arc::new(next));

        info!(logger_rebuilt, "Reload config finished!");
        Ok(ReloadOutcome { logger_rebuilt })
    }
}
