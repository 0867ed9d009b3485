//! Logger construction and live replacement
//!
//! A [`Logger`] is built from the `Logs.Common` section of the configuration.
//! The process subscriber wraps the logger's layer in a
//! [`tracing_subscriber::reload`] layer so that a reloaded configuration can
//! swap level, format and output without reinstalling the subscriber.

use std::io::IsTerminal;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt, reload};

use crate::error::{Error, Result};
use crate::rotate::RotatingFile;

/// Type-erased layer installed behind the reload switch
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging settings from the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LogSettings {
    /// One of debug, info, warn, error, fatal, panic
    pub level: String,

    /// Log file prefix, used when `stdout` is false
    pub file: String,

    /// strftime format appended to the file prefix
    pub time_format: String,

    /// How long a log file is written before a new one is opened
    pub rotation_period: String,

    /// Maintain a symlink at the file prefix pointing at the current file
    pub symlink: bool,

    /// Emit JSON lines instead of plain text
    #[serde(rename = "JSON", alias = "Json")]
    pub json: bool,

    /// Log to stdout instead of a file
    pub stdout: bool,
}

/// Map a configured level name to a tracing level
///
/// `fatal` and `panic` have no tracing counterpart and map to `ERROR`.
pub fn parse_level(name: &str) -> Result<Level> {
    match name.to_ascii_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" | "fatal" | "panic" => Ok(Level::ERROR),
        _ => Err(Error::Config(format!("could not find log level {name}"))),
    }
}

#[derive(Debug, Clone)]
enum Sink {
    Stdout,
    Stderr,
    File(RotatingFile),
}

/// A logger derived from one `LogSettings` value
///
/// Handles are shared as `Arc<Logger>`; an unchanged settings section on reload
/// keeps the same handle.
#[derive(Debug)]
pub struct Logger {
    settings: LogSettings,
    level: Level,
    sink: Sink,
}

impl Logger {
    /// Build a logger, opening the log file if one is configured
    pub fn new(settings: Option<&LogSettings>) -> Result<Self> {
        let settings = settings
            .cloned()
            .ok_or_else(|| Error::Config("log configuration is empty".into()))?;
        let level = parse_level(&settings.level)?;

        let sink = if settings.stdout {
            Sink::Stdout
        } else if settings.file.is_empty() {
            Sink::Stderr
        } else {
            Sink::File(RotatingFile::open(
                &settings.file,
                &settings.time_format,
                &settings.rotation_period,
                settings.symlink,
            )?)
        };

        Ok(Self {
            settings,
            level,
            sink,
        })
    }

    /// Settings this logger was built from
    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    /// Maximum enabled level
    pub fn level(&self) -> Level {
        self.level
    }

    /// Path of the active log file, if logging to a file
    pub fn file_path(&self) -> Option<std::path::PathBuf> {
        match &self.sink {
            Sink::File(file) => Some(file.current_path()),
            _ => None,
        }
    }

    /// Build the subscriber layer for this logger
    ///
    /// `RUST_LOG` directives refine the configured level.
    pub fn layer(&self) -> BoxedLayer {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy();

        let (writer, ansi) = match &self.sink {
            Sink::Stdout => (
                BoxMakeWriter::new(std::io::stdout),
                std::io::stdout().is_terminal(),
            ),
            Sink::Stderr => (
                BoxMakeWriter::new(std::io::stderr),
                std::io::stderr().is_terminal(),
            ),
            Sink::File(file) => {
                let file = file.clone();
                (BoxMakeWriter::new(move || file.clone()), false)
            }
        };

        let output: BoxedLayer = if self.settings.json {
            fmt::layer().json().with_writer(writer).boxed()
        } else {
            fmt::layer().with_ansi(ansi).with_writer(writer).boxed()
        };

        filter.and_then(output).boxed()
    }
}

/// Switch that swaps the active logger layer in the live subscriber
pub struct LogSwitch {
    handle: reload::Handle<BoxedLayer, Registry>,
    // Keeps the layer alive when no global subscriber owns it.
    _detached: Option<reload::Layer<BoxedLayer, Registry>>,
}

impl LogSwitch {
    /// Install `logger` as the process-wide subscriber
    pub fn install(logger: &Logger) -> Result<Self> {
        let (layer, handle) = reload::Layer::new(logger.layer());
        tracing_subscriber::registry()
            .with(layer)
            .try_init()
            .map_err(|e| Error::Logging(e.to_string()))?;

        Ok(Self {
            handle,
            _detached: None,
        })
    }

    /// Create a switch that is not attached to any subscriber
    pub fn detached(logger: &Logger) -> Self {
        let (layer, handle) = reload::Layer::new(logger.layer());
        Self {
            handle,
            _detached: Some(layer),
        }
    }

    /// Replace the active layer with one built from `logger`
    pub fn apply(&self, logger: &Logger) -> Result<()> {
        self.handle
            .reload(logger.layer())
            .map_err(|e| Error::Logging(e.to_string()))
    }
}

impl std::fmt::Debug for LogSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSwitch")
            .field("detached", &self._detached.is_some())
            .finish()
    }
}
