//! Logging setup for introshim
//!
//! The shim only emits `tracing` events under the `introshim_core::*`
//! targets. A subscriber is installed by whoever loads the shim, either by
//! calling [`init_logging`] or with `init_logging = true` in the shim config.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// The `[logging]` table of the shim config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base level, overridden by `RUST_LOG`
    pub level: String,

    /// Extra `EnvFilter` directives, e.g. `introshim_core::synth=trace`
    pub directives: Vec<String>,

    /// Write to stderr
    pub console: bool,

    /// Also append to this file
    pub file: Option<PathBuf>,

    pub timestamps: bool,
    pub targets: bool,
    pub ansi: bool,

    /// Include source file and line
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            console: true,
            file: None,
            timestamps: true,
            targets: true,
            ansi: true,
            source_location: false,
        }
    }
}

impl LogConfig {
    /// Everything the shim does during negotiation, with source locations
    pub fn debug() -> Self {
        Self {
            level: "debug".to_string(),
            directives: vec!["introshim_core::synth=trace".to_string()],
            source_location: true,
            ..Self::default()
        }
    }

    /// File-only output for a shim running inside an instrumented process
    pub fn agent(file: impl Into<PathBuf>) -> Self {
        Self {
            console: false,
            file: Some(file.into()),
            ansi: false,
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    pub fn with_directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Parsed base level, `INFO` if unparseable
    pub fn level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }

    /// Filter string handed to `EnvFilter` when `RUST_LOG` is unset
    pub fn filter_directives(&self) -> String {
        std::iter::once(self.level().as_str().to_lowercase())
            .chain(self.directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn fmt_layer<W>(&self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(self.targets)
            .with_file(self.source_location)
            .with_line_number(self.source_location);
        if self.timestamps {
            layer.boxed()
        } else {
            layer.without_time().boxed()
        }
    }
}

/// Install a global subscriber for `config`
///
/// Returns `false` if a subscriber was already set; repeated installs are
/// harmless. An unopenable log file drops the file output only.
pub fn init_logging(config: &LogConfig) -> bool {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.console {
        layers.push(config.fmt_layer(std::io::stderr, config.ansi));
    }
    let mut file_error = None;
    if let Some(ref path) = config.file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => layers.push(config.fmt_layer(Mutex::new(file), false)),
            Err(e) => file_error = Some((path, e)),
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directives()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .is_ok();
    if let Some((path, e)) = file_error {
        tracing::warn!(path = %path.display(), error = %e, "Cannot open log file");
    }
    installed
}

pub fn init_debug_logging() -> bool {
    init_logging(&LogConfig::debug())
}

/// File logging to `introshim-<pid>.log` in the temp directory, for shims
/// loaded where stderr is not visible
pub fn init_agent_logging() -> bool {
    let path = std::env::temp_dir().join(format!("introshim-{}.log", std::process::id()));
    init_logging(&LogConfig::agent(path))
}
