//! `tracing` subscriber setup shared by the Prospect binaries
//!
//! A [`LogConfig`] picks the level, the sinks (stdout and/or a daily rolling
//! file) and the line format. Binaries build one from their CLI flags, let
//! `LOG_*` environment variables override it, and keep the returned
//! [`LoggingGuard`] alive until exit.
//!
//! Library code logs through the `tracing` macros with structured fields:
//!
//! ```rust
//! use tracing::{info, warn};
//!
//! let page = 3;
//! info!(page, records = 25, "Page persisted");
//! warn!(page, reason = "missing name", "Skipping record");
//! ```
//!
//! ```no_run
//! use prospect_common::logging::{init_logging, LogConfig, LogLevel};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::default()
//!         .with_level(LogLevel::Debug)
//!         .merge_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::debug!("ready");
//!     Ok(())
//! }
//! ```

use crate::env;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Look `input` up in a table of accepted spellings
fn lookup<T: Copy>(kind: &str, input: &str, table: &[(&str, T)]) -> Result<T> {
    let wanted = input.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, value)| *value)
        .ok_or_else(|| anyhow!("Unknown {kind} '{input}'"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        lookup(
            "log level",
            s,
            &[
                ("trace", Self::Trace),
                ("debug", Self::Debug),
                ("info", Self::Info),
                ("warn", Self::Warn),
                ("warning", Self::Warn),
                ("error", Self::Error),
            ],
        )
    }
}

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    fn console(self) -> bool {
        self != LogOutput::File
    }

    fn file(self) -> bool {
        self != LogOutput::Console
    }
}

impl FromStr for LogOutput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        lookup(
            "log output",
            s,
            &[
                ("console", Self::Console),
                ("stdout", Self::Console),
                ("file", Self::File),
                ("both", Self::Both),
                ("all", Self::Both),
            ],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        lookup(
            "log format",
            s,
            &[("text", Self::Text), ("pretty", Self::Text), ("json", Self::Json)],
        )
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub output: LogOutput,
    pub format: LogFormat,
    /// Only used when `output` includes the file sink
    pub log_dir: PathBuf,
    /// Rolling files are named `<prefix>.<date>`
    pub log_file_prefix: String,
    /// Extra comma separated directives, e.g. `sqlx=warn,reqwest=info`
    pub filter_directives: Option<String>,
    pub include_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            output: LogOutput::default(),
            format: LogFormat::default(),
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "prospect".to_string(),
            filter_directives: None,
            include_targets: true,
        }
    }
}

impl LogConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Override fields from `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR`,
    /// `LOG_FILE_PREFIX`, `LOG_FILTER` and `LOG_INCLUDE_TARGETS`.
    ///
    /// Blank variables are ignored; unparseable ones are an error.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(level) = env::optional("LOG_LEVEL") {
            self.level = level.parse()?;
        }
        if let Some(output) = env::optional("LOG_OUTPUT") {
            self.output = output.parse()?;
        }
        if let Some(format) = env::optional("LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(dir) = env::optional("LOG_DIR") {
            self.log_dir = dir.into();
        }
        if let Some(prefix) = env::optional("LOG_FILE_PREFIX") {
            self.log_file_prefix = prefix;
        }
        if let Some(filter) = env::optional("LOG_FILTER") {
            self.filter_directives = Some(filter);
        }
        self.include_targets = env::parsed_or("LOG_INCLUDE_TARGETS", self.include_targets)?;
        Ok(self)
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_file_prefix = prefix.into();
        self
    }

    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter_directives = Some(directives.into());
        self
    }

    /// `RUST_LOG` first, then the configured level, then extra directives
    fn env_filter(&self) -> Result<EnvFilter> {
        let base = EnvFilter::from_default_env().add_directive(LevelFilter::from(self.level).into());

        self.filter_directives
            .iter()
            .flat_map(|directives| directives.split(','))
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .try_fold(base, |filter, directive| -> Result<EnvFilter> {
                let parsed: Directive = directive
                    .parse()
                    .with_context(|| format!("Bad log filter directive '{directive}'"))?;
                Ok(filter.add_directive(parsed))
            })
    }
}

/// Keeps the non-blocking file writer flushing until dropped.
///
/// Hold it in `main` for the lifetime of the process.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global tracing subscriber
///
/// Must be called once at startup. Fails if a subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = config.env_filter()?;
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut file_guard = None;

    if config.output.console() {
        layers.push(format_layer(config, fmt::layer().with_writer(std::io::stdout)));
    }

    if config.output.file() {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory {}", config.log_dir.display())
        })?;

        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);

        layers.push(format_layer(
            config,
            fmt::layer().with_writer(writer).with_ansi(false),
        ));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggingGuard { _file: file_guard })
}

fn format_layer<N, W>(config: &LogConfig, layer: fmt::Layer<Registry, N, fmt::format::Format, W>) -> BoxedLayer
where
    N: for<'writer> fmt::FormatFields<'writer> + Send + Sync + 'static,
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = layer.with_target(config.include_targets);
    match config.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
