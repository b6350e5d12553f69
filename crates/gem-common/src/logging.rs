//! `tracing` setup for the publisher
//!
//! Logs go to stderr, to a daily rotating file, or both, as text or JSON.
//! stdout is left to command output such as the JSON of `adpc-gem preview`.
//!
//! Scheduled runs configure logging through the environment:
//!
//! | Variable          | Effect                                                   |
//! |-------------------|----------------------------------------------------------|
//! | `LOG_LEVEL`       | `trace`, `debug`, `info` (default), `warn`, `error`      |
//! | `LOG_OUTPUT`      | `console` (default), `file`, `both`                      |
//! | `LOG_FORMAT`      | `text` (default), `json`                                 |
//! | `LOG_DIR`         | directory for log files                                  |
//! | `TEMP_DIR`        | log files go to `$TEMP_DIR/hdx-scraper-adpc-gem` instead |
//! | `LOG_FILE_ONLY`   | truthy value forces file-only output                     |
//! | `LOG_FILE_PREFIX` | file name prefix, `adpc-gem` by default                  |
//! | `LOG_FILTER`      | extra directives, e.g. `reqwest=warn,hyper=info`         |
//!
//! ```no_run
//! use gem_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("Publisher started");
//!     Ok(())
//! }
//! ```

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self, format::FmtSpan, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

/// Folder name used under `TEMP_DIR` for log files
pub const LOG_SUBDIR: &str = "hdx-scraper-adpc-gem";

const DEFAULT_FILE_PREFIX: &str = "adpc-gem";

/// Implements `as_str`, `Display` and case-insensitive `FromStr` from a
/// table of canonical names and accepted aliases.
macro_rules! named_setting {
    ($ty:ident, $what:literal { $($variant:ident => $name:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name $(| $alias)* => Ok($ty::$variant),)+
                    _ => bail!("unknown {} '{}'", $what, s),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

named_setting!(LogLevel, "log level" {
    Trace => "trace",
    Debug => "debug",
    Info => "info",
    Warn => "warn" | "warning",
    Error => "error",
});

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

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// stderr
    #[default]
    Console,
    File,
    Both,
}

named_setting!(LogOutput, "log output" {
    Console => "console" | "stderr",
    File => "file",
    Both => "both" | "all",
});

impl LogOutput {
    pub fn to_console(self) -> bool {
        self != LogOutput::File
    }

    pub fn to_file(self) -> bool {
        self != LogOutput::Console
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

named_setting!(LogFormat, "log format" {
    Text => "text" | "pretty",
    Json => "json",
});

/// Logging settings for one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub output: LogOutput,
    pub format: LogFormat,
    /// Used only when `output` includes the file
    pub log_dir: PathBuf,
    /// Daily files are named `<prefix>.<YYYY-MM-DD>`
    pub log_file_prefix: String,
    /// Comma-separated `EnvFilter` directives added on top of `level`
    pub filter_directives: Option<String>,
    /// Add source file and line to each line
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            output: LogOutput::default(),
            format: LogFormat::default(),
            log_dir: std::env::temp_dir().join(LOG_SUBDIR),
            log_file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            filter_directives: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Read the variables listed in the module docs from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// [`LogConfig::from_env`] over an arbitrary lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("LOG_LEVEL") {
            config.level = value.parse()?;
        }
        if let Some(value) = lookup("LOG_OUTPUT") {
            config.output = value.parse()?;
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            config.format = value.parse()?;
        }

        config.log_dir = match (lookup("LOG_DIR"), lookup("TEMP_DIR")) {
            (Some(dir), _) => PathBuf::from(dir),
            (None, Some(temp)) => PathBuf::from(temp).join(LOG_SUBDIR),
            (None, None) => config.log_dir,
        };

        if lookup("LOG_FILE_ONLY").is_some_and(|v| is_truthy(&v)) {
            config.output = LogOutput::File;
        }

        config.log_file_prefix = lookup("LOG_FILE_PREFIX").unwrap_or(config.log_file_prefix);
        config.filter_directives = lookup("LOG_FILTER");
        config.include_location = lookup("LOG_INCLUDE_LOCATION").is_some_and(|v| is_truthy(&v));

        Ok(config)
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .from_env_lossy();

        let extra = self.filter_directives.as_deref().unwrap_or_default();
        for directive in extra.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let directive = directive
                .parse()
                .with_context(|| format!("invalid LOG_FILTER directive '{}'", directive))?;
            filter = filter.add_directive(directive);
        }

        Ok(filter)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Holds the background file writer; dropping it flushes buffered lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard> {
    let filter = config.env_filter()?;

    let mut guard = None;
    let file_layer = if config.output.to_file() {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("cannot create log directory '{}'", config.log_dir.display())
        })?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);
        Some(fmt_layer(config, writer, false))
    } else {
        None
    };

    let console_layer = config
        .output
        .to_console()
        .then(|| fmt_layer(config, std::io::stderr, true));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(LogGuard { _file: guard })
}

fn fmt_layer<S, W>(config: &LogConfig, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(FmtSpan::CLOSE);

    match config.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
