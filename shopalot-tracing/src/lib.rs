//! Logging configuration for the ShopALot binaries.
//!
//! All logging goes through the [tracing] family of crates; this crate only installs the global
//! subscriber. Every binary flattens [`Options`] into its own clap parser and calls
//! [`Options::init`] once at startup:
//!
//! ```no_run
//! use clap::Parser;
//!
//! #[derive(Debug, Parser)]
//! struct Args {
//!     #[command(flatten)]
//!     tracing: shopalot_tracing::Options,
//! }
//!
//! fn main() -> Result<(), shopalot_tracing::Error> {
//!     let args = Args::parse();
//!     // Keep the guard alive until exit, or buffered file logs are lost.
//!     let _guard = args.tracing.init("shopalot_datagen")?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod error;
pub use error::Error;
mod logformat;
pub use logformat::LogFormat;

fn warn_if_debug_build() {
    #[cfg(debug_assertions)]
    tracing::warn!("Built without optimizations, benchmark timings will be skewed")
}

#[derive(Debug, Clone, Args)]
#[group(id = "logging")]
pub struct Options {
    /// Directory for `<binary>.log`. Stdout is used when unset.
    #[arg(long, env = "LOG_PATH")]
    pub log_path: Option<PathBuf>,

    /// How often the log file under `--log-path` is rolled over.
    #[arg(long, env = "LOG_ROTATION", default_value = "daily", value_enum)]
    pub log_rotation: RotationCadence,

    /// Event layout.
    #[arg(long, env = "LOG_FORMAT", default_value = "full", value_enum)]
    pub log_format: LogFormat,

    /// Plain stdout output without ANSI colors. File output is never colored.
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// [`EnvFilter`] directives, e.g. `info,shopalot_datagen=debug,reqwest=warn` to trace
    /// per-record generation while keeping the HTTP client quiet.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            log_path: None,
            log_rotation: RotationCadence::Daily,
            log_format: LogFormat::Full,
            no_color: false,
            log_level: "info".to_owned(),
        }
    }
}

/// Parseable stand-in for [`Rotation`], which has no `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum RotationCadence {
    Daily,
    Hourly,
    Minutely,
    /// One file for the lifetime of the process
    Never,
}

impl From<RotationCadence> for Rotation {
    fn from(cadence: RotationCadence) -> Self {
        match cadence {
            RotationCadence::Daily => Rotation::DAILY,
            RotationCadence::Hourly => Rotation::HOURLY,
            RotationCadence::Minutely => Rotation::MINUTELY,
            RotationCadence::Never => Rotation::NEVER,
        }
    }
}

// Each format changes the layer's type, so the four arms can't share one binding.
macro_rules! log_format_init {
    ($format:expr, $registry:expr, $layer:expr) => {
        match $format {
            LogFormat::Compact => $registry.with($layer.compact()).try_init(),
            LogFormat::Full => $registry.with($layer).try_init(),
            LogFormat::Pretty => $registry.with($layer.pretty()).try_init(),
            LogFormat::Json => $registry
                .with($layer.json().with_current_span(true))
                .try_init(),
        }
    };
}

impl Options {
    fn file_writer(&self, dir: &Path, binary: &str) -> (NonBlocking, WorkerGuard) {
        let appender =
            RollingFileAppender::new(self.log_rotation.into(), dir, format!("{binary}.log"));
        tracing_appender::non_blocking(appender)
    }

    /// Installs the global subscriber.
    ///
    /// If a log path is configured, events are written to a rolling file through a
    /// non-blocking writer and the returned [`WorkerGuard`] **must** be kept alive for the
    /// whole program; dropping it early loses buffered events. Otherwise events go to stdout
    /// and no guard is returned.
    ///
    /// Fails if the level filter does not parse or a global subscriber is already installed.
    pub fn init(&self, binary: &str) -> Result<Option<WorkerGuard>, Error> {
        let registry = tracing_subscriber::registry().with(EnvFilter::try_new(&self.log_level)?);

        let guard = if let Some(dir) = &self.log_path {
            let (writer, guard) = self.file_writer(dir, binary);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            log_format_init!(self.log_format, registry, layer)?;
            Some(guard)
        } else {
            let layer = fmt::layer().with_ansi(!self.no_color);
            log_format_init!(self.log_format, registry, layer)?;
            None
        };

        warn_if_debug_build();
        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        tracing: Options,
    }

    #[test]
    fn defaults_match_parser_defaults() {
        let parsed = Cli::try_parse_from(["cli"]).unwrap().tracing;
        let default = Options::default();
        assert_eq!(parsed.log_format, default.log_format);
        assert_eq!(parsed.log_rotation, default.log_rotation);
    }

    #[test]
    fn parses_flags() {
        let parsed = Cli::try_parse_from([
            "cli",
            "--log-format",
            "json",
            "--log-rotation",
            "never",
            "--log-level",
            "debug,reqwest=warn",
            "--no-color",
        ])
        .unwrap()
        .tracing;
        assert_eq!(parsed.log_format, LogFormat::Json);
        assert_eq!(parsed.log_rotation, RotationCadence::Never);
        assert_eq!(parsed.log_level, "debug,reqwest=warn");
        assert!(parsed.no_color);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["cli", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn bad_filter_fails_before_installing() {
        let options = Options {
            log_level: "info,shopalot=loudest".to_owned(),
            ..Options::default()
        };
        assert!(matches!(options.init("test"), Err(Error::Parse(_))));
    }
}
