use clap::ValueEnum;

/// Layout of each emitted event, one per `tracing_subscriber::fmt::format` formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    Compact,
    #[default]
    Full,
    /// Multi-line, for reading a single run by eye
    Pretty,
    /// One object per line; pairs with `--log-path` when runs are post-processed
    Json,
}
