use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid --log-level directives: {0}")]
    Parse(#[from] ParseError),
    #[error("a global tracing subscriber is already installed: {0}")]
    Init(#[from] TryInitError),
}
