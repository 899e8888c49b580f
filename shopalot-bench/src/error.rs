use std::io;
use std::time::Duration;

/// Errors raised by the benchmark harness and its boundary capabilities.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A statement came back with a status other than `success`.
    #[error("{phase} statement {run} failed with status {status}: {message}")]
    Query {
        phase: &'static str,
        run: usize,
        status: String,
        message: String,
    },

    #[error("HTTP request to the query service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command `{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("the cluster did not become ready within {0:?}")]
    NotReady(Duration),

    #[error("index {index} does not exist on {dataverse}.{dataset}")]
    MissingIndex {
        index: String,
        dataverse: String,
        dataset: String,
    },

    /// A lookup built from a regenerated record matched nothing.
    #[error("query {run} found no match for {predicate}")]
    EmptyResult { run: usize, predicate: String },

    #[error(transparent)]
    Datagen(#[from] shopalot_datagen::Error),

    #[error("invalid workload: {0}")]
    InvalidWorkload(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
