use std::io;
use std::path::PathBuf;

use crate::EntityKind;

/// Errors raised while generating or emitting ShopALot records.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The id does not fit in the configured zero-padded key width.
    #[error("id {id} is outside the key domain [0, 10^{width})")]
    InvalidRange { id: u64, width: usize },

    /// A consumer failed to write its output. Surfaced verbatim, never repaired.
    #[error("consumer I/O error on {}: {source}", path.display())]
    ConsumerIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{kind} generation requires the {missing} id range")]
    MissingReferenceRange {
        kind: EntityKind,
        missing: &'static str,
    },

    #[error("cannot sample {requested} ids from a domain of {available}")]
    SampleTooLarge { requested: u64, available: u64 },
}

impl Error {
    pub(crate) fn consumer_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::ConsumerIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
