use thiserror::Error;

/// Fatal ingestion failures. Per-session problems (short sessions,
/// irregular sampling) are counted and skipped instead of raised.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The source is not a recognized archive locator.
    #[error("unrecognized archive source: {0}")]
    ArchiveFormat(String),

    /// Every entry was filtered out; nothing to analyze.
    #[error("no valid sessions found in archive")]
    NoValidSessions,

    #[error("failed to download archive: {0}")]
    Download(#[source] Box<ureq::Error>),

    #[error("failed to read archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("i/o error reading archive: {0}")]
    Io(#[from] std::io::Error),

    /// Unparseable JSON payload, with the entry and the failing path.
    #[error("invalid JSON in `{entry}` at {}: {source}", .source.path())]
    Json {
        entry: String,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
}

impl From<ureq::Error> for IngestError {
    fn from(e: ureq::Error) -> Self {
        Self::Download(Box::new(e))
    }
}
