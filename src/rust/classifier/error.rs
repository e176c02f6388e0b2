use std::io;
use std::path::PathBuf;

/// Errors raised while streaming the training corpus.
///
/// Any of these aborts the whole training run. A corrupt file is never
/// skipped, because a partially ingested label would skew its reference
/// vector.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// The training file could not be opened or read
    #[error("Failed to read training file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The training file is not valid JSON
    #[error("Failed to parse training file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The JSON is well formed but not an array of `{"Answer": "..."}` records
    #[error("Invalid document collection in {path:?}: {message}")]
    Format { path: PathBuf, message: String },
    /// `next_document` was called after the last document
    #[error("No documents left in the corpus")]
    Exhausted,
}

/// Errors raised while restoring a persisted model.
///
/// These are recoverable at the service level: startup falls back to
/// training a fresh model.
#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error("Persisted model not found at {0:?}")]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Persisted model is corrupt: {0}")]
    Corrupt(String),
    #[error("Unsupported model format version {0}")]
    UnsupportedVersion(u32),
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("Persisted labels {persisted:?} do not match corpus labels {corpus:?}")]
    LabelMismatch {
        persisted: Vec<String>,
        corpus: Vec<String>,
    },
}

/// Errors raised by a training run.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    #[error("Corpus is empty: {0}")]
    EmptyCorpus(String),
    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),
}

/// Per-request errors. They never affect other requests or the process.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Classifier is not ready")]
    NotReady,
    #[error("Scoring error: {0}")]
    Scoring(String),
}

impl RequestError {
    /// Machine-readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::Scoring(_) => "scoring_error",
        }
    }
}

/// Fatal startup error: neither restoring nor training produced a model.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Training failed: {0}")]
    Training(#[from] TrainingError),
}
