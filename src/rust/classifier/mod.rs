use std::path::PathBuf;

use serde::Serialize;

mod embedding;
mod error;
mod scorer;
mod service;
pub mod builder;
pub(crate) mod utils;

pub use builder::ClassificationServiceBuilder;
pub use embedding::{EmbeddingEngine, TextEmbedding};
pub use error::{IngestionError, LoadFailure, RequestError, ServiceError, TrainingError};
pub use scorer::{score, ClassificationResult, LabelScore};
pub use service::{ClassificationService, ServiceStatus};

/// Information about the model a ready service is using
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierInfo {
    /// Where the model is persisted
    pub model_path: PathBuf,
    /// Labels in training order
    pub labels: Vec<String>,
    pub num_labels: usize,
    /// Number of distinct tokens the model knows
    pub vocabulary_size: usize,
    /// Size of the embedding vectors
    pub embedding_size: usize,
}
