use std::path::PathBuf;

use log::info;

use super::embedding::EmbeddingEngine;
use super::error::{ServiceError, TrainingError};
use super::service::ClassificationService;
use crate::corpus::DEFAULT_BUFFER_CAPACITY;
use crate::model_store::ModelStore;
use crate::paragraph_vectors::{ParagraphVectors, TrainingConfig};

/// A builder for constructing a [`ClassificationService`] with a fluent interface.
///
/// # Example
/// ```
/// use labelwise::ClassificationService;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = ClassificationService::builder()
///     .add_source_folder("trainingData")
///     .with_model_path("/tmp/labelwise-doc/model.bin")
///     .build()?;
/// assert!(!service.is_ready());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ClassificationServiceBuilder {
    source_dirs: Vec<PathBuf>,
    buffer_capacity: Option<usize>,
    training_config: TrainingConfig,
    store: Option<ModelStore>,
    engine: Option<Box<dyn EmbeddingEngine + Send + Sync>>,
}

impl ClassificationServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory of `<label>.<ext>` training files. Directories are
    /// scanned in the order they were added.
    pub fn add_source_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_dirs.push(path.into());
        self
    }

    /// Maximum number of documents the corpus reader keeps buffered
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Hyperparameters for the default engine
    pub fn with_training_config(mut self, config: TrainingConfig) -> Self {
        self.training_config = config;
        self
    }

    pub fn with_model_store(mut self, store: ModelStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_model_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_model_store(ModelStore::new(path.into()))
    }

    /// Replaces the default [`ParagraphVectors`] engine. The training config
    /// set on this builder is then ignored.
    pub fn with_engine<E>(mut self, engine: E) -> Self
    where
        E: EmbeddingEngine + Send + Sync + 'static,
    {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Builds an uninitialized service. Nothing is read from disk yet.
    ///
    /// # Errors
    /// `ServiceError::Training` with `InvalidConfig` when no source folder
    /// was added, the buffer capacity is zero, or the training config is
    /// invalid.
    pub fn build(self) -> Result<ClassificationService, ServiceError> {
        if self.source_dirs.is_empty() {
            return Err(TrainingError::InvalidConfig(
                "at least one source folder is required".into(),
            )
            .into());
        }
        let buffer_capacity = self.buffer_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY);
        if buffer_capacity == 0 {
            return Err(TrainingError::InvalidConfig("buffer capacity must be > 0".into()).into());
        }

        let engine: Box<dyn EmbeddingEngine + Send + Sync> = match self.engine {
            Some(engine) => engine,
            None => {
                self.training_config.validate()?;
                Box::new(ParagraphVectors::new(self.training_config))
            }
        };
        let store = self.store.unwrap_or_else(ModelStore::new_default);

        info!(
            "Classification service configured: {} source folder(s), model at {:?}",
            self.source_dirs.len(),
            store.model_path()
        );
        Ok(ClassificationService::new(
            self.source_dirs,
            buffer_capacity,
            engine,
            store,
        ))
    }
}
