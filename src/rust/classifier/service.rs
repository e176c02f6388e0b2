use std::path::PathBuf;

use log::{error, info, warn};

use super::builder::ClassificationServiceBuilder;
use super::embedding::{EmbeddingEngine, TextEmbedding};
use super::error::{LoadFailure, RequestError, ServiceError, TrainingError};
use super::scorer::{score, ClassificationResult};
use super::ClassifierInfo;
use crate::config::Config;
use crate::corpus::{FileLabelAwareReader, LabelAwareIterator};
use crate::model_store::ModelStore;
use crate::normalizer::normalize;
use crate::paragraph_vectors::EmbeddingModel;

/// Lifecycle state reported by [`ClassificationService::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Uninitialized,
    Ready,
}

enum ServiceState {
    Uninitialized,
    Ready(EmbeddingModel),
}

/// Restores or trains a model at startup, then classifies documents.
///
/// State transitions take `&mut self` and finish before the service is
/// shared, so concurrent `classify` calls through an `Arc` only ever see a
/// complete model.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use labelwise::ClassificationService;
/// use std::sync::Arc;
///
/// let mut service = ClassificationService::builder()
///     .add_source_folder("trainingData")
///     .build()?;
/// service.start(false)?;
///
/// let service = Arc::new(service);
/// let result = service.classify("<p>Cheap watches, buy now!</p>")?;
/// if let Some(best) = result.best() {
///     println!("{}: {:.3}", best.label, best.score);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ClassificationService {
    source_dirs: Vec<PathBuf>,
    buffer_capacity: usize,
    engine: Box<dyn EmbeddingEngine + Send + Sync>,
    store: ModelStore,
    state: ServiceState,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ClassificationService>();
    }
};

impl ClassificationService {
    pub(crate) fn new(
        source_dirs: Vec<PathBuf>,
        buffer_capacity: usize,
        engine: Box<dyn EmbeddingEngine + Send + Sync>,
        store: ModelStore,
    ) -> Self {
        Self {
            source_dirs,
            buffer_capacity,
            engine,
            store,
            state: ServiceState::Uninitialized,
        }
    }

    /// Creates a new ClassificationServiceBuilder for fluent construction
    pub fn builder() -> ClassificationServiceBuilder {
        ClassificationServiceBuilder::new()
    }

    /// Builds an uninitialized service from a loaded [`Config`]
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        config
            .corpus
            .source_dirs
            .iter()
            .fold(Self::builder(), |builder, dir| builder.add_source_folder(dir))
            .with_buffer_capacity(config.corpus.buffer_capacity)
            .with_training_config(config.training.clone())
            .with_model_store(config.model_store())
            .build()
    }

    pub fn status(&self) -> ServiceStatus {
        match self.state {
            ServiceState::Uninitialized => ServiceStatus::Uninitialized,
            ServiceState::Ready(_) => ServiceStatus::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == ServiceStatus::Ready
    }

    /// The active model, once the service is ready
    pub fn model(&self) -> Option<&EmbeddingModel> {
        match &self.state {
            ServiceState::Ready(model) => Some(model),
            ServiceState::Uninitialized => None,
        }
    }

    pub fn source_dirs(&self) -> &[PathBuf] {
        &self.source_dirs
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    fn corpus_reader(&self) -> FileLabelAwareReader {
        self.source_dirs
            .iter()
            .fold(FileLabelAwareReader::builder(), |builder, dir| {
                builder.add_source_folder(dir)
            })
            .with_buffer_capacity(self.buffer_capacity)
            .build()
    }

    /// Loads the persisted model and checks it against the corpus labels.
    ///
    /// When the source folders yield labels that differ from the model's,
    /// the model is stale and `LoadFailure::LabelMismatch` is returned. When
    /// they yield none, the model's own labels are trusted. On any failure
    /// the state is left unchanged.
    pub fn restore_or_fail(&mut self) -> Result<(), LoadFailure> {
        let model = self.store.restore()?;

        let reader = self.corpus_reader();
        let corpus_labels = reader.labels();
        if corpus_labels.is_empty() {
            warn!("Source folders yield no labels; trusting the persisted model's labels");
        } else if corpus_labels != model.labels() {
            return Err(LoadFailure::LabelMismatch {
                persisted: model.labels().as_slice().to_vec(),
                corpus: corpus_labels.as_slice().to_vec(),
            });
        }

        info!(
            "Model restored: {} labels, {} tokens, dimension {}",
            model.labels().len(),
            model.vocab().len(),
            model.dimension()
        );
        self.state = ServiceState::Ready(model);
        Ok(())
    }

    /// Trains a model from the source folders and persists it.
    ///
    /// Nothing is persisted when training fails. A persist failure after a
    /// successful training is logged and the service still becomes ready.
    pub fn train_fresh(&mut self) -> Result<(), TrainingError> {
        let mut reader = self.corpus_reader();
        info!(
            "Training from {} file(s) across {} label(s)",
            reader.files().len(),
            reader.labels().len()
        );

        let model = self.engine.train(&mut reader)?;

        if let Err(e) = self.store.persist(&model) {
            error!(
                "Failed to persist model to {:?}: {}",
                self.store.model_path(),
                e
            );
        }
        self.state = ServiceState::Ready(model);
        Ok(())
    }

    /// Restore, falling back to training. `fresh` skips the restore attempt.
    pub fn start(&mut self, fresh: bool) -> Result<(), ServiceError> {
        if fresh {
            info!("Fresh start requested; ignoring any persisted model");
        } else {
            match self.restore_or_fail() {
                Ok(()) => return Ok(()),
                Err(LoadFailure::Missing(path)) => {
                    info!("No persisted model at {:?}; training a new one", path)
                }
                Err(e) => warn!("Could not restore model ({}); retraining", e),
            }
        }
        self.train_fresh()?;
        Ok(())
    }

    /// Ranks every label against `raw`, which may contain markup.
    ///
    /// Empty input, or input without any known token, scores every label
    /// at `0.0` in label order.
    pub fn classify(&self, raw: &str) -> Result<ClassificationResult, RequestError> {
        let model = self.model().ok_or(RequestError::NotReady)?;
        let text = normalize(raw);
        let vector = model.vectorize(&text);
        score(vector.view(), &model.reference_vectors())
    }

    /// Returns information about the service's model, once ready
    pub fn info(&self) -> Option<ClassifierInfo> {
        self.model().map(|model| ClassifierInfo {
            model_path: self.store.model_path().to_path_buf(),
            labels: model.labels().as_slice().to_vec(),
            num_labels: model.labels().len(),
            vocabulary_size: model.vocab().len(),
            embedding_size: model.dimension(),
        })
    }
}
