//! In-process embedding engine.
//!
//! [`ParagraphVectors`] learns token vectors with skip-gram and negative
//! sampling over a labeled corpus, then represents every label by the
//! centroid of its documents. The resulting [`EmbeddingModel`] is immutable
//! and can be persisted with [`EmbeddingModel::persist`].

mod codec;
mod model;
mod trainer;
mod vocab;

pub use model::EmbeddingModel;
pub use trainer::ParagraphVectors;
pub use vocab::Vocabulary;

use serde::{Deserialize, Serialize};

use crate::classifier::TrainingError;

/// Hyperparameters of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Starting learning rate
    pub learning_rate: f32,
    /// Floor the learning rate decays to
    pub min_learning_rate: f32,
    /// Number of tokens between learning-rate updates
    pub batch_size: usize,
    /// Passes over the corpus
    pub epochs: usize,
    /// Learn token vectors; when off they keep their seeded random values
    pub train_word_vectors: bool,
    /// Vector dimension
    pub layer_size: usize,
    /// Maximum skip-gram context distance
    pub window_size: usize,
    /// Negative samples per positive pair
    pub negative_samples: usize,
    /// Tokens seen fewer times are dropped from the vocabulary
    pub min_word_frequency: u64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.025,
            min_learning_rate: 0.001,
            batch_size: 1000,
            epochs: 20,
            train_word_vectors: true,
            layer_size: 100,
            window_size: 5,
            negative_samples: 5,
            min_word_frequency: 1,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_layer_size(mut self, layer_size: usize) -> Self {
        self.layer_size = layer_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_train_word_vectors(mut self, train: bool) -> Self {
        self.train_word_vectors = train;
        self
    }

    /// Checks that the hyperparameters describe a runnable training job
    pub fn validate(&self) -> Result<(), TrainingError> {
        let invalid = |msg: &str| -> Result<(), TrainingError> {
            Err(TrainingError::InvalidConfig(msg.to_string()))
        };

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid("learning_rate must be > 0");
        }
        if !(self.min_learning_rate.is_finite() && self.min_learning_rate > 0.0) {
            return invalid("min_learning_rate must be > 0");
        }
        if self.min_learning_rate > self.learning_rate {
            return invalid("min_learning_rate must not exceed learning_rate");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be > 0");
        }
        if self.epochs == 0 {
            return invalid("epochs must be > 0");
        }
        if self.layer_size == 0 {
            return invalid("layer_size must be > 0");
        }
        if self.window_size == 0 {
            return invalid("window_size must be > 0");
        }
        if self.min_word_frequency == 0 {
            return invalid("min_word_frequency must be > 0");
        }
        Ok(())
    }
}
