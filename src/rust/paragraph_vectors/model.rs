use ndarray::{Array1, Array2, ArrayView1};

use super::codec;
use super::vocab::Vocabulary;
use super::TrainingConfig;
use crate::classifier::{LoadFailure, TextEmbedding};
use crate::corpus::LabelSet;
use crate::tokenizer::tokenize;

/// A trained embedding model: vocabulary, token vectors and one reference
/// vector per label.
///
/// The model is never mutated after training or restore, so it can be shared
/// across threads behind an `Arc` without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingModel {
    config: TrainingConfig,
    vocab: Vocabulary,
    token_vectors: Array2<f32>,
    labels: LabelSet,
    reference_vectors: Array2<f32>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<EmbeddingModel>();
    }
};

impl EmbeddingModel {
    /// Assembles a model. `token_vectors` has one row per vocabulary entry and
    /// `reference_vectors` one row per label, with equal column counts.
    pub(crate) fn new(
        config: TrainingConfig,
        vocab: Vocabulary,
        token_vectors: Array2<f32>,
        labels: LabelSet,
        reference_vectors: Array2<f32>,
    ) -> Self {
        debug_assert_eq!(token_vectors.nrows(), vocab.len());
        debug_assert_eq!(reference_vectors.nrows(), labels.len());
        debug_assert_eq!(token_vectors.ncols(), reference_vectors.ncols());
        Self {
            config,
            vocab,
            token_vectors,
            labels,
            reference_vectors,
        }
    }

    /// Hyperparameters the model was trained with
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn dimension(&self) -> usize {
        self.token_vectors.ncols()
    }

    pub(crate) fn token_vectors(&self) -> &Array2<f32> {
        &self.token_vectors
    }

    pub(crate) fn reference_matrix(&self) -> &Array2<f32> {
        &self.reference_vectors
    }

    /// Vector of a single in-vocabulary token
    pub fn token_vector(&self, token: &str) -> Option<ArrayView1<'_, f32>> {
        self.vocab.index_of(token).map(|i| self.token_vectors.row(i))
    }

    /// Centroid of the vectors of the known tokens, in token order.
    ///
    /// Returns the zero vector when no token is in the vocabulary.
    pub fn vectorize_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Array1<f32> {
        let mut sum = Array1::zeros(self.dimension());
        let mut known = 0usize;
        for token in tokens {
            if let Some(i) = self.vocab.index_of(token.as_ref()) {
                sum += &self.token_vectors.row(i);
                known += 1;
            }
        }
        if known > 0 {
            sum / known as f32
        } else {
            sum
        }
    }

    /// Serializes the full model into a checksummed binary blob
    pub fn persist(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Restores a model written by [`EmbeddingModel::persist`]
    pub fn restore(bytes: &[u8]) -> Result<Self, LoadFailure> {
        codec::decode(bytes)
    }
}

impl TextEmbedding for EmbeddingModel {
    fn vectorize(&self, text: &str) -> Array1<f32> {
        self.vectorize_tokens(&tokenize(text))
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn reference_vector(&self, label: &str) -> Option<ArrayView1<'_, f32>> {
        self.labels
            .index_of(label)
            .map(|i| self.reference_vectors.row(i))
    }
}
