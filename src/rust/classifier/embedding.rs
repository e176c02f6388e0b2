use ndarray::{Array1, ArrayView1};

use super::error::TrainingError;
use crate::corpus::{LabelAwareIterator, LabelSet};
use crate::paragraph_vectors::EmbeddingModel;

/// Read side of a trained embedding model.
///
/// The service only needs three things from a model at request time:
/// - a vector for an arbitrary normalized document
/// - the ordered label set
/// - each label's reference vector
pub trait TextEmbedding {
    /// Maps normalized text to a document vector. Text without any known
    /// token maps to the zero vector.
    fn vectorize(&self, text: &str) -> Array1<f32>;

    /// Labels in the order they were discovered during training
    fn labels(&self) -> &LabelSet;

    /// The representative vector of `label`, if the label is known
    fn reference_vector(&self, label: &str) -> Option<ArrayView1<'_, f32>>;

    /// Every label paired with its reference vector, in label order.
    fn reference_vectors(&self) -> Vec<(&str, ArrayView1<'_, f32>)> {
        self.labels()
            .iter()
            .filter_map(|label| {
                self.reference_vector(label)
                    .map(|vector| (label.as_str(), vector))
            })
            .collect()
    }
}

/// Trains an [`EmbeddingModel`] from a labeled document stream.
///
/// Implementations may rewind the corpus with
/// [`LabelAwareIterator::reset`] as often as they need; the corpus is left
/// rewound when training returns successfully.
pub trait EmbeddingEngine {
    fn train(&self, corpus: &mut dyn LabelAwareIterator) -> Result<EmbeddingModel, TrainingError>;
}
