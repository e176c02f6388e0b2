use std::cmp::Ordering;

use ndarray::ArrayView1;
use serde::Serialize;

use super::error::RequestError;
use super::utils::cosine_similarity;

/// Similarity of a document to one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

/// Labels ranked by descending score. Ties keep label-set order.
///
/// Serializes as a plain JSON array of `{"label", "score"}` objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClassificationResult {
    scores: Vec<LabelScore>,
}

impl ClassificationResult {
    /// The highest scoring label, if any label is known
    pub fn best(&self) -> Option<&LabelScore> {
        self.scores.first()
    }

    pub fn scores(&self) -> &[LabelScore] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabelScore> {
        self.scores.iter()
    }
}

impl IntoIterator for ClassificationResult {
    type Item = LabelScore;
    type IntoIter = std::vec::IntoIter<LabelScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClassificationResult {
    type Item = &'a LabelScore;
    type IntoIter = std::slice::Iter<'a, LabelScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.iter()
    }
}

/// Ranks `labels` by cosine similarity to `document`.
///
/// Every label appears exactly once. Zero-norm vectors score `0.0`, so an
/// input without known tokens yields all zeros in label order.
///
/// # Errors
/// `RequestError::Scoring` when a reference vector's dimension differs from
/// the document vector's.
pub fn score(
    document: ArrayView1<f32>,
    labels: &[(&str, ArrayView1<f32>)],
) -> Result<ClassificationResult, RequestError> {
    let mut scores = Vec::with_capacity(labels.len());
    for (label, reference) in labels {
        if reference.len() != document.len() {
            return Err(RequestError::Scoring(format!(
                "reference vector for '{}' has dimension {}, document has {}",
                label,
                reference.len(),
                document.len()
            )));
        }
        scores.push(LabelScore {
            label: (*label).to_string(),
            score: cosine_similarity(document, reference.view()),
        });
    }

    // sort_by is stable, so equal scores keep label order
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(ClassificationResult { scores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_scores_are_sorted_descending() {
        let doc = array![1.0f32, 0.2];
        let a = array![0.0f32, 1.0];
        let b = array![1.0f32, 0.0];
        let c = array![-1.0f32, 0.0];
        let result = score(doc.view(), &[("a", a.view()), ("b", b.view()), ("c", c.view())]).unwrap();

        let labels: Vec<&str> = result.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert_eq!(result.best().unwrap().label, "b");
        assert!(result.iter().all(|s| (-1.0..=1.0).contains(&s.score)));
    }

    #[test]
    fn test_zero_document_keeps_label_order() {
        let doc = Array1::<f32>::zeros(2);
        let a = array![0.0f32, 1.0];
        let b = array![1.0f32, 0.0];
        let result = score(doc.view(), &[("ham", a.view()), ("spam", b.view())]).unwrap();
        let pairs: Vec<(&str, f32)> = result.iter().map(|s| (s.label.as_str(), s.score)).collect();
        assert_eq!(pairs, vec![("ham", 0.0), ("spam", 0.0)]);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let doc = array![1.0f32, 0.0];
        let bad = array![1.0f32, 0.0, 0.0];
        assert!(matches!(
            score(doc.view(), &[("x", bad.view())]),
            Err(RequestError::Scoring(_))
        ));
    }

    #[test]
    fn test_no_labels_is_empty_result() {
        let doc = array![1.0f32];
        let result = score(doc.view(), &[]).unwrap();
        assert!(result.is_empty());
        assert!(result.best().is_none());
    }

    #[test]
    fn test_serializes_as_array() {
        let doc = array![1.0f32, 0.0];
        let a = array![1.0f32, 0.0];
        let result = score(doc.view(), &[("spam", a.view())]).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!([{"label": "spam", "score": 1.0}]));
    }
}
