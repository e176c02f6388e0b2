use ndarray::{Array1, ArrayView1};

pub(crate) fn normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 && norm.is_finite() {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn average_vectors(vectors: &[Array1<f32>], embedding_size: usize) -> Array1<f32> {
    if vectors.is_empty() {
        return Array1::zeros(embedding_size);
    }
    let sum = vectors.iter().fold(Array1::zeros(vectors[0].len()), |acc, v| acc + v);
    sum / vectors.len() as f32
}

/// Cosine similarity in `[-1, 1]`. Zero-norm or non-finite inputs score 0.
pub(crate) fn cosine_similarity(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a <= 1e-10 || norm_b <= 1e-10 {
        return 0.0;
    }
    let similarity = a.dot(&b) / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
