use std::collections::HashMap;

use rand::Rng;

/// Exponent applied to token counts in the negative-sampling distribution.
const UNIGRAM_POWER: f64 = 0.75;

/// Token vocabulary ordered by descending frequency, then lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vocabulary {
    words: Vec<String>,
    counts: Vec<u64>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from raw token counts, keeping tokens seen at
    /// least `min_frequency` times.
    pub fn from_counts(counts: HashMap<String, u64>, min_frequency: u64) -> Self {
        let mut entries: Vec<(String, u64)> = counts
            .into_iter()
            .filter(|(_, count)| *count >= min_frequency)
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self::from_entries(entries)
    }

    /// Rebuilds a vocabulary from `(token, count)` pairs, keeping their order.
    pub(crate) fn from_entries(entries: Vec<(String, u64)>) -> Self {
        let mut words = Vec::with_capacity(entries.len());
        let mut counts = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for (word, count) in entries {
            index.insert(word.clone(), words.len());
            words.push(word);
            counts.push(count);
        }
        Self { words, counts, index }
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total occurrences of all kept tokens
    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Draws negative samples from the unigram distribution raised to 3/4.
#[derive(Debug, Clone)]
pub(crate) struct NegativeSampler {
    cumulative: Vec<f64>,
}

impl NegativeSampler {
    pub(crate) fn new(vocab: &Vocabulary) -> Self {
        let mut total = 0.0;
        let cumulative = vocab
            .counts()
            .iter()
            .map(|&count| {
                total += (count as f64).powf(UNIGRAM_POWER);
                total
            })
            .collect();
        Self { cumulative }
    }

    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        let x = rng.gen::<f64>() * total;
        self.cumulative
            .partition_point(|&c| c <= x)
            .min(self.cumulative.len().saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn counts(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn test_vocabulary_order_and_min_frequency() {
        let vocab = Vocabulary::from_counts(
            counts(&[("b", 2), ("a", 2), ("c", 5), ("rare", 1)]),
            2,
        );
        assert_eq!(vocab.words(), &["c", "a", "b"]);
        assert_eq!(vocab.index_of("a"), Some(1));
        assert!(!vocab.contains("rare"));
        assert_eq!(vocab.total_count(), 9);
    }

    #[test]
    fn test_sampler_stays_in_range() {
        let vocab = Vocabulary::from_counts(counts(&[("x", 10), ("y", 1), ("z", 3)]), 1);
        let sampler = NegativeSampler::new(&vocab);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut hits = [0usize; 3];
        for _ in 0..1000 {
            hits[sampler.sample(&mut rng)] += 1;
        }
        // "x" is the most frequent token and must be drawn most often.
        assert!(hits[0] > hits[1] && hits[0] > hits[2]);
        assert!(hits.iter().all(|&h| h > 0));
    }
}
