use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::model::EmbeddingModel;
use super::vocab::{NegativeSampler, Vocabulary};
use super::TrainingConfig;
use crate::classifier::utils::{average_vectors, normalize_vector};
use crate::classifier::{EmbeddingEngine, TrainingError};
use crate::corpus::LabelAwareIterator;
use crate::tokenizer::tokenize;

/// Logistic inputs beyond this magnitude are treated as saturated.
const MAX_EXP: f32 = 6.0;

/// Trains token vectors with skip-gram and negative sampling, then derives
/// one reference vector per label.
///
/// The corpus is streamed once per pass and rewound with
/// [`LabelAwareIterator::reset`] in between, so memory use does not grow with
/// corpus size beyond the vocabulary. Training is single-threaded and fully
/// determined by the corpus and [`TrainingConfig::seed`].
///
/// # Example
/// ```no_run
/// use labelwise::corpus::FileLabelAwareReader;
/// use labelwise::paragraph_vectors::{ParagraphVectors, TrainingConfig};
/// use labelwise::{EmbeddingEngine, TextEmbedding};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut reader = FileLabelAwareReader::builder()
///     .add_source_folder("trainingData")
///     .build();
/// let model = ParagraphVectors::new(TrainingConfig::default()).train(&mut reader)?;
/// println!("{} labels, {} tokens", model.labels().len(), model.vocab().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParagraphVectors {
    config: TrainingConfig,
}

impl ParagraphVectors {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    fn build_vocabulary(
        &self,
        corpus: &mut dyn LabelAwareIterator,
    ) -> Result<(Vocabulary, usize), TrainingError> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut documents = 0usize;

        corpus.reset();
        while corpus.has_next()? {
            let doc = corpus.next_document()?;
            for token in tokenize(&doc.content) {
                *counts.entry(token).or_insert(0) += 1;
            }
            documents += 1;
        }

        Ok((
            Vocabulary::from_counts(counts, self.config.min_word_frequency),
            documents,
        ))
    }

    /// One skip-gram pass over a document. Each context token's vector is
    /// trained to predict the centre token against sampled negatives.
    fn train_sequence(
        &self,
        ids: &[usize],
        state: &mut TrainingState,
        rng: &mut ChaCha8Rng,
        schedule: &mut LearningRate,
    ) {
        let window = self.config.window_size;
        let mut neu1e = Array1::<f32>::zeros(self.config.layer_size);

        for (pos, &center) in ids.iter().enumerate() {
            let alpha = schedule.step();
            let span = window - rng.gen_range(0..window);
            let start = pos.saturating_sub(span);
            let end = (pos + span + 1).min(ids.len());

            for (ctx_pos, &context) in ids.iter().enumerate().take(end).skip(start) {
                if ctx_pos == pos {
                    continue;
                }
                neu1e.fill(0.0);
                for d in 0..=self.config.negative_samples {
                    let (target, label) = if d == 0 {
                        (center, 1.0)
                    } else {
                        let target = state.sampler.sample(rng);
                        if target == center {
                            continue;
                        }
                        (target, 0.0)
                    };

                    let f = state.syn0.row(context).dot(&state.syn1neg.row(target));
                    let g = (label - sigmoid(f)) * alpha;
                    neu1e.scaled_add(g, &state.syn1neg.row(target));
                    state
                        .syn1neg
                        .row_mut(target)
                        .scaled_add(g, &state.syn0.row(context));
                }
                state.syn0.row_mut(context).scaled_add(1.0, &neu1e);
            }
        }
    }
}

impl EmbeddingEngine for ParagraphVectors {
    fn train(&self, corpus: &mut dyn LabelAwareIterator) -> Result<EmbeddingModel, TrainingError> {
        self.config.validate()?;
        let started = Instant::now();

        let labels = corpus.labels().clone();
        if labels.is_empty() {
            return Err(TrainingError::EmptyCorpus("no labeled training files found".into()));
        }

        let (vocab, documents) = self.build_vocabulary(corpus)?;
        if vocab.is_empty() {
            return Err(TrainingError::EmptyCorpus(format!(
                "{} document(s) produced no vocabulary tokens",
                documents
            )));
        }
        info!(
            "Vocabulary built: {} tokens from {} documents across {} labels",
            vocab.len(),
            documents,
            labels.len()
        );

        let dim = self.config.layer_size;
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let syn0 = Array2::from_shape_fn((vocab.len(), dim), |_| {
            (rng.gen::<f32>() - 0.5) / dim as f32
        });
        let mut state = TrainingState {
            syn0,
            syn1neg: Array2::zeros((vocab.len(), dim)),
            sampler: NegativeSampler::new(&vocab),
        };

        if self.config.train_word_vectors {
            let mut schedule = LearningRate::new(
                &self.config,
                vocab.total_count() * self.config.epochs as u64,
            );
            for epoch in 1..=self.config.epochs {
                corpus.reset();
                while corpus.has_next()? {
                    let doc = corpus.next_document()?;
                    let ids: Vec<usize> = tokenize(&doc.content)
                        .iter()
                        .filter_map(|token| vocab.index_of(token))
                        .collect();
                    self.train_sequence(&ids, &mut state, &mut rng, &mut schedule);
                }
                debug!(
                    "Epoch {}/{} complete (learning rate {:.5})",
                    epoch, self.config.epochs, schedule.current
                );
            }
        } else {
            info!("Token vector training disabled; keeping seeded initial vectors");
        }

        let reference_vectors = reference_vectors(corpus, &vocab, &state.syn0, &labels)?;
        corpus.reset();

        info!(
            "Training finished in {:.2?} ({} epochs, {} dimensions)",
            started.elapsed(),
            if self.config.train_word_vectors { self.config.epochs } else { 0 },
            dim
        );

        Ok(EmbeddingModel::new(
            self.config.clone(),
            vocab,
            state.syn0,
            labels,
            reference_vectors,
        ))
    }
}

/// Computes each label's reference vector: the normalized mean of its
/// documents' normalized centroids. Documents without known tokens are
/// ignored; a label without usable documents gets the zero vector.
fn reference_vectors(
    corpus: &mut dyn LabelAwareIterator,
    vocab: &Vocabulary,
    syn0: &Array2<f32>,
    labels: &crate::corpus::LabelSet,
) -> Result<Array2<f32>, TrainingError> {
    let dim = syn0.ncols();
    let mut centroids: Vec<Vec<Array1<f32>>> = vec![Vec::new(); labels.len()];

    corpus.reset();
    while corpus.has_next()? {
        let doc = corpus.next_document()?;
        let Some(label) = labels.index_of(&doc.label) else {
            warn!("Document labeled '{}' is not in the label set", doc.label);
            continue;
        };

        let mut sum = Array1::<f32>::zeros(dim);
        let mut known = 0usize;
        for token in tokenize(&doc.content) {
            if let Some(i) = vocab.index_of(&token) {
                sum += &syn0.row(i);
                known += 1;
            }
        }
        if known > 0 {
            centroids[label].push(normalize_vector(&(sum / known as f32)));
        }
    }

    let mut reference = Array2::zeros((labels.len(), dim));
    for (i, (label, docs)) in labels.iter().zip(&centroids).enumerate() {
        if docs.is_empty() {
            warn!("Label '{}' has no usable documents; its reference vector is zero", label);
            continue;
        }
        let prototype = normalize_vector(&average_vectors(docs, dim));
        reference.row_mut(i).assign(&prototype);
    }
    Ok(reference)
}

struct TrainingState {
    /// Token (input) vectors
    syn0: Array2<f32>,
    /// Output vectors for negative sampling
    syn1neg: Array2<f32>,
    sampler: NegativeSampler,
}

/// Linear decay from `learning_rate` to `min_learning_rate` over all
/// training tokens, updated every `batch_size` tokens.
struct LearningRate {
    start: f32,
    min: f32,
    total: u64,
    batch: u64,
    processed: u64,
    current: f32,
}

impl LearningRate {
    fn new(config: &TrainingConfig, total: u64) -> Self {
        Self {
            start: config.learning_rate,
            min: config.min_learning_rate,
            total: total.max(1),
            batch: config.batch_size as u64,
            processed: 0,
            current: config.learning_rate,
        }
    }

    fn step(&mut self) -> f32 {
        if self.processed % self.batch == 0 {
            let progress = self.processed as f32 / self.total as f32;
            self.current = (self.start - (self.start - self.min) * progress).max(self.min);
        }
        self.processed += 1;
        self.current
    }
}

fn sigmoid(x: f32) -> f32 {
    let x = x.clamp(-MAX_EXP, MAX_EXP);
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{IngestionError, TextEmbedding};
    use crate::corpus::{LabelSet, LabeledDocument};

    struct VecCorpus {
        docs: Vec<LabeledDocument>,
        position: usize,
        labels: LabelSet,
        resets: usize,
    }

    impl VecCorpus {
        fn new(docs: &[(&str, &str)]) -> Self {
            Self {
                docs: docs.iter().map(|(l, c)| LabeledDocument::new(*c, *l)).collect(),
                position: 0,
                labels: docs.iter().map(|(l, _)| *l).collect(),
                resets: 0,
            }
        }
    }

    impl LabelAwareIterator for VecCorpus {
        fn has_next(&mut self) -> Result<bool, IngestionError> {
            Ok(self.position < self.docs.len())
        }

        fn next_document(&mut self) -> Result<LabeledDocument, IngestionError> {
            let doc = self.docs.get(self.position).cloned().ok_or(IngestionError::Exhausted)?;
            self.position += 1;
            Ok(doc)
        }

        fn reset(&mut self) {
            self.position = 0;
            self.resets += 1;
        }

        fn labels(&self) -> &LabelSet {
            &self.labels
        }
    }

    fn corpus() -> VecCorpus {
        VecCorpus::new(&[
            ("spam", "buy cheap pills now"),
            ("spam", "cheap watches buy now today"),
            ("ham", "meeting moved to tomorrow at noon"),
            ("ham", "lunch with the team tomorrow"),
        ])
    }

    #[test]
    fn test_train_produces_reference_per_label() {
        let engine = ParagraphVectors::new(TrainingConfig::default().with_layer_size(16));
        let model = engine.train(&mut corpus()).unwrap();
        assert_eq!(model.labels().as_slice(), &["spam", "ham"]);
        assert_eq!(model.dimension(), 16);
        for label in ["spam", "ham"] {
            let v = model.reference_vector(label).unwrap();
            let norm = v.dot(&v).sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "{} norm {}", label, norm);
        }
        assert!(model.vocab().contains("cheap"));
    }

    #[test]
    fn test_training_is_deterministic() {
        let config = TrainingConfig::default().with_layer_size(8).with_epochs(3);
        let a = ParagraphVectors::new(config.clone()).train(&mut corpus()).unwrap();
        let b = ParagraphVectors::new(config).train(&mut corpus()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_training_streams_by_resetting() {
        let mut corpus = corpus();
        let config = TrainingConfig::default().with_layer_size(4).with_epochs(2);
        ParagraphVectors::new(config).train(&mut corpus).unwrap();
        // vocabulary pass + 2 epochs + reference pass + final rewind
        assert_eq!(corpus.resets, 5);
    }

    #[test]
    fn test_untrained_vectors_still_classify_by_overlap() {
        let config = TrainingConfig::default().with_train_word_vectors(false);
        let model = ParagraphVectors::new(config).train(&mut corpus()).unwrap();
        let doc = model.vectorize("cheap pills");
        let spam = model.reference_vector("spam").unwrap();
        let ham = model.reference_vector("ham").unwrap();
        assert!(doc.dot(&spam) > doc.dot(&ham));
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let mut empty = VecCorpus::new(&[]);
        assert!(matches!(
            ParagraphVectors::default().train(&mut empty),
            Err(TrainingError::EmptyCorpus(_))
        ));

        let mut no_tokens = VecCorpus::new(&[("a", "123 !!"), ("b", "")]);
        assert!(matches!(
            ParagraphVectors::default().train(&mut no_tokens),
            Err(TrainingError::EmptyCorpus(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let engine = ParagraphVectors::new(TrainingConfig::default().with_epochs(0));
        assert!(matches!(
            engine.train(&mut corpus()),
            Err(TrainingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_learning_rate_decays_to_floor() {
        let config = TrainingConfig { batch_size: 1, ..Default::default() };
        let mut schedule = LearningRate::new(&config, 10);
        let first = schedule.step();
        let mut last = first;
        for _ in 0..20 {
            last = schedule.step();
        }
        assert_eq!(first, config.learning_rate);
        assert_eq!(last, config.min_learning_rate);
    }
}
