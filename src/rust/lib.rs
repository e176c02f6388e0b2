//! Label-aware text classification trained from example corpora.
//!
//! Training data is one JSON file per label (`spam.json`, `ham.json`, ...),
//! each an array of `{"Answer": "..."}` records. The service learns token
//! vectors from every document, represents each label by the centroid of its
//! documents and ranks new documents by cosine similarity.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use labelwise::ClassificationService;
//!
//! let mut service = ClassificationService::builder()
//!     .add_source_folder("trainingData")
//!     .with_model_path("models/labelwise.model")
//!     .build()?;
//!
//! // Restore the persisted model, or train and persist a new one
//! service.start(false)?;
//!
//! for entry in service.classify("Cheap watches, <b>buy now</b>!")? {
//!     println!("{}: {:.3}", entry.label, entry.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A ready service is immutable and can be shared across threads using `Arc`:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use labelwise::ClassificationService;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let mut service = ClassificationService::builder()
//!     .add_source_folder("trainingData")
//!     .build()?;
//! service.start(false)?;
//! let service = Arc::new(service);
//!
//! let handles: Vec<_> = (0..3)
//!     .map(|_| {
//!         let service = Arc::clone(&service);
//!         thread::spawn(move || service.classify("test text").map(|r| r.len()))
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod model_store;
pub mod normalizer;
pub mod paragraph_vectors;
pub mod server;
pub mod tokenizer;

pub use classifier::{
    score, ClassificationResult, ClassificationService, ClassificationServiceBuilder,
    ClassifierInfo, EmbeddingEngine, IngestionError, LabelScore, LoadFailure, RequestError,
    ServiceError, ServiceStatus, TextEmbedding, TrainingError,
};
pub use config::{load_config, load_or_default, Config};
pub use corpus::{FileLabelAwareReader, LabelAwareIterator, LabelSet, LabeledDocument};
pub use model_store::ModelStore;
pub use normalizer::normalize;
pub use paragraph_vectors::{EmbeddingModel, ParagraphVectors, TrainingConfig};
pub use tokenizer::tokenize;

pub fn init_logger() {
    env_logger::init();
}
