//! Label-aware training corpora.
//!
//! A corpus is consumed through the [`LabelAwareIterator`] capability so the
//! trainer does not care where documents come from. [`FileLabelAwareReader`]
//! is the file-backed source: one JSON file per label.

mod file_reader;

pub use file_reader::{label_for, CorpusFile, FileLabelAwareReader, FileLabelAwareReaderBuilder};

use crate::classifier::IngestionError;

/// Default number of documents the reader keeps buffered.
pub const DEFAULT_BUFFER_CAPACITY: usize = 200;

/// A normalized training document tagged with exactly one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledDocument {
    pub content: String,
    pub label: String,
}

impl LabeledDocument {
    pub fn new(content: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            label: label.into(),
        }
    }
}

/// Unique labels in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `label` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if self.contains(&label) {
            return false;
        }
        self.labels.push(label);
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = LabelSet::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

/// A resettable, pull-based stream of labeled documents.
///
/// `has_next` and `next_document` may block while the next source file is
/// read and parsed. Errors are fatal for the consumer's current pass.
pub trait LabelAwareIterator {
    /// Whether another document is available.
    fn has_next(&mut self) -> Result<bool, IngestionError>;

    /// Returns the next document, or [`IngestionError::Exhausted`] when none is left.
    fn next_document(&mut self) -> Result<LabeledDocument, IngestionError>;

    /// Rewinds to the first document and drops anything buffered.
    fn reset(&mut self);

    /// All labels this corpus can produce, known before streaming starts.
    fn labels(&self) -> &LabelSet;

    /// Adapts the stream into a standard iterator.
    fn documents(&mut self) -> Documents<'_>
    where
        Self: Sized,
    {
        Documents::new(self)
    }
}

/// Iterator over a [`LabelAwareIterator`]; stops after the first error.
pub struct Documents<'a> {
    inner: &'a mut (dyn LabelAwareIterator + 'a),
    done: bool,
}

impl<'a> Documents<'a> {
    pub fn new(inner: &'a mut (dyn LabelAwareIterator + 'a)) -> Self {
        Self { inner, done: false }
    }
}

impl Iterator for Documents<'_> {
    type Item = Result<LabeledDocument, IngestionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.inner.has_next() {
            Ok(true) => self.inner.next_document(),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}
