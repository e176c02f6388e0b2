use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;

use super::{LabelAwareIterator, LabelSet, LabeledDocument, DEFAULT_BUFFER_CAPACITY};
use crate::classifier::IngestionError;
use crate::normalizer::normalize;

/// A training file and the label derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub path: PathBuf,
    pub label: String,
}

/// One record of a training file. Only `Answer` is interpreted.
#[derive(Debug, Deserialize)]
struct TrainingRecord {
    #[serde(rename = "Answer")]
    answer: String,
}

/// Records of the current file that have not been moved into the buffer yet.
#[derive(Debug)]
struct PendingFile {
    label: String,
    records: std::vec::IntoIter<TrainingRecord>,
}

/// Derives a label from a file name: everything before the last `.`.
///
/// Returns `None` for names without an extension, names whose label would be
/// empty (`.gitkeep`) and names that are not valid UTF-8.
///
/// ```
/// use std::path::Path;
/// use labelwise::corpus::label_for;
///
/// assert_eq!(label_for(Path::new("data/spam.json")).as_deref(), Some("spam"));
/// assert_eq!(label_for(Path::new("data/v1.ham.json")).as_deref(), Some("v1.ham"));
/// assert_eq!(label_for(Path::new("data/README")), None);
/// ```
pub fn label_for(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    match name.rfind('.') {
        Some(dot) if dot > 0 => Some(name[..dot].to_string()),
        _ => None,
    }
}

/// Streams labeled documents from one JSON file per label.
///
/// Files are parsed one at a time, only when the buffer runs dry, and the
/// buffer never holds more than `capacity` documents. Documents are emitted in
/// file order, then record order within each file.
///
/// # Example
/// ```no_run
/// use labelwise::corpus::{FileLabelAwareReader, LabelAwareIterator};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut reader = FileLabelAwareReader::builder()
///     .add_source_folder("trainingData")
///     .build();
///
/// println!("labels: {:?}", reader.labels().as_slice());
/// while reader.has_next()? {
///     let doc = reader.next_document()?;
///     println!("{}: {}", doc.label, doc.content);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileLabelAwareReader {
    files: Vec<CorpusFile>,
    labels: LabelSet,
    capacity: usize,
    position: usize,
    buffer: VecDeque<LabeledDocument>,
    pending: Option<PendingFile>,
}

impl FileLabelAwareReader {
    /// Creates a builder for scanning source folders
    pub fn builder() -> FileLabelAwareReaderBuilder {
        FileLabelAwareReaderBuilder::new()
    }

    /// The ordered list of files this reader streams
    pub fn files(&self) -> &[CorpusFile] {
        &self.files
    }

    /// Maximum number of buffered documents
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of documents currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn fill_buffer(&mut self) -> Result<(), IngestionError> {
        while self.buffer.is_empty() {
            if let Some(pending) = self.pending.as_mut() {
                while self.buffer.len() < self.capacity {
                    let Some(record) = pending.records.next() else {
                        break;
                    };
                    self.buffer.push_back(LabeledDocument::new(
                        normalize(&record.answer),
                        pending.label.clone(),
                    ));
                }
                let drained = pending.records.len() == 0;
                if drained {
                    self.pending = None;
                }
                continue;
            }

            let Some(file) = self.files.get(self.position) else {
                return Ok(());
            };
            self.position += 1;

            let records = read_collection(&file.path)?;
            debug!(
                "Parsed {} documents for label '{}' from {:?}",
                records.len(),
                file.label,
                file.path
            );
            self.pending = Some(PendingFile {
                label: file.label.clone(),
                records: records.into_iter(),
            });
        }
        Ok(())
    }
}

impl LabelAwareIterator for FileLabelAwareReader {
    fn has_next(&mut self) -> Result<bool, IngestionError> {
        self.fill_buffer()?;
        Ok(!self.buffer.is_empty())
    }

    fn next_document(&mut self) -> Result<LabeledDocument, IngestionError> {
        self.fill_buffer()?;
        self.buffer.pop_front().ok_or(IngestionError::Exhausted)
    }

    fn reset(&mut self) {
        self.position = 0;
        self.buffer.clear();
        self.pending = None;
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

/// Reads and parses a whole training file.
fn read_collection(path: &Path) -> Result<Vec<TrainingRecord>, IngestionError> {
    let content = fs::read_to_string(path).map_err(|source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Syntax errors are `Parse`, shape errors are `Format`.
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| IngestionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_value::<Vec<TrainingRecord>>(value).map_err(|e| IngestionError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Builder that scans source folders for training files.
#[derive(Debug, Default, Clone)]
pub struct FileLabelAwareReaderBuilder {
    folders: Vec<PathBuf>,
    buffer_capacity: Option<usize>,
}

impl FileLabelAwareReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a folder to scan. Folders are scanned in the order they are added.
    pub fn add_source_folder(mut self, folder: impl AsRef<Path>) -> Self {
        self.folders.push(folder.as_ref().to_path_buf());
        self
    }

    /// Sets the maximum number of buffered documents (at least 1)
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity.max(1));
        self
    }

    /// Scans every folder and builds the reader.
    ///
    /// Paths that are not directories, or cannot be listed, are skipped.
    /// Within a folder only regular files are considered, sorted by file name
    /// so the label order and document order are reproducible across
    /// platforms.
    pub fn build(self) -> FileLabelAwareReader {
        let mut files = Vec::new();
        let mut labels = LabelSet::new();

        for folder in &self.folders {
            if !folder.is_dir() {
                debug!("Skipping {:?}: not a directory", folder);
                continue;
            }

            let mut paths: Vec<PathBuf> = match fs::read_dir(folder) {
                Ok(entries) => entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| path.is_file())
                    .collect(),
                Err(e) => {
                    warn!("Skipping {:?}: cannot list directory: {}", folder, e);
                    continue;
                }
            };
            paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

            for path in paths {
                let Some(label) = label_for(&path) else {
                    warn!("Skipping {:?}: file name has no label extension", path);
                    continue;
                };
                labels.insert(label.as_str());
                files.push(CorpusFile { path, label });
            }
        }

        info!(
            "Scanned {} folder(s): {} training file(s), {} label(s)",
            self.folders.len(),
            files.len(),
            labels.len()
        );

        FileLabelAwareReader {
            files,
            labels,
            capacity: self.buffer_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY),
            position: 0,
            buffer: VecDeque::new(),
            pending: None,
        }
    }
}
