#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use labelwise::{ClassificationService, TrainingConfig};
use tempfile::TempDir;

/// Writes `answers` as a `[{"Answer": ...}]` collection to `dir/file`.
pub fn write_collection(dir: &Path, file: &str, answers: &[&str]) {
    let records: Vec<_> = answers
        .iter()
        .map(|a| serde_json::json!({ "Answer": a, "Id": 1 }))
        .collect();
    fs::write(dir.join(file), serde_json::to_string_pretty(&records).unwrap()).unwrap();
}

/// A scratch area with a `data/` training directory and a model path.
pub struct Workspace {
    pub root: TempDir,
    pub data: PathBuf,
    pub model_path: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        fs::create_dir(&data).unwrap();
        let model_path = root.path().join("models").join("labelwise.model");
        Self {
            root,
            data,
            model_path,
        }
    }

    /// Two spam and two ham documents
    pub fn spam_ham() -> Self {
        let ws = Self::new();
        write_collection(
            &ws.data,
            "spam.json",
            &[
                "<p>Buy cheap pills now!</p>",
                "Cheap watches, <b>buy now</b> while stocks last",
            ],
        );
        write_collection(
            &ws.data,
            "ham.json",
            &[
                "The meeting moved to tomorrow at noon",
                "Lunch with the project team tomorrow",
            ],
        );
        ws
    }

    pub fn service(&self) -> ClassificationService {
        self.service_with(quick_config())
    }

    pub fn service_with(&self, config: TrainingConfig) -> ClassificationService {
        ClassificationService::builder()
            .add_source_folder(&self.data)
            .with_training_config(config)
            .with_model_path(&self.model_path)
            .build()
            .unwrap()
    }

    pub fn ready_service(&self) -> ClassificationService {
        let mut service = self.service();
        service.start(false).unwrap();
        service
    }
}

/// Small but complete training settings for fast tests
pub fn quick_config() -> TrainingConfig {
    TrainingConfig::default().with_layer_size(32).with_epochs(10)
}

pub const SAMPLE_INPUTS: &[&str] = &[
    "buy now cheap",
    "",
    "<div>meeting <i>tomorrow</i></div>",
    "completely unrelated words",
    "cheap lunch meeting",
];
