use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::corpus::DEFAULT_BUFFER_CAPACITY;
use crate::model_store::ModelStore;
use crate::paragraph_vectors::TrainingConfig;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/labelwise.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Directories scanned for `<label>.<ext>` training files, in order
    pub source_dirs: Vec<PathBuf>,
    pub buffer_capacity: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source_dirs: vec![PathBuf::from("trainingData")],
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Where the trained model is persisted. Defaults to the models cache dir.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8099".to_string(),
        }
    }
}

impl Config {
    /// Checks every section, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.corpus.source_dirs.is_empty() {
            anyhow::bail!("corpus.source_dirs must name at least one directory");
        }
        if self.corpus.buffer_capacity == 0 {
            anyhow::bail!("corpus.buffer_capacity must be > 0");
        }
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }
        self.training
            .validate()
            .with_context(|| "Invalid [training] section")?;
        Ok(())
    }

    /// The model store described by `[model]`
    pub fn model_store(&self) -> ModelStore {
        match &self.model.path {
            Some(path) => ModelStore::new(path),
            None => ModelStore::new_default(),
        }
    }
}

/// Reads, parses and validates a TOML config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Like [`load_config`], but an absent file yields the built-in defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    info!("No config file at {}; using defaults", path.display());
    let config = Config::default();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let file = write_config(
            r#"
            [corpus]
            source_dirs = ["a", "b"]

            [training]
            epochs = 3
            "#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.corpus.source_dirs, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(config.corpus.buffer_capacity, 200);
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.training.layer_size, 100);
        assert_eq!(config.server.bind, "0.0.0.0:8099");
        assert!(config.model.path.is_none());
    }

    #[test]
    fn test_model_path_selects_store() {
        let file = write_config("[model]\npath = \"/tmp/lw/model.bin\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.model_store().model_path(),
            Path::new("/tmp/lw/model.bin")
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(load_config(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        for bad in [
            "[corpus]\nsource_dirs = []\n",
            "[corpus]\nbuffer_capacity = 0\n",
            "[server]\nbind = \"  \"\n",
            "[training]\nepochs = 0\n",
            "[training]\nlearning_rate = 0.01\nmin_learning_rate = 0.02\n",
            "[training]\nepochs = \"many\"\n",
        ] {
            let file = write_config(bad);
            assert!(load_config(file.path()).is_err(), "accepted: {}", bad);
        }
    }
}
