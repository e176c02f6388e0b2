use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::classifier::LoadFailure;
use crate::paragraph_vectors::EmbeddingModel;

/// File name of the persisted model inside the models directory.
pub const DEFAULT_MODEL_FILE: &str = "labelwise.model";

/// Reads and writes the persisted [`EmbeddingModel`] at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    model_path: PathBuf,
}

impl ModelStore {
    /// A store at [`DEFAULT_MODEL_FILE`] under the default models directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_models_dir().join(DEFAULT_MODEL_FILE))
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        Self::default_models_dir_from(env::var_os("LABELWISE_CACHE"))
    }

    /// Resolves the models directory from the value of `LABELWISE_CACHE`, if set.
    fn default_models_dir_from(cache_env: Option<OsString>) -> PathBuf {
        if let Some(path) = cache_env.filter(|path| !path.is_empty()) {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("labelwise").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("labelwise").join("models");
        }

        env::temp_dir().join("labelwise").join("models")
    }

    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_model_persisted(&self) -> bool {
        self.model_path.is_file()
    }

    /// Writes the model next to its final path, then renames it into place,
    /// so readers never see a half-written file.
    pub fn persist(&self, model: &EmbeddingModel) -> io::Result<()> {
        if let Some(parent) = self.model_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = model.persist();
        let tmp_path = self.temp_path();
        fs::write(&tmp_path, &bytes)?;
        if let Err(e) = fs::rename(&tmp_path, &self.model_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        info!(
            "Persisted model to {:?} ({} bytes, sha256 {})",
            self.model_path,
            bytes.len(),
            file_digest(&bytes)
        );
        Ok(())
    }

    /// Loads the persisted model.
    ///
    /// # Errors
    /// `LoadFailure::Missing` when nothing has been persisted yet; any other
    /// variant means the file exists but cannot be used.
    pub fn restore(&self) -> Result<EmbeddingModel, LoadFailure> {
        let bytes = match fs::read(&self.model_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LoadFailure::Missing(self.model_path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        debug!(
            "Read {} bytes from {:?} (sha256 {})",
            bytes.len(),
            self.model_path,
            file_digest(&bytes)
        );

        let model = EmbeddingModel::restore(&bytes)?;
        info!("Restored model from {:?}", self.model_path);
        Ok(model)
    }

    /// Deletes the persisted model. A missing file is not an error.
    pub fn remove_model(&self) -> io::Result<()> {
        match fs::remove_file(&self.model_path) {
            Ok(()) => {
                info!("Removed persisted model {:?}", self.model_path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .model_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_MODEL_FILE.into());
        name.push(".tmp");
        self.model_path.with_file_name(name)
    }
}

fn file_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dir_honours_cache_override() {
        let dir = tempfile::tempdir().unwrap();
        let default_dir = ModelStore::default_models_dir_from(Some(dir.path().into()));
        assert_eq!(default_dir, dir.path().join("models"));
    }

    #[test]
    fn test_default_dir_without_override() {
        let unset = ModelStore::default_models_dir_from(None);
        assert!(unset.ends_with(Path::new("labelwise").join("models")));
        assert_eq!(ModelStore::default_models_dir_from(Some(OsString::new())), unset);
    }

    #[test]
    fn test_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("nested").join("model.bin"));
        assert!(!store.is_model_persisted());
        assert!(matches!(store.restore(), Err(LoadFailure::Missing(_))));
        assert!(store.remove_model().is_ok());
    }

    #[test]
    fn test_corrupt_file_is_not_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("model.bin"));
        fs::write(store.model_path(), b"corrupted data").unwrap();
        assert!(store.is_model_persisted());
        assert!(matches!(store.restore(), Err(LoadFailure::Corrupt(_))));
    }

    #[test]
    fn test_temp_path_is_a_sibling() {
        let store = ModelStore::new("/var/lib/labelwise/model.bin");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/var/lib/labelwise/model.bin.tmp")
        );
    }
}
