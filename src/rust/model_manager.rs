use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{BuildInfo, ClassifierError, Featurizer, FeaturizerSettings, MaxentClassifier, ProductFeatures};

/// Version of the on-disk model layout this crate reads and writes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Date stamp used in artifact file names (year, day, month).
pub const FILE_DATE_FORMAT: &str = "%Y-%d-%m";

/// What gets written to a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Identifier of the featurizer the model was trained with
    pub featurizer: String,
    /// How that featurizer was configured
    pub settings: FeaturizerSettings,
    pub classifier: MaxentClassifier,
}

impl ModelArtifact {
    pub fn new(featurizer: &ProductFeatures, classifier: MaxentClassifier) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            featurizer: featurizer.name().to_string(),
            settings: featurizer.settings(),
            classifier,
        }
    }

    /// Rebuilds the featurizer the model was trained with.
    ///
    /// # Errors
    /// - `ModelLoad` if the artifact names a featurizer or lemmatizer this crate doesn't provide
    pub fn featurizer(&self) -> Result<ProductFeatures, ClassifierError> {
        let featurizer = ProductFeatures::from_settings(&self.settings)?;
        if self.featurizer != featurizer.name() {
            return Err(ClassifierError::ModelLoad(format!(
                "Model was built with featurizer '{}', expected '{}'",
                self.featurizer,
                featurizer.name()
            )));
        }
        Ok(featurizer)
    }
}

/// The pair of files one build produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub model: PathBuf,
    pub info: PathBuf,
}

/// Names, writes and reads model artifacts and their metadata.
///
/// Files are never overwritten: writing to a path that already exists fails
/// with `OutputExists`.
#[derive(Debug, Clone)]
pub struct ModelManager {
    output_dir: PathBuf,
}

impl ModelManager {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Paths of the model and metadata files for a build on `date`
    pub fn paths_for(&self, date: NaiveDate) -> OutputPaths {
        let stamp = date.format(FILE_DATE_FORMAT);
        OutputPaths {
            model: self.output_dir.join(format!("model-{}.bin", stamp)),
            info: self.output_dir.join(format!("info-{}.json", stamp)),
        }
    }

    /// Today's output paths, failing if either file already exists
    pub fn output_paths(&self) -> Result<OutputPaths, ClassifierError> {
        let paths = self.paths_for(Local::now().date_naive());
        Self::ensure_absent(&paths)?;
        Ok(paths)
    }

    pub fn ensure_absent(paths: &OutputPaths) -> Result<(), ClassifierError> {
        for path in [&paths.model, &paths.info] {
            if path.exists() {
                log::error!("Refusing to overwrite {:?}", path);
                return Err(ClassifierError::OutputExists(path.clone()));
            }
        }
        Ok(())
    }

    /// Writes a model artifact and returns the SHA-256 of the bytes written
    pub fn save_model(&self, path: &Path, artifact: &ModelArtifact) -> Result<String, ClassifierError> {
        let start = Instant::now();
        let bytes = bincode::serialize(artifact)
            .map_err(|e| ClassifierError::Serialization(format!("Failed to encode model: {}", e)))?;
        log::info!("Writing {} bytes to {:?}", bytes.len(), path);
        write_new(path, |writer| writer.write_all(&bytes))?;
        log::info!("Wrote model in {:.2?}", start.elapsed());
        Ok(sha256_hex(&bytes))
    }

    /// Writes a build metadata record as pretty-printed JSON
    pub fn save_info(&self, path: &Path, info: &BuildInfo) -> Result<(), ClassifierError> {
        let start = Instant::now();
        let json = serde_json::to_vec_pretty(info)?;
        log::info!("Writing build information to {:?}", path);
        write_new(path, |writer| writer.write_all(&json))?;
        log::info!("Wrote build information in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Reads a model artifact written by [`ModelManager::save_model`].
    ///
    /// # Errors
    /// - `ModelLoad` if the file is missing, can't be decoded, or has an unknown format version
    pub fn load_model(path: &Path) -> Result<ModelArtifact, ClassifierError> {
        let bytes = fs::read(path)
            .map_err(|e| ClassifierError::ModelLoad(format!("Failed to read '{}': {}", path.display(), e)))?;
        log::debug!("Read {} bytes from {:?}", bytes.len(), path);

        let artifact: ModelArtifact = bincode::deserialize(&bytes).map_err(|e| {
            ClassifierError::ModelLoad(format!("'{}' is not a valid model: {}", path.display(), e))
        })?;
        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(ClassifierError::ModelLoad(format!(
                "'{}' has model format version {}, expected {}",
                path.display(),
                artifact.format_version,
                MODEL_FORMAT_VERSION
            )));
        }
        Ok(artifact)
    }

    /// Checks a model file against the checksum recorded at build time
    pub fn verify(path: &Path, expected_hash: &str) -> Result<bool, ClassifierError> {
        log::info!("Verifying file: {:?}", path);
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        Ok(hash == expected_hash)
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Creates `path` (which must not exist), runs `write` against it and
/// removes the file again if anything fails part way.
fn write_new<F>(path: &Path, write: F) -> Result<(), ClassifierError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(ClassifierError::OutputExists(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut writer = BufWriter::new(file);
    let result = write(&mut writer)
        .and_then(|_| writer.flush())
        .and_then(|_| writer.get_ref().sync_all());
    drop(writer);

    if let Err(e) = result {
        log::error!("Failed to write {:?}: {}", path, e);
        let _ = fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_use_year_day_month() {
        let manager = ModelManager::new("/tmp/models");
        let date = NaiveDate::from_ymd_opt(2015, 2, 5).unwrap();
        let paths = manager.paths_for(date);
        assert_eq!(paths.model, PathBuf::from("/tmp/models/model-2015-05-02.bin"));
        assert_eq!(paths.info, PathBuf::from("/tmp/models/info-2015-05-02.json"));
    }

    #[test]
    fn test_write_new_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"first").unwrap();

        let result = write_new(&path, |w| w.write_all(b"second"));
        assert!(matches!(result, Err(ClassifierError::OutputExists(_))));
        assert_eq!(fs::read(&path).unwrap(), b"first");
    }

    #[test]
    fn test_write_new_cleans_up_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let result = write_new(&path, |_| Err(io::Error::new(io::ErrorKind::Other, "disk full")));
        assert!(matches!(result, Err(ClassifierError::Io(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, "corrupted data").unwrap();
        assert!(matches!(ModelManager::load_model(&path), Err(ClassifierError::ModelLoad(_))));
        assert!(matches!(
            ModelManager::load_model(&dir.path().join("missing.bin")),
            Err(ClassifierError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
