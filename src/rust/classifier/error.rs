use std::io;
use std::path::PathBuf;

/// Represents the different types of errors that can occur while building or using the classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The corpus could not be opened, or a row/header is malformed
    #[error("Corpus read error: {0}")]
    CorpusRead(String),
    /// The featureset cannot support training (empty, or fewer than two labels)
    #[error("Training error: {0}")]
    Training(String),
    /// A build would overwrite an existing model or metadata file
    #[error("Can't overwrite file at '{}'!", .0.display())]
    OutputExists(PathBuf),
    /// The model artifact is missing, truncated or not a model this crate wrote
    #[error("Model load error: {0}")]
    ModelLoad(String),
    /// Failed to encode the model artifact or the metadata record
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<csv::Error> for ClassifierError {
    fn from(err: csv::Error) -> Self {
        ClassifierError::CorpusRead(err.to_string())
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::Serialization(err.to_string())
    }
}
