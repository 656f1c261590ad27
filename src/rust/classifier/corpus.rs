use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Deserialize;

use super::error::ClassifierError;
use super::features::{FeatureSet, Featurizer};

/// Column holding the label of each row.
pub const LABEL_COLUMN: &str = "category";

/// One corpus row. Description and keywords are optional columns.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
}

/// Reads a labeled CSV corpus and featurizes every row, in file order.
///
/// # Errors
/// - `CorpusRead` if the file can't be opened or parsed
/// - `CorpusRead` if the header lacks a `category` or `name` column
/// - `CorpusRead` if any row has an empty category
pub fn read_featureset(path: &Path, featurizer: &dyn Featurizer) -> Result<FeatureSet, ClassifierError> {
    let file = File::open(path)
        .map_err(|e| ClassifierError::CorpusRead(format!("Failed to open '{}': {}", path.display(), e)))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(file);

    let headers = reader.headers()?.clone();
    for required in [LABEL_COLUMN, "name"] {
        if !headers.iter().any(|h| h == required) {
            return Err(ClassifierError::CorpusRead(format!(
                "'{}' has no '{}' column",
                path.display(),
                required
            )));
        }
    }

    let mut featureset = FeatureSet::new();
    for (row, record) in reader.deserialize::<ProductRecord>().enumerate() {
        let record = record?;
        if record.category.trim().is_empty() {
            return Err(ClassifierError::CorpusRead(format!(
                "Row {} of '{}' has no category",
                row + 1,
                path.display()
            )));
        }
        let features = featurizer.featurize(
            &record.name,
            record.description.as_deref(),
            record.keywords.as_deref(),
        );
        featureset.push((features, record.category));
    }

    debug!("Read {} rows from {:?}", featureset.len(), path);
    Ok(featureset)
}

/// Featurizes a corpus once and hands out the cached result afterwards.
#[derive(Debug, Clone)]
pub struct Corpus {
    path: PathBuf,
    featureset: Option<FeatureSet>,
    elapsed: Option<Duration>,
}

impl Corpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            featureset: None,
            elapsed: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the featureset, reading the file on first use only.
    pub fn featureset(&mut self, featurizer: &dyn Featurizer) -> Result<&FeatureSet, ClassifierError> {
        if self.featureset.is_none() {
            info!("Extracting features from {:?}", self.path);
            let start = Instant::now();
            let featureset = read_featureset(&self.path, featurizer)?;
            let elapsed = start.elapsed();
            info!("Extracted features for {} rows in {:.2?}", featureset.len(), elapsed);
            self.elapsed = Some(elapsed);
            self.featureset = Some(featureset);
        } else {
            info!("Using cached features for {:?}", self.path);
        }
        Ok(self.featureset.get_or_insert_with(FeatureSet::new))
    }

    /// Time spent on the first (uncached) read, if it happened
    pub fn extraction_time(&self) -> Option<Duration> {
        self.elapsed
    }

    pub fn is_loaded(&self) -> bool {
        self.featureset.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProductFeatures;
    use std::io::Write;

    fn write_corpus(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_rows_in_file_order() {
        let file = write_corpus(
            "category,name,description,keywords\n\
             bags,Leather Tote,A roomy bag,handbag\n\
             shoes,Running Shoes,,sneaker\n",
        );
        let featureset = read_featureset(file.path(), &ProductFeatures::new()).unwrap();
        assert_eq!(featureset.len(), 2);
        assert_eq!(featureset[0].1, "bags");
        assert!(featureset[0].0.contains_key("roomy"));
        assert!(featureset[0].0.contains_key("KEYWORD(handbag)"));
        assert_eq!(featureset[1].1, "shoes");
        assert!(featureset[1].0.contains_key("shoe"));
    }

    #[test]
    fn test_optional_columns() {
        let file = write_corpus("name,category\nCanvas Tote,bags\n");
        let featureset = read_featureset(file.path(), &ProductFeatures::new()).unwrap();
        assert_eq!(featureset.len(), 1);
        assert!(featureset[0].0.contains_key("tote"));
    }

    #[test]
    fn test_missing_category_column() {
        let file = write_corpus("name,description\nCanvas Tote,bag\n");
        let result = read_featureset(file.path(), &ProductFeatures::new());
        assert!(matches!(result, Err(ClassifierError::CorpusRead(_))));
    }

    #[test]
    fn test_empty_category() {
        let file = write_corpus("category,name\nbags,Tote\n,Sneaker\n");
        let result = read_featureset(file.path(), &ProductFeatures::new());
        assert!(matches!(result, Err(ClassifierError::CorpusRead(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = read_featureset(Path::new("/nonexistent/corpus.csv"), &ProductFeatures::new());
        assert!(matches!(result, Err(ClassifierError::CorpusRead(_))));
    }

    #[test]
    fn test_featureset_is_cached() {
        let file = write_corpus("category,name\nbags,Tote\nshoes,Sneaker\n");
        let featurizer = ProductFeatures::new();
        let mut corpus = Corpus::new(file.path());
        assert!(!corpus.is_loaded());
        assert_eq!(corpus.featureset(&featurizer).unwrap().len(), 2);

        // The cache survives the file going away
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
        assert_eq!(corpus.featureset(&featurizer).unwrap().len(), 2);
        assert!(corpus.extraction_time().is_some());
    }
}
