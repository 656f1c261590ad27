use std::fs;
use std::path::{Path, PathBuf};

use apparel::{ApparelClassifier, ClassifierBuilder, ClassifierError};

fn fixture_corpus() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/corpus.csv")
}

fn write_corpus(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("corpus.csv");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_second_build_refuses_to_overwrite() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut builder = ClassifierBuilder::new(fixture_corpus())
        .with_output_dir(dir.path())?
        .with_validation(false);
    let first = builder.build()?;
    let model_bytes = fs::read(&first.info.paths.model)?;
    let info_bytes = fs::read(&first.info.paths.info)?;

    // Same builder, same day
    assert!(matches!(builder.build(), Err(ClassifierError::OutputExists(_))));

    // A fresh builder fails as soon as the output directory is chosen
    let result = ClassifierBuilder::new(fixture_corpus()).with_output_dir(dir.path());
    assert!(matches!(result, Err(ClassifierError::OutputExists(_))));

    assert_eq!(fs::read(&first.info.paths.model)?, model_bytes);
    assert_eq!(fs::read(&first.info.paths.info)?, info_bytes);
    Ok(())
}

#[test]
fn test_existing_metadata_alone_blocks_build() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut builder = ClassifierBuilder::new(fixture_corpus())
        .with_output_dir(dir.path())?
        .with_validation(false);
    let first = builder.build()?;
    fs::remove_file(&first.info.paths.model)?;

    let result = ClassifierBuilder::new(fixture_corpus()).with_output_dir(dir.path());
    match result {
        Err(ClassifierError::OutputExists(path)) => assert_eq!(path, first.info.paths.info),
        other => panic!("expected OutputExists, got {:?}", other.map(|_| ())),
    }
    assert!(!first.info.paths.model.exists());
    Ok(())
}

#[test]
fn test_missing_corpus() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut builder = ClassifierBuilder::new(dir.path().join("missing.csv")).with_output_dir(dir.path())?;
    assert!(matches!(builder.build(), Err(ClassifierError::CorpusRead(_))));
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_corpus_without_category_column() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let corpus = write_corpus(dir.path(), "name,description\nLeather Tote,A bag\n");
    let mut builder = ClassifierBuilder::new(corpus).with_output_dir(dir.path())?;
    assert!(matches!(builder.build(), Err(ClassifierError::CorpusRead(_))));
    Ok(())
}

#[test]
fn test_single_label_corpus() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let corpus = write_corpus(dir.path(), "category,name\nbags,Leather Tote\nbags,Canvas Tote\n");
    let mut builder = ClassifierBuilder::new(corpus)
        .with_output_dir(dir.path())?
        .with_validation(false);
    assert!(matches!(builder.build(), Err(ClassifierError::Training(_))));
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}

#[test]
fn test_small_corpus_cannot_be_validated() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let corpus = write_corpus(dir.path(), "category,name\nbags,Leather Tote\nshoes,Running Shoes\n");

    let mut builder = ClassifierBuilder::new(&corpus)
        .with_output_dir(dir.path())?
        .with_validation(true);
    assert!(matches!(builder.build(), Err(ClassifierError::Training(_))));
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);

    let mut builder = ClassifierBuilder::new(&corpus)
        .with_output_dir(dir.path())?
        .with_validation(false);
    assert!(builder.build().is_ok());
    Ok(())
}

#[test]
fn test_corrupt_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("model.bin");
    fs::write(&path, "corrupted data")?;
    assert!(matches!(ApparelClassifier::new(&path), Err(ClassifierError::ModelLoad(_))));

    fs::write(&path, [])?;
    assert!(matches!(ApparelClassifier::new(&path), Err(ClassifierError::ModelLoad(_))));
    Ok(())
}

#[test]
fn test_truncated_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut builder = ClassifierBuilder::new(fixture_corpus())
        .with_output_dir(dir.path())?
        .with_validation(false);
    let result = builder.build()?;

    let bytes = fs::read(&result.info.paths.model)?;
    let truncated = dir.path().join("truncated.bin");
    fs::write(&truncated, &bytes[..bytes.len() / 2])?;
    assert!(matches!(ApparelClassifier::new(&truncated), Err(ClassifierError::ModelLoad(_))));
    Ok(())
}
