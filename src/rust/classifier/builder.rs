use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use log::{error, info};

use super::corpus::Corpus;
use super::error::ClassifierError;
use super::classifier::ApparelClassifier;
use super::features::{FeatureSet, Featurizer, FeaturizerSettings, ProductFeatures};
use super::metadata::{ArtifactPaths, BuildInfo, ComponentNames, Timer, SCHEMA_VERSION};
use super::model::{MaxentClassifier, ProbabilisticClassifier};
use super::trainer::Trainer;
use super::validation::cross_validate;
use crate::{ModelArtifact, ModelManager, TrainingConfig};

/// Phases of a build, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Init,
    Featurizing,
    Training,
    Validating,
    WritingModel,
    WritingMetadata,
    Done,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Featurizing => "featurizing",
            Self::Training => "training",
            Self::Validating => "validating",
            Self::WritingModel => "writing model",
            Self::WritingMetadata => "writing metadata",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a successful build hands back: the record written to disk and the
/// model that was persisted.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub info: BuildInfo,
    pub classifier: MaxentClassifier,
    /// Featurizer configuration saved with the model
    pub featurizer: FeaturizerSettings,
}

impl BuildResult {
    /// An in-memory classifier that featurizes the way the build did
    pub fn into_classifier(self) -> Result<ApparelClassifier, ClassifierError> {
        let featurizer = ProductFeatures::from_settings(&self.featurizer)?;
        Ok(ApparelClassifier::from_parts(self.classifier, featurizer))
    }
}

/// Builds a maximum entropy model from a labeled CSV corpus and writes it,
/// with a metadata record, to an output directory.
///
/// Two files are written, `model-<YYYY-DD-MM>.bin` and `info-<YYYY-DD-MM>.json`.
/// A build refuses to start if either already exists, and writes nothing
/// unless featurizing, training and (optional) validation all succeed.
///
/// ```no_run
/// use apparel::ClassifierBuilder;
///
/// # fn main() -> Result<(), apparel::ClassifierError> {
/// let mut builder = ClassifierBuilder::new("fixtures/products.csv")
///     .with_output_dir("models")?
///     .with_validation(true);
/// let result = builder.build()?;
/// println!("accuracy: {:?}", result.info.accuracy);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ClassifierBuilder {
    corpus: Corpus,
    featurizer: ProductFeatures,
    trainer: Trainer,
    manager: ModelManager,
    validate: bool,
    state: BuildState,
}

impl ClassifierBuilder {
    /// Creates a builder for `corpus` writing into the current directory, with validation on
    pub fn new(corpus: impl Into<PathBuf>) -> Self {
        Self {
            corpus: Corpus::new(corpus),
            featurizer: ProductFeatures::new(),
            trainer: Trainer::default(),
            manager: ModelManager::new("."),
            validate: true,
            state: BuildState::Init,
        }
    }

    /// Sets the directory the model and metadata are written to.
    ///
    /// # Errors
    /// - `OutputExists` if today's model or metadata file is already there
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        self.manager = ModelManager::new(dir);
        self.manager.output_paths()?;
        Ok(self)
    }

    /// Turns cross validation on or off
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_training_config(mut self, config: TrainingConfig) -> Self {
        self.trainer = Trainer::new(config);
        self
    }

    pub fn with_featurizer(mut self, featurizer: ProductFeatures) -> Self {
        self.featurizer = featurizer;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn corpus_path(&self) -> &Path {
        self.corpus.path()
    }

    /// Featurized corpus, read on first call and cached afterwards
    pub fn featureset(&mut self) -> Result<&FeatureSet, ClassifierError> {
        self.corpus.featureset(&self.featurizer)
    }

    /// Trains a model on the whole corpus without writing anything
    pub fn train(&mut self) -> Result<(MaxentClassifier, Duration), ClassifierError> {
        let featureset = self.corpus.featureset(&self.featurizer)?;
        self.trainer.train(featureset)
    }

    /// Estimates accuracy on a random held-out tenth of the corpus
    pub fn cross_validate(&mut self) -> Result<(f64, Duration), ClassifierError> {
        let featureset = self.corpus.featureset(&self.featurizer)?;
        cross_validate(&self.trainer, featureset)
    }

    /// Runs the whole build and writes the model and metadata files.
    ///
    /// # Errors
    /// - `OutputExists` if today's files already exist in the output directory
    /// - `CorpusRead` if the corpus can't be read
    /// - `Training` if the corpus (or its training partition) has fewer than two labels
    /// - `Io` / `Serialization` if writing fails; nothing is left behind in that case
    pub fn build(&mut self) -> Result<BuildResult, ClassifierError> {
        self.state = BuildState::Init;
        let result = self.run();
        if let Err(e) = &result {
            error!("Build failed while {}: {}", self.state, e);
            self.state = BuildState::Failed;
        }
        result
    }

    fn run(&mut self) -> Result<BuildResult, ClassifierError> {
        let paths = self.manager.output_paths()?;
        let started = Local::now();
        let start = Instant::now();
        info!("=== Starting build from {:?} ===", self.corpus.path());

        self.state = BuildState::Featurizing;
        let featureset = self.corpus.featureset(&self.featurizer)?;

        self.state = BuildState::Training;
        let (classifier, training_time) = self.trainer.train(featureset)?;

        let (accuracy, validation_time) = if self.validate {
            self.state = BuildState::Validating;
            let (accuracy, elapsed) = cross_validate(&self.trainer, featureset)?;
            (Some(accuracy), Some(elapsed))
        } else {
            info!("Skipping validation");
            (None, None)
        };
        let examples = featureset.len();
        let feature_time = self.corpus.extraction_time().unwrap_or_default();

        self.state = BuildState::WritingModel;
        let artifact = ModelArtifact::new(&self.featurizer, classifier);
        let checksum = self.manager.save_model(&paths.model, &artifact)?;

        let finished = Local::now();
        let build_time = start.elapsed();

        self.state = BuildState::WritingMetadata;
        let info = BuildInfo {
            version: crate::VERSION.to_string(),
            schema_version: SCHEMA_VERSION,
            started: BuildInfo::format_timestamp(&started),
            finished: BuildInfo::format_timestamp(&finished),
            accuracy,
            validated: self.validate,
            corpus: self.corpus.path().to_path_buf(),
            paths: ArtifactPaths {
                model: paths.model.clone(),
                info: paths.info.clone(),
            },
            classes: ComponentNames {
                classifier: "MaxentClassifier".to_string(),
                features: self.featurizer.name().to_string(),
                lemmatizer: artifact.settings.lemmatizer.clone(),
            },
            training: *self.trainer.config(),
            timer: Timer::new(build_time, feature_time, training_time, validation_time),
            checksum,
            labels: artifact.classifier.labels().to_vec(),
            examples,
        };
        if let Err(e) = self.manager.save_info(&paths.info, &info) {
            let _ = std::fs::remove_file(&paths.model);
            return Err(e);
        }

        self.state = BuildState::Done;
        info!("=== Build finished in {:.2?} ===", build_time);
        Ok(BuildResult {
            info,
            classifier: artifact.classifier,
            featurizer: artifact.settings,
        })
    }
}
