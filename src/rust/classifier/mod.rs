use std::path::PathBuf;

mod error;
mod utils;
mod lemmatizer;
mod features;
mod corpus;
mod model;
mod trainer;
pub mod validation;
mod metadata;
pub mod builder;
mod classifier;

pub use error::ClassifierError;
pub use lemmatizer::{lemmatizer_by_name, EnglishLemmatizer, IdentityLemmatizer, Lemmatizer};
pub use features::{
    keyword_feature, FeatureMapping, FeatureSet, Featurizer, FeaturizerSettings, Label, ProductFeatures, ASCII_PUNCTUATION,
    ENGLISH_STOPWORDS,
};
pub use corpus::{read_featureset, Corpus, ProductRecord, LABEL_COLUMN};
pub use model::{Explanation, LabelExplanation, MaxentClassifier, ProbDist, ProbabilisticClassifier};
pub use trainer::Trainer;
pub use validation::{accuracy, cross_validate, cross_validate_with_rng, split_featureset};
pub use metadata::{ArtifactPaths, BuildInfo, ComponentNames, Timer, DATE_FORMAT, SCHEMA_VERSION};
pub use builder::{BuildResult, BuildState, ClassifierBuilder};
pub use classifier::{ApparelClassifier, EXPLAIN_TOP_FEATURES, PROBABILITY_FLOOR};

/// Information about a loaded classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// File the model was loaded from, if any
    pub model_path: Option<PathBuf>,
    /// Number of classes the classifier is trained on
    pub num_classes: usize,
    /// Labels of the classes
    pub class_labels: Vec<String>,
    /// Number of distinct features in the model
    pub num_features: usize,
}
