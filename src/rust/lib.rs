//! A maximum entropy classifier that assigns apparel products to categories.
//!
//! Products are described by a name, an optional description and optional
//! keywords. Text is reduced to a bag of lemmatized words, keyword tokens are
//! kept in their own namespace, and a log-linear model is trained on a
//! labeled CSV corpus.
//!
//! # Building a model
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use apparel::ClassifierBuilder;
//!
//! let mut builder = ClassifierBuilder::new("fixtures/products.csv")
//!     .with_output_dir("models")?
//!     .with_validation(true);
//! let result = builder.build()?;
//! println!("Model written to {:?}", result.info.paths.model);
//! # Ok(())
//! # }
//! ```
//!
//! # Classifying
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use apparel::ApparelClassifier;
//!
//! let classifier = ApparelClassifier::new("models/model-2015-05-02.bin")?;
//! let ranked = classifier.classify("Leather Tote Bag", None, Some("handbag"));
//! println!("Predicted class: {}", ranked[0].0);
//! println!("{}", classifier.explain("Leather Tote Bag", None, None));
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod runtime;
pub mod model_manager;
pub mod config;

pub use classifier::{
    ApparelClassifier, BuildInfo, BuildResult, ClassifierBuilder, ClassifierError, ClassifierInfo, Explanation,
    FeatureMapping, FeatureSet, FeaturizerSettings, MaxentClassifier, ProductFeatures,
};
pub use runtime::TrainingConfig;
pub use model_manager::{ModelArtifact, ModelManager, OutputPaths};
pub use config::{ApparelConfig, ConfigError};

/// Version recorded in build metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn init_logger() {
    env_logger::init();
}
