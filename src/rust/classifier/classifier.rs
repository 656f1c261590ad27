use std::path::{Path, PathBuf};

use log::info;

use super::error::ClassifierError;
use super::features::{FeatureMapping, Featurizer, Label, ProductFeatures};
use super::model::{Explanation, MaxentClassifier, ProbabilisticClassifier};
use crate::ModelManager;

/// Labels at or below this probability are left out of classification results.
pub const PROBABILITY_FLOOR: f64 = 0.01;

/// Number of features listed per label by [`ApparelClassifier::explain`].
pub const EXPLAIN_TOP_FEATURES: usize = 10;

/// Classifies products with a model loaded from disk.
///
/// The model is loaded once, when the classifier is created, so a missing
/// or corrupt file is reported there rather than on the first call.
///
/// ```no_run
/// use apparel::ApparelClassifier;
///
/// # fn main() -> Result<(), apparel::ClassifierError> {
/// let classifier = ApparelClassifier::new("models/model-2015-05-02.bin")?;
/// for (label, probability) in classifier.classify("GUESS Handbag, Isla Large Satchel", None, None) {
///     println!("{}: {:.2}", label, probability);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApparelClassifier {
    model_path: Option<PathBuf>,
    classifier: MaxentClassifier,
    featurizer: ProductFeatures,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ApparelClassifier>();
    }
};

impl ApparelClassifier {
    /// Loads the model at `model` along with the featurizer it was trained with.
    ///
    /// # Errors
    /// - `ModelLoad` if the file is missing or corrupt, or names a featurizer or lemmatizer this crate doesn't provide
    pub fn new(model: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = model.as_ref();
        info!("Loading model from {:?}", path);
        let artifact = ModelManager::load_model(path)?;
        let featurizer = artifact.featurizer().map_err(|e| match e {
            ClassifierError::ModelLoad(msg) => ClassifierError::ModelLoad(format!("'{}': {}", path.display(), msg)),
            other => other,
        })?;

        info!(
            "Loaded model with {} labels ({} stopwords, {})",
            artifact.classifier.labels_len(),
            artifact.settings.stopwords.len(),
            artifact.settings.lemmatizer
        );
        Ok(Self {
            model_path: Some(path.to_path_buf()),
            classifier: artifact.classifier,
            featurizer,
        })
    }

    /// Wraps a model that is already in memory, featurizing with the defaults
    pub fn from_classifier(classifier: MaxentClassifier) -> Self {
        Self::from_parts(classifier, ProductFeatures::new())
    }

    /// Wraps a model with the featurizer it was trained with
    pub fn from_parts(classifier: MaxentClassifier, featurizer: ProductFeatures) -> Self {
        Self {
            model_path: None,
            classifier,
            featurizer,
        }
    }

    pub fn featurize(&self, name: &str, description: Option<&str>, keywords: Option<&str>) -> FeatureMapping {
        self.featurizer.featurize(name, description, keywords)
    }

    /// Ranks the labels for a product, most probable first.
    ///
    /// Labels with probability at or below [`PROBABILITY_FLOOR`] are dropped;
    /// equal probabilities keep label alphabet order.
    pub fn classify(&self, name: &str, description: Option<&str>, keywords: Option<&str>) -> Vec<(Label, f64)> {
        let features = self.featurize(name, description, keywords);
        let dist = self.classifier.prob_classify(&features);

        let mut labels: Vec<(Label, f64)> = dist
            .iter()
            .filter(|(_, p)| *p > PROBABILITY_FLOOR)
            .map(|(label, p)| (label.clone(), p))
            .collect();
        labels.sort_by(|a, b| b.1.total_cmp(&a.1));
        labels
    }

    /// Reports which features drove the decision for a product
    pub fn explain(&self, name: &str, description: Option<&str>, keywords: Option<&str>) -> Explanation {
        let features = self.featurize(name, description, keywords);
        self.classifier.explain(&features, EXPLAIN_TOP_FEATURES)
    }

    /// Every label the model knows, unfiltered
    pub fn labels(&self) -> &[Label] {
        self.classifier.labels()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            num_classes: self.classifier.labels_len(),
            class_labels: self.labels().to_vec(),
            num_features: self.classifier.feature_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrainingConfig;

    fn setup_test_classifier() -> ApparelClassifier {
        let featurizer = ProductFeatures::new();
        let rows = [
            ("bags", "Leather Tote Bag"),
            ("bags", "Canvas Shoulder Bag"),
            ("bags", "Quilted Crossbody Bag"),
            ("shoes", "Leather Running Shoes"),
            ("shoes", "Suede Ankle Boots"),
            ("shoes", "Canvas Sneakers"),
            ("hats", "Wool Beanie Hat"),
        ];
        let featureset: Vec<_> = rows
            .iter()
            .map(|(label, name)| (featurizer.featurize(name, None, None), label.to_string()))
            .collect();
        let model = MaxentClassifier::train(&featureset, &TrainingConfig::default()).unwrap();
        ApparelClassifier::from_classifier(model)
    }

    #[test]
    fn test_classify_ranks_labels() {
        let classifier = setup_test_classifier();
        let ranked = classifier.classify("Leather Tote Bag", None, None);
        assert_eq!(ranked[0].0, "bags");
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        assert!(ranked.iter().all(|(_, p)| *p > PROBABILITY_FLOOR));
    }

    #[test]
    fn test_improbable_labels_are_dropped() {
        let featurizer = ProductFeatures::new();
        let featureset: Vec<_> = [("bags", "Tote"), ("shoes", "Sneaker"), ("hats", "Beanie")]
            .iter()
            .map(|(label, name)| (featurizer.featurize(name, None, None), label.to_string()))
            .collect();
        let config = TrainingConfig::default()
            .with_max_iterations(1000)
            .with_gaussian_prior_sigma(100.0);
        let model = MaxentClassifier::train(&featureset, &config).unwrap();
        let dist = model.prob_classify(&featurizer.featurize("Tote", None, None));
        assert!(dist.prob("shoes") <= PROBABILITY_FLOOR);
        assert!(dist.prob("hats") <= PROBABILITY_FLOOR);

        let classifier = ApparelClassifier::from_parts(model, featurizer);
        let ranked = classifier.classify("Tote", None, None);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, "bags");
        assert_eq!(classifier.labels(), &["bags", "hats", "shoes"]);
    }

    #[test]
    fn test_labels_are_unfiltered() {
        let classifier = setup_test_classifier();
        assert_eq!(classifier.labels(), &["bags", "hats", "shoes"]);
        assert_eq!(classifier.info().num_classes, 3);
        assert!(classifier.info().model_path.is_none());
    }

    #[test]
    fn test_explain_names_known_features() {
        let classifier = setup_test_classifier();
        let explanation = classifier.explain("Quilted Bag", None, Some("evening"));
        assert_eq!(explanation.predicted, "bags");
        assert!(explanation.unknown_features.contains(&"KEYWORD(evening)".to_string()));
        let top = &explanation.labels[0];
        assert!(top.contributions.iter().any(|(feature, _)| feature == "bag"));
    }

    #[test]
    fn test_missing_model() {
        let result = ApparelClassifier::new("/nonexistent/model.bin");
        assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
    }
}
