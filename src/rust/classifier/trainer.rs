use std::time::{Duration, Instant};

use log::info;

use super::error::ClassifierError;
use super::features::{FeatureMapping, Label};
use super::model::MaxentClassifier;
use crate::TrainingConfig;

/// Trains maximum entropy models with one fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Trains on `featureset` and reports how long it took.
    ///
    /// # Errors
    /// - `Training` if the featureset is empty or has fewer than two labels
    pub fn train(&self, featureset: &[(FeatureMapping, Label)]) -> Result<(MaxentClassifier, Duration), ClassifierError> {
        info!("Training maximum entropy model on {} examples", featureset.len());
        let start = Instant::now();
        let classifier = MaxentClassifier::train(featureset, &self.config)?;
        let elapsed = start.elapsed();
        info!(
            "Trained {} features over {} labels in {:.2?}",
            classifier.feature_count(),
            classifier.labels_len(),
            elapsed
        );
        Ok((classifier, elapsed))
    }
}
