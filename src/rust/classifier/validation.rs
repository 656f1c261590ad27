use std::time::{Duration, Instant};

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use super::error::ClassifierError;
use super::features::{FeatureMapping, FeatureSet, Label};
use super::model::ProbabilisticClassifier;
use super::trainer::Trainer;

/// One example in this many is held out for testing.
pub const HOLDOUT_DIVISOR: usize = 10;

/// Shuffles a copy of the featureset and splits it into training and test
/// partitions. The test partition holds `len / HOLDOUT_DIVISOR` examples.
pub fn split_featureset<R: Rng + ?Sized>(
    featureset: &[(FeatureMapping, Label)],
    rng: &mut R,
) -> (FeatureSet, FeatureSet) {
    let mut shuffled = featureset.to_vec();
    shuffled.shuffle(rng);
    let offset = shuffled.len() / HOLDOUT_DIVISOR;
    let train = shuffled.split_off(offset);
    (train, shuffled)
}

/// Fraction of `test` whose most probable label is the true label; 0.0 for an empty test set.
pub fn accuracy<C: ProbabilisticClassifier + ?Sized>(classifier: &C, test: &[(FeatureMapping, Label)]) -> f64 {
    if test.is_empty() {
        return 0.0;
    }
    let correct = test
        .iter()
        .filter(|(features, label)| classifier.classify(features).as_ref() == Some(label))
        .count();
    correct as f64 / test.len() as f64
}

/// Estimates accuracy by training on 90% of a shuffled featureset and
/// testing on the remaining 10%.
pub fn cross_validate(trainer: &Trainer, featureset: &[(FeatureMapping, Label)]) -> Result<(f64, Duration), ClassifierError> {
    cross_validate_with_rng(trainer, featureset, &mut rand::rng())
}

/// Same as [`cross_validate`] with a caller-supplied random source.
///
/// # Errors
/// - `Training` if the held-out partition would be empty
/// - `Training` if the training partition has fewer than two labels
pub fn cross_validate_with_rng<R: Rng + ?Sized>(
    trainer: &Trainer,
    featureset: &[(FeatureMapping, Label)],
    rng: &mut R,
) -> Result<(f64, Duration), ClassifierError> {
    let start = Instant::now();

    let (train, test) = split_featureset(featureset, rng);
    if test.is_empty() {
        return Err(ClassifierError::Training(format!(
            "Need at least {} examples to hold out a test partition, found {}",
            HOLDOUT_DIVISOR,
            featureset.len()
        )));
    }
    info!("Cross validating: {} training, {} test examples", train.len(), test.len());

    let (classifier, _) = trainer.train(&train)?;
    let accuracy = accuracy(&classifier, &test);

    let elapsed = start.elapsed();
    info!("Validation accuracy {:.4} in {:.2?}", accuracy, elapsed);
    Ok((accuracy, elapsed))
}
