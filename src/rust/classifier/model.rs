use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::features::{FeatureMapping, Label};
use super::utils::{log_sum_exp, softmax};
use crate::TrainingConfig;

/// A probability for every label of a classifier, in label alphabet order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbDist {
    probs: Vec<(Label, f64)>,
}

impl ProbDist {
    pub fn new(probs: Vec<(Label, f64)>) -> Self {
        Self { probs }
    }

    /// Probability of `label`, zero for labels outside the alphabet
    pub fn prob(&self, label: &str) -> f64 {
        self.probs
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    /// Labels with non-zero support, in alphabet order
    pub fn samples(&self) -> impl Iterator<Item = &Label> {
        self.probs.iter().map(|(l, _)| l)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, f64)> {
        self.probs.iter().map(|(l, p)| (l, *p))
    }

    /// The most probable label; the first in alphabet order wins a tie
    pub fn max(&self) -> Option<&Label> {
        let mut best: Option<(&Label, f64)> = None;
        for (label, p) in self.iter() {
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((label, p)),
            }
        }
        best.map(|(label, _)| label)
    }
}

/// How much each feature pushed one label's score.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelExplanation {
    pub label: Label,
    pub probability: f64,
    /// `(feature, weight)` sorted by absolute weight, largest first
    pub contributions: Vec<(String, f64)>,
}

/// Feature contributions behind one classification decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub predicted: Label,
    /// Every label, most probable first
    pub labels: Vec<LabelExplanation>,
    /// Input features the model never saw during training
    pub unknown_features: Vec<String>,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "predicted: {}", self.predicted)?;
        for label in &self.labels {
            writeln!(f, "  {} (p={:.4})", label.label, label.probability)?;
            if label.contributions.is_empty() {
                writeln!(f, "    (no known features)")?;
            }
            for (feature, weight) in &label.contributions {
                writeln!(f, "    {:+.4}  {}", weight, feature)?;
            }
        }
        if !self.unknown_features.is_empty() {
            writeln!(f, "  ignored: {}", self.unknown_features.join(", "))?;
        }
        Ok(())
    }
}

/// The operations inference and validation need from a trained model.
pub trait ProbabilisticClassifier {
    /// The full label alphabet
    fn labels(&self) -> &[Label];

    /// Probability of every label given the features
    fn prob_classify(&self, features: &FeatureMapping) -> ProbDist;

    /// The single most probable label
    fn classify(&self, features: &FeatureMapping) -> Option<Label> {
        self.prob_classify(features).max().cloned()
    }

    /// Reports the `top_n` strongest feature weights for every label
    fn explain(&self, features: &FeatureMapping, top_n: usize) -> Explanation;
}

/// Log-linear classifier with one weight per (label, feature) pair.
///
/// `p(label | features)` is the softmax over labels of the summed weights of
/// the present features. Features outside the training alphabet contribute
/// nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxentClassifier {
    labels: Vec<Label>,
    features: BTreeMap<String, usize>,
    weights: Array2<f64>,
}

impl MaxentClassifier {
    /// Fits weights to a featureset by gradient ascent on the penalized
    /// conditional log likelihood.
    ///
    /// # Errors
    /// - `Training` if the featureset is empty or has fewer than two labels
    /// - `Training` if the config is unusable
    pub fn train(featureset: &[(FeatureMapping, Label)], config: &TrainingConfig) -> Result<Self, ClassifierError> {
        config.validate().map_err(ClassifierError::Training)?;
        if featureset.is_empty() {
            return Err(ClassifierError::Training("Featureset is empty".into()));
        }

        let labels: Vec<Label> = featureset
            .iter()
            .map(|(_, label)| label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if labels.len() < 2 {
            return Err(ClassifierError::Training(format!(
                "At least 2 distinct labels are required, found {}",
                labels.len()
            )));
        }

        let features: BTreeMap<String, usize> = featureset
            .iter()
            .flat_map(|(feats, _)| feats.iter().filter(|&(_, &on)| on).map(|(k, _)| k.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, k)| (k, i))
            .collect();

        let mut model = Self {
            weights: Array2::zeros((labels.len(), features.len())),
            labels,
            features,
        };

        let examples: Vec<(Vec<usize>, usize)> = featureset
            .iter()
            .map(|(feats, label)| {
                let label_idx = model.labels.binary_search(label).unwrap_or_default();
                (model.encode(feats), label_idx)
            })
            .collect();

        model.fit(&examples, config);
        Ok(model)
    }

    fn fit(&mut self, examples: &[(Vec<usize>, usize)], config: &TrainingConfig) {
        let n = examples.len() as f64;
        let variance = config.gaussian_prior_sigma * config.gaussian_prior_sigma;
        let max_active = examples.iter().map(|(f, _)| f.len()).max().unwrap_or(1).max(1);
        let step = config.learning_rate / max_active as f64;

        let mut empirical = Array2::<f64>::zeros(self.weights.raw_dim());
        for (feats, label) in examples {
            for &f in feats {
                empirical[[*label, f]] += 1.0;
            }
        }

        let mut previous_ll: Option<f64> = None;
        for iteration in 0..config.max_iterations {
            let mut expected = Array2::<f64>::zeros(self.weights.raw_dim());
            let mut log_likelihood = 0.0;

            for (feats, label) in examples {
                let scores = self.scores(feats);
                log_likelihood += scores[*label] - log_sum_exp(&scores);
                let probs = softmax(&scores);
                for (y, p) in probs.iter().enumerate() {
                    for &f in feats {
                        expected[[y, f]] += p;
                    }
                }
            }

            let penalty = self.weights.iter().map(|w| w * w).sum::<f64>() / (2.0 * variance);
            let average_ll = (log_likelihood - penalty) / n;
            debug!("iteration {:>4}: log likelihood {:.6}", iteration, average_ll);

            if let Some(previous) = previous_ll {
                if (average_ll - previous).abs() < config.min_ll_delta {
                    debug!("converged after {} iterations", iteration);
                    break;
                }
            }
            previous_ll = Some(average_ll);

            let gradient = (&empirical - &expected - &self.weights / variance) / n;
            self.weights.scaled_add(step, &gradient);
        }
    }

    fn encode(&self, features: &FeatureMapping) -> Vec<usize> {
        features
            .iter()
            .filter(|&(_, &on)| on)
            .filter_map(|(key, _)| self.features.get(key).copied())
            .collect()
    }

    fn scores(&self, active: &[usize]) -> Array1<f64> {
        let mut scores = Array1::zeros(self.labels.len());
        for (y, score) in scores.iter_mut().enumerate() {
            *score = active.iter().map(|&f| self.weights[[y, f]]).sum();
        }
        scores
    }

    /// Weight of a (label, feature) pair, if both are known
    pub fn weight(&self, label: &str, feature: &str) -> Option<f64> {
        let y = self.labels.iter().position(|l| l == label)?;
        let f = *self.features.get(feature)?;
        Some(self.weights[[y, f]])
    }

    /// Number of distinct features seen during training
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn labels_len(&self) -> usize {
        self.labels.len()
    }
}

impl ProbabilisticClassifier for MaxentClassifier {
    fn labels(&self) -> &[Label] {
        &self.labels
    }

    fn prob_classify(&self, features: &FeatureMapping) -> ProbDist {
        let probs = softmax(&self.scores(&self.encode(features)));
        ProbDist::new(self.labels.iter().cloned().zip(probs.iter().copied()).collect())
    }

    fn explain(&self, features: &FeatureMapping, top_n: usize) -> Explanation {
        let active = self.encode(features);
        let dist = self.prob_classify(features);

        let mut labels: Vec<LabelExplanation> = self
            .labels
            .iter()
            .enumerate()
            .map(|(y, label)| {
                let mut contributions: Vec<(String, f64)> = features
                    .keys()
                    .filter_map(|key| self.features.get(key).map(|&f| (key.clone(), self.weights[[y, f]])))
                    .collect();
                contributions.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then_with(|| a.0.cmp(&b.0)));
                contributions.truncate(top_n);
                LabelExplanation {
                    label: label.clone(),
                    probability: dist.prob(label),
                    contributions,
                }
            })
            .collect();
        labels.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        debug!("explained {} known features across {} labels", active.len(), labels.len());

        Explanation {
            predicted: dist.max().cloned().unwrap_or_default(),
            labels,
            unknown_features: features
                .keys()
                .filter(|key| !self.features.contains_key(*key))
                .cloned()
                .collect(),
        }
    }
}
