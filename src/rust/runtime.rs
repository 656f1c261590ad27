use serde::{Deserialize, Serialize};

/// Settings for the maximum entropy learner.
///
/// The builder trains every model of a build (the final model and the
/// validation model) with the same settings so that accuracies are
/// comparable from one build to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Upper bound on gradient ascent iterations
    pub max_iterations: usize,
    /// Standard deviation of the Gaussian prior on every weight
    pub gaussian_prior_sigma: f64,
    /// Base step size; the effective step is divided by the largest number of features in one example
    pub learning_rate: f64,
    /// Stop once the average log likelihood improves by less than this
    pub min_ll_delta: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            gaussian_prior_sigma: 1.0,
            learning_rate: 2.0,
            min_ll_delta: 1e-6,
        }
    }
}

impl TrainingConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_gaussian_prior_sigma(mut self, sigma: f64) -> Self {
        self.gaussian_prior_sigma = sigma;
        self
    }

    /// Checks that the settings describe a usable optimizer
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        if !(self.gaussian_prior_sigma > 0.0) {
            return Err(format!("gaussian_prior_sigma must be positive, got {}", self.gaussian_prior_sigma));
        }
        if !(self.learning_rate > 0.0) {
            return Err(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.gaussian_prior_sigma, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(TrainingConfig::default().with_max_iterations(0).validate().is_err());
        assert!(TrainingConfig::default().with_gaussian_prior_sigma(0.0).validate().is_err());
        assert!(TrainingConfig::default().with_gaussian_prior_sigma(f64::NAN).validate().is_err());
    }
}
