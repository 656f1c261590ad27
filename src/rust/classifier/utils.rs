use ndarray::Array1;

pub(crate) fn log_sum_exp(scores: &Array1<f64>) -> f64 {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + scores.iter().map(|&s| (s - max).exp()).sum::<f64>().ln()
}

/// Turns unnormalized log scores into a probability vector
pub(crate) fn softmax(scores: &Array1<f64>) -> Array1<f64> {
    let norm = log_sum_exp(scores);
    scores.mapv(|s| (s - norm).exp())
}
