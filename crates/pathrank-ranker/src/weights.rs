//! Checks and transforms for the signal weight vector.

use pathrank_common::{PathrankError, Result, ScoreWeights};

/// Weights must be finite and non-negative, and at least one must be
/// positive.
pub fn check(weights: &ScoreWeights) -> Result<()> {
    let all = as_array(weights);
    if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(PathrankError::Config(format!(
            "score weights must be finite and non-negative, got {:?}",
            all
        )));
    }
    if all.iter().all(|w| *w == 0.0) {
        return Err(PathrankError::Config("all score weights are zero".to_string()));
    }
    Ok(())
}

/// Rescale so the weights sum to 1.0. Leaves an all-zero vector unchanged.
pub fn normalised(weights: &ScoreWeights) -> ScoreWeights {
    let sum: f64 = as_array(weights).iter().sum();
    if sum <= 0.0 {
        return weights.clone();
    }
    ScoreWeights {
        relation: weights.relation / sum,
        similarity: weights.similarity / sum,
        correlation: weights.correlation / sum,
    }
}

/// `[relation, similarity, correlation]`
pub fn as_array(weights: &ScoreWeights) -> [f64; 3] {
    [weights.relation, weights.similarity, weights.correlation]
}
