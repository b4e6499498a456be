use crate::error::{EngineError, Result};
use crate::record::VerdictRecord;

/// Absolute tolerance for a probability distribution summing to 1.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Fail unless `probabilities` sums to 1 within tolerance.
/// An empty slice sums to 0 and fails.
pub fn enforce_distribution(probabilities: &[f64]) -> Result<()> {
    let sum: f64 = probabilities.iter().sum();
    if !((sum - 1.0).abs() <= PROBABILITY_SUM_TOLERANCE) {
        return Err(EngineError::invariant(format!(
            "probabilities sum to {} instead of 1",
            sum
        )));
    }
    Ok(())
}

/// Full aggregate check: distribution sum, per-record ranges, and no
/// falsified record claiming any confidence.
pub fn enforce_invariants(records: &[VerdictRecord], probabilities: &[f64]) -> Result<()> {
    enforce_distribution(probabilities)?;

    for r in records {
        r.validate()?;
        if r.falsified() && r.confidence() > 0.0 {
            return Err(EngineError::invariant(format!(
                "falsified record `{}` has confidence {}",
                r.agent_id(),
                r.confidence()
            )));
        }
    }
    Ok(())
}
