use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------
// Advisory: an optional, non-authoritative meta-signal. The decision
// engine may read it but never trusts it for anything but two gates.
// ---------------------------------------------------------------------

/// Reliability grade attached to an advisory. `D` marks a suspected
/// Byzantine contributor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReliabilityTier {
    A,
    B,
    C,
    D,
}

impl ReliabilityTier {
    /// Exact, case-sensitive grade names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(ReliabilityTier::A),
            "B" => Some(ReliabilityTier::B),
            "C" => Some(ReliabilityTier::C),
            "D" => Some(ReliabilityTier::D),
            _ => None,
        }
    }
}

/// Unknown grades, or non-string values, read as no tier at all.
fn lenient_tier<'de, D>(deserializer: D) -> Result<Option<ReliabilityTier>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(ReliabilityTier::parse))
}

/// Advisory signal from an external supplier.
///
/// Every field is optional; an empty JSON object `{}` is a valid advisory.
/// Defaults when absent:
/// - `reliability_tier`: none (never treated as `D`); unknown grades too
/// - `epistemic_inevitability`: 0.0
/// - `probabilities`: empty (no distribution to check)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Advisory {
    #[serde(deserialize_with = "lenient_tier")]
    pub reliability_tier: Option<ReliabilityTier>,
    pub epistemic_inevitability: Option<f64>,
    pub probabilities: BTreeMap<String, f64>,
}

impl Advisory {
    pub fn new(tier: ReliabilityTier, inevitability: f64) -> Self {
        Self {
            reliability_tier: Some(tier),
            epistemic_inevitability: Some(inevitability),
            probabilities: BTreeMap::new(),
        }
    }

    pub fn with_probability(mut self, agent_id: impl Into<String>, weight: f64) -> Self {
        self.probabilities.insert(agent_id.into(), weight);
        self
    }

    #[inline]
    pub fn is_byzantine(&self) -> bool {
        self.reliability_tier == Some(ReliabilityTier::D)
    }

    #[inline]
    pub fn inevitability(&self) -> f64 {
        self.epistemic_inevitability.unwrap_or(0.0)
    }

    /// Probability weights in agent-id order.
    pub fn weights(&self) -> Vec<f64> {
        self.probabilities.values().copied().collect()
    }
}

/// Numerically stable softmax. Empty input yields an empty distribution.
pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max_v = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max_v.is_finite() {
        return Vec::new();
    }
    let exps: Vec<f64> = values.iter().map(|v| (v - max_v).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// How flat a probability distribution is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Flatness {
    pub max_probability: f64,
    pub entropy_of_distribution: f64,
    /// Standard deviation from the uniform distribution.
    pub std_deviation: f64,
}

pub fn softmax_flatness(probabilities: &[f64]) -> Flatness {
    if probabilities.is_empty() {
        return Flatness::default();
    }
    let n = probabilities.len() as f64;
    let uniform = 1.0 / n;

    let max_probability = probabilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let entropy_of_distribution = -probabilities
        .iter()
        .map(|p| p * (p + 1e-12).ln())
        .sum::<f64>();
    let variance = probabilities
        .iter()
        .map(|p| (p - uniform) * (p - uniform))
        .sum::<f64>()
        / n;

    Flatness {
        max_probability,
        entropy_of_distribution,
        std_deviation: variance.sqrt(),
    }
}
