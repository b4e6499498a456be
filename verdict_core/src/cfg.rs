use serde::{Deserialize, Serialize};

/// Thresholds for the decision chain. `Default` is the contract table;
/// overriding them is meant for experiments, not production verdicts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionCfg {
    /// Mean contradiction at or above which the pool is suspended.
    pub tau_contra_mean: f64,
    /// Single-record contradiction at or above which the pool is suspended.
    pub tau_contra_max: f64,
    pub tau_single_conf: f64,
    pub tau_single_contra: f64,
    pub tau_byz_entropy: f64,
    pub tau_reint_conf: f64,
    pub tau_reint_cov: f64,
    pub tau_reint_inev: f64,
    pub tau_dom_conf: f64,
    pub tau_dom_cov: f64,
    pub tau_accept_conf: f64,
    pub tau_accept_contra: f64,
    pub tau_reject_conf: f64,
    pub tau_reject_cov: f64,
}

impl Default for DecisionCfg {
    fn default() -> Self {
        Self {
            tau_contra_mean: 0.60,
            tau_contra_max: 0.70,
            tau_single_conf: 0.85,
            tau_single_contra: 0.30,
            tau_byz_entropy: 0.70,
            tau_reint_conf: 0.70,
            tau_reint_cov: 0.75,
            tau_reint_inev: 0.75,
            tau_dom_conf: 0.80,
            tau_dom_cov: 0.60,
            tau_accept_conf: 0.70,
            tau_accept_contra: 0.15,
            tau_reject_conf: 0.50,
            tau_reject_cov: 0.40,
        }
    }
}

/// When a mini-decision result is worth shadowing to peers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerCfg {
    /// Minimum number of contradiction flags.
    pub contradiction_threshold: usize,
    /// Compared against the capped confidence score, not a difference.
    pub confidence_delta_threshold: f64,
    pub entropy_spike_threshold: f64,
}

impl Default for TriggerCfg {
    fn default() -> Self {
        Self {
            contradiction_threshold: 1,
            confidence_delta_threshold: 0.2,
            entropy_spike_threshold: 0.8,
        }
    }
}
