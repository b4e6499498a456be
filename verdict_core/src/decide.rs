//verdict_core/decide.rs

use log::debug;
use serde::{Deserialize, Serialize};

use crate::advisory::Advisory;
use crate::cfg::DecisionCfg;
use crate::clock::now_ms;
use crate::error::Result;
use crate::record::VerdictRecord;

/// Categorical disposition of a claim.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    Accept,
    Conditional,
    Reinterpreted,
    Reject,
    Suspend,
}

/// Why the chain stopped where it did. Serialized as its text.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Rationale {
    #[serde(rename = "No CVVs provided")]
    NoRecords,
    #[serde(rename = "Falsification detected")]
    Falsified,
    #[serde(rename = "High epistemic contradiction")]
    HighContradiction,
    #[serde(rename = "Single strong view")]
    SingleStrongView,
    #[serde(rename = "Insufficient consensus or strength")]
    InsufficientConsensus,
    #[serde(rename = "Byzantine + epistemic uncertainty")]
    ByzantineUncertainty,
    #[serde(rename = "High confidence with divergence")]
    HighConfidenceDivergence,
    #[serde(rename = "Single worldview dominant")]
    DominantView,
    #[serde(rename = "Consensus achieved")]
    Consensus,
    #[serde(rename = "Insufficient confidence or coverage")]
    InsufficientConfidenceOrCoverage,
    #[serde(rename = "Ambiguous; human escalation required")]
    Ambiguous,
}

impl Rationale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rationale::NoRecords => "No CVVs provided",
            Rationale::Falsified => "Falsification detected",
            Rationale::HighContradiction => "High epistemic contradiction",
            Rationale::SingleStrongView => "Single strong view",
            Rationale::InsufficientConsensus => "Insufficient consensus or strength",
            Rationale::ByzantineUncertainty => "Byzantine + epistemic uncertainty",
            Rationale::HighConfidenceDivergence => "High confidence with divergence",
            Rationale::DominantView => "Single worldview dominant",
            Rationale::Consensus => "Consensus achieved",
            Rationale::InsufficientConfidenceOrCoverage => "Insufficient confidence or coverage",
            Rationale::Ambiguous => "Ambiguous; human escalation required",
        }
    }
}

impl std::fmt::Display for Rationale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregates over the input records, rounded to 4 decimals.
/// All zero for an empty record set.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregateStats {
    pub count: usize,
    pub avg_confidence: f64,
    pub avg_contradiction: f64,
    pub max_contradiction: f64,
    pub avg_entropy: f64,
    pub avg_coverage: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Audit {
    pub invariants_checked: bool,
    /// 1-based position of the rule that matched.
    pub chain_step: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub rationale: Rationale,
    pub stats: AggregateStats,
    /// One per input record, input order.
    pub signatures: Vec<String>,
    /// Informational only; excluded from any equality a caller cares about.
    pub timestamp_ms: u64,
    pub audit: Audit,
}

/// Unrounded means the chain compares against.
#[derive(Clone, Copy, Debug, Default)]
struct Means {
    confidence: f64,
    contradiction: f64,
    max_contradiction: f64,
    entropy: f64,
    coverage: f64,
}

impl Means {
    fn of(records: &[VerdictRecord]) -> Self {
        if records.is_empty() {
            return Means::default();
        }
        let n = records.len() as f64;
        let mut m = Means::default();
        for r in records {
            m.confidence += r.confidence();
            m.contradiction += r.contradiction();
            m.entropy += r.entropy();
            m.coverage += r.coverage();
            m.max_contradiction = m.max_contradiction.max(r.contradiction());
        }
        m.confidence /= n;
        m.contradiction /= n;
        m.entropy /= n;
        m.coverage /= n;
        m
    }

    fn rounded(&self, count: usize) -> AggregateStats {
        AggregateStats {
            count,
            avg_confidence: round4(self.confidence),
            avg_contradiction: round4(self.contradiction),
            max_contradiction: round4(self.max_contradiction),
            avg_entropy: round4(self.entropy),
            avg_coverage: round4(self.coverage),
        }
    }
}

#[inline]
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Decide with the default threshold table.
pub fn decide(records: &[VerdictRecord], advisory: &Advisory) -> Result<Verdict> {
    decide_cfg(records, advisory, &DecisionCfg::default())
}

/// Validate every record, then walk the priority chain; first match wins.
///
/// Inputs are borrowed and never mutated. The only impure read is the
/// wall clock for `timestamp_ms`.
pub fn decide_cfg(
    records: &[VerdictRecord],
    advisory: &Advisory,
    cfg: &DecisionCfg,
) -> Result<Verdict> {
    for r in records {
        r.validate()?;
    }

    let means = Means::of(records);
    let (status, rationale, chain_step) = run_chain(records, advisory, cfg, &means);
    debug!(
        "verdict: {:?} ({}) at step {} over {} records",
        status,
        rationale,
        chain_step,
        records.len()
    );

    Ok(Verdict {
        status,
        rationale,
        stats: means.rounded(records.len()),
        signatures: records.iter().map(VerdictRecord::signature).collect(),
        timestamp_ms: now_ms(),
        audit: Audit {
            invariants_checked: true,
            chain_step,
        },
    })
}

fn run_chain(
    records: &[VerdictRecord],
    advisory: &Advisory,
    cfg: &DecisionCfg,
    m: &Means,
) -> (VerdictStatus, Rationale, u8) {
    use Rationale as R;
    use VerdictStatus as S;

    if records.is_empty() {
        return (S::Suspend, R::NoRecords, 1);
    }

    let any_falsified = records.iter().any(VerdictRecord::falsified);
    if any_falsified {
        return (S::Reject, R::Falsified, 2);
    }

    if m.contradiction >= cfg.tau_contra_mean || m.max_contradiction >= cfg.tau_contra_max {
        return (S::Suspend, R::HighContradiction, 3);
    }

    if let [only] = records {
        let strong = only.confidence() >= cfg.tau_single_conf
            && only.contradiction() < cfg.tau_single_contra
            && !only.falsified();
        return if strong {
            (S::Conditional, R::SingleStrongView, 4)
        } else {
            (S::Suspend, R::InsufficientConsensus, 4)
        };
    }

    if advisory.is_byzantine() && m.entropy > cfg.tau_byz_entropy {
        return (S::Suspend, R::ByzantineUncertainty, 5);
    }

    if m.confidence > cfg.tau_reint_conf
        && m.coverage > cfg.tau_reint_cov
        && advisory.inevitability() > cfg.tau_reint_inev
    {
        return (S::Reinterpreted, R::HighConfidenceDivergence, 6);
    }

    let dominant = records.iter().any(|r| r.confidence() > cfg.tau_dom_conf);
    if dominant && m.coverage > cfg.tau_dom_cov {
        return (S::Conditional, R::DominantView, 7);
    }

    if m.confidence > cfg.tau_accept_conf
        && m.contradiction < cfg.tau_accept_contra
        && !any_falsified
    {
        return (S::Accept, R::Consensus, 8);
    }

    if m.confidence < cfg.tau_reject_conf || m.coverage < cfg.tau_reject_cov {
        return (S::Reject, R::InsufficientConfidenceOrCoverage, 9);
    }

    (S::Suspend, R::Ambiguous, 10)
}
