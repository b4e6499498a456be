pub mod error;
pub mod clock;

pub mod record;
pub mod advisory;
pub mod mini;
pub mod cfg;
pub mod invariants;
pub mod decide;

pub use error::{EngineError, Result};
pub use clock::now_ms;

pub use record::VerdictRecord;
pub use advisory::{Advisory, Flatness, ReliabilityTier, softmax, softmax_flatness};
pub use mini::{
    enforce_mini_invariants, execute, MiniDecisionResult, NodeKind, NodeOutcome, RuleNode, RuleSet,
    MAX_NODES,
};
pub use cfg::{DecisionCfg, TriggerCfg};
pub use invariants::{PROBABILITY_SUM_TOLERANCE, enforce_distribution, enforce_invariants};
pub use decide::{AggregateStats, Audit, Rationale, Verdict, VerdictStatus, decide, decide_cfg};
