//! verdict_supervisor
//!
//! Stateful orchestration around `verdict_core`.
//!
//! Responsibilities:
//! - hold the session-scoped shadow registry
//! - run four agent beams in a fixed order against it
//! - hand the resulting records to the core decision engine
//!
//! Non-goals:
//! - no IO
//! - no async
//! - no decision policy (lives in core)

pub mod error;
pub mod shadow;
pub mod beam;
pub mod orchestrator;
pub mod deliberation;

pub use error::OrchestratorError;

pub use shadow::{
    evaluate_trigger, BeamMetrics, KeyStats, ResonanceEvent, ResonanceReport, ShadowAdjustment,
    ShadowArtifact, ShadowKey, ShadowPropagator, ShadowStats, ShadowTrigger,
    CUMULATIVE_DELTA_CAP, MAX_ADJUSTMENTS_PER_KEY, SHADOW_TTL_MS,
};

pub use beam::{run_beam, AgentRun, AgentRunner, BeamLane, BeamRun, Claim, RuleSetRunner, Station};

pub use orchestrator::{BeamMetadata, MultiBeamOrchestrator, MultiBeamResult, BEAM_ARITY};

pub use deliberation::{Deliberation, DeliberationReport};
