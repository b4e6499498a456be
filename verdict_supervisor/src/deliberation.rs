//! One-call deliberation over a claim.
//!
//! Each call gets its own session propagator, so TTLs, rate-limit counters
//! and cumulative deltas never carry over from a previous claim.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use verdict_core::{decide_cfg, enforce_distribution, Advisory, DecisionCfg, TriggerCfg, Verdict};

use crate::beam::{AgentRunner, Claim};
use crate::error::OrchestratorError;
use crate::orchestrator::{BeamMetadata, MultiBeamOrchestrator};
use crate::shadow::{ResonanceReport, ShadowPropagator, ShadowStats};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliberationReport {
    pub claim_id: String,
    pub verdict: Verdict,
    pub beam_metadata: Vec<BeamMetadata>,
    pub resonance: ResonanceReport,
    pub shadow_stats: ShadowStats,
    pub deliberation_complete: bool,
}

#[derive(Debug)]
pub struct Deliberation {
    orchestrator: MultiBeamOrchestrator,
    decision_cfg: DecisionCfg,
}

impl Deliberation {
    pub fn new(runners: Vec<Box<dyn AgentRunner>>) -> Result<Self, OrchestratorError> {
        Ok(Self {
            orchestrator: MultiBeamOrchestrator::new(runners)?,
            decision_cfg: DecisionCfg::default(),
        })
    }

    pub fn with_decision_cfg(mut self, cfg: DecisionCfg) -> Self {
        self.decision_cfg = cfg;
        self
    }

    pub fn with_triggers(mut self, triggers: TriggerCfg) -> Self {
        self.orchestrator = self.orchestrator.with_triggers(triggers);
        self
    }

    /// Access for per-agent trigger overrides.
    pub fn orchestrator_mut(&mut self) -> &mut MultiBeamOrchestrator {
        &mut self.orchestrator
    }

    pub fn deliberate(
        &self,
        claim: &Claim,
        advisory: &Advisory,
    ) -> Result<DeliberationReport, OrchestratorError> {
        let mut propagator = ShadowPropagator::new();
        let beams = self.orchestrator.run(claim, &mut propagator)?;

        if !advisory.probabilities.is_empty() {
            enforce_distribution(&advisory.weights()).map_err(|e| {
                warn!("claim {}: advisory rejected: {}", claim.claim_id, e);
                e
            })?;
        }

        let verdict = decide_cfg(&beams.records, advisory, &self.decision_cfg).map_err(|e| {
            warn!("claim {}: decision aborted: {}", claim.claim_id, e);
            e
        })?;
        info!(
            "claim {}: {:?} ({})",
            claim.claim_id, verdict.status, verdict.rationale
        );

        Ok(DeliberationReport {
            claim_id: claim.claim_id.clone(),
            verdict,
            beam_metadata: beams.beam_metadata,
            resonance: beams.resonance,
            shadow_stats: propagator.stats(),
            deliberation_complete: true,
        })
    }
}
