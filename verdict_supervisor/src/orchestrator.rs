//! Multi-beam orchestrator.
//!
//! Runs a fixed roster of four agents, one after another in declared order,
//! against a single shared `ShadowPropagator`. Earlier agents' shadows are
//! visible to later ones within the same pass.
//!
//! No IO. No threads. Exclusive access to the propagator is a `&mut` borrow
//! for the whole pass.

use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

use verdict_core::{TriggerCfg, VerdictRecord};

use crate::beam::{run_beam, AgentRunner, Claim};
use crate::error::OrchestratorError;
use crate::shadow::{ResonanceReport, ShadowPropagator};

/// Number of agents in every pass.
pub const BEAM_ARITY: usize = 4;

/// Per-agent summary of one pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamMetadata {
    pub agent_id: String,
    pub trajectory_length: usize,
    pub shadows_emitted: usize,
    pub shadows_applied: usize,
    pub final_confidence: f64,
    pub final_entropy: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiBeamResult {
    /// One per agent, declared order.
    pub records: Vec<VerdictRecord>,
    pub beam_metadata: Vec<BeamMetadata>,
    pub resonance: ResonanceReport,
}

pub struct MultiBeamOrchestrator {
    runners: Vec<Box<dyn AgentRunner>>,
    agent_ids: Vec<String>,
    triggers: TriggerCfg,
    /// Optional per-agent trigger overrides.
    trigger_overrides: HashMap<String, TriggerCfg>,
}

impl std::fmt::Debug for MultiBeamOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiBeamOrchestrator")
            .field("agent_ids", &self.agent_ids)
            .field("triggers", &self.triggers)
            .field("trigger_overrides", &self.trigger_overrides)
            .finish()
    }
}

impl MultiBeamOrchestrator {
    /// Fails unless exactly `BEAM_ARITY` runners are supplied.
    pub fn new(runners: Vec<Box<dyn AgentRunner>>) -> Result<Self, OrchestratorError> {
        if runners.len() != BEAM_ARITY {
            return Err(OrchestratorError::Arity {
                expected: BEAM_ARITY,
                got: runners.len(),
            });
        }
        let agent_ids = runners.iter().map(|r| r.agent_id().to_string()).collect();
        Ok(Self {
            runners,
            agent_ids,
            triggers: TriggerCfg::default(),
            trigger_overrides: HashMap::new(),
        })
    }

    pub fn with_triggers(mut self, triggers: TriggerCfg) -> Self {
        self.triggers = triggers;
        self
    }

    /// Override trigger thresholds for shadows emitted by `agent_id`.
    pub fn set_trigger_override(&mut self, agent_id: impl Into<String>, cfg: TriggerCfg) {
        self.trigger_overrides.insert(agent_id.into(), cfg);
    }

    pub fn clear_trigger_override(&mut self, agent_id: &str) {
        self.trigger_overrides.remove(agent_id);
    }

    pub fn agent_ids(&self) -> &[String] {
        &self.agent_ids
    }

    fn triggers_for(&self, agent_id: &str) -> &TriggerCfg {
        self.trigger_overrides.get(agent_id).unwrap_or(&self.triggers)
    }

    /// One sequential pass over all agents.
    ///
    /// The first failing beam aborts the pass; shadows it already emitted
    /// stay in `propagator`.
    pub fn run(
        &self,
        claim: &Claim,
        propagator: &mut ShadowPropagator,
    ) -> Result<MultiBeamResult, OrchestratorError> {
        let mut records = Vec::with_capacity(self.runners.len());
        let mut beam_metadata = Vec::with_capacity(self.runners.len());

        for (i, runner) in self.runners.iter().enumerate() {
            let agent_id = runner.agent_id();
            let beam = run_beam(
                runner.as_ref(),
                claim,
                &self.agent_ids,
                self.triggers_for(agent_id),
                propagator,
            )?;

            info!(
                "beam {}/{} ({}) complete: confidence={:.3} entropy={:.3}",
                i + 1,
                self.runners.len(),
                agent_id,
                beam.final_metrics.confidence,
                beam.final_metrics.entropy
            );

            beam_metadata.push(BeamMetadata {
                agent_id: agent_id.to_string(),
                trajectory_length: beam.trajectory.len(),
                shadows_emitted: beam.shadows_emitted.len(),
                shadows_applied: beam.shadows_applied(),
                final_confidence: beam.final_metrics.confidence,
                final_entropy: beam.final_metrics.entropy,
            });
            records.push(beam.record);
        }

        Ok(MultiBeamResult {
            records,
            beam_metadata,
            resonance: propagator.resonance(),
        })
    }
}
