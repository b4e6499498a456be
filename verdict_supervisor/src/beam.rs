//! Beam layer: one agent's reasoning line over a claim.
//!
//! The beam owns no policy:
//! - an `AgentRunner` decides where to go and what to evaluate
//! - a `BeamLane` is the runner's only window onto the shared session
//! - the beam turns the runner's final metrics into a `VerdictRecord`
//!
//! Products provide an `AgentRunner` (or use `RuleSetRunner`) per agent.

use serde::{Deserialize, Serialize};

use verdict_core::{
    enforce_mini_invariants, execute, EngineError, MiniDecisionResult, RuleSet, TriggerCfg,
    VerdictRecord,
};

use crate::shadow::{BeamMetrics, ShadowAdjustment, ShadowArtifact, ShadowPropagator};

/// The proposition under deliberation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,
    pub proposition: String,
}

impl Claim {
    pub fn new(claim_id: impl Into<String>, proposition: impl Into<String>) -> Self {
        Self {
            claim_id: claim_id.into(),
            proposition: proposition.into(),
        }
    }
}

/// What a runner hands back when its line is done.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    pub metrics: BeamMetrics,
    pub coverage: f64,
    pub falsified: bool,
}

/// Trait: produce one agent's assessment of a claim.
///
/// Implementations may evaluate rule sets through `lane.invoke` and should
/// call `lane.absorb` wherever peers may have left shadows.
pub trait AgentRunner {
    fn agent_id(&self) -> &str;

    fn run(&self, claim: &Claim, lane: &mut BeamLane<'_>) -> Result<AgentRun, EngineError>;
}

/// A runner's handle on the session while it runs.
pub struct BeamLane<'a> {
    agent_id: &'a str,
    peers: &'a [String],
    triggers: &'a TriggerCfg,
    propagator: &'a mut ShadowPropagator,

    trajectory: Vec<String>,
    emitted: Vec<ShadowArtifact>,
    adjustments: Vec<ShadowAdjustment>,
}

impl<'a> BeamLane<'a> {
    /// `peers` is the full agent roster; the lane skips its own id.
    pub fn new(
        agent_id: &'a str,
        peers: &'a [String],
        triggers: &'a TriggerCfg,
        propagator: &'a mut ShadowPropagator,
    ) -> Self {
        Self {
            agent_id,
            peers,
            triggers,
            propagator,
            trajectory: Vec::new(),
            emitted: Vec::new(),
            adjustments: Vec::new(),
        }
    }

    pub fn agent_id(&self) -> &str {
        self.agent_id
    }

    /// Record a step in this agent's trajectory.
    pub fn visit(&mut self, location: impl Into<String>) {
        self.trajectory.push(location.into());
    }

    /// Run the bounded executor, check its result, then offer it as a
    /// shadow to every peer at `location`.
    pub fn invoke(
        &mut self,
        rules: &RuleSet,
        location: &str,
        context: &str,
    ) -> Result<MiniDecisionResult, EngineError> {
        let result = execute(rules, context);
        enforce_mini_invariants(&result)?;

        for peer in self.peers.iter().filter(|p| p.as_str() != self.agent_id) {
            if let Some(artifact) =
                self.propagator
                    .emit(self.agent_id, location, peer, &result, self.triggers)
            {
                self.emitted.push(artifact);
            }
        }
        Ok(result)
    }

    /// Apply whatever peers left for this agent at `location`.
    pub fn absorb(&mut self, location: &str, metrics: BeamMetrics) -> BeamMetrics {
        let adjustment = self.propagator.apply(self.agent_id, location, metrics);
        if adjustment.applied > 0 {
            self.adjustments.push(adjustment);
        }
        adjustment.metrics
    }

    pub fn trajectory(&self) -> &[String] {
        &self.trajectory
    }
}

/// One stop on a `RuleSetRunner`'s route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub location: String,
    /// `None` is a waypoint: visited and absorbed, nothing evaluated.
    pub rules: Option<RuleSet>,
}

/// Reference runner that walks a fixed route of stations.
///
/// At each station it evaluates the station's rules against the claim
/// proposition (confidence = capped score, contradiction = highest flagged
/// fraction so far), then absorbs peer shadows. Coverage is the share of
/// stations that carried rules. Never falsifies.
#[derive(Clone, Debug)]
pub struct RuleSetRunner {
    agent_id: String,
    stations: Vec<Station>,
}

impl RuleSetRunner {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            stations: Vec::new(),
        }
    }

    pub fn with_station(mut self, location: impl Into<String>, rules: RuleSet) -> Self {
        self.stations.push(Station {
            location: location.into(),
            rules: Some(rules),
        });
        self
    }

    pub fn with_waypoint(mut self, location: impl Into<String>) -> Self {
        self.stations.push(Station {
            location: location.into(),
            rules: None,
        });
        self
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }
}

impl AgentRunner for RuleSetRunner {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn run(&self, claim: &Claim, lane: &mut BeamLane<'_>) -> Result<AgentRun, EngineError> {
        let mut metrics = BeamMetrics::default();
        let mut evaluated = 0usize;

        for station in &self.stations {
            lane.visit(station.location.as_str());
            if let Some(rules) = &station.rules {
                let result = lane.invoke(rules, &station.location, &claim.proposition)?;
                metrics.confidence = result.confidence_score;
                metrics.contradiction = metrics.contradiction.max(result.contradiction_ratio());
                evaluated += 1;
            }
            metrics = lane.absorb(&station.location, metrics);
        }

        let coverage = if self.stations.is_empty() {
            0.0
        } else {
            evaluated as f64 / self.stations.len() as f64
        };

        Ok(AgentRun {
            metrics,
            coverage,
            falsified: false,
        })
    }
}

/// Everything one beam produced in a pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamRun {
    pub record: VerdictRecord,
    pub final_metrics: BeamMetrics,
    pub trajectory: Vec<String>,
    pub shadows_emitted: Vec<ShadowArtifact>,
    pub adjustments: Vec<ShadowAdjustment>,
}

impl BeamRun {
    /// Artifacts absorbed across all adjustments.
    pub fn shadows_applied(&self) -> usize {
        self.adjustments.iter().map(|a| a.applied).sum()
    }
}

/// Run one runner to completion and seal its record.
pub fn run_beam(
    runner: &dyn AgentRunner,
    claim: &Claim,
    peers: &[String],
    triggers: &TriggerCfg,
    propagator: &mut ShadowPropagator,
) -> Result<BeamRun, EngineError> {
    let agent_id = runner.agent_id();
    let mut lane = BeamLane::new(agent_id, peers, triggers, propagator);
    let out = runner.run(claim, &mut lane)?;

    let record = VerdictRecord::new(
        agent_id,
        out.metrics.confidence,
        out.metrics.contradiction,
        out.metrics.entropy,
        out.coverage,
        out.falsified,
    );
    record.validate()?;

    let BeamLane {
        trajectory,
        emitted,
        adjustments,
        ..
    } = lane;

    Ok(BeamRun {
        record,
        final_metrics: out.metrics,
        trajectory,
        shadows_emitted: emitted,
        adjustments,
    })
}
