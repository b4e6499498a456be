//! Cross-agent shadow propagation.
//!
//! One agent's mini-decision results are reduced to four fields (score,
//! contradiction flag, entropy marker, trigger kind) and parked under a
//! `(target, node_location)` key. When the target agent later passes the
//! same location it absorbs a damped, capped nudge to its live metrics.
//! No reasoning content crosses the boundary.
//!
//! Three bounds hold per key regardless of how many agents emit:
//! - artifacts older than `SHADOW_TTL_MS` are evicted before use
//! - at most `MAX_ADJUSTMENTS_PER_KEY` artifacts are ever applied
//! - the cumulative applied delta stays within `±CUMULATIVE_DELTA_CAP`
//!
//! State lives for one deliberation session. Do not reuse a propagator
//! across unrelated claims: TTLs and counters would bleed through.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use verdict_core::{now_ms, MiniDecisionResult, TriggerCfg};

pub const SHADOW_TTL_MS: u64 = 5000;
pub const MAX_ADJUSTMENTS_PER_KEY: u32 = 3;
pub const CUMULATIVE_DELTA_CAP: f64 = 0.25;

const CONTRADICTION_NUDGE: f64 = -0.15;
const CONFIDENCE_DAMPING: f64 = 0.3;
const CONFIDENCE_NUDGE_MAX: f64 = 0.10;
const ENTROPY_DAMPING: f64 = 0.2;
const ENTROPY_NUDGE_MAX: f64 = 0.08;

// How a confidence shift carries over to the other two metrics.
const ENTROPY_COUPLING: f64 = 0.5;
const CONTRADICTION_COUPLING: f64 = 0.3;

const HASH_PREFIX_LEN: usize = 16;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShadowTrigger {
    HighContradiction,
    ConfidenceDelta,
    EntropySpike,
}

/// Registry key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShadowKey {
    pub target: String,
    pub node_location: String,
}

impl ShadowKey {
    pub fn new(target: impl Into<String>, node_location: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            node_location: node_location.into(),
        }
    }
}

/// Metric-only residue of one agent's mini-decision.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ShadowArtifact {
    pub shadow_id: String,
    pub origin_agent: String,
    pub emitted_at_ms: u64,
    pub node_location: String,
    pub target: String,
    pub trigger: ShadowTrigger,

    /// The capped confidence score of the originating result.
    pub confidence_delta: f64,
    pub contradiction_flag: bool,
    pub entropy_marker: f64,

    /// Truncated hash of the origin agent id.
    pub integrity_hash: String,
    pub invocation_count: usize,
    pub ttl_ms: u64,
}

impl ShadowArtifact {
    #[inline]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.emitted_at_ms) > self.ttl_ms
    }

    /// This artifact's contribution before the summed total is clamped.
    pub fn adjustment_delta(&self) -> f64 {
        match self.trigger {
            ShadowTrigger::HighContradiction => {
                if self.contradiction_flag {
                    CONTRADICTION_NUDGE
                } else {
                    0.0
                }
            }
            ShadowTrigger::ConfidenceDelta => {
                (self.confidence_delta * CONFIDENCE_DAMPING).min(CONFIDENCE_NUDGE_MAX)
            }
            ShadowTrigger::EntropySpike => {
                -(self.entropy_marker * ENTROPY_DAMPING).min(ENTROPY_NUDGE_MAX)
            }
        }
    }
}

/// Live metrics an agent carries while it runs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BeamMetrics {
    pub confidence: f64,
    pub entropy: f64,
    pub contradiction: f64,
}

impl Default for BeamMetrics {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            entropy: 0.5,
            contradiction: 0.0,
        }
    }
}

impl BeamMetrics {
    /// Shift by an already-clamped total; each metric is re-clamped to [0,1].
    pub fn shifted(&self, total: f64) -> Self {
        Self {
            confidence: (self.confidence + total).clamp(0.0, 1.0),
            entropy: (self.entropy - total * ENTROPY_COUPLING).clamp(0.0, 1.0),
            contradiction: (self.contradiction + total * CONTRADICTION_COUPLING).clamp(0.0, 1.0),
        }
    }
}

/// Outcome of one `apply` call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ShadowAdjustment {
    pub metrics: BeamMetrics,
    /// Artifacts that contributed; 0 means metrics are unchanged.
    pub applied: usize,
    /// Total delta applied to confidence.
    pub delta: f64,
}

impl ShadowAdjustment {
    fn unchanged(metrics: BeamMetrics) -> Self {
        Self {
            metrics,
            applied: 0,
            delta: 0.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResonanceEvent {
    pub key: ShadowKey,
    /// Distinct origin agents, first-seen order.
    pub agents_involved: Vec<String>,
    /// Confidence values of the (up to) two most recent artifacts.
    pub confidence_shifts: Vec<f64>,
    pub timestamp_ms: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ResonanceReport {
    pub total_resonance_events: usize,
    pub active_shadows: usize,
    /// Live artifact count per key that has any.
    pub distribution: Vec<(ShadowKey, usize)>,
    pub events: Vec<ResonanceEvent>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyStats {
    pub key: ShadowKey,
    pub adjustments: u32,
    pub cumulative_delta: f64,
}

/// Snapshot of registry bookkeeping. Rate limiting is only visible here.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ShadowStats {
    pub total_shadows: usize,
    /// Stored but past TTL; evicted lazily on the next `apply` at their key.
    pub expired_shadows: usize,
    pub active_keys: usize,
    pub keys: Vec<KeyStats>,
}

#[derive(Clone, Copy, Debug, Default)]
struct KeyCounters {
    adjustments: u32,
    cumulative: f64,
}

/// Decide which trigger, if any, a result fires. Fixed priority:
/// contradiction count, then capped score, then entropy marker.
pub fn evaluate_trigger(result: &MiniDecisionResult, cfg: &TriggerCfg) -> Option<ShadowTrigger> {
    if result.contradiction_flags.len() >= cfg.contradiction_threshold {
        return Some(ShadowTrigger::HighContradiction);
    }
    // Compares the absolute score against a threshold named as a delta.
    if result.confidence_score >= cfg.confidence_delta_threshold {
        return Some(ShadowTrigger::ConfidenceDelta);
    }
    if result.entropy_marker() >= cfg.entropy_spike_threshold {
        return Some(ShadowTrigger::EntropySpike);
    }
    None
}

fn truncated_sha256(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut s = hex::encode(digest);
    s.truncate(HASH_PREFIX_LEN);
    s
}

/// Session-scoped shadow registry.
#[derive(Clone, Debug, Default)]
pub struct ShadowPropagator {
    registry: BTreeMap<ShadowKey, Vec<ShadowArtifact>>,
    counters: BTreeMap<ShadowKey, KeyCounters>,
}

impl ShadowPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(
        &mut self,
        origin: &str,
        location: &str,
        target: &str,
        result: &MiniDecisionResult,
        triggers: &TriggerCfg,
    ) -> Option<ShadowArtifact> {
        self.emit_at(origin, location, target, result, triggers, now_ms())
    }

    /// Store an artifact for `target` at `location` if `result` fires a trigger.
    pub fn emit_at(
        &mut self,
        origin: &str,
        location: &str,
        target: &str,
        result: &MiniDecisionResult,
        triggers: &TriggerCfg,
        now_ms: u64,
    ) -> Option<ShadowArtifact> {
        let trigger = evaluate_trigger(result, triggers)?;

        let artifact = ShadowArtifact {
            shadow_id: truncated_sha256(&format!("{}{}{}", origin, location, now_ms)),
            origin_agent: origin.to_string(),
            emitted_at_ms: now_ms,
            node_location: location.to_string(),
            target: target.to_string(),
            trigger,
            confidence_delta: result.confidence_score,
            contradiction_flag: !result.contradiction_flags.is_empty(),
            entropy_marker: result.entropy_marker(),
            integrity_hash: truncated_sha256(origin),
            invocation_count: result.rule_results.len(),
            ttl_ms: SHADOW_TTL_MS,
        };
        debug!(
            "shadow {} emitted: {} -> {} @ {} ({:?})",
            artifact.shadow_id, origin, target, location, trigger
        );

        self.registry
            .entry(ShadowKey::new(target, location))
            .or_default()
            .push(artifact.clone());
        Some(artifact)
    }

    pub fn apply(&mut self, target: &str, location: &str, base: BeamMetrics) -> ShadowAdjustment {
        self.apply_at(target, location, base, now_ms())
    }

    /// Nudge `base` with live artifacts parked for `target` at `location`.
    ///
    /// Self-emitted artifacts never apply. Rate-limited keys return `base`
    /// untouched. At most the remaining per-key budget of artifacts is
    /// applied (oldest first), and the total is clamped both per call and
    /// to the key's remaining cumulative headroom.
    pub fn apply_at(
        &mut self,
        target: &str,
        location: &str,
        base: BeamMetrics,
        now_ms: u64,
    ) -> ShadowAdjustment {
        let key = ShadowKey::new(target, location);
        let shadows = match self.registry.get_mut(&key) {
            Some(s) => s,
            None => return ShadowAdjustment::unchanged(base),
        };

        let before = shadows.len();
        shadows.retain(|s| !s.is_expired(now_ms));
        if shadows.len() < before {
            debug!(
                "evicted {} expired shadows at {}@{}",
                before - shadows.len(),
                target,
                location
            );
        }
        if shadows.is_empty() {
            return ShadowAdjustment::unchanged(base);
        }

        let counters = self.counters.entry(key).or_default();
        if counters.adjustments >= MAX_ADJUSTMENTS_PER_KEY {
            debug!("shadow rate limit reached at {}@{}", target, location);
            return ShadowAdjustment::unchanged(base);
        }
        let budget = (MAX_ADJUSTMENTS_PER_KEY - counters.adjustments) as usize;

        let mut applied = 0usize;
        let mut raw = 0.0_f64;
        for s in shadows
            .iter()
            .filter(|s| s.origin_agent != target)
            .take(budget)
        {
            raw += s.adjustment_delta();
            applied += 1;
        }
        if applied == 0 {
            return ShadowAdjustment::unchanged(base);
        }

        let total = raw
            .clamp(-CUMULATIVE_DELTA_CAP, CUMULATIVE_DELTA_CAP)
            .clamp(
                -CUMULATIVE_DELTA_CAP - counters.cumulative,
                CUMULATIVE_DELTA_CAP - counters.cumulative,
            );

        counters.adjustments += applied as u32;
        counters.cumulative += total;

        ShadowAdjustment {
            metrics: base.shifted(total),
            applied,
            delta: total,
        }
    }

    pub fn resonance(&self) -> ResonanceReport {
        self.resonance_at(now_ms())
    }

    /// Report every key where two or more live artifacts converge.
    /// Read-only: nothing is evicted or counted.
    pub fn resonance_at(&self, now_ms: u64) -> ResonanceReport {
        let mut report = ResonanceReport::default();

        for (key, shadows) in &self.registry {
            let live: Vec<&ShadowArtifact> =
                shadows.iter().filter(|s| !s.is_expired(now_ms)).collect();
            if live.is_empty() {
                continue;
            }
            report.active_shadows += live.len();
            report.distribution.push((key.clone(), live.len()));

            if live.len() < 2 {
                continue;
            }
            let mut agents_involved: Vec<String> = Vec::new();
            for s in &live {
                if !agents_involved.iter().any(|a| a == &s.origin_agent) {
                    agents_involved.push(s.origin_agent.clone());
                }
            }
            let confidence_shifts = live[live.len() - 2..]
                .iter()
                .map(|s| s.confidence_delta)
                .collect();

            report.events.push(ResonanceEvent {
                key: key.clone(),
                agents_involved,
                confidence_shifts,
                timestamp_ms: now_ms,
            });
        }

        report.total_resonance_events = report.events.len();
        report
    }

    pub fn stats(&self) -> ShadowStats {
        self.stats_at(now_ms())
    }

    pub fn stats_at(&self, now_ms: u64) -> ShadowStats {
        let mut stats = ShadowStats {
            active_keys: self.registry.len(),
            ..ShadowStats::default()
        };
        for shadows in self.registry.values() {
            stats.total_shadows += shadows.len();
            stats.expired_shadows += shadows.iter().filter(|s| s.is_expired(now_ms)).count();
        }
        stats.keys = self
            .counters
            .iter()
            .map(|(key, c)| KeyStats {
                key: key.clone(),
                adjustments: c.adjustments,
                cumulative_delta: c.cumulative,
            })
            .collect();
        stats
    }

    /// Stored artifacts for a key, expired ones included until evicted.
    pub fn artifacts(&self, target: &str, location: &str) -> &[ShadowArtifact] {
        self.registry
            .get(&ShadowKey::new(target, location))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
