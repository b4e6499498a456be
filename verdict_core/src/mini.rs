//! Bounded rule executor.
//!
//! Runs at most `MAX_NODES` typed nodes against a context string and folds
//! their signed deltas onto the rule set's baseline. The final clamp to
//! [0,1] is the only thing keeping the score capped, no matter how many
//! large deltas pile up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Hard cap on nodes visited per call.
pub const MAX_NODES: usize = 5;

const DEFAULT_BASELINE: f64 = 0.5;
const DEFAULT_CERTAINTY: f64 = 0.8;

const CONTRADICTION_PENALTY: f64 = 0.3;
const NODE_DELTA_FLOOR: f64 = -0.5;

const CONTRADICTION_INDICATORS: [&str; 8] = [
    "contradiction",
    "paradox",
    "inconsistent",
    "mutually exclusive",
    "cannot be both",
    "impossible",
    "false premise",
    "invalid conclusion",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    InferenceRule,
    Method,
    Concept,
    Other,
}

impl NodeKind {
    fn parse(s: &str) -> Self {
        match s {
            "inference_rule" => NodeKind::InferenceRule,
            "method" => NodeKind::Method,
            "concept" => NodeKind::Concept,
            _ => NodeKind::Other,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeValue {
    pub certainty: Option<f64>,
}

/// One rule node. Every field defaults when missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleNode {
    pub id: String,
    pub term: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub definition: String,
    pub value: NodeValue,
}

impl RuleNode {
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            node_type: node_type.into(),
            ..Self::default()
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_certainty(mut self, certainty: f64) -> Self {
        self.value.certainty = Some(certainty);
        self
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::parse(&self.node_type)
    }
}

/// Ordered rule definition with a declared confidence baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub initial_confidence: f64,
    pub entries: Vec<RuleNode>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            initial_confidence: DEFAULT_BASELINE,
            entries: Vec::new(),
        }
    }
}

impl RuleSet {
    pub fn new(initial_confidence: f64) -> Self {
        Self {
            initial_confidence,
            entries: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: RuleNode) -> Self {
        self.entries.push(node);
        self
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// What a single node contributed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeOutcome {
    pub node_id: String,
    pub term: String,
    pub kind: NodeKind,
    pub confidence_delta: f64,
    pub contradiction_detected: bool,
    pub notes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiniDecisionResult {
    /// Always within [0,1].
    pub confidence_score: f64,
    pub rule_results: BTreeMap<String, NodeOutcome>,
    /// Flagged node ids in visit order.
    pub contradiction_flags: Vec<String>,
}

impl MiniDecisionResult {
    /// Variance of per-node deltas scaled by 10 and capped at 1.0.
    pub fn entropy_marker(&self) -> f64 {
        if self.rule_results.is_empty() {
            return 0.0;
        }
        let n = self.rule_results.len() as f64;
        let mean = self
            .rule_results
            .values()
            .map(|o| o.confidence_delta)
            .sum::<f64>()
            / n;
        let variance = self
            .rule_results
            .values()
            .map(|o| {
                let d = o.confidence_delta - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        (variance * 10.0).min(1.0)
    }

    /// Fraction of evaluated nodes that raised a contradiction.
    pub fn contradiction_ratio(&self) -> f64 {
        if self.rule_results.is_empty() {
            return 0.0;
        }
        let flagged = self
            .rule_results
            .values()
            .filter(|o| o.contradiction_detected)
            .count();
        flagged as f64 / self.rule_results.len() as f64
    }
}

/// Run `rules` against `context`. Pure; no state survives the call.
pub fn execute(rules: &RuleSet, context: &str) -> MiniDecisionResult {
    let context_lower = context.to_lowercase();

    let mut accumulated = 0.0_f64;
    let mut rule_results = BTreeMap::new();
    let mut contradiction_flags = Vec::new();

    for node in rules.entries.iter().take(MAX_NODES) {
        let outcome = evaluate_node(node, &context_lower);
        accumulated += outcome.confidence_delta;
        if outcome.contradiction_detected {
            contradiction_flags.push(node.id.clone());
        }
        rule_results.insert(node.id.clone(), outcome);
    }

    let baseline = finite_or(rules.initial_confidence, DEFAULT_BASELINE);
    let total = baseline + accumulated;
    // `clamp` passes NaN through.
    let confidence_score = (if total.is_nan() { baseline } else { total }).clamp(0.0, 1.0);

    MiniDecisionResult {
        confidence_score,
        rule_results,
        contradiction_flags,
    }
}

/// Reject a result whose score escaped [0,1].
pub fn enforce_mini_invariants(result: &MiniDecisionResult) -> Result<()> {
    if !(0.0..=1.0).contains(&result.confidence_score) {
        return Err(EngineError::invariant(format!(
            "mini-decision confidence {} out of bounds; accumulation uncapped",
            result.confidence_score
        )));
    }
    Ok(())
}

fn evaluate_node(node: &RuleNode, context_lower: &str) -> NodeOutcome {
    let term_lower = node.term.to_lowercase();
    let mut notes = Vec::new();

    let kind = node.kind();
    let mut delta = match kind {
        NodeKind::InferenceRule => inference_delta(node, &term_lower, &mut notes),
        NodeKind::Method => method_delta(node, &term_lower, &mut notes),
        NodeKind::Concept => concept_delta(node, &term_lower, context_lower, &mut notes),
        NodeKind::Other => {
            notes.push(format!(
                "unknown node type '{}': minimal confidence boost",
                node.node_type
            ));
            0.05
        }
    };

    let contradiction_detected = has_contradiction(&term_lower, &node.definition, context_lower);
    if contradiction_detected {
        delta = (delta - CONTRADICTION_PENALTY).max(NODE_DELTA_FLOOR);
        notes.push("contradiction detected in node content".to_string());
    }

    NodeOutcome {
        node_id: node.id.clone(),
        term: node.term.clone(),
        kind,
        confidence_delta: delta,
        contradiction_detected,
        notes,
    }
}

fn inference_delta(node: &RuleNode, term: &str, notes: &mut Vec<String>) -> f64 {
    let certainty = node
        .value
        .certainty
        .map_or(DEFAULT_CERTAINTY, |c| finite_or(c, DEFAULT_CERTAINTY));
    let (weight, note) = if term.contains("modus_ponens") {
        (0.15, "applied modus ponens".to_string())
    } else if term.contains("modus_tollens") {
        (0.12, "applied modus tollens".to_string())
    } else if term.contains("syllogism") {
        (0.10, "applied syllogistic reasoning".to_string())
    } else {
        (0.08, format!("applied general inference rule: {}", node.term))
    };
    notes.push(note);
    certainty * weight
}

fn method_delta(node: &RuleNode, term: &str, notes: &mut Vec<String>) -> f64 {
    let (delta, note) = if term.contains("deductive") {
        (0.12, "deductive method recognized".to_string())
    } else if term.contains("inductive") {
        (0.08, "inductive method recognized".to_string())
    } else if node.definition.to_lowercase().contains("logical") {
        (0.10, "logical method framework applied".to_string())
    } else {
        (0.06, format!("general reasoning method: {}", node.term))
    };
    notes.push(note);
    delta
}

fn concept_delta(node: &RuleNode, term: &str, context: &str, notes: &mut Vec<String>) -> f64 {
    if !term.is_empty() && context.contains(term) {
        notes.push(format!("concept '{}' is contextually relevant", node.term));
        0.10
    } else {
        notes.push(format!("concept '{}' not directly relevant", node.term));
        0.05
    }
}

/// Non-finite input scalars count as malformed and take their default.
#[inline]
fn finite_or(x: f64, fallback: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        fallback
    }
}

fn has_contradiction(term: &str, definition: &str, context: &str) -> bool {
    let content = format!("{} {} {}", term, definition.to_lowercase(), context);
    CONTRADICTION_INDICATORS
        .iter()
        .any(|indicator| content.contains(indicator))
}
