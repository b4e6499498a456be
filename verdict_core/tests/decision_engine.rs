use verdict_core::*;

fn rec(
    id: &str,
    confidence: f64,
    contradiction: f64,
    entropy: f64,
    coverage: f64,
) -> VerdictRecord {
    VerdictRecord::new(id, confidence, contradiction, entropy, coverage, false)
}

fn falsified(
    id: &str,
    confidence: f64,
    contradiction: f64,
    entropy: f64,
    coverage: f64,
) -> VerdictRecord {
    VerdictRecord::new(id, confidence, contradiction, entropy, coverage, true)
}

fn advisory(tier: ReliabilityTier, inevitability: f64) -> Advisory {
    Advisory::new(tier, inevitability)
}

fn tier_a() -> Advisory {
    advisory(ReliabilityTier::A, 0.8)
}

#[test]
fn empty_records_suspend() {
    let v = decide(&[], &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
    assert_eq!(v.rationale, Rationale::NoRecords);
    assert_eq!(v.rationale.as_str(), "No CVVs provided");
    assert_eq!(v.audit.chain_step, 1);
    assert!(v.signatures.is_empty());
    assert_eq!(v.stats, AggregateStats::default());
}

#[test]
fn falsified_record_vetoes_everything() {
    let records = [falsified("a", 0.99, 0.0, 0.0, 1.0), rec("b", 0.99, 0.0, 0.0, 1.0)];
    let v = decide(&records, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Reject);
    assert_eq!(v.rationale, Rationale::Falsified);
}

#[test]
fn falsification_beats_extreme_contradiction() {
    let records = [falsified("a", 0.90, 0.99, 0.8, 0.7), rec("b", 0.50, 0.99, 0.9, 0.5)];
    assert_eq!(decide(&records, &tier_a()).unwrap().status, VerdictStatus::Reject);
}

#[test]
fn single_falsified_record_rejects() {
    let records = [falsified("solo", 0.95, 0.0, 0.1, 0.95)];
    let v = decide(&records, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Reject);
    assert_eq!(v.audit.chain_step, 2);
}

#[test]
fn high_mean_contradiction_suspends_despite_confidence() {
    // Scenario A
    let records = [
        rec("a", 0.85, 0.65, 0.4, 0.8),
        rec("b", 0.82, 0.70, 0.45, 0.8),
        rec("c", 0.80, 0.68, 0.42, 0.8),
    ];
    let v = decide(&records, &advisory(ReliabilityTier::A, 0.8)).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
    assert!(v.rationale.as_str().to_lowercase().contains("contradiction"));
    assert_eq!(v.audit.chain_step, 3);
}

#[test]
fn single_poisoned_record_dominates() {
    // Scenario B
    let records = [rec("strong", 0.90, 0.10, 0.2, 0.9), rec("poison", 0.85, 0.80, 0.7, 0.7)];
    let v = decide(&records, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
    assert_eq!(v.rationale, Rationale::HighContradiction);
}

#[test]
fn extreme_contradiction_dominates() {
    let records = [rec("a", 0.95, 0.95, 0.1, 0.9), rec("b", 0.94, 0.96, 0.1, 0.9)];
    let v = decide(&records, &advisory(ReliabilityTier::A, 0.9)).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
}

#[test]
fn contradiction_threshold_boundary() {
    let below = [rec("a", 0.80, 0.59, 0.3, 0.8), rec("b", 0.81, 0.58, 0.3, 0.8)];
    let v = decide(&below, &tier_a()).unwrap();
    assert_ne!(v.status, VerdictStatus::Suspend);
    assert_ne!(v.audit.chain_step, 3);

    let above = [rec("a", 0.80, 0.61, 0.3, 0.8), rec("b", 0.81, 0.62, 0.3, 0.8)];
    let v = decide(&above, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
    assert_eq!(v.audit.chain_step, 3);
}

#[test]
fn contradiction_blocks_reinterpretation() {
    let records = [
        rec("a", 0.76, 0.65, 0.4, 0.8),
        rec("b", 0.75, 0.67, 0.4, 0.8),
        rec("c", 0.77, 0.64, 0.4, 0.8),
        rec("d", 0.74, 0.66, 0.4, 0.8),
    ];
    let v = decide(&records, &advisory(ReliabilityTier::A, 0.9)).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
}

#[test]
fn single_strong_record_is_conditional() {
    // Scenario C
    let records = [rec("solo", 0.90, 0.05, 0.2, 0.9)];
    let v = decide(&records, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Conditional);
    assert_eq!(v.rationale, Rationale::SingleStrongView);
    assert_eq!(v.audit.chain_step, 4);
}

#[test]
fn single_record_never_reaches_accept() {
    let weak = [rec("solo", 0.84, 0.05, 0.2, 0.9)];
    let v = decide(&weak, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
    assert_eq!(v.rationale, Rationale::InsufficientConsensus);

    let contradicted = [rec("solo", 0.95, 0.30, 0.2, 0.9)];
    let v = decide(&contradicted, &advisory(ReliabilityTier::A, 0.99)).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
    assert_eq!(v.audit.chain_step, 4);
}

#[test]
fn byzantine_needs_tier_d_and_high_entropy() {
    let records = [rec("a", 0.7, 0.1, 0.85, 0.7), rec("b", 0.7, 0.1, 0.85, 0.7)];
    let v = decide(&records, &advisory(ReliabilityTier::D, 0.8)).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
    assert_eq!(v.rationale, Rationale::ByzantineUncertainty);

    // Same records without a tier fall through to the ambiguous default.
    let v = decide(&records, &Advisory::default()).unwrap();
    assert_eq!(v.audit.chain_step, 10);
}

#[test]
fn tier_d_with_low_entropy_does_not_suspend() {
    let records = [rec("a", 0.85, 0.1, 0.3, 0.8), rec("b", 0.85, 0.1, 0.3, 0.8)];
    let v = decide(&records, &advisory(ReliabilityTier::D, 0.8)).unwrap();
    assert_ne!(v.status, VerdictStatus::Suspend);
}

#[test]
fn reinterpreted_needs_inevitability() {
    let records = [
        rec("a", 0.75, 0.15, 0.4, 0.8),
        rec("b", 0.74, 0.14, 0.4, 0.8),
        rec("c", 0.76, 0.13, 0.4, 0.8),
        rec("d", 0.73, 0.16, 0.4, 0.8),
    ];
    let v = decide(&records, &advisory(ReliabilityTier::A, 0.85)).unwrap();
    assert_eq!(v.status, VerdictStatus::Reinterpreted);

    let v = decide(&records, &advisory(ReliabilityTier::A, 0.7)).unwrap();
    assert_ne!(v.status, VerdictStatus::Reinterpreted);
}

#[test]
fn dominant_view_is_conditional() {
    let records = [
        rec("strong", 0.88, 0.1, 0.4, 0.8),
        rec("weak1", 0.52, 0.3, 0.6, 0.6),
        rec("weak2", 0.48, 0.3, 0.6, 0.6),
    ];
    let v = decide(&records, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Conditional);
    assert_eq!(v.rationale, Rationale::DominantView);
}

#[test]
fn consensus_accepts() {
    let records = [
        rec("a", 0.78, 0.08, 0.25, 0.85),
        rec("b", 0.76, 0.09, 0.26, 0.85),
        rec("c", 0.77, 0.07, 0.24, 0.85),
    ];
    let v = decide(&records, &advisory(ReliabilityTier::A, 0.7)).unwrap();
    assert_eq!(v.status, VerdictStatus::Accept);
    assert_eq!(v.rationale, Rationale::Consensus);
}

#[test]
fn collectively_low_confidence_rejects() {
    let records = [rec("a", 0.45, 0.2, 0.6, 0.5), rec("b", 0.44, 0.25, 0.65, 0.5)];
    let v = decide(&records, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Reject);
    assert_eq!(v.rationale, Rationale::InsufficientConfidenceOrCoverage);
}

#[test]
fn ambiguous_pool_escalates() {
    let records = [rec("a", 0.65, 0.2, 0.5, 0.6), rec("b", 0.64, 0.22, 0.52, 0.6)];
    let v = decide(&records, &tier_a()).unwrap();
    assert_eq!(v.status, VerdictStatus::Suspend);
    assert_eq!(v.rationale, Rationale::Ambiguous);
}

#[test]
fn empty_advisory_uses_defaults() {
    let adv: Advisory = serde_json::from_str("{}").unwrap();
    assert_eq!(adv, Advisory::default());
    assert!(!adv.is_byzantine());
    assert_eq!(adv.inevitability(), 0.0);

    // Would be REINTERPRETED with inevitability; without it the dominant view wins.
    let records = [rec("a", 0.85, 0.1, 0.3, 0.8), rec("b", 0.85, 0.1, 0.3, 0.8)];
    let v = decide(&records, &adv).unwrap();
    assert_eq!(v.status, VerdictStatus::Conditional);
}

#[test]
fn out_of_range_record_fails_before_any_rule() {
    let records = [falsified("a", 0.5, 0.1, 0.1, 0.5), rec("bad", 1.2, 0.1, 0.1, 0.5)];
    let err = decide(&records, &tier_a()).unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation { agent_id: "bad".to_string(), field: "confidence", value: 1.2 }
    );
    assert_eq!(err.kind(), "validation");

    let nan = [rec("nan", 0.5, 0.1, f64::NAN, 0.5)];
    assert!(matches!(
        decide(&nan, &tier_a()),
        Err(EngineError::Validation { field: "entropy", .. })
    ));
}

#[test]
fn decision_is_deterministic() {
    let records = [
        rec("a", 0.78, 0.08, 0.25, 0.85),
        rec("b", 0.76, 0.09, 0.26, 0.85),
    ];
    let adv = tier_a();
    let v1 = decide(&records, &adv).unwrap();
    let v2 = decide(&records, &adv).unwrap();
    assert_eq!(v1.status, v2.status);
    assert_eq!(v1.rationale, v2.rationale);
    assert_eq!(v1.signatures, v2.signatures);
    assert_eq!(v1.stats, v2.stats);
    assert_eq!(v1.signatures, vec![records[0].signature(), records[1].signature()]);
}

#[test]
fn stats_are_rounded_to_four_places() {
    let records = [
        rec("a", 0.1, 0.0, 0.2, 0.9),
        rec("b", 0.2, 0.1, 0.2, 0.9),
        rec("c", 0.2, 0.0, 0.2, 0.9),
    ];
    let v = decide(&records, &tier_a()).unwrap();
    assert_eq!(v.stats.count, 3);
    assert!((v.stats.avg_confidence - 0.1667).abs() < 1e-9);
    assert!((v.stats.avg_contradiction - 0.0333).abs() < 1e-9);
    assert!((v.stats.max_contradiction - 0.1).abs() < 1e-9);
    assert!(v.audit.invariants_checked);
}

#[test]
fn custom_cfg_moves_thresholds() {
    let records = [rec("a", 0.80, 0.55, 0.3, 0.8), rec("b", 0.81, 0.55, 0.3, 0.8)];
    assert_ne!(decide(&records, &tier_a()).unwrap().audit.chain_step, 3);

    let cfg = DecisionCfg { tau_contra_mean: 0.5, ..DecisionCfg::default() };
    let v = decide_cfg(&records, &tier_a(), &cfg).unwrap();
    assert_eq!(v.audit.chain_step, 3);
}

#[test]
fn verdict_serializes_with_wire_names() {
    let v = decide(&[], &Advisory::default()).unwrap();
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["status"], "SUSPEND");
    assert_eq!(json["rationale"], "No CVVs provided");
    assert_eq!(json["audit"]["invariants_checked"], true);
}
