//! End-to-end scenarios exercising the boundary operations together.

use sibyl_core::EngineConfig;
use sibyl_engine::{Cell, EngineError, IntentEngine, IntentRecord, Row, columns};

fn engine() -> IntentEngine {
    match IntentEngine::new(EngineConfig::default()) {
        Ok(engine) => engine,
        Err(error) => panic!("engine creation failed: {error}"),
    }
}

fn pharmacy_record() -> IntentRecord {
    IntentRecord::new(
        "INT-PHR-0001",
        "pharmacy",
        "healthcare",
        "PharmacyAgent",
        "prescription or medication refills",
    )
    .with_utterances(vec![
        "I need to refill my prescription",
        "Where is the nearest pharmacy?",
        "I need help with my medication",
        "Is my drug covered",
        "Mail order pharmacy",
    ])
    .with_keywords(vec!["pharmacy", "prescription", "medication", "refill"])
    .with_threshold(0.7)
}

fn benefits_record() -> IntentRecord {
    IntentRecord::new(
        "INT-BEN-0014",
        "benefits",
        "benefits",
        "BenefitsAgent",
        "coverage and benefit information",
    )
    .with_utterances(vec![
        "What are my benefits",
        "What does my plan cover",
        "I need help with my coverage",
        "Benefits summary",
        "Coverage information",
    ])
    .with_keywords(vec!["benefits", "coverage", "plan"])
}

fn wellness_row(index: usize, intent_id: &str, name: &str) -> Row {
    Row::new(index)
        .with_text(columns::INTENT_ID, intent_id)
        .with_text(columns::INTENT_NAME, name)
        .with_text(columns::CATEGORY, "wellness")
        .with_text(columns::AGENT_ROUTING, "WellnessAgent")
        .with_cell(columns::PRIORITY, Cell::Int(3))
        .with_text(columns::DESCRIPTION_SHORT, "wellness programs")
        .with_text(
            columns::TRAINING_UTTERANCES,
            "Wellness program information | Health incentive programs | Wellness rewards | \
             Earn wellness points | Fitness program coverage",
        )
        .with_text(columns::KEYWORDS, "wellness | incentive | rewards")
}

#[test]
fn firm_match_on_exact_training_utterance() {
    let engine = engine();
    let outcome = engine.apply_single(pharmacy_record());
    assert!(outcome.success);
    assert_eq!(outcome.version, 1);

    let decision = engine.classify("I need to refill my prescription");
    assert_eq!(decision.intent_name.as_deref(), Some("pharmacy"));
    assert_eq!(decision.agent.as_deref(), Some("PharmacyAgent"));
    assert!(
        decision.confidence >= 0.7,
        "confidence {} must clear the 0.7 record threshold",
        decision.confidence
    );
    assert!(!decision.needs_clarification);
}

#[test]
fn ambiguous_utterance_asks_for_clarification() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);
    assert!(engine.apply_single(benefits_record()).success);

    let decision = engine.classify("I need help with my coverage and medication");
    assert!(decision.needs_clarification);
    assert!(decision.disambiguation_prompt.is_some());
    let ids: Vec<_> = decision
        .candidates
        .iter()
        .map(|candidate| candidate.intent_id.as_str())
        .collect();
    assert!(ids.contains(&"INT-PHR-0001"), "candidates: {ids:?}");
    assert!(ids.contains(&"INT-BEN-0014"), "candidates: {ids:?}");
}

#[test]
fn unrelated_utterance_is_a_decision_not_an_error() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);
    assert!(engine.apply_single(benefits_record()).success);

    let decision = engine.classify("what's the weather like today");
    assert!(decision.intent_name.is_none());
    assert!(decision.agent.is_none());
    assert!(!decision.needs_clarification);

    let decision = engine.classify("");
    assert!(decision.intent_name.is_none());
    assert!(!decision.needs_clarification);
}

#[test]
fn duplicate_id_in_bulk_upload_stages_nothing() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);
    let version_before = engine.current_version();

    let rows = vec![
        wellness_row(0, "INT-WEL-0047", "wellnessPrograms"),
        wellness_row(1, "INT-WEL-0047", "gymFitness"),
    ];
    let report = engine.stage_bulk(&rows);
    assert!(!report.valid);
    assert!(
        report
            .errors
            .iter()
            .any(|issue| issue.intent_id.as_deref() == Some("INT-WEL-0047")),
        "error must reference the duplicated id: {report:?}"
    );

    match engine.activate_staged() {
        Err(EngineError::NothingStaged) => {}
        other => panic!("expected NothingStaged, got {other:?}"),
    }
    assert_eq!(
        engine.current_version(),
        version_before,
        "registry must be unchanged after a rejected upload"
    );
}

#[test]
fn bulk_upload_replaces_whole_registry_on_activation() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);
    assert!(engine.apply_single(benefits_record()).success);
    assert_eq!(engine.current_version(), 2);

    let rows = vec![wellness_row(0, "INT-WEL-0047", "wellnessPrograms")];
    let report = engine.stage_bulk(&rows);
    assert!(report.valid);
    assert_eq!(
        engine.current_version(),
        2,
        "staging alone must not activate"
    );

    let activation = match engine.activate_staged() {
        Ok(activation) => activation,
        Err(error) => panic!("activation failed: {error}"),
    };
    assert_eq!(activation.version, 3);

    let catalog = engine.list_intents();
    assert_eq!(catalog.count, 1, "bulk upload replaces, never merges");
    assert_eq!(catalog.intents[0].intent_id, "INT-WEL-0047");
}

#[test]
fn invalid_merge_keeps_version_and_valid_merge_increments_once() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);

    let mut bad = benefits_record();
    bad.agent_routing = String::new();
    let outcome = engine.apply_single(bad);
    assert!(!outcome.success);
    assert_eq!(outcome.version, 1, "failed merge must not bump the version");
    assert_eq!(engine.current_version(), 1);

    let outcome = engine.apply_single(benefits_record());
    assert!(outcome.success);
    assert_eq!(outcome.version, 2, "valid merge bumps by exactly one");
}

#[test]
fn resubmitting_a_record_converges_instead_of_duplicating() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);
    assert!(engine.apply_single(pharmacy_record()).success);

    assert_eq!(engine.current_version(), 2, "each publish bumps the version");
    let stats = engine.stats();
    assert_eq!(stats.intent_count, 1, "same id must never duplicate");

    let snapshot = engine.snapshot();
    let stored = snapshot.get("INT-PHR-0001");
    assert_eq!(
        stored.map(|record| record.training_utterances.len()),
        Some(5)
    );
}

#[test]
fn classification_is_deterministic_across_calls() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);
    assert!(engine.apply_single(benefits_record()).success);

    let mut first = engine.classify("I need help with my coverage and medication");
    let mut second = engine.classify("I need help with my coverage and medication");
    first.processing_time_ms = 0.0;
    second.processing_time_ms = 0.0;
    assert_eq!(first, second);
}

#[test]
fn in_flight_snapshot_survives_a_reload() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);

    let held = engine.snapshot();
    assert!(engine.apply_single(benefits_record()).success);

    assert_eq!(held.version(), 1);
    assert_eq!(held.len(), 1, "held snapshot must be unaffected by updates");
    assert_eq!(engine.snapshot().len(), 2);
}

#[test]
fn catalog_groups_by_category() {
    let engine = engine();
    assert!(engine.apply_single(pharmacy_record()).success);
    assert!(engine.apply_single(benefits_record()).success);

    let catalog = engine.list_intents();
    assert_eq!(catalog.count, 2);
    assert_eq!(catalog.categories.get("healthcare"), Some(&1));
    assert_eq!(catalog.categories.get("benefits"), Some(&1));
}
