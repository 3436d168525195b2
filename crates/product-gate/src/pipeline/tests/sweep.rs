use super::common::*;
use crate::pipeline::decision::Verdict;
use crate::pipeline::domain::CategoryId;
use crate::pipeline::sweep::{sweep, sweep_inputs, sweep_with_threads, SweepInput};

fn batch() -> Vec<crate::pipeline::domain::RawInput> {
    let mut rejected = robot_vacuum_input();
    rejected.id.0 = "rv-002".to_string();
    rejected.specs.remove("heightCm");

    let mut unknown = robot_vacuum_input();
    unknown.id.0 = "tt-001".to_string();
    unknown.category = CategoryId::new("toaster");

    vec![robot_vacuum_input(), air_purifier_input(), rejected, unknown]
}

#[test]
fn sweep_tallies_verdicts_in_input_order() {
    let report = sweep(&gate(), &batch());

    assert_eq!(report.writes, 1);
    assert_eq!(report.repairs, 1);
    assert_eq!(report.rejects, 1);
    assert_eq!(report.failures, 1);
    let ids: Vec<&str> = report.entries.iter().map(|e| e.record_id.0.as_str()).collect();
    assert_eq!(ids, vec!["rv-001", "ap-001", "rv-002", "tt-001"]);
    assert_eq!(report.entries[2].verdict, Some(Verdict::Reject));
    assert!(report.entries[3]
        .failure
        .as_deref()
        .is_some_and(|failure| failure.starts_with("CONFIG_ERROR")));
}

#[test]
fn sweep_exit_code_is_the_worst_seen() {
    let report = sweep(&gate(), &batch());
    assert_eq!(report.exit_code(), 3);

    let clean = sweep(&gate(), &[robot_vacuum_input()]);
    assert_eq!(clean.exit_code(), 0);

    assert_eq!(sweep(&gate(), &[]).exit_code(), 0);
}

#[test]
fn dedicated_pool_matches_global_pool() {
    let gate = gate();
    let inputs = batch();

    let global = sweep(&gate, &inputs);
    let pooled = sweep_with_threads(&gate, &inputs, 2).expect("pool builds");

    assert_eq!(global.entries, pooled.entries);
}

#[test]
fn csv_export_has_one_row_per_record() {
    let report = sweep(&gate(), &batch());
    let mut buffer = Vec::new();

    report.write_csv(&mut buffer).expect("csv written");

    let text = String::from_utf8(buffer).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "record_id,category,verdict,exit_code,violations,failure");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("rv-001,robot-vacuum,WRITE,0,0,"));
}

#[test]
fn legacy_records_are_tallied_as_fallbacks() {
    let mut legacy = robot_vacuum_input();
    legacy.id.0 = "rv-legacy".to_string();
    legacy.specs.clear();
    legacy.legacy_description = Some("Robot with a clean base".to_string());

    let report = sweep(&gate(), &[robot_vacuum_input(), legacy]);

    assert_eq!((report.writes, report.fallbacks), (1, 1));
    assert!(report.entries[1].is_fallback);
    assert_eq!(report.exit_code(), 0);
    let mut buffer = Vec::new();
    report.write_csv(&mut buffer).expect("csv written");
    let text = String::from_utf8(buffer).expect("utf8");
    assert!(text.contains("rv-legacy,robot-vacuum,FALLBACK,0,0,"));
}

#[test]
fn unreadable_documents_become_failure_entries() {
    let mut shapeless = serde_json::to_value(robot_vacuum_input()).expect("serializes");
    shapeless["id"] = serde_json::json!("rv-009");
    shapeless
        .as_object_mut()
        .expect("record object")
        .remove("sources");
    let good = serde_json::to_string(&robot_vacuum_input()).expect("serializes");

    let inputs = vec![
        SweepInput::from_json("a.json", &good),
        SweepInput::from_json("b.json", &shapeless.to_string()),
        SweepInput::from_json("c.json", "{ not json"),
    ];
    let report = sweep_inputs(&gate(), &inputs);

    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.writes, 1);
    assert_eq!(report.failures, 2);
    let shape = &report.entries[1];
    assert_eq!(shape.record_id.0, "rv-009");
    assert_eq!(shape.category.as_str(), "robot-vacuum");
    assert_eq!(shape.exit_code, 2);
    assert!(shape
        .failure
        .as_deref()
        .is_some_and(|failure| failure.starts_with("STRUCTURAL_ERROR")));
    assert_eq!(report.entries[2].record_id.0, "c.json");
    assert_eq!(report.entries[2].exit_code, 3);
    assert_eq!(report.exit_code(), 3);
}
