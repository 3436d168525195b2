use super::common::*;
use crate::pipeline::categories::ROBOT_VACUUM;
use crate::pipeline::domain::CategoryId;
use crate::pipeline::legacy::{fallback_record, LegacyRecord};
use crate::pipeline::scoring::Criterion;

fn legacy_input() -> crate::pipeline::domain::RawInput {
    let mut raw = robot_vacuum_input();
    raw.specs.clear();
    raw.evidence.clear();
    raw.legacy_description =
        Some("Slim robot with LiDAR navigation and a self-emptying clean base.".to_string());
    raw
}

#[test]
fn only_spec_less_records_with_a_description_qualify() {
    assert!(LegacyRecord::from_raw(&robot_vacuum_input()).is_none());

    let mut raw = legacy_input();
    raw.legacy_description = Some("   ".to_string());
    assert!(LegacyRecord::from_raw(&raw).is_none());

    assert!(LegacyRecord::from_raw(&legacy_input()).is_some());
}

#[test]
fn fallback_record_is_always_flagged() {
    let registry = registry();
    let bundle = registry
        .lookup(&CategoryId::new(ROBOT_VACUUM))
        .expect("robot vacuum registered");
    let legacy = LegacyRecord::from_raw(&legacy_input()).expect("legacy record");

    let record = fallback_record(bundle, &legacy);

    assert!(record.is_fallback);
    assert!(record.specs.is_empty());
    assert_eq!(record.tags.get("smart_navigation"), Some(&true));
    assert_eq!(record.tags.get("self_emptying"), Some(&true));
    assert_eq!(record.tags.get("mopping"), Some(&false));
    assert_eq!(record.scores.criteria, bundle.baseline);
    assert_eq!(record.scores.criteria.get(Criterion::C1), 5.0);
}

#[test]
fn gate_fallback_requires_a_known_category() {
    let mut legacy = LegacyRecord::from_raw(&legacy_input()).expect("legacy record");
    legacy.category = CategoryId::new("toaster");

    assert!(gate().fallback(&legacy).is_err());
}
