use super::common::*;
use crate::pipeline::categories::{AIR_PURIFIER, ROBOT_VACUUM, SMART_PLUG};
use crate::pipeline::contract::{CompletenessContract, Tier};
use crate::pipeline::domain::CategoryId;
use crate::pipeline::registry::{CategoryBundle, CategoryRegistry, RegistryError};
use crate::pipeline::scoring::{Condition, Criterion, CriterionWeights, Rule};

fn robot_bundle() -> CategoryBundle {
    registry()
        .lookup(&CategoryId::new(ROBOT_VACUUM))
        .expect("robot vacuum registered")
        .clone()
}

#[test]
fn standard_registry_lists_builtin_categories() {
    let registry = registry();

    let ids: Vec<String> = registry.list().iter().map(|id| id.to_string()).collect();

    assert_eq!(ids, vec![AIR_PURIFIER, ROBOT_VACUUM, SMART_PLUG]);
    let summaries = registry.summaries();
    let plug = summaries
        .iter()
        .find(|summary| summary.id.as_str() == SMART_PLUG)
        .expect("smart plug listed");
    assert_eq!(plug.tier, Tier::Stub);
    let purifier = summaries
        .iter()
        .find(|summary| summary.id.as_str() == AIR_PURIFIER)
        .expect("air purifier listed");
    assert!(purifier.placeholder_autofill);
}

#[test]
fn every_builtin_weight_table_sums_to_one() {
    let registry = registry();
    for id in registry.list() {
        let bundle = registry.lookup(&id).expect("listed ids resolve");
        assert!((bundle.weights.sum() - 1.0).abs() <= 0.01, "{id}");
    }
}

#[test]
fn unknown_category_is_a_config_error() {
    let err = registry()
        .lookup(&CategoryId::new("toaster"))
        .expect_err("toaster is not registered");

    assert_eq!(err, RegistryError::UnknownCategory(CategoryId::new("toaster")));
    assert_eq!(err.kind(), "CONFIG_ERROR");
}

#[test]
fn rejects_weights_that_do_not_sum_to_one() {
    let mut bundle = robot_bundle();
    bundle.weights = CriterionWeights::new([0.1; 10].map(|w| w * 0.5));

    let err = CategoryRegistry::from_bundles([bundle]).expect_err("weights rejected");

    assert!(matches!(err, RegistryError::WeightSum { .. }));
}

#[test]
fn rejects_evidence_fields_outside_required_sets() {
    let mut bundle = robot_bundle();
    bundle.contract = bundle.contract.clone().evidence(&["serialNumber"]);

    let err = CategoryRegistry::from_bundles([bundle]).expect_err("contract rejected");

    assert_eq!(
        err,
        RegistryError::ContractInvariant {
            category: CategoryId::new(ROBOT_VACUUM),
            fields: vec!["serialNumber".to_string()],
        }
    );
}

#[test]
fn rejects_contract_for_another_category() {
    let mut bundle = robot_bundle();
    bundle.contract = CompletenessContract::new(AIR_PURIFIER, Tier::Production);

    let err = CategoryRegistry::from_bundles([bundle]).expect_err("mismatch rejected");

    assert!(matches!(err, RegistryError::ContractCategoryMismatch { .. }));
}

#[test]
fn rejects_duplicate_rule_ids_and_categories() {
    let mut bundle = robot_bundle();
    bundle
        .rules
        .push(Rule::new("mopping", Condition::present("mopping"), Criterion::C7, 1.0));
    assert!(matches!(
        CategoryRegistry::from_bundles([bundle]),
        Err(RegistryError::RuleTable { .. })
    ));

    let err = CategoryRegistry::from_bundles([robot_bundle(), robot_bundle()])
        .expect_err("duplicate category");
    assert_eq!(err, RegistryError::DuplicateCategory(CategoryId::new(ROBOT_VACUUM)));
}

#[test]
fn config_error_message_names_the_problem() {
    let mut bundle = robot_bundle();
    bundle.contract = bundle.contract.clone().evidence(&["serialNumber", "wheelCount"]);

    let err = CategoryRegistry::from_bundles([bundle]).expect_err("contract rejected");

    assert_eq!(
        err.to_string(),
        "contract for 'robot-vacuum' marks evidence on fields it never requires: serialNumber, wheelCount"
    );
}
