use super::common::*;
use crate::pipeline::domain::SpecValue;
use crate::pipeline::scoring::{
    apply_rules, validate_rules, Condition, Criterion, CriterionScores, CriterionWeights, Rule,
    WeightProblem,
};

fn table() -> Vec<Rule> {
    vec![
        Rule::new("strong", Condition::at_least("suctionPa", 4000.0), Criterion::C1, 3.0),
        Rule::new("stronger", Condition::at_least("suctionPa", 8000.0), Criterion::C1, 3.0),
        Rule::new("lidar", Condition::equals("navigationType", "lidar"), Criterion::C2, 0.1),
        Rule::new("tall", Condition::at_least("heightCm", 11.0), Criterion::C5, -7.0),
        Rule::new("no-mop", Condition::is_true("mopping").negate(), Criterion::C7, 0.2),
        Rule::new("mop-noise", Condition::at_most("noiseDb", 60.0), Criterion::C7, 0.7),
    ]
}

#[test]
fn clamps_to_score_bounds_and_reports_clamped_criteria() {
    let values = specs(&[
        ("suctionPa", SpecValue::Number(9000.0)),
        ("heightCm", SpecValue::Number(12.0)),
    ]);

    let outcome = apply_rules(&CriterionScores::uniform(5.0), &values, &table());

    assert_eq!(outcome.scores.get(Criterion::C1), 10.0);
    assert_eq!(outcome.scores.get(Criterion::C5), 0.0);
    assert_eq!(outcome.clamped, vec![Criterion::C1, Criterion::C5]);
    assert!(outcome.scores.within_bounds());
}

#[test]
fn rule_order_does_not_change_scores() {
    let values = specs(&[
        ("suctionPa", SpecValue::Number(5000.0)),
        ("navigationType", text("lidar")),
        ("noiseDb", SpecValue::Number(55.0)),
    ]);
    let baseline = CriterionScores::uniform(5.0);
    let forward = table();
    let mut reversed = table();
    reversed.reverse();

    let a = apply_rules(&baseline, &values, &forward);
    let b = apply_rules(&baseline, &values, &reversed);

    assert_eq!(a.scores, b.scores);
    assert_eq!(a.scores.get(Criterion::C7), 5.9);
    assert_eq!(a.fired.len(), b.fired.len());
}

#[test]
fn fired_rules_are_audited() {
    let values = specs(&[("navigationType", text("lidar")), ("mopping", SpecValue::Bool(true))]);

    let outcome = apply_rules(&CriterionScores::uniform(5.0), &values, &table());

    let ids: Vec<&str> = outcome.fired.iter().map(|rule| rule.id.as_str()).collect();
    assert_eq!(ids, vec!["lidar"]);
}

#[test]
fn compound_conditions_fold() {
    let values = specs(&[
        ("selfEmptying", SpecValue::Bool(true)),
        ("dustbinMl", SpecValue::Number(450.0)),
        ("features", SpecValue::List(vec!["app".to_string(), "voice".to_string()])),
    ]);

    let all = Condition::All {
        of: vec![
            Condition::is_true("selfEmptying"),
            Condition::at_least("dustbinMl", 400.0),
        ],
    };
    let any = Condition::Any {
        of: vec![
            Condition::present("missing"),
            Condition::contains("features", "voice"),
        ],
    };

    assert!(all.evaluate(&values));
    assert!(any.evaluate(&values));
    assert!(!Condition::present("missing").evaluate(&values));
}

#[test]
fn conditions_ignore_placeholders() {
    let values = specs(&[("navigationType", SpecValue::placeholder())]);

    assert!(!Condition::present("navigationType").evaluate(&values));
    assert!(!Condition::equals("navigationType", crate::pipeline::PLACEHOLDER_TOKEN).evaluate(&values));
}

#[test]
fn conditions_deserialize_from_tagged_json() {
    let raw = r#"{"op":"all","of":[{"op":"at_least","field":"suctionPa","threshold":4000.0},{"op":"not","condition":{"op":"is_true","field":"mopping"}}]}"#;

    let condition: Condition = serde_json::from_str(raw).expect("condition parses");

    assert!(condition.evaluate(&specs(&[("suctionPa", SpecValue::Number(4500.0))])));
}

#[test]
fn weights_must_sum_to_one() {
    let weights = CriterionWeights::new([0.2; 10]);

    assert!(matches!(weights.validate(), Err(WeightProblem::Sum(sum)) if (sum - 2.0).abs() < 1e-9));
}

#[test]
fn negative_weight_is_rejected() {
    let weights = CriterionWeights::new([0.3, 0.3, 0.3, 0.2, -0.1, 0.0, 0.0, 0.0, 0.0, 0.0]);

    assert_eq!(weights.validate(), Err(WeightProblem::Negative(Criterion::C5)));
}

#[test]
fn overall_is_the_weighted_sum() {
    let weights = CriterionWeights::new([0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let mut scores = CriterionScores::uniform(0.0);
    scores.set(Criterion::C1, 8.0);
    scores.set(Criterion::C2, 6.0);

    assert_eq!(weights.overall(&scores), 7.0);
}

#[test]
fn duplicate_rule_ids_are_rejected() {
    let mut rules = table();
    rules.push(Rule::new("strong", Condition::present("x"), Criterion::C3, 1.0));

    let (id, reason) = validate_rules(&rules).expect_err("duplicate id");

    assert_eq!(id, "strong");
    assert!(reason.contains("twice"));
}

#[test]
fn scores_serialize_by_criterion_label() {
    let scores = CriterionScores::uniform(5.0);

    let json = serde_json::to_value(scores).expect("serializes");

    assert_eq!(json["c1"], 5.0);
    assert_eq!(json["c10"], 5.0);
    assert_eq!(json.as_object().map(|map| map.len()), Some(10));

    let back: CriterionScores = serde_json::from_value(json).expect("round trips");
    assert_eq!(back, scores);
}
