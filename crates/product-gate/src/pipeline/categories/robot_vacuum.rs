use std::collections::BTreeMap;

use super::{flag, number, tag_map, text_is, ROBOT_VACUUM};
use crate::pipeline::contract::{CompletenessContract, Tier};
use crate::pipeline::domain::{CategoryId, SpecMap, Violation};
use crate::pipeline::normalizer::NormalizationTables;
use crate::pipeline::registry::CategoryBundle;
use crate::pipeline::scoring::{Condition, Criterion, CriterionScores, CriterionWeights, Rule};
use crate::pipeline::structure::{check_fields, FieldRule};

const NAVIGATION: &[&str] = &["lidar", "camera", "gyro", "random"];
const NAVIGATION_KEYWORDS: &[&str] = &["lidar", "laser", "vslam", "camera"];
const MOPPING_KEYWORDS: &[&str] = &["mop", "mopping", "wet cleaning"];
const SELF_EMPTYING_KEYWORDS: &[&str] = &["self-emptying", "auto-empty", "clean base"];

const SCHEMA: [FieldRule; 8] = [
    FieldRule::number("heightCm", 3.0, 20.0),
    FieldRule::one_of("navigationType", NAVIGATION),
    FieldRule::number("suctionPa", 100.0, 20_000.0),
    FieldRule::number("batteryMinutes", 10.0, 600.0),
    FieldRule::number("noiseDb", 30.0, 100.0),
    FieldRule::number("dustbinMl", 50.0, 3_000.0),
    FieldRule::boolean("mopping"),
    FieldRule::boolean("selfEmptying"),
];

// c1 suction, c2 navigation, c3 runtime, c4 noise, c5 clearance,
// c6 capacity, c7 mopping, c8 autonomy, c9 maintenance, c10 value
const WEIGHTS: [f64; 10] = [0.2, 0.15, 0.15, 0.1, 0.1, 0.1, 0.05, 0.05, 0.05, 0.05];

pub(super) fn bundle() -> CategoryBundle {
    CategoryBundle {
        id: CategoryId::new(ROBOT_VACUUM),
        label: "Robot vacuum",
        contract: CompletenessContract::new(ROBOT_VACUUM, Tier::Production)
            .product(&["heightCm", "navigationType", "suctionPa", "batteryMinutes"])
            .mock(&["noiseDb", "dustbinMl", "mopping"])
            .evidence(&["navigationType", "suctionPa"])
            .evidence_recommended(&["batteryMinutes"]),
        normalization: NormalizationTables::new()
            .alias(
                "navigationType",
                &[
                    ("lidar", "lidar"),
                    ("laser", "lidar"),
                    ("lds", "lidar"),
                    ("laser distance sensor", "lidar"),
                    ("camera", "camera"),
                    ("vslam", "camera"),
                    ("visual slam", "camera"),
                    ("gyro", "gyro"),
                    ("gyroscope", "gyro"),
                    ("random", "random"),
                    ("bump", "random"),
                ],
            )
            .unit("heightCm", "cm", &[("mm", 0.1), ("m", 100.0)])
            .unit("suctionPa", "pa", &[("kpa", 1_000.0)])
            .unit(
                "batteryMinutes",
                "min",
                &[("minutes", 1.0), ("mins", 1.0), ("h", 60.0), ("hr", 60.0), ("hours", 60.0)],
            )
            .unit("noiseDb", "db", &[("dba", 1.0), ("db(a)", 1.0)])
            .unit("dustbinMl", "ml", &[("l", 1_000.0), ("cl", 10.0)])
            .booleans(&["mopping", "selfEmptying"]),
        weights: CriterionWeights::new(WEIGHTS),
        baseline: CriterionScores::uniform(5.0),
        rules: rules(),
        schema,
        tags,
        legacy_keywords: vec![
            ("smart_navigation", NAVIGATION_KEYWORDS),
            ("mopping", MOPPING_KEYWORDS),
            ("self_emptying", SELF_EMPTYING_KEYWORDS),
        ],
    }
}

fn schema(specs: &SpecMap) -> Vec<Violation> {
    check_fields(specs, &SCHEMA)
}

fn tags(specs: &SpecMap) -> BTreeMap<String, bool> {
    tag_map(&[
        (
            "fits_under_furniture",
            number(specs, "heightCm").is_some_and(|height| height <= 9.0),
        ),
        (
            "smart_navigation",
            text_is(specs, "navigationType", &["lidar", "camera"]),
        ),
        (
            "quiet",
            number(specs, "noiseDb").is_some_and(|noise| noise <= 60.0),
        ),
        ("mopping", flag(specs, "mopping")),
        ("self_emptying", flag(specs, "selfEmptying")),
    ])
}

fn rules() -> Vec<Rule> {
    vec![
        Rule::new("suction-strong", Condition::at_least("suctionPa", 4_000.0), Criterion::C1, 2.0),
        Rule::new("suction-very-strong", Condition::at_least("suctionPa", 8_000.0), Criterion::C1, 2.0),
        Rule::new("suction-flagship", Condition::at_least("suctionPa", 10_000.0), Criterion::C1, 2.0),
        Rule::new("suction-weak", Condition::at_most("suctionPa", 1_500.0), Criterion::C1, -2.0),
        Rule::new("nav-lidar", Condition::equals("navigationType", "lidar"), Criterion::C2, 3.0),
        Rule::new("nav-camera", Condition::equals("navigationType", "camera"), Criterion::C2, 2.0),
        Rule::new("nav-random", Condition::equals("navigationType", "random"), Criterion::C2, -3.0),
        Rule::new("battery-long", Condition::at_least("batteryMinutes", 150.0), Criterion::C3, 2.0),
        Rule::new("battery-short", Condition::at_most("batteryMinutes", 60.0), Criterion::C3, -2.0),
        Rule::new("noise-quiet", Condition::at_most("noiseDb", 60.0), Criterion::C4, 2.0),
        Rule::new("noise-loud", Condition::at_least("noiseDb", 72.0), Criterion::C4, -2.0),
        Rule::new("height-slim", Condition::at_most("heightCm", 8.0), Criterion::C5, 3.0),
        Rule::new("height-tall", Condition::at_least("heightCm", 11.0), Criterion::C5, -2.0),
        Rule::new("dustbin-large", Condition::at_least("dustbinMl", 400.0), Criterion::C6, 1.5),
        Rule::new("dustbin-small", Condition::at_most("dustbinMl", 200.0), Criterion::C6, -1.5),
        Rule::new("mopping", Condition::is_true("mopping"), Criterion::C7, 3.0),
        Rule::new("no-mopping", Condition::is_true("mopping").negate(), Criterion::C7, -2.0),
        Rule::new("self-emptying", Condition::is_true("selfEmptying"), Criterion::C8, 4.0),
        Rule::new(
            "self-emptying-large-bin",
            Condition::All {
                of: vec![
                    Condition::is_true("selfEmptying"),
                    Condition::at_least("dustbinMl", 400.0),
                ],
            },
            Criterion::C9,
            1.0,
        ),
    ]
}
