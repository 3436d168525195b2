use std::collections::BTreeMap;

use super::{flag, number, tag_map, text_is, AIR_PURIFIER};
use crate::pipeline::contract::{CompletenessContract, Tier};
use crate::pipeline::domain::{CategoryId, SpecMap, Violation};
use crate::pipeline::normalizer::NormalizationTables;
use crate::pipeline::registry::CategoryBundle;
use crate::pipeline::scoring::{Condition, Criterion, CriterionScores, CriterionWeights, Rule};
use crate::pipeline::structure::{check_fields, FieldRule};

const FILTERS: &[&str] = &["hepa-h13", "hepa", "activated-carbon", "ionic"];
const HEPA_KEYWORDS: &[&str] = &["true hepa", "h13", "h14"];
const SENSOR_KEYWORDS: &[&str] = &["air quality sensor", "pm2.5 sensor", "auto mode"];

const SCHEMA: [FieldRule; 8] = [
    FieldRule::number("cadrM3h", 20.0, 2_000.0),
    FieldRule::number("roomSizeM2", 5.0, 300.0),
    FieldRule::one_of("filterType", FILTERS),
    FieldRule::number("noiseDb", 15.0, 90.0),
    FieldRule::number("filterLifeMonths", 1.0, 120.0),
    FieldRule::number("powerWatts", 1.0, 500.0),
    FieldRule::boolean("airQualitySensor"),
    FieldRule::boolean("autoMode"),
];

// c1 clean air delivery, c2 coverage, c3 filtration, c4 noise, c5 efficiency,
// c6 filter life, c7 sensing, c8 automation, c9 build, c10 value
const WEIGHTS: [f64; 10] = [0.25, 0.15, 0.15, 0.1, 0.1, 0.1, 0.05, 0.05, 0.025, 0.025];

pub(super) fn bundle() -> CategoryBundle {
    CategoryBundle {
        id: CategoryId::new(AIR_PURIFIER),
        label: "Air purifier",
        contract: CompletenessContract::new(AIR_PURIFIER, Tier::Production)
            .product(&["cadrM3h", "roomSizeM2", "filterType"])
            .mock(&["noiseDb", "filterLifeMonths", "powerWatts"])
            .evidence(&["cadrM3h"])
            .evidence_recommended(&["filterType"])
            .with_placeholder_autofill(),
        normalization: NormalizationTables::new()
            .alias(
                "filterType",
                &[
                    ("true hepa", "hepa-h13"),
                    ("hepa h13", "hepa-h13"),
                    ("h13", "hepa-h13"),
                    ("hepa-h13", "hepa-h13"),
                    ("hepa", "hepa"),
                    ("carbon", "activated-carbon"),
                    ("activated carbon", "activated-carbon"),
                    ("ionizer", "ionic"),
                    ("ionic", "ionic"),
                ],
            )
            .unit("cadrM3h", "m3/h", &[("m³/h", 1.0), ("cfm", 1.699)])
            .unit("roomSizeM2", "m2", &[("m²", 1.0), ("sqft", 0.0929), ("ft2", 0.0929)])
            .unit("noiseDb", "db", &[("dba", 1.0), ("db(a)", 1.0)])
            .unit("filterLifeMonths", "months", &[("mo", 1.0), ("years", 12.0), ("y", 12.0)])
            .unit("powerWatts", "w", &[("kw", 1_000.0)])
            .booleans(&["airQualitySensor", "autoMode"]),
        weights: CriterionWeights::new(WEIGHTS),
        baseline: CriterionScores::uniform(5.0),
        rules: rules(),
        schema,
        tags,
        legacy_keywords: vec![("true_hepa", HEPA_KEYWORDS), ("smart", SENSOR_KEYWORDS)],
    }
}

fn schema(specs: &SpecMap) -> Vec<Violation> {
    check_fields(specs, &SCHEMA)
}

fn tags(specs: &SpecMap) -> BTreeMap<String, bool> {
    tag_map(&[
        (
            "large_room",
            number(specs, "roomSizeM2").is_some_and(|size| size >= 40.0),
        ),
        ("true_hepa", text_is(specs, "filterType", &["hepa-h13"])),
        (
            "quiet",
            number(specs, "noiseDb").is_some_and(|noise| noise <= 50.0),
        ),
        (
            "smart",
            flag(specs, "airQualitySensor") && flag(specs, "autoMode"),
        ),
    ])
}

fn rules() -> Vec<Rule> {
    vec![
        Rule::new("cadr-high", Condition::at_least("cadrM3h", 300.0), Criterion::C1, 2.5),
        Rule::new("cadr-very-high", Condition::at_least("cadrM3h", 500.0), Criterion::C1, 2.0),
        Rule::new("cadr-low", Condition::at_most("cadrM3h", 120.0), Criterion::C1, -2.5),
        Rule::new("room-large", Condition::at_least("roomSizeM2", 40.0), Criterion::C2, 2.0),
        Rule::new("room-small", Condition::at_most("roomSizeM2", 15.0), Criterion::C2, -1.5),
        Rule::new("filter-h13", Condition::equals("filterType", "hepa-h13"), Criterion::C3, 4.0),
        Rule::new("filter-hepa", Condition::equals("filterType", "hepa"), Criterion::C3, 2.0),
        Rule::new("filter-ionic", Condition::equals("filterType", "ionic"), Criterion::C3, -2.0),
        Rule::new("noise-quiet", Condition::at_most("noiseDb", 50.0), Criterion::C4, 2.5),
        Rule::new("noise-loud", Condition::at_least("noiseDb", 65.0), Criterion::C4, -2.0),
        Rule::new("power-frugal", Condition::at_most("powerWatts", 40.0), Criterion::C5, 2.0),
        Rule::new("power-hungry", Condition::at_least("powerWatts", 100.0), Criterion::C5, -2.0),
        Rule::new("filter-life-long", Condition::at_least("filterLifeMonths", 12.0), Criterion::C6, 2.0),
        Rule::new("sensor", Condition::is_true("airQualitySensor"), Criterion::C7, 3.0),
        Rule::new("auto-mode", Condition::is_true("autoMode"), Criterion::C8, 3.0),
    ]
}
