use std::collections::BTreeMap;

use super::{flag, number, tag_map, text_is, SMART_PLUG};
use crate::pipeline::contract::{CompletenessContract, Tier};
use crate::pipeline::domain::{CategoryId, SpecMap, Violation};
use crate::pipeline::normalizer::NormalizationTables;
use crate::pipeline::registry::CategoryBundle;
use crate::pipeline::scoring::{Condition, Criterion, CriterionScores, CriterionWeights, Rule};
use crate::pipeline::structure::{check_fields, FieldRule};

const PROTOCOLS: &[&str] = &["wifi", "zigbee", "zwave", "matter", "thread"];
const MONITORING_KEYWORDS: &[&str] = &["energy monitoring", "power metering", "kwh"];

const SCHEMA: [FieldRule; 3] = [
    FieldRule::number("maxLoadWatts", 100.0, 4_000.0),
    FieldRule::one_of("protocol", PROTOCOLS),
    FieldRule::boolean("energyMonitoring"),
];

const WEIGHTS: [f64; 10] = [0.3, 0.2, 0.1, 0.1, 0.1, 0.05, 0.05, 0.05, 0.025, 0.025];

pub(super) fn bundle() -> CategoryBundle {
    CategoryBundle {
        id: CategoryId::new(SMART_PLUG),
        label: "Smart plug",
        contract: CompletenessContract::new(SMART_PLUG, Tier::Stub)
            .product(&["maxLoadWatts", "protocol"])
            .mock(&["energyMonitoring"])
            .evidence(&["maxLoadWatts"]),
        normalization: NormalizationTables::new()
            .alias(
                "protocol",
                &[
                    ("wifi", "wifi"),
                    ("wi-fi", "wifi"),
                    ("2.4ghz wifi", "wifi"),
                    ("zigbee", "zigbee"),
                    ("zigbee 3.0", "zigbee"),
                    ("z-wave", "zwave"),
                    ("zwave", "zwave"),
                    ("matter", "matter"),
                    ("thread", "thread"),
                ],
            )
            .unit("maxLoadWatts", "w", &[("kw", 1_000.0)])
            .booleans(&["energyMonitoring"]),
        weights: CriterionWeights::new(WEIGHTS),
        baseline: CriterionScores::uniform(5.0),
        rules: vec![
            Rule::new("load-high", Condition::at_least("maxLoadWatts", 3_000.0), Criterion::C1, 2.0),
            Rule::new("protocol-matter", Condition::equals("protocol", "matter"), Criterion::C2, 3.0),
            Rule::new("protocol-zigbee", Condition::equals("protocol", "zigbee"), Criterion::C2, 1.5),
            Rule::new("monitoring", Condition::is_true("energyMonitoring"), Criterion::C3, 3.0),
        ],
        schema,
        tags,
        legacy_keywords: vec![("energy_monitoring", MONITORING_KEYWORDS)],
    }
}

fn schema(specs: &SpecMap) -> Vec<Violation> {
    check_fields(specs, &SCHEMA)
}

fn tags(specs: &SpecMap) -> BTreeMap<String, bool> {
    tag_map(&[
        (
            "heavy_duty",
            number(specs, "maxLoadWatts").is_some_and(|load| load >= 3_000.0),
        ),
        ("matter_ready", text_is(specs, "protocol", &["matter"])),
        ("energy_monitoring", flag(specs, "energyMonitoring")),
    ])
}
