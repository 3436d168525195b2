//! Built-in category bundles.
//!
//! Each module owns one category's contract, coercion tables, schema, tags,
//! and score rules. Weighting is editorial data and is kept deliberately small.

mod air_purifier;
mod robot_vacuum;
mod smart_plug;

use std::collections::BTreeMap;

use super::domain::{SpecMap, SpecValue};
use super::registry::CategoryBundle;

pub const ROBOT_VACUUM: &str = "robot-vacuum";
pub const AIR_PURIFIER: &str = "air-purifier";
pub const SMART_PLUG: &str = "smart-plug";

pub(crate) fn standard_bundles() -> Vec<CategoryBundle> {
    vec![
        robot_vacuum::bundle(),
        air_purifier::bundle(),
        smart_plug::bundle(),
    ]
}

fn number(specs: &SpecMap, field: &str) -> Option<f64> {
    specs.get(field).and_then(SpecValue::as_number)
}

fn flag(specs: &SpecMap, field: &str) -> bool {
    specs.get(field).and_then(SpecValue::as_bool) == Some(true)
}

fn text_is(specs: &SpecMap, field: &str, expected: &[&str]) -> bool {
    specs
        .get(field)
        .and_then(SpecValue::as_text)
        .is_some_and(|text| expected.contains(&text))
}

fn tag_map(entries: &[(&str, bool)]) -> BTreeMap<String, bool> {
    entries
        .iter()
        .map(|(tag, value)| (tag.to_string(), *value))
        .collect()
}
