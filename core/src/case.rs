//! Deep key-case conversion for JSON payloads.
//!
//! Outgoing payloads and query keys travel as snake_case; parsed responses
//! are handed to callers as camelCase. Only object keys are rewritten, leaf
//! values are never touched.

use convert_case::{Boundary, Case, Converter};
use serde_json::{Map, Value};

/// Word boundaries shared by both directions. Digits stay attached to the
/// preceding word so `page2` survives a round trip, while an uppercase letter
/// after a digit (`page2Count`) or at the end of an acronym (`XMLHttp`)
/// still starts a new word.
const BOUNDARIES: [Boundary; 6] = [
    Boundary::Underscore,
    Boundary::Hyphen,
    Boundary::Space,
    Boundary::LowerUpper,
    Boundary::DigitUpper,
    Boundary::Acronym,
];

/// Naming convention for object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    /// `snake_case`, used on the wire.
    Snake,
    /// `camelCase`, used in process.
    Camel,
}

impl KeyCase {
    fn converter(self) -> Converter {
        let case = match self {
            KeyCase::Snake => Case::Snake,
            KeyCase::Camel => Case::Camel,
        };
        Converter::new().set_boundaries(&BOUNDARIES).to_case(case)
    }

    /// Convert a single key.
    pub fn convert_key(self, key: &str) -> String {
        self.converter().convert(key)
    }
}

/// Return a deep copy of `value` with every object key rewritten to `case`.
pub fn convert_keys(value: &Value, case: KeyCase) -> Value {
    convert_with(value, &case.converter())
}

/// Deep copy with snake_case keys.
pub fn to_snake_keys(value: &Value) -> Value {
    convert_keys(value, KeyCase::Snake)
}

/// Deep copy with camelCase keys.
pub fn to_camel_keys(value: &Value) -> Value {
    convert_keys(value, KeyCase::Camel)
}

/// Convert the top-level keys of `map` and everything below them.
pub fn convert_map(map: &Map<String, Value>, case: KeyCase) -> Map<String, Value> {
    let converter = case.converter();
    convert_map_with(map, &converter)
}

fn convert_with(value: &Value, converter: &Converter) -> Value {
    match value {
        Value::Object(map) => Value::Object(convert_map_with(map, converter)),
        Value::Array(items) => Value::Array(items.iter().map(|v| convert_with(v, converter)).collect()),
        leaf => leaf.clone(),
    }
}

fn convert_map_with(map: &Map<String, Value>, converter: &Converter) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (converter.convert(key), convert_with(value, converter)))
        .collect()
}
