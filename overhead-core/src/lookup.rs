//! Aircraft type lookup table — joins the manufacturer and aircraft-type
//! datasets into a single type-code → description mapping.
//!
//! The index is built once at startup and only read afterwards, so it is
//! safe to share across concurrent resolutions without locking.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::types::{
    AircraftTypeRecord, ManufacturerRecord, OverheadError, Result, UNKNOWN_AIRCRAFT,
};

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Mapping from ICAO type code to `"<manufacturer> <model>"`.
#[derive(Debug, Clone, Default)]
pub struct TypeDescriptionIndex {
    map: HashMap<String, String>,
}

impl TypeDescriptionIndex {
    /// Join the two datasets into the index.
    ///
    /// Left join: a type whose manufacturer id has no match still produces an
    /// entry, with an empty manufacturer component (the leading space is kept
    /// for compatibility with the upstream datasets). Duplicate type codes
    /// overwrite, last record wins.
    pub fn build(manufacturers: &[ManufacturerRecord], types: &[AircraftTypeRecord]) -> Self {
        let by_id: HashMap<&str, &str> = manufacturers
            .iter()
            .map(|m| (m.id.as_str(), m.name.as_str()))
            .collect();

        let mut map = HashMap::with_capacity(types.len());
        for t in types {
            let manufacturer = by_id.get(t.manufacturer.as_str()).copied().unwrap_or("");
            map.insert(t.icao_code.clone(), format!("{} {}", manufacturer, t.name));
        }
        TypeDescriptionIndex { map }
    }

    /// Description for a type code, if present.
    pub fn describe(&self, type_code: &str) -> Option<&str> {
        self.map.get(type_code).map(String::as_str)
    }

    /// Description for an optional type code, falling back to
    /// [`UNKNOWN_AIRCRAFT`]. The result is never empty.
    pub fn describe_or_unknown(&self, type_code: Option<&str>) -> String {
        type_code
            .and_then(|c| self.describe(c))
            .unwrap_or(UNKNOWN_AIRCRAFT)
            .to_string()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dataset loading
// ---------------------------------------------------------------------------

/// Load the manufacturers dataset from a JSON array file.
pub fn load_manufacturers(path: impl AsRef<Path>) -> Result<Vec<ManufacturerRecord>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_manufacturers(&text)
}

/// Load the aircraft-types dataset from a JSON array file.
pub fn load_aircraft_types(path: impl AsRef<Path>) -> Result<Vec<AircraftTypeRecord>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_aircraft_types(&text)
}

/// Parse the manufacturers dataset. Malformed records are skipped, a file
/// that is not a JSON array is an error.
pub fn parse_manufacturers(text: &str) -> Result<Vec<ManufacturerRecord>> {
    parse_records(text, "manufacturers")
}

/// Parse the aircraft-types dataset. Malformed records are skipped, a file
/// that is not a JSON array is an error.
pub fn parse_aircraft_types(text: &str) -> Result<Vec<AircraftTypeRecord>> {
    parse_records(text, "aircraft-types")
}

fn parse_records<T: serde::de::DeserializeOwned>(text: &str, dataset: &str) -> Result<Vec<T>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)
        .map_err(|e| OverheadError::Dataset(format!("{dataset}: {e}")))?;

    let total = values.len();
    let mut records = Vec::with_capacity(total);
    for value in values {
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping malformed {dataset} record: {e}"),
        }
    }
    if records.len() < total {
        warn!(
            "{dataset}: kept {} of {} records",
            records.len(),
            total
        );
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn manufacturer(id: &str, name: &str) -> ManufacturerRecord {
        ManufacturerRecord {
            id: id.into(),
            name: name.into(),
        }
    }

    fn aircraft_type(code: &str, manufacturer: &str, name: &str) -> AircraftTypeRecord {
        AircraftTypeRecord {
            icao_code: code.into(),
            manufacturer: manufacturer.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_build_joins_manufacturer() {
        let index = TypeDescriptionIndex::build(
            &[manufacturer("B", "Boeing")],
            &[aircraft_type("B738", "B", "737-800")],
        );
        assert_eq!(index.describe("B738"), Some("Boeing 737-800"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_build_missing_manufacturer_keeps_entry() {
        let index = TypeDescriptionIndex::build(&[], &[aircraft_type("C172", "XX", "172")]);
        // Left join: empty manufacturer component, leading space preserved
        assert_eq!(index.describe("C172"), Some(" 172"));
    }

    #[test]
    fn test_build_duplicate_type_last_wins() {
        let index = TypeDescriptionIndex::build(
            &[manufacturer("B", "Boeing"), manufacturer("A", "Airbus")],
            &[
                aircraft_type("X999", "B", "First"),
                aircraft_type("X999", "A", "Second"),
            ],
        );
        assert_eq!(index.describe("X999"), Some("Airbus Second"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_every_type_produces_one_entry() {
        let types = vec![
            aircraft_type("B738", "B", "737-800"),
            aircraft_type("A320", "A", "A320"),
            aircraft_type("C172", "missing", "172"),
        ];
        let index = TypeDescriptionIndex::build(&[manufacturer("B", "Boeing")], &types);
        assert_eq!(index.len(), 3);
        for t in &types {
            assert!(index.describe(&t.icao_code).is_some());
        }
    }

    #[test]
    fn test_describe_or_unknown() {
        let index = TypeDescriptionIndex::build(
            &[manufacturer("B", "Boeing")],
            &[aircraft_type("B738", "B", "737-800")],
        );
        assert_eq!(
            index.describe_or_unknown(Some("B738")),
            "Boeing 737-800"
        );
        assert_eq!(index.describe_or_unknown(Some("ZZZZ")), UNKNOWN_AIRCRAFT);
        assert_eq!(index.describe_or_unknown(None), UNKNOWN_AIRCRAFT);
    }

    #[test]
    fn test_parse_skips_malformed_records() {
        let text = r#"[
            {"id": "B", "name": "Boeing"},
            {"id": "A"},
            {"name": "Orphan"},
            {"id": "C", "name": "Cessna"}
        ]"#;
        let records = parse_manufacturers(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Boeing");
        assert_eq!(records[1].name, "Cessna");
    }

    #[test]
    fn test_parse_aircraft_types() {
        let text = r#"[
            {"icaoCode": "B738", "manufacturer": "B", "name": "737-800"},
            {"icaoCode": "A320", "manufacturer": "A", "name": "A320"}
        ]"#;
        let records = parse_aircraft_types(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].icao_code, "B738");
        assert_eq!(records[1].manufacturer, "A");
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_manufacturers("{\"id\": \"B\"}"),
            Err(OverheadError::Dataset(_))
        ));
        assert!(matches!(
            parse_manufacturers("not json"),
            Err(OverheadError::Dataset(_))
        ));
    }

    #[test]
    fn test_end_to_end_example() {
        let manufacturers = parse_manufacturers(r#"[{"id": "B", "name": "Boeing"}]"#).unwrap();
        let types = parse_aircraft_types(
            r#"[{"icaoCode": "B738", "manufacturer": "B", "name": "737-800"}]"#,
        )
        .unwrap();
        let index = TypeDescriptionIndex::build(&manufacturers, &types);
        assert_eq!(index.describe("B738"), Some("Boeing 737-800"));
    }
}
