//! Shared types, error enum, and ICAO hex helpers for overhead-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by overhead-core.
#[derive(Debug, Error)]
pub enum OverheadError {
    #[error("invalid ICAO hex address: {0:?}")]
    InvalidHex(String),
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
    #[error("invalid search radius: {0}")]
    InvalidRadius(f64),
    #[error("dataset error: {0}")]
    Dataset(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, OverheadError>;

/// Placeholder description when resolution fails or the type code is unknown.
pub const UNKNOWN_AIRCRAFT: &str = "Unknown aircraft";

// ---------------------------------------------------------------------------
// ICAO hex address helpers
// ---------------------------------------------------------------------------

/// Validate and normalize an ICAO hex address to uppercase.
///
/// The remote metadata store keys buckets by uppercase hex prefix, so every
/// address is canonicalized before lookup. Empty or non-hex input is a caller
/// error, never silently coerced.
pub fn normalize_hex(hex: &str) -> Result<String> {
    let hex = hex.trim();
    if hex.is_empty() {
        return Err(OverheadError::InvalidHex(hex.to_string()));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(OverheadError::InvalidHex(hex.to_string()));
    }
    Ok(hex.to_ascii_uppercase())
}

// ---------------------------------------------------------------------------
// Static dataset records
// ---------------------------------------------------------------------------

/// One row of the manufacturers dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManufacturerRecord {
    pub id: String,
    pub name: String,
}

/// One row of the aircraft-types dataset.
///
/// Field names match the dataset JSON: `icaoCode` is the ICAO type designator
/// (e.g. "B738"), `manufacturer` is a manufacturer id joined against
/// [`ManufacturerRecord::id`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AircraftTypeRecord {
    #[serde(rename = "icaoCode")]
    pub icao_code: String,
    pub manufacturer: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// One aircraft as reported by a traffic source for a single polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawAircraftObservation {
    pub icao_hex: String,
    pub callsign: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub altitude_ft: Option<i32>,
    pub ground_speed_kts: Option<i32>,
    pub heading_deg: Option<i32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl RawAircraftObservation {
    /// Bare observation with only the hex address set.
    pub fn new(icao_hex: impl Into<String>) -> Self {
        RawAircraftObservation {
            icao_hex: icao_hex.into(),
            callsign: None,
            origin: None,
            destination: None,
            altitude_ft: None,
            ground_speed_kts: None,
            heading_deg: None,
            lat: None,
            lon: None,
        }
    }
}

/// An observation enriched with the resolved aircraft identity.
///
/// `description` is always non-empty: [`UNKNOWN_AIRCRAFT`] is substituted
/// when resolution fails or the type code is absent from the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAircraftRecord {
    #[serde(flatten)]
    pub observation: RawAircraftObservation,
    pub type_code: Option<String>,
    pub description: String,
}

impl ResolvedAircraftRecord {
    /// Flight level (altitude / 100), 0 when altitude is unknown.
    pub fn flight_level(&self) -> i32 {
        self.observation.altitude_ft.unwrap_or(0) / 100
    }

    fn origin_description(&self) -> &str {
        self.observation.origin.as_deref().unwrap_or("Unknown origin")
    }

    fn destination_description(&self) -> &str {
        self.observation
            .destination
            .as_deref()
            .unwrap_or("Unknown destination")
    }

    /// One-line list entry for display.
    pub fn list_line(&self) -> String {
        format!(
            "{} - Flight level {}, Speed {} knots, Origin {}, Destination {}",
            self.description,
            self.flight_level(),
            self.observation.ground_speed_kts.unwrap_or(0),
            self.origin_description(),
            self.destination_description(),
        )
    }

    /// Narration sentence for a speech collaborator.
    pub fn spoken_summary(&self) -> String {
        format!(
            "There is a {} flying at flight level {} and a speed of {} knots. \
             Originating from {} and flying to {}.",
            self.description,
            self.flight_level(),
            self.observation.ground_speed_kts.unwrap_or(0),
            self.origin_description(),
            self.destination_description(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
