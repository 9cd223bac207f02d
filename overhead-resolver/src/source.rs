//! Live traffic sources — cloud flight search and local receiver polling.
//!
//! Both sources normalize their wire payloads into
//! [`RawAircraftObservation`]; downstream code never knows which one
//! supplied a batch.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use overhead_core::config::{Config, SourceMode};
use overhead_core::{RawAircraftObservation, SearchRadius};

use crate::error::{ResolveError, Result};

/// Default cloud flight-search API base.
const FLIGHT_SEARCH_BASE: &str = "https://aeroapi.flightaware.com/aeroapi";

/// Supplies one batch of observations per polling cycle.
#[async_trait]
pub trait TrafficSource: Send + Sync {
    async fn fetch(&self, search: &SearchRadius) -> Result<Vec<RawAircraftObservation>>;
}

/// Build the traffic source selected by the configuration.
pub fn source_from_config(config: &Config) -> Result<Box<dyn TrafficSource>> {
    let timeout = Duration::from_secs(config.service.timeout_sec);
    match config.source.mode {
        SourceMode::FlightSearch => {
            let api_key = config.source.api_key.as_deref().ok_or_else(|| {
                ResolveError::SourceConfig("flightsearch mode requires an api_key".into())
            })?;
            let base = config
                .source
                .endpoint
                .as_deref()
                .unwrap_or(FLIGHT_SEARCH_BASE);
            Ok(Box::new(FlightSearchSource::new(base, api_key, timeout)?))
        }
        SourceMode::Receiver => {
            let endpoint = config.source.endpoint.as_deref().ok_or_else(|| {
                ResolveError::SourceConfig("receiver mode requires an endpoint".into())
            })?;
            Ok(Box::new(ReceiverSource::new(endpoint, timeout)?))
        }
    }
}

// ---------------------------------------------------------------------------
// Cloud flight search
// ---------------------------------------------------------------------------

/// Cloud flight-search API client, queried by a bounding box around the
/// observer.
pub struct FlightSearchSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FlightSearchSource {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(FlightSearchSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl TrafficSource for FlightSearchSource {
    async fn fetch(&self, search: &SearchRadius) -> Result<Vec<RawAircraftObservation>> {
        let bbox = search.bounding_box();
        let query = format!(
            "-latlong \"{} {} {} {}\"",
            bbox.south, bbox.west, bbox.north, bbox.east
        );
        let url = format!("{}/flights/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("query", query.as_str())])
            .header("x-apikey", &self.api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status { url, status });
        }

        let payload: FlightResponse =
            response.json().await.map_err(|e| ResolveError::Malformed {
                url,
                detail: e.to_string(),
            })?;
        Ok(payload
            .flights
            .into_iter()
            .filter_map(flight_to_observation)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct FlightResponse {
    #[serde(default)]
    flights: Vec<Flight>,
}

#[derive(Debug, Deserialize)]
struct Flight {
    hex: Option<String>,
    ident: Option<String>,
    origin: Option<AirportRef>,
    destination: Option<AirportRef>,
    last_position: Option<LastPosition>,
}

#[derive(Debug, Deserialize)]
struct AirportRef {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LastPosition {
    altitude: Option<i32>,
    groundspeed: Option<i32>,
    heading: Option<i32>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

fn flight_to_observation(flight: Flight) -> Option<RawAircraftObservation> {
    let icao_hex = match flight.hex {
        Some(hex) if !hex.is_empty() => hex,
        _ => {
            debug!("dropping flight {:?} without hex address", flight.ident);
            return None;
        }
    };
    let position = flight.last_position;
    Some(RawAircraftObservation {
        icao_hex,
        callsign: flight.ident,
        origin: flight.origin.and_then(|a| a.name),
        destination: flight.destination.and_then(|a| a.name),
        altitude_ft: position.as_ref().and_then(|p| p.altitude),
        ground_speed_kts: position.as_ref().and_then(|p| p.groundspeed),
        heading_deg: position.as_ref().and_then(|p| p.heading),
        lat: position.as_ref().and_then(|p| p.latitude),
        lon: position.as_ref().and_then(|p| p.longitude),
    })
}

// ---------------------------------------------------------------------------
// Local receiver
// ---------------------------------------------------------------------------

/// Local network traffic receiver, polled at a fixed endpoint serving
/// dump1090-style `aircraft.json`.
pub struct ReceiverSource {
    client: reqwest::Client,
    endpoint: String,
}

impl ReceiverSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ReceiverSource {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl TrafficSource for ReceiverSource {
    async fn fetch(&self, _search: &SearchRadius) -> Result<Vec<RawAircraftObservation>> {
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                url: self.endpoint.clone(),
                status,
            });
        }

        let payload: ReceiverPayload =
            response.json().await.map_err(|e| ResolveError::Malformed {
                url: self.endpoint.clone(),
                detail: e.to_string(),
            })?;
        Ok(payload
            .aircraft
            .into_iter()
            .map(receiver_to_observation)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ReceiverPayload {
    #[serde(default)]
    aircraft: Vec<ReceiverAircraft>,
}

#[derive(Debug, Deserialize)]
struct ReceiverAircraft {
    hex: String,
    flight: Option<String>,
    alt_baro: Option<AltBaro>,
    gs: Option<f64>,
    track: Option<f64>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Barometric altitude is either feet or the literal string "ground".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AltBaro {
    Feet(i32),
    Ground(String),
}

fn receiver_to_observation(aircraft: ReceiverAircraft) -> RawAircraftObservation {
    let altitude_ft = match aircraft.alt_baro {
        Some(AltBaro::Feet(ft)) => Some(ft),
        _ => None,
    };
    RawAircraftObservation {
        icao_hex: aircraft.hex,
        // dump1090 pads callsigns with trailing spaces
        callsign: aircraft.flight.map(|f| f.trim().to_string()),
        origin: None,
        destination: None,
        altitude_ft,
        ground_speed_kts: aircraft.gs.map(|v| v.round() as i32),
        heading_deg: aircraft.track.map(|v| v.round() as i32),
        lat: aircraft.lat,
        lon: aircraft.lon,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
