//! Configuration file management for overhead.
//!
//! Reads/writes `~/.overhead/config.yaml` with observer position, metadata
//! service settings, traffic source selection, and dataset paths.

use std::path::PathBuf;

use crate::types::OverheadError;

/// Full configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub observer: ObserverConfig,
    pub service: ServiceConfig,
    pub source: SourceConfig,
    pub datasets: DatasetsConfig,
}

/// Observer position and search radius.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: f64,
}

/// Remote metadata service settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_sec: u64,
    pub max_concurrent: usize,
}

/// Which traffic source supplies observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    FlightSearch,
    Receiver,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::FlightSearch => "flightsearch",
            SourceMode::Receiver => "receiver",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flightsearch" => Some(SourceMode::FlightSearch),
            "receiver" => Some(SourceMode::Receiver),
            _ => None,
        }
    }
}

/// Traffic source settings.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub mode: SourceMode,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
}

/// Static dataset file paths.
#[derive(Debug, Clone)]
pub struct DatasetsConfig {
    pub manufacturers: String,
    pub aircraft_types: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            observer: ObserverConfig {
                lat: None,
                lon: None,
                radius_km: 10.0,
            },
            service: ServiceConfig {
                base_url: "https://metadata.overheadapp.io".into(),
                timeout_sec: 8,
                max_concurrent: 8,
            },
            source: SourceConfig {
                mode: SourceMode::Receiver,
                api_key: None,
                endpoint: Some("http://127.0.0.1:8080/data/aircraft.json".into()),
            },
            datasets: DatasetsConfig {
                manufacturers: "data/manufacturers.json".into(),
                aircraft_types: "data/aircraft-types.json".into(),
            },
        }
    }
}

/// Get the config directory path (`~/.overhead/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".overhead")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.overhead/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    let path = config_file();
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };

    parse_config(&text).unwrap_or_default()
}

/// Save config to `~/.overhead/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, OverheadError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| OverheadError::Config(e.to_string()))?;

    let path = config_file();
    let text = serialize_config(config);
    std::fs::write(&path, text).map_err(|e| OverheadError::Config(e.to_string()))?;

    Ok(path)
}

/// Parse simple YAML-like config text.
fn parse_config(text: &str) -> Option<Config> {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        if let Some((key, val)) = stripped.split_once(':') {
            let key = key.trim();
            let val = val.trim();

            if !is_indented {
                if val.is_empty() {
                    current_section = Some(key.to_string());
                } else {
                    current_section = None;
                }
            } else if let Some(ref section) = current_section {
                match section.as_str() {
                    "observer" => match key {
                        "lat" => config.observer.lat = parse_float_value(val),
                        "lon" => config.observer.lon = parse_float_value(val),
                        "radius_km" => {
                            if let Some(v) = parse_float_value(val) {
                                config.observer.radius_km = v;
                            }
                        }
                        _ => {}
                    },
                    "service" => match key {
                        "base_url" => {
                            if let Some(v) = parse_string_value(val) {
                                config.service.base_url = v;
                            }
                        }
                        "timeout_sec" => {
                            if let Ok(v) = val.parse::<u64>() {
                                config.service.timeout_sec = v;
                            }
                        }
                        "max_concurrent" => {
                            if let Ok(v) = val.parse::<usize>() {
                                config.service.max_concurrent = v;
                            }
                        }
                        _ => {}
                    },
                    "source" => match key {
                        "mode" => {
                            if let Some(v) =
                                parse_string_value(val).and_then(|v| SourceMode::parse(&v))
                            {
                                config.source.mode = v;
                            }
                        }
                        "api_key" => config.source.api_key = parse_string_value(val),
                        "endpoint" => config.source.endpoint = parse_string_value(val),
                        _ => {}
                    },
                    "datasets" => match key {
                        "manufacturers" => {
                            if let Some(v) = parse_string_value(val) {
                                config.datasets.manufacturers = v;
                            }
                        }
                        "aircraft_types" => {
                            if let Some(v) = parse_string_value(val) {
                                config.datasets.aircraft_types = v;
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
        }
    }

    Some(config)
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if (val.starts_with('"') && val.ends_with('"'))
        || (val.starts_with('\'') && val.ends_with('\''))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# overhead configuration".to_string(), String::new()];

    lines.push("observer:".into());
    match config.observer.lat {
        Some(v) => lines.push(format!("  lat: {v}")),
        None => lines.push("  lat: null".into()),
    }
    match config.observer.lon {
        Some(v) => lines.push(format!("  lon: {v}")),
        None => lines.push("  lon: null".into()),
    }
    lines.push(format!("  radius_km: {}", config.observer.radius_km));
    lines.push(String::new());

    lines.push("service:".into());
    lines.push(format!("  base_url: \"{}\"", config.service.base_url));
    lines.push(format!("  timeout_sec: {}", config.service.timeout_sec));
    lines.push(format!(
        "  max_concurrent: {}",
        config.service.max_concurrent
    ));
    lines.push(String::new());

    lines.push("source:".into());
    lines.push(format!("  mode: \"{}\"", config.source.mode.as_str()));
    match &config.source.api_key {
        Some(v) => lines.push(format!("  api_key: \"{v}\"")),
        None => lines.push("  api_key: null".into()),
    }
    match &config.source.endpoint {
        Some(v) => lines.push(format!("  endpoint: \"{v}\"")),
        None => lines.push("  endpoint: null".into()),
    }
    lines.push(String::new());

    lines.push("datasets:".into());
    lines.push(format!(
        "  manufacturers: \"{}\"",
        config.datasets.manufacturers
    ));
    lines.push(format!(
        "  aircraft_types: \"{}\"",
        config.datasets.aircraft_types
    ));
    lines.push(String::new());

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
