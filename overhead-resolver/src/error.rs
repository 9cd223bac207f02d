//! Error enum for overhead-resolver.

use thiserror::Error;

/// All errors produced by overhead-resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("empty ICAO hex address")]
    EmptyAddress,
    #[error("invalid ICAO hex address: {0:?}")]
    BadAddress(String),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("{url} returned malformed payload: {detail}")]
    Malformed { url: String, detail: String },
    #[error("source is not configured: {0}")]
    SourceConfig(String),
    #[error("batch cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ResolveError>;
