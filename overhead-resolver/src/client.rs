//! Remote metadata client — hex-prefix bucket fetch over HTTP.
//!
//! The metadata store is partitioned into buckets keyed by address prefix.
//! A bucket payload is a JSON object mapping remaining suffixes to metadata
//! records, plus an optional `children` array naming finer-grained
//! sub-buckets that exist beneath this prefix.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ResolveError, Result};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Metadata for a single aircraft address.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetadataRecord {
    /// ICAO type designator, e.g. "B738".
    #[serde(rename = "type")]
    pub type_code: Option<String>,
}

/// One prefix bucket of the metadata store.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    /// Remaining suffix → record, for addresses stored directly here.
    pub entries: HashMap<String, MetadataRecord>,
    /// Names of child buckets (this prefix plus one more character).
    pub children: Vec<String>,
}

impl Bucket {
    /// Parse a bucket payload.
    ///
    /// Entry values that are not metadata objects are skipped; a payload
    /// that is not a JSON object, or a `children` value that is not an
    /// array, is malformed.
    pub fn from_value(url: &str, value: Value) -> Result<Self> {
        let object = match value {
            Value::Object(map) => map,
            other => {
                return Err(ResolveError::Malformed {
                    url: url.to_string(),
                    detail: format!("expected object, got {other}"),
                })
            }
        };

        let mut bucket = Bucket::default();
        for (key, val) in object {
            if key == "children" {
                let items = val.as_array().ok_or_else(|| ResolveError::Malformed {
                    url: url.to_string(),
                    detail: "children is not an array".into(),
                })?;
                bucket.children = items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                continue;
            }
            match serde_json::from_value::<MetadataRecord>(val) {
                Ok(record) => {
                    bucket.entries.insert(key, record);
                }
                Err(e) => debug!("{url}: skipping entry {key:?}: {e}"),
            }
        }
        Ok(bucket)
    }
}

// ---------------------------------------------------------------------------
// Fetcher seam
// ---------------------------------------------------------------------------

/// Source of prefix buckets. The production implementation is
/// [`MetadataClient`]; tests use in-memory fixtures.
#[async_trait]
pub trait BucketFetcher: Send + Sync {
    async fn fetch_bucket(&self, bucket: &str) -> Result<Bucket>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// HTTP client for the remote metadata service.
///
/// Stateless requests over a shared connection pool; safe to reuse across
/// concurrent resolutions.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: reqwest::Client,
    base_url: String,
}

impl MetadataClient {
    /// Create a client with a bounded per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(MetadataClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn bucket_url(&self, bucket: &str) -> String {
        format!("{}/db/{}.json", self.base_url, bucket)
    }
}

#[async_trait]
impl BucketFetcher for MetadataClient {
    async fn fetch_bucket(&self, bucket: &str) -> Result<Bucket> {
        let url = self.bucket_url(bucket);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status { url, status });
        }
        let value: Value = response
            .json()
            .await
            .map_err(|e| ResolveError::Malformed {
                url: url.clone(),
                detail: e.to_string(),
            })?;
        Bucket::from_value(&url, value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Bucket> {
        Bucket::from_value("test", serde_json::from_str(text).unwrap())
    }

    #[test]
    fn test_parse_bucket() {
        let bucket = parse(
            r#"{
                "12345": {"type": "B738"},
                "99AA0": {"type": "A320"},
                "children": ["A1", "A2"]
            }"#,
        )
        .unwrap();
        assert_eq!(bucket.entries.len(), 2);
        assert_eq!(
            bucket.entries["12345"].type_code.as_deref(),
            Some("B738")
        );
        assert_eq!(bucket.children, vec!["A1", "A2"]);
    }

    #[test]
    fn test_parse_bucket_without_children() {
        let bucket = parse(r#"{"12345": {"type": "B738"}}"#).unwrap();
        assert!(bucket.children.is_empty());
        assert_eq!(bucket.entries.len(), 1);
    }

    #[test]
    fn test_parse_bucket_record_without_type() {
        let bucket = parse(r#"{"12345": {"reg": "N818DA"}}"#).unwrap();
        assert_eq!(bucket.entries["12345"].type_code, None);
    }

    #[test]
    fn test_parse_bucket_skips_non_object_entries() {
        let bucket = parse(r#"{"12345": {"type": "B738"}, "bogus": 7}"#).unwrap();
        assert_eq!(bucket.entries.len(), 1);
        assert!(bucket.entries.contains_key("12345"));
    }

    #[test]
    fn test_parse_bucket_rejects_non_object() {
        assert!(matches!(
            parse("[1, 2, 3]"),
            Err(ResolveError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parse_bucket_rejects_bad_children() {
        assert!(matches!(
            parse(r#"{"children": "A1"}"#),
            Err(ResolveError::Malformed { .. })
        ));
    }

    #[test]
    fn test_bucket_url() {
        let client =
            MetadataClient::new("https://example.com/meta/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.bucket_url("A1"),
            "https://example.com/meta/db/A1.json"
        );
    }
}
