//! Adaptive-depth prefix resolution against the remote metadata store.
//!
//! An address is looked up in the bucket named by its prefix. On a direct
//! suffix hit the record is returned; if the bucket instead declares a child
//! bucket one character deeper along the address, the lookup escalates to
//! that child. Dense prefixes are split into children lazily on the server
//! side, so the walk is bounded by the address length.

use tracing::{debug, warn};

use overhead_core::normalize_hex;

use crate::client::{BucketFetcher, MetadataRecord};
use crate::error::{ResolveError, Result};

/// Default prefix length for the first bucket fetch.
const DEFAULT_START_LEVEL: usize = 1;

/// Resolves ICAO hex addresses to metadata records.
pub struct PrefixResolver<F: BucketFetcher> {
    fetcher: F,
    start_level: usize,
}

impl<F: BucketFetcher> PrefixResolver<F> {
    pub fn new(fetcher: F) -> Self {
        PrefixResolver {
            fetcher,
            start_level: DEFAULT_START_LEVEL,
        }
    }

    /// Override the starting prefix length.
    pub fn with_start_level(mut self, level: usize) -> Self {
        self.start_level = level.max(1);
        self
    }

    /// Resolve an address to its metadata record.
    ///
    /// Returns `Ok(None)` when no match path exists at any level, and also
    /// when a bucket fetch fails mid-walk: transient remote failures degrade
    /// to NotFound for this address alone. Empty or non-hex input is a
    /// caller error.
    pub async fn resolve(&self, icao_hex: &str) -> Result<Option<MetadataRecord>> {
        if icao_hex.trim().is_empty() {
            return Err(ResolveError::EmptyAddress);
        }
        let hex = normalize_hex(icao_hex)
            .map_err(|_| ResolveError::BadAddress(icao_hex.to_string()))?;

        let mut level = self.start_level;
        while level <= hex.len() {
            let (bucket_key, remainder) = hex.split_at(level);

            let bucket = match self.fetcher.fetch_bucket(bucket_key).await {
                Ok(b) => b,
                Err(e) => {
                    warn!("bucket {bucket_key} unavailable, {hex} unresolved: {e}");
                    return Ok(None);
                }
            };

            if let Some(record) = bucket.entries.get(remainder) {
                return Ok(Some(record.clone()));
            }

            // A child bucket one character deeper may hold the address.
            let next = match remainder.chars().next() {
                Some(c) => c,
                None => return Ok(None),
            };
            let child = format!("{bucket_key}{next}");
            if !bucket.children.iter().any(|c| *c == child) {
                debug!("{hex}: no entry and no child {child} at level {level}");
                return Ok(None);
            }
            level += 1;
        }

        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Bucket;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    struct MapFetcher {
        buckets: HashMap<String, Bucket>,
        fetches: AtomicUsize,
    }

    impl MapFetcher {
        fn new(buckets: Vec<(&str, Bucket)>) -> Self {
            MapFetcher {
                buckets: buckets
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BucketFetcher for MapFetcher {
        async fn fetch_bucket(&self, bucket: &str) -> Result<Bucket> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.buckets
                .get(bucket)
                .cloned()
                .ok_or_else(|| ResolveError::Status {
                    url: format!("test/db/{bucket}.json"),
                    status: reqwest::StatusCode::NOT_FOUND,
                })
        }
    }

    fn record(type_code: &str) -> MetadataRecord {
        MetadataRecord {
            type_code: Some(type_code.to_string()),
        }
    }

    fn bucket(entries: Vec<(&str, MetadataRecord)>, children: Vec<&str>) -> Bucket {
        Bucket {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            children: children.into_iter().map(str::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn test_direct_hit_at_level_one() {
        let fetcher = MapFetcher::new(vec![(
            "A",
            bucket(vec![("12345", record("B738"))], vec![]),
        )]);
        let resolver = PrefixResolver::new(fetcher);

        let found = resolver.resolve("A12345").await.unwrap().unwrap();
        assert_eq!(found.type_code.as_deref(), Some("B738"));
        assert_eq!(resolver.fetcher.fetch_count(), 1, "must not recurse");
    }

    #[tokio::test]
    async fn test_escalates_to_declared_child() {
        let fetcher = MapFetcher::new(vec![
            ("A", bucket(vec![], vec!["A1"])),
            ("A1", bucket(vec![("2345", record("A320"))], vec![])),
        ]);
        let resolver = PrefixResolver::new(fetcher);

        let found = resolver.resolve("A12345").await.unwrap().unwrap();
        assert_eq!(found.type_code.as_deref(), Some("A320"));
        assert_eq!(
            resolver.fetcher.fetch_count(),
            2,
            "exactly one level deeper"
        );
    }

    #[tokio::test]
    async fn test_not_found_without_matching_child() {
        let fetcher = MapFetcher::new(vec![(
            "A",
            bucket(vec![("99999", record("B738"))], vec!["A9"]),
        )]);
        let resolver = PrefixResolver::new(fetcher);

        assert!(resolver.resolve("A12345").await.unwrap().is_none());
        assert_eq!(resolver.fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_child_without_deeper_match() {
        let fetcher = MapFetcher::new(vec![
            ("A", bucket(vec![], vec!["A1"])),
            ("A1", bucket(vec![], vec![])),
        ]);
        let resolver = PrefixResolver::new(fetcher);

        assert!(resolver.resolve("A12345").await.unwrap().is_none());
        assert_eq!(resolver.fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_never_walks_past_address_length() {
        // Every level declares the next child; the walk must stop at the
        // address length instead of indexing past it.
        let fetcher = MapFetcher::new(vec![
            ("A", bucket(vec![], vec!["A1"])),
            ("A1", bucket(vec![], vec!["A12"])),
            ("A12", bucket(vec![], vec![])),
        ]);
        let resolver = PrefixResolver::new(fetcher);

        assert!(resolver.resolve("A12").await.unwrap().is_none());
        assert_eq!(resolver.fetcher.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_start_level_beyond_address_is_not_found() {
        let fetcher = MapFetcher::new(vec![]);
        let resolver = PrefixResolver::new(fetcher).with_start_level(7);

        assert!(resolver.resolve("A12345").await.unwrap().is_none());
        assert_eq!(resolver.fetcher.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_not_found() {
        let fetcher = MapFetcher::new(vec![]);
        let resolver = PrefixResolver::new(fetcher);

        assert!(resolver.resolve("A12345").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_address_rejected() {
        let resolver = PrefixResolver::new(MapFetcher::new(vec![]));
        assert!(matches!(
            resolver.resolve("").await,
            Err(ResolveError::EmptyAddress)
        ));
        assert!(matches!(
            resolver.resolve("   ").await,
            Err(ResolveError::EmptyAddress)
        ));
    }

    #[tokio::test]
    async fn test_non_hex_address_rejected() {
        let resolver = PrefixResolver::new(MapFetcher::new(vec![]));
        assert!(matches!(
            resolver.resolve("A12X45").await,
            Err(ResolveError::BadAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_lowercase_address_normalized() {
        let fetcher = MapFetcher::new(vec![(
            "A",
            bucket(vec![("12345", record("B738"))], vec![]),
        )]);
        let resolver = PrefixResolver::new(fetcher);

        let found = resolver.resolve("a12345").await.unwrap();
        assert!(found.is_some());
    }
}
