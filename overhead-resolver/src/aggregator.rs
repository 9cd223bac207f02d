//! Fan-out batch resolution — one concurrent lookup per candidate aircraft,
//! joined into a single completed batch.
//!
//! Candidates are filtered by the search radius first; each survivor is
//! resolved independently with no ordering between tasks. Every task returns
//! its own record and the results are merged at the join point, so no shared
//! collection is mutated concurrently. In-flight resolutions are bounded by
//! a semaphore to avoid unbounded fan-out against the metadata service.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use overhead_core::{
    RawAircraftObservation, ResolvedAircraftRecord, SearchRadius, TypeDescriptionIndex,
};

use crate::client::BucketFetcher;
use crate::error::{ResolveError, Result};
use crate::resolver::PrefixResolver;

/// Default bound on simultaneous in-flight resolutions.
const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Resolves batches of observations against the metadata store.
pub struct BatchResolver<F: BucketFetcher + 'static> {
    resolver: Arc<PrefixResolver<F>>,
    index: Arc<TypeDescriptionIndex>,
    max_in_flight: usize,
}

impl<F: BucketFetcher + 'static> BatchResolver<F> {
    pub fn new(resolver: PrefixResolver<F>, index: TypeDescriptionIndex) -> Self {
        BatchResolver {
            resolver: Arc::new(resolver),
            index: Arc::new(index),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Override the in-flight resolution bound.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    /// Resolve every in-range candidate and wait for all of them.
    ///
    /// Each survivor of the radius filter contributes exactly one record to
    /// the output: resolution failures degrade to [`overhead_core::UNKNOWN_AIRCRAFT`]
    /// rather than dropping the aircraft. Output order is completion order,
    /// not input order.
    ///
    /// Cancelling the token abandons the batch with
    /// [`ResolveError::Cancelled`]; a cancelled batch never yields a partial
    /// result that could be merged into a newer one.
    pub async fn resolve_all(
        &self,
        observations: Vec<RawAircraftObservation>,
        search: &SearchRadius,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedAircraftRecord>> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let in_range: Vec<RawAircraftObservation> = observations
            .into_iter()
            .filter(|obs| search.contains_observation(obs))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks: JoinSet<Result<ResolvedAircraftRecord>> = JoinSet::new();

        for obs in in_range {
            let resolver = Arc::clone(&self.resolver);
            let index = Arc::clone(&self.index);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(p) => p,
                        Err(_) => return Err(ResolveError::Cancelled),
                    },
                };
                tokio::select! {
                    _ = cancel.cancelled() => Err(ResolveError::Cancelled),
                    record = resolve_one(&resolver, &index, obs) => Ok(record),
                }
            });
        }

        let mut records = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(record)) => records.push(record),
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => warn!("resolution task failed to join: {e}"),
            }
        }

        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        Ok(records)
    }
}

/// Resolve a single observation, degrading every failure to a record with a
/// placeholder description.
async fn resolve_one<F: BucketFetcher>(
    resolver: &PrefixResolver<F>,
    index: &TypeDescriptionIndex,
    obs: RawAircraftObservation,
) -> ResolvedAircraftRecord {
    let metadata = match resolver.resolve(&obs.icao_hex).await {
        Ok(found) => found,
        Err(e) => {
            warn!("unusable address {:?}: {e}", obs.icao_hex);
            None
        }
    };
    let type_code = metadata.and_then(|m| m.type_code);
    let description = index.describe_or_unknown(type_code.as_deref());
    ResolvedAircraftRecord {
        observation: obs,
        type_code,
        description,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
