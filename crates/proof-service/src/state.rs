//! Shared application state: the storage backend, request counters, and the
//! Prometheus recorder handle.

use metrics_exporter_prometheus::PrometheusHandle;
use ssz_merkle_core::query::{QueryApi, StateStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    query: QueryApi,
    health_store: Arc<dyn StateStore>,
    metrics_handle: PrometheusHandle,
    requests_served: AtomicU64,
    proof_errors: AtomicU64,
    start_time: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, metrics_handle: PrometheusHandle) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                query: QueryApi::new(store.clone()),
                health_store: store,
                metrics_handle,
                requests_served: AtomicU64::new(0),
                proof_errors: AtomicU64::new(0),
                start_time: Instant::now(),
            }),
        }
    }

    #[must_use]
    pub fn query(&self) -> &QueryApi {
        &self.inner.query
    }

    #[must_use]
    pub fn health_store(&self) -> &Arc<dyn StateStore> {
        &self.inner.health_store
    }

    #[must_use]
    pub fn metrics_handle(&self) -> &PrometheusHandle {
        &self.inner.metrics_handle
    }

    pub fn record_request(&self) {
        self.inner.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_proof_error(&self) {
        self.inner.proof_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn requests_served(&self) -> u64 {
        self.inner.requests_served.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn proof_errors(&self) -> u64 {
        self.inner.proof_errors.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_store::{FixtureBeaconStore, Snapshot};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use ssz_merkle_core::primitives::Version;
    use ssz_merkle_core::schema::BeaconState;

    fn test_state() -> AppState {
        let store = Arc::new(FixtureBeaconStore::single(Snapshot::linked(BeaconState::default(), Version([0; 4]))));
        let handle = PrometheusBuilder::new().build_recorder().handle();
        AppState::new(store, handle)
    }

    #[test]
    fn counters_start_at_zero_and_increment() {
        let state = test_state();
        assert_eq!(state.requests_served(), 0);
        state.record_request();
        state.record_request();
        assert_eq!(state.requests_served(), 2);
        state.record_proof_error();
        assert_eq!(state.proof_errors(), 1);
    }
}
