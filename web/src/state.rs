//! Application state shared across HTTP handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use order_api_core::{Clock, OrderStore, SystemClock};
use std::sync::Arc;

/// Default page size for `GET /orders` when the request gives none.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page size `GET /orders` accepts.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Application state shared across all HTTP handlers.
///
/// Cloned into every request; the store and clock are shared handles.
///
/// # Examples
///
/// ```ignore
/// let state = AppState::new(OrderStore::new(Arc::new(backend)))
///     .with_page_sizes(50, 1000);
/// let app = app_router(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Order persistence.
    pub store: OrderStore,
    /// Time source for order timestamps.
    pub clock: Arc<dyn Clock>,
    /// Page size used when a listing request gives none.
    pub page_size_default: usize,
    /// Largest page size a listing request may ask for.
    pub page_size_max: usize,
    /// Prometheus handle rendered at `GET /metrics`, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state over the given store with the system clock and default page sizes.
    #[must_use]
    pub fn new(store: OrderStore) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            page_size_default: DEFAULT_PAGE_SIZE,
            page_size_max: MAX_PAGE_SIZE,
            metrics: None,
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the default and maximum listing page sizes.
    #[must_use]
    pub fn with_page_sizes(mut self, default: usize, max: usize) -> Self {
        self.page_size_default = default;
        self.page_size_max = max;
        self
    }

    /// Expose the given Prometheus handle at `GET /metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("page_size_default", &self.page_size_default)
            .field("page_size_max", &self.page_size_max)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
