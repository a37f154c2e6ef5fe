//! Key-value backend abstraction.
//!
//! The [`OrderBackend`] trait exposes exactly the primitives the order store
//! needs from a networked key-value server. The two compound primitives,
//! [`insert_indexed`](OrderBackend::insert_indexed) and
//! [`remove_indexed`](OrderBackend::remove_indexed), must commit atomically:
//! the record write and the index update are applied together or not at all.
//! The store relies on this for its index invariant and takes no client-side
//! locks.
//!
//! # Implementations
//!
//! - `RedisBackend` (in `order-api-redis` crate): Production implementation
//! - `InMemoryBackend` (in `order-api-testing` crate): Fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
//! backend can be shared as `Arc<dyn OrderBackend>`.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by backend methods.
pub type BackendFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Errors reported by a backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend unreachable or the connection dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed to execute a command.
    #[error("command error: {0}")]
    Command(String),

    /// An atomic unit did not commit; none of its steps were applied.
    #[error("transaction aborted: {0}")]
    Aborted(String),
}

/// Cursor position plus the members returned by one index scan step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanPage {
    /// Cursor to resume from; `0` once the enumeration is exhausted.
    pub cursor: u64,
    /// Index members returned by this step.
    pub keys: Vec<String>,
}

/// Key-value operations backing the order store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one handle can serve every
/// request concurrently without external synchronization.
pub trait OrderBackend: Send + Sync {
    /// Check the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached.
    fn ping(&self) -> BackendFuture<'_, ()>;

    /// Read the value stored at `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure. Absence is not an error.
    fn get<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<String>>;

    /// Read many keys in one round trip.
    ///
    /// The result has one entry per requested key, in request order.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure.
    fn get_many<'a>(&'a self, keys: &'a [String]) -> BackendFuture<'a, Vec<Option<String>>>;

    /// Overwrite `key` only if it already exists.
    ///
    /// Returns `true` if the value was written, `false` if the key was absent
    /// (in which case nothing was created).
    ///
    /// # Errors
    ///
    /// Returns error on transport failure.
    fn replace<'a>(&'a self, key: &'a str, value: &'a str) -> BackendFuture<'a, bool>;

    /// Atomically write `key` if absent and add it to `index`.
    ///
    /// Returns `true` if both steps were applied, `false` if `key` already
    /// existed (in which case neither step was applied).
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or abort; no step is applied.
    fn insert_indexed<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        index: &'a str,
    ) -> BackendFuture<'a, bool>;

    /// Atomically delete `key` and remove it from `index`.
    ///
    /// Returns `true` if a record existed and both steps were applied,
    /// `false` if `key` was absent beforehand.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or abort; no step is applied.
    fn remove_indexed<'a>(&'a self, key: &'a str, index: &'a str) -> BackendFuture<'a, bool>;

    /// Advance a cursor over the members of `index`.
    ///
    /// `count` is the requested batch size. Enumeration order is unspecified
    /// and not a snapshot: members added or removed while a scan is in
    /// progress may be returned zero or more times.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure.
    fn scan_index<'a>(
        &'a self,
        index: &'a str,
        cursor: u64,
        count: usize,
    ) -> BackendFuture<'a, ScanPage>;
}
