//! The order store.
//!
//! [`OrderStore`] maps orders onto backend keys and keeps the `orders` index
//! set consistent with the records:
//!
//! > a key has a live record if and only if it is a member of the index.
//!
//! Insert and delete touch both the record and the index, and are issued as a
//! single atomic backend call. Update only replaces the record value, so index
//! membership is untouched. Nothing in this type is locked or cached; all
//! state lives in the backend, and the store handle is cheap to clone.
//!
//! # Listing consistency
//!
//! [`OrderStore::find_all`] is a weak, SCAN-like enumeration of the index.
//! There is no snapshot: orders inserted or deleted while a caller is paging
//! may be seen zero times, once, or (depending on the backend) more than once
//! across the full set of pages. Only with no concurrent mutation does
//! chaining cursors until `0` yield every order exactly once.
//!
//! # Deadlines
//!
//! Every operation is bounded by the handle's deadline, if any. Exceeding it
//! abandons the in-flight call and returns
//! [`TransportError::DeadlineExceeded`]. For a mutating call the outcome is
//! then unknown to the caller, but the backend's atomicity still guarantees
//! the index invariant. Dropping an operation's future cancels it the same way.

use crate::backend::{BackendError, OrderBackend, ScanPage};
use crate::codec;
use crate::error::{Result, StoreError, TransportError};
use crate::keys::{order_key, ORDER_INDEX_KEY};
use crate::order::{Order, OrderId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One page request for [`OrderStore::find_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of orders to return. Values below 1 are treated as 1.
    pub size: usize,
    /// Cursor returned by the previous call, `0` to start.
    pub cursor: u64,
}

impl Page {
    /// First page of the given size.
    #[must_use]
    pub const fn first(size: usize) -> Self {
        Self { size, cursor: 0 }
    }

    /// Page of the given size resuming at `cursor`.
    #[must_use]
    pub const fn resume(size: usize, cursor: u64) -> Self {
        Self { size, cursor }
    }
}

/// Orders returned by one [`OrderStore::find_all`] call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindResult {
    /// Decoded orders, in the order the index enumeration returned their keys.
    pub orders: Vec<Order>,
    /// Cursor for the next call; `0` once the index has been fully enumerated.
    pub cursor: u64,
}

impl FindResult {
    /// Returns `true` if no further pages remain.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.cursor == 0
    }
}

/// Index-consistent order persistence over an injected backend.
///
/// # Example
///
/// ```ignore
/// use order_api_core::{OrderStore, Page};
/// use std::sync::Arc;
///
/// let store = OrderStore::new(Arc::new(backend));
/// store.insert(&order).await?;
/// let first = store.find_all(Page::first(50)).await?;
/// ```
#[derive(Clone)]
pub struct OrderStore {
    backend: Arc<dyn OrderBackend>,
    deadline: Option<Duration>,
}

impl OrderStore {
    /// Create a store over the given backend, with no deadline.
    #[must_use]
    pub fn new(backend: Arc<dyn OrderBackend>) -> Self {
        Self {
            backend,
            deadline: None,
        }
    }

    /// Handle sharing the same backend, with every operation bounded by `deadline`.
    #[must_use]
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            deadline: Some(deadline),
        }
    }

    /// Deadline applied to each operation, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Check the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] if the backend cannot be reached.
    pub async fn ping(&self) -> Result<()> {
        self.run("ping", async { Ok(self.backend.ping().await?) })
            .await
    }

    /// Create an order record and index it, atomically.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyExists`] if a record already exists for the ID
    ///   (the existing record is left untouched)
    /// - [`StoreError::Serialization`] if the order cannot be encoded
    /// - [`StoreError::Transport`] on backend failure; nothing is applied
    pub async fn insert(&self, order: &Order) -> Result<()> {
        self.run("insert", async {
            let data = codec::encode(order)?;
            let key = order_key(order.order_id);

            let inserted = self
                .backend
                .insert_indexed(&key, &data, ORDER_INDEX_KEY)
                .await?;

            if !inserted {
                tracing::debug!(order_id = %order.order_id, "Order key already present, insert rejected");
                return Err(StoreError::AlreadyExists(order.order_id));
            }

            tracing::info!(order_id = %order.order_id, "Inserted order and indexed it atomically");
            Ok(())
        })
        .await
    }

    /// Load an order by ID.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no record exists
    /// - [`StoreError::Serialization`] if the stored value is corrupt
    /// - [`StoreError::Transport`] on backend failure
    pub async fn find_by_id(&self, order_id: OrderId) -> Result<Order> {
        self.run("find_by_id", async {
            let key = order_key(order_id);

            let data = self
                .backend
                .get(&key)
                .await?
                .ok_or(StoreError::NotFound(order_id))?;

            codec::decode(&data).inspect_err(|e| {
                tracing::error!(order_id = %order_id, key = %key, error = %e, "Stored order is corrupt");
            })
        })
        .await
    }

    /// Replace an existing order record.
    ///
    /// Never creates a record; index membership is unchanged.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotExist`] if no record exists at the time of the write
    /// - [`StoreError::Serialization`] if the order cannot be encoded
    /// - [`StoreError::Transport`] on backend failure
    pub async fn update(&self, order: &Order) -> Result<()> {
        self.run("update", async {
            let data = codec::encode(order)?;
            let key = order_key(order.order_id);

            if !self.backend.replace(&key, &data).await? {
                return Err(StoreError::NotExist(order.order_id));
            }

            tracing::info!(order_id = %order.order_id, "Updated order");
            Ok(())
        })
        .await
    }

    /// Delete an order record and drop it from the index, atomically.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotExist`] if no record existed before the delete
    /// - [`StoreError::Transport`] on backend failure; nothing is applied
    pub async fn delete_by_id(&self, order_id: OrderId) -> Result<()> {
        self.run("delete_by_id", async {
            let key = order_key(order_id);

            if !self.backend.remove_indexed(&key, ORDER_INDEX_KEY).await? {
                return Err(StoreError::NotExist(order_id));
            }

            tracing::info!(order_id = %order_id, "Deleted order and removed it from index atomically");
            Ok(())
        })
        .await
    }

    /// Fetch one page of orders by advancing a cursor over the index.
    ///
    /// Keys are fetched with a single batched read and decoded in the order
    /// the enumeration returned them. A key whose record disappeared between
    /// the scan and the read is skipped. An empty page is not an error; keep
    /// paging until the returned cursor is `0`.
    ///
    /// Backends may treat `size` as a hint and return more keys per step;
    /// every returned key is fetched so no order is lost.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Serialization`] if any fetched record is corrupt
    /// - [`StoreError::Transport`] if the scan or the batched read fails, or
    ///   the batched read does not return one value per key
    pub async fn find_all(&self, page: Page) -> Result<FindResult> {
        self.run("find_all", async {
            let count = page.size.max(1);

            let ScanPage { cursor, keys } = self
                .backend
                .scan_index(ORDER_INDEX_KEY, page.cursor, count)
                .await?;

            if keys.is_empty() {
                return Ok(FindResult {
                    orders: Vec::new(),
                    cursor,
                });
            }

            let values = self.backend.get_many(&keys).await?;
            if values.len() != keys.len() {
                return Err(BackendError::Command(format!(
                    "batched read returned {} values for {} keys",
                    values.len(),
                    keys.len()
                ))
                .into());
            }

            let mut orders = Vec::with_capacity(values.len());
            for (key, value) in keys.iter().zip(values) {
                let Some(data) = value else {
                    tracing::debug!(key = %key, "Indexed order removed during scan, skipping");
                    continue;
                };
                let order = codec::decode(&data).inspect_err(|e| {
                    tracing::error!(key = %key, error = %e, "Stored order is corrupt");
                })?;
                orders.push(order);
            }

            tracing::debug!(
                request_cursor = page.cursor,
                next_cursor = cursor,
                count = orders.len(),
                "Scanned order index page"
            );

            Ok(FindResult { orders, cursor })
        })
        .await
    }

    /// Run one operation under the deadline and record its outcome.
    async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();

        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, fut).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(op, ?deadline, "Order store operation exceeded deadline");
                    Err(TransportError::DeadlineExceeded(deadline).into())
                }
            },
            None => fut.await,
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::counter!("order_store_operations_total", "op" => op, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("order_store_operation_duration_seconds", "op" => op)
            .record(started.elapsed().as_secs_f64());

        result
    }
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
