//! # Order API Core
//!
//! Order model and the index-consistent order store.
//!
//! This crate provides:
//! - The [`Order`] record and its lifecycle (placed → shipped → completed)
//! - The store key layout ([`keys`]) and JSON record codec ([`codec`])
//! - The [`OrderBackend`] seam implemented by concrete key-value servers
//! - [`OrderStore`]: insert, lookup, update, delete and paginated listing,
//!   keeping the `orders` index set consistent with the stored records
//!
//! ## Architecture
//!
//! ```text
//! HTTP handler ──▶ OrderStore ──▶ Arc<dyn OrderBackend> ──▶ Redis
//!                  (keys, codec,      (atomic record+index
//!                   error mapping)     primitives)
//! ```
//!
//! The store is the only component that reads or writes the index set.
//!
//! ## Example
//!
//! ```ignore
//! use order_api_core::{Order, OrderStore, Page};
//!
//! async fn list_everything(store: &OrderStore) -> order_api_core::Result<Vec<Order>> {
//!     let mut all = Vec::new();
//!     let mut page = Page::first(100);
//!     loop {
//!         let result = store.find_all(page).await?;
//!         all.extend(result.orders);
//!         if result.cursor == 0 {
//!             return Ok(all);
//!         }
//!         page = Page::resume(100, result.cursor);
//!     }
//! }
//! ```

pub mod backend;
pub mod codec;
pub mod environment;
pub mod error;
pub mod keys;
pub mod order;
pub mod store;

// Re-export commonly used types
pub use backend::{BackendError, BackendFuture, OrderBackend, ScanPage};
pub use environment::{Clock, SystemClock};
pub use error::{Result, StoreError, TransportError};
pub use order::{CustomerId, LineItem, Order, OrderId, OrderStatus, TransitionError};
pub use store::{FindResult, OrderStore, Page};
