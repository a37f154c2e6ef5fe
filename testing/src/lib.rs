//! # Order API Testing
//!
//! Testing utilities for the order API.
//!
//! This crate provides:
//! - [`InMemoryBackend`]: an [`OrderBackend`](order_api_core::OrderBackend)
//!   with fault injection and inspection helpers
//! - [`mocks::FixedClock`]: deterministic time
//! - [`fixtures`]: ready-made orders
//!
//! ## Example
//!
//! ```
//! use order_api_core::OrderStore;
//! use order_api_testing::{fixtures, InMemoryBackend};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let backend = InMemoryBackend::new();
//! let store = OrderStore::new(Arc::new(backend.clone()));
//!
//! store.insert(&fixtures::order(1)).await.unwrap();
//! assert!(backend.is_consistent("orders", "order:").unwrap());
//! # });
//! ```

pub mod backend;

pub use backend::{FaultPoint, InMemoryBackend};

/// Mock implementations of environment traits.
pub mod mocks {
    use chrono::{DateTime, Utc};
    use order_api_core::Clock;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use order_api_testing::mocks::FixedClock;
    /// use order_api_core::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a fixed clock at a known instant (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }
}

/// Ready-made orders.
pub mod fixtures {
    use chrono::{DateTime, Utc};
    use order_api_core::{CustomerId, LineItem, Order, OrderId};
    use uuid::Uuid;

    /// Fixed placement time used by fixtures.
    #[must_use]
    pub fn placed_at() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089)
    }

    /// A line item with the given quantity and unit price.
    #[must_use]
    pub fn line_item(quantity: u32, price: u64) -> LineItem {
        LineItem {
            item_id: Uuid::new_v4(),
            quantity,
            price,
        }
    }

    /// A placed order with two line items.
    #[must_use]
    pub fn order(id: u64) -> Order {
        Order::place(
            OrderId::new(id),
            CustomerId::new(),
            vec![line_item(1, 1_999), line_item(3, 250)],
            placed_at(),
        )
    }

    /// Distinct placed orders with IDs `1..=n`.
    #[must_use]
    pub fn orders(n: u64) -> Vec<Order> {
        (1..=n).map(order).collect()
    }
}
