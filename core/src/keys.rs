//! Store key layout.
//!
//! - **Record**: `order:{order_id}` → JSON-encoded [`Order`](crate::Order)
//! - **Index**: `orders` (Set) → store key of every live record

use crate::order::OrderId;

/// Name of the set holding the key of every live order record.
pub const ORDER_INDEX_KEY: &str = "orders";

/// Prefix shared by all order record keys.
pub const ORDER_KEY_PREFIX: &str = "order:";

/// Store key for an order record.
///
/// # Examples
///
/// ```
/// use order_api_core::{keys::order_key, OrderId};
///
/// assert_eq!(order_key(OrderId::new(42)), "order:42");
/// ```
#[must_use]
pub fn order_key(order_id: OrderId) -> String {
    format!("{ORDER_KEY_PREFIX}{order_id}")
}
