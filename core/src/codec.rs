//! JSON encoding of stored order records.

use crate::error::{Result, StoreError};
use crate::order::Order;

/// Encode an order for storage.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the order cannot be encoded.
pub fn encode(order: &Order) -> Result<String> {
    serde_json::to_string(order).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode a stored order record.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the value is not a valid order.
pub fn decode(data: &str) -> Result<Order> {
    serde_json::from_str(data).map_err(|e| StoreError::Serialization(e.to_string()))
}
