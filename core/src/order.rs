//! Order domain types.
//!
//! An [`Order`] is replaced as a whole on every write; the store never
//! patches individual fields. Lifecycle state is not stored separately, it is
//! derived from which timestamps are present:
//!
//! | `created_on` | `shipped_on` | `completed_on` | Status      |
//! |--------------|--------------|----------------|-------------|
//! | set          | -            | -              | `Placed`    |
//! | set          | set          | -              | `Shipped`   |
//! | set          | set          | set            | `Completed` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique numeric order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    /// Create an order ID from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Reference to the customer who placed an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    /// Create a random customer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item being ordered.
    pub item_id: Uuid,
    /// Number of units.
    pub quantity: u32,
    /// Unit price in minor currency units.
    pub price: u64,
}

impl LineItem {
    /// Line total (quantity × unit price), saturating on overflow.
    #[must_use]
    pub const fn subtotal(&self) -> u64 {
        self.price.saturating_mul(self.quantity as u64)
    }
}

/// Lifecycle state of an order, derived from its timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, not yet shipped.
    Placed,
    /// Handed to the carrier.
    Shipped,
    /// Delivered and closed.
    Completed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placed => write!(f, "placed"),
            Self::Shipped => write!(f, "shipped"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// `ship` on an order that already has a ship date.
    #[error("order {0} has already been shipped")]
    AlreadyShipped(OrderId),

    /// `complete` on an order that was never shipped.
    #[error("order {0} cannot be completed before it is shipped")]
    NotShipped(OrderId),

    /// `complete` on an order that already has a completion date.
    #[error("order {0} has already been completed")]
    AlreadyCompleted(OrderId),
}

/// The persisted order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier; determines the store key.
    pub order_id: OrderId,
    /// Customer who placed the order.
    pub customer_id: CustomerId,
    /// Ordered line items.
    pub line_items: Vec<LineItem>,
    /// When the order was placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    /// When the order shipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_on: Option<DateTime<Utc>>,
    /// When the order was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a newly placed order.
    #[must_use]
    pub fn place(
        order_id: OrderId,
        customer_id: CustomerId,
        line_items: Vec<LineItem>,
        created_on: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            line_items,
            created_on: Some(created_on),
            shipped_on: None,
            completed_on: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        if self.completed_on.is_some() {
            OrderStatus::Completed
        } else if self.shipped_on.is_some() {
            OrderStatus::Shipped
        } else {
            OrderStatus::Placed
        }
    }

    /// Sum of all line subtotals, saturating on overflow.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.line_items
            .iter()
            .fold(0u64, |acc, item| acc.saturating_add(item.subtotal()))
    }

    /// Mark the order as shipped.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::AlreadyShipped`] if the order already shipped.
    pub fn ship(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.shipped_on.is_some() {
            return Err(TransitionError::AlreadyShipped(self.order_id));
        }
        self.shipped_on = Some(at);
        Ok(())
    }

    /// Mark the order as completed.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::NotShipped`] if the order has not shipped yet
    /// - [`TransitionError::AlreadyCompleted`] if the order is already completed
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.shipped_on.is_none() {
            return Err(TransitionError::NotShipped(self.order_id));
        }
        if self.completed_on.is_some() {
            return Err(TransitionError::AlreadyCompleted(self.order_id));
        }
        self.completed_on = Some(at);
        Ok(())
    }
}
