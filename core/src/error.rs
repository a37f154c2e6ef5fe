//! Error taxonomy for order store operations.
//!
//! Absence is modelled as distinct variants rather than sentinel values:
//! [`StoreError::NotFound`] for reads, [`StoreError::NotExist`] for
//! existence-gated writes. Decode failures are always reported as
//! [`StoreError::Serialization`], never coerced into an empty result.

use crate::backend::BackendError;
use crate::order::OrderId;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by [`OrderStore`](crate::OrderStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Lookup found no record for the order.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// Update or delete targeted an order with no record.
    #[error("order {0} does not exist")]
    NotExist(OrderId),

    /// Insert targeted an order that already has a record.
    #[error("order {0} already exists")]
    AlreadyExists(OrderId),

    /// Record could not be encoded, or a stored value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend unreachable, command failed, transaction aborted, or deadline hit.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl StoreError {
    /// Returns `true` for the absence variants (`NotFound`, `NotExist`).
    ///
    /// # Examples
    ///
    /// ```
    /// # use order_api_core::{OrderId, StoreError};
    /// assert!(StoreError::NotFound(OrderId::new(1)).is_absent());
    /// assert!(!StoreError::AlreadyExists(OrderId::new(1)).is_absent());
    /// ```
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NotExist(_))
    }

    /// Returns `true` if retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Short label used for metrics and log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::NotExist(_) => "not_exist",
            Self::AlreadyExists(_) => "already_exists",
            Self::Serialization(_) => "serialization",
            Self::Transport(TransportError::DeadlineExceeded(_)) => "deadline_exceeded",
            Self::Transport(TransportError::Backend(_)) => "transport",
        }
    }
}

/// Failure to complete a round trip with the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The backend reported an error.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The operation was abandoned after the caller's deadline.
    #[error("operation cancelled after exceeding deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        Self::Transport(TransportError::Backend(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::NotFound(OrderId::new(5)).to_string(),
            "order 5 not found"
        );
        assert_eq!(
            StoreError::AlreadyExists(OrderId::new(5)).to_string(),
            "order 5 already exists"
        );
    }

    #[test]
    fn test_backend_error_is_transport() {
        let err: StoreError = BackendError::Connection("refused".into()).into();
        assert!(err.is_transient());
        assert!(!err.is_absent());
        assert_eq!(
            err.to_string(),
            "transport error: connection error: refused"
        );
    }

    #[test]
    fn test_deadline_is_transport() {
        let err: StoreError = TransportError::DeadlineExceeded(Duration::from_millis(5)).into();
        assert!(err.is_transient());
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_serialization_not_transient() {
        assert!(!StoreError::Serialization("bad".into()).is_transient());
    }
}
