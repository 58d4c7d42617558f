//! Common error types for hmi-arbiter.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the core value types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A state axis holds the `Invalid` marker.
    #[error("invalid {axis}")]
    InvalidAxis {
        /// Name of the offending axis.
        axis: &'static str,
    },

    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),
}
