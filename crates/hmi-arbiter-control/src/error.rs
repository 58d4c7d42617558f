//! Error types for the state controller.
//!
//! None of these errors is fatal. Public entry points on
//! [`StateController`](crate::StateController) log them and hand them back
//! inside [`Outcome::Dropped`](crate::Outcome::Dropped); the state is left
//! exactly as it was before the offending request.

use hmi_arbiter_core::{AppId, CoreError, CorrelationId, HmiAppId};
use thiserror::Error;

use crate::event::ResultCode;

/// A result type using `StateError`.
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur while processing a state request or event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A requested state has an invalid axis.
    #[error("invalid state requested for app {app_id}: {source}")]
    InvalidState {
        /// Application the state was requested for.
        app_id: AppId,
        /// Which axis was rejected.
        #[source]
        source: CoreError,
    },

    /// The application is not registered.
    #[error("app not found: {0}")]
    AppNotFound(AppId),

    /// No registered application carries this HMI id.
    #[error("no app with hmi id {0}")]
    HmiAppNotFound(HmiAppId),

    /// No activation request is pending under this correlation id.
    #[error("unknown correlation id: {0}")]
    UnknownCorrelation(CorrelationId),

    /// The HMI answered an activation request with a non-success code.
    #[error("activation {correlation_id} rejected by HMI: {result:?}")]
    ActivationRejected {
        /// Correlation id of the rejected request.
        correlation_id: CorrelationId,
        /// Result code reported by the HMI.
        result: ResultCode,
    },

    /// The activation response arrived after the configured timeout.
    #[error("activation {0} expired before the HMI responded")]
    ActivationExpired(CorrelationId),

    /// The application is already registered.
    #[error("app already registered: {0}")]
    AlreadyRegistered(AppId),
}

/// Coarse classification of a [`StateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was malformed.
    InvalidInput,
    /// The request referenced an application or correlation id that does not exist.
    UnresolvableReference,
    /// The HMI declined, or never completed, an activation handshake.
    HandshakeRejected,
    /// The request conflicts with existing state.
    Conflict,
}

impl StateError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState { .. } => ErrorKind::InvalidInput,
            Self::AppNotFound(_) | Self::HmiAppNotFound(_) | Self::UnknownCorrelation(_) => {
                ErrorKind::UnresolvableReference
            }
            Self::ActivationRejected { .. } | Self::ActivationExpired(_) => {
                ErrorKind::HandshakeRejected
            }
            Self::AlreadyRegistered(_) => ErrorKind::Conflict,
        }
    }
}
