//! Activation handshake bookkeeping.
//!
//! Promoting an application to `FULL` on the HMI's behalf is asynchronous:
//! the controller sends an [`ActivateAppRequest`], remembers the target state
//! under the request's correlation id, and applies it only when a successful
//! response arrives. Entries are removed by their response, by
//! [`PendingActivations::expire`], or when their application unregisters.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hmi_arbiter_core::{AppId, CorrelationId, HmiAppId, HmiLevel, HmiState};
use serde::Serialize;

use crate::error::{Result, StateError};
use crate::event::ResultCode;

/// Outbound request asking the HMI to bring an application to the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivateAppRequest {
    /// Pairs the request with its response.
    pub correlation_id: CorrelationId,
    /// Middleware-side id of the application.
    pub app_id: AppId,
    /// HMI-side id of the application.
    pub hmi_app_id: HmiAppId,
    /// Requested level.
    pub level: HmiLevel,
}

/// A sent activation request awaiting its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingActivation {
    /// Target application.
    pub app_id: AppId,
    /// HMI-side id used to resolve the application on response.
    pub hmi_app_id: HmiAppId,
    /// State applied on success.
    pub target: HmiState,
    /// When the request was sent.
    pub requested_at: DateTime<Utc>,
}

impl PendingActivation {
    /// Whether the entry is at least `timeout_seconds` old at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, timeout_seconds: Option<u64>) -> bool {
        let Some(timeout) = timeout_seconds else {
            return false;
        };
        u64::try_from((now - self.requested_at).num_seconds()).is_ok_and(|age| age >= timeout)
    }
}

/// Pending activation requests keyed by correlation id.
#[derive(Debug, Default)]
pub struct PendingActivations {
    entries: HashMap<CorrelationId, PendingActivation>,
}

impl PendingActivations {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sent request, replacing any entry under the same id.
    pub fn insert(&mut self, correlation_id: CorrelationId, pending: PendingActivation) {
        if self.entries.insert(correlation_id, pending).is_some() {
            tracing::warn!(
                correlation_id = %correlation_id,
                "Correlation id reused while still pending"
            );
        }
    }

    /// Forget a request without resolving it.
    pub fn remove(&mut self, correlation_id: CorrelationId) -> Option<PendingActivation> {
        self.entries.remove(&correlation_id)
    }

    /// Consume the entry answered by a response.
    ///
    /// The entry is removed whatever the outcome.
    ///
    /// # Errors
    ///
    /// - `StateError::UnknownCorrelation` if nothing is pending under the id
    /// - `StateError::ActivationRejected` if `result` is not success
    /// - `StateError::ActivationExpired` if the entry outlived `timeout_seconds`
    pub fn resolve(
        &mut self,
        correlation_id: CorrelationId,
        result: ResultCode,
        now: DateTime<Utc>,
        timeout_seconds: Option<u64>,
    ) -> Result<PendingActivation> {
        let pending = self
            .entries
            .remove(&correlation_id)
            .ok_or(StateError::UnknownCorrelation(correlation_id))?;

        if !result.is_success() {
            return Err(StateError::ActivationRejected {
                correlation_id,
                result,
            });
        }
        if pending.is_expired(now, timeout_seconds) {
            return Err(StateError::ActivationExpired(correlation_id));
        }
        Ok(pending)
    }

    /// Drop every entry targeting `app_id`. Returns how many were dropped.
    pub fn remove_for_app(&mut self, app_id: AppId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, pending| pending.app_id != app_id);
        before - self.entries.len()
    }

    /// Remove and return every entry that has outlived `timeout_seconds`.
    pub fn expire(
        &mut self,
        now: DateTime<Utc>,
        timeout_seconds: Option<u64>,
    ) -> Vec<(CorrelationId, PendingActivation)> {
        let expired: Vec<CorrelationId> = self
            .entries
            .iter()
            .filter(|(_, pending)| pending.is_expired(now, timeout_seconds))
            .map(|(id, _)| *id)
            .collect();

        let mut removed: Vec<_> = expired
            .into_iter()
            .filter_map(|id| self.entries.remove(&id).map(|pending| (id, pending)))
            .collect();
        removed.sort_by_key(|(id, _)| *id);
        removed
    }

    /// Snapshot of all pending entries, ordered by correlation id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(CorrelationId, PendingActivation)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(id, p)| (*id, *p)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
