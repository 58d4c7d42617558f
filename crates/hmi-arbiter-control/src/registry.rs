//! Controller state and the transitions applied under its lock.
//!
//! Every transition follows the same shape: mutate regular states and overlay
//! stacks, then diff each application's effective state against the last one
//! it was sent and queue notifications for exactly the applications that
//! changed. Errors are raised before anything is mutated.

use std::collections::BTreeMap;

use chrono::Utc;
use hmi_arbiter_core::{
    AppId, AppProfile, CorrelationId, HmiAppId, HmiLevel, HmiState, OverlayKind, SystemContext,
};

use crate::activation::{ActivateAppRequest, PendingActivation, PendingActivations};
use crate::app_state::AppEntry;
use crate::arbitration;
use crate::error::{Result, StateError};
use crate::event::ResultCode;
use crate::notify::Notification;
use crate::overlay;
use crate::types::Outcome;

/// Everything guarded by the controller's state lock.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) apps: BTreeMap<AppId, AppEntry>,
    /// Global overlays in activation order.
    pub(crate) active: Vec<OverlayKind>,
    pub(crate) pending: PendingActivations,
}

impl Registry {
    pub(crate) fn blocking_active(&self) -> bool {
        self.active.iter().any(|kind| kind.is_blocking())
    }

    pub(crate) fn overlay_active(&self, kind: OverlayKind) -> bool {
        self.active.contains(&kind) || self.apps.values().any(|entry| entry.has_overlay(kind))
    }

    fn entry(&self, app_id: AppId) -> Result<&AppEntry> {
        self.apps.get(&app_id).ok_or(StateError::AppNotFound(app_id))
    }

    fn entry_mut(&mut self, app_id: AppId) -> Result<&mut AppEntry> {
        self.apps
            .get_mut(&app_id)
            .ok_or(StateError::AppNotFound(app_id))
    }

    fn find_by_hmi_id(&self, hmi_app_id: HmiAppId) -> Result<AppId> {
        self.apps
            .values()
            .find(|entry| entry.profile().hmi_app_id == hmi_app_id)
            .map(AppEntry::app_id)
            .ok_or(StateError::HmiAppNotFound(hmi_app_id))
    }
}

/// One locked pass over the registry.
pub(crate) struct Pass<'a> {
    registry: &'a mut Registry,
    attenuated: bool,
    notes: Vec<Notification>,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(registry: &'a mut Registry, attenuated: bool) -> Self {
        Self {
            registry,
            attenuated,
            notes: Vec::new(),
        }
    }

    /// Notifications queued by this pass, in order.
    pub(crate) fn into_notes(self) -> Vec<Notification> {
        self.notes
    }

    /// Diff every application against what it was last told and queue
    /// notifications for the ones that moved.
    fn commit(&mut self) -> usize {
        let mut changed = 0;
        for (app_id, entry) in &mut self.registry.apps {
            let old = *entry.notified();
            let new = entry.effective(self.attenuated);
            let notes = Notification::for_change(*app_id, &old, &new);
            if notes.is_empty() {
                continue;
            }
            tracing::info!(
                app_id = %app_id,
                old = %old,
                new = %new,
                kind = ?new.kind,
                "HMI state changed"
            );
            entry.set_notified(new);
            self.notes.extend(notes);
            changed += 1;
        }
        changed
    }

    fn applied(&mut self) -> Outcome {
        Outcome::Applied {
            changed: self.commit(),
        }
    }

    fn arbitrate(&mut self, app_id: AppId, requested: &HmiState) -> Result<()> {
        let assignments = arbitration::plan(self.registry.apps.values(), app_id, requested)?;
        for (id, state) in assignments {
            if let Some(entry) = self.registry.apps.get_mut(&id) {
                entry.set_regular(state);
            }
        }
        Ok(())
    }

    pub(crate) fn register(&mut self, profile: AppProfile, level: HmiLevel) -> Result<Outcome> {
        let app_id = profile.app_id;
        if self.registry.apps.contains_key(&app_id) {
            return Err(StateError::AlreadyRegistered(app_id));
        }
        let regular =
            arbitration::state_for_level(&profile.capabilities, level, SystemContext::Main);
        regular
            .validate()
            .map_err(|source| StateError::InvalidState { app_id, source })?;

        let mut entry = AppEntry::new(profile);
        for kind in &self.registry.active {
            entry.push(*kind);
        }
        self.registry.apps.insert(app_id, entry);
        self.arbitrate(app_id, &regular)?;

        tracing::info!(
            app_id = %app_id,
            hmi_app_id = %profile.hmi_app_id,
            level = %level,
            "Registered app"
        );
        Ok(self.applied())
    }

    pub(crate) fn unregister(&mut self, app_id: AppId) -> Result<Outcome> {
        self.registry
            .apps
            .remove(&app_id)
            .ok_or(StateError::AppNotFound(app_id))?;
        let dropped = self.registry.pending.remove_for_app(app_id);
        tracing::info!(app_id = %app_id, dropped_activations = dropped, "Unregistered app");
        Ok(Outcome::unchanged())
    }

    pub(crate) fn set_resuming(&mut self, app_id: AppId, resuming: bool) -> Result<Outcome> {
        self.registry.entry_mut(app_id)?.set_resuming(resuming);
        tracing::debug!(app_id = %app_id, resuming, "Resumption window updated");
        Ok(Outcome::unchanged())
    }

    /// Apply, postpone or send for activation a regular-state request.
    pub(crate) fn request(
        &mut self,
        app_id: AppId,
        requested: HmiState,
        correlation: Option<CorrelationId>,
    ) -> Result<Outcome> {
        requested
            .validate()
            .map_err(|source| StateError::InvalidState { app_id, source })?;

        let blocked = self.registry.blocking_active();
        let entry = self.registry.entry_mut(app_id)?;
        let resuming = entry.is_resuming();
        if blocked && !resuming {
            entry.postpone(requested);
            tracing::debug!(app_id = %app_id, state = %requested, "Postponed regular state");
            return Ok(Outcome::Postponed);
        }

        let Some(correlation_id) = correlation else {
            let resumes_audio = resuming
                && entry.capabilities().is_audio()
                && requested.level == HmiLevel::Limited;
            self.arbitrate(app_id, &requested)?;
            let outcome = self.applied();
            if resumes_audio {
                tracing::info!(app_id = %app_id, "Resuming audio source");
                self.notes.push(Notification::ResumeAudioSource(app_id));
            }
            return Ok(outcome);
        };

        let hmi_app_id = entry.profile().hmi_app_id;
        self.registry.pending.insert(
            correlation_id,
            PendingActivation {
                app_id,
                hmi_app_id,
                target: requested,
                requested_at: Utc::now(),
            },
        );
        self.notes
            .push(Notification::ActivateApp(ActivateAppRequest {
                correlation_id,
                app_id,
                hmi_app_id,
                level: requested.level,
            }));
        tracing::info!(
            app_id = %app_id,
            correlation_id = %correlation_id,
            level = %requested.level,
            "Activation requested"
        );
        Ok(Outcome::AwaitingActivation(correlation_id))
    }

    /// Request `level` with audio and video derived from the capabilities.
    pub(crate) fn request_level(
        &mut self,
        app_id: AppId,
        level: HmiLevel,
        correlation: Option<CorrelationId>,
    ) -> Result<Outcome> {
        let entry = self.registry.entry(app_id)?;
        let requested =
            arbitration::state_for_level(entry.capabilities(), level, entry.regular().context);
        self.request(app_id, requested, correlation)
    }

    pub(crate) fn deactivate(&mut self, app_id: AppId) -> Result<Outcome> {
        let entry = self.registry.entry(app_id)?;
        if entry.effective(self.attenuated).level != HmiLevel::Full {
            tracing::debug!(app_id = %app_id, "Deactivation ignored, app not in FULL");
            return Ok(Outcome::unchanged());
        }
        self.request_level(app_id, HmiLevel::Background, None)
    }

    pub(crate) fn activation_response(
        &mut self,
        correlation_id: CorrelationId,
        result: ResultCode,
        timeout_seconds: Option<u64>,
    ) -> Result<Outcome> {
        let pending =
            self.registry
                .pending
                .resolve(correlation_id, result, Utc::now(), timeout_seconds)?;
        let app_id = self.registry.find_by_hmi_id(pending.hmi_app_id)?;

        tracing::info!(
            app_id = %app_id,
            correlation_id = %correlation_id,
            "Activation confirmed"
        );
        self.arbitrate(app_id, &pending.target)?;
        Ok(self.applied())
    }

    pub(crate) fn push_global(&mut self, kind: OverlayKind) -> Outcome {
        if !self.registry.active.contains(&kind) {
            self.registry.active.push(kind);
        }
        for entry in self.registry.apps.values_mut() {
            entry.push(kind);
        }
        tracing::info!(overlay = ?kind, "Global overlay started");
        self.applied()
    }

    pub(crate) fn pop_global(&mut self, kind: OverlayKind) -> Result<Outcome> {
        self.registry.active.retain(|active| *active != kind);
        for entry in self.registry.apps.values_mut() {
            entry.pop(kind);
        }
        self.promote_postponed()?;
        tracing::info!(overlay = ?kind, "Global overlay stopped");
        Ok(self.applied())
    }

    pub(crate) fn start_streaming(&mut self, app_id: AppId) -> Result<Outcome> {
        let entry = self.registry.entry_mut(app_id)?;
        let kind = overlay::streaming_kind(entry.capabilities());
        entry.push(kind);
        tracing::info!(app_id = %app_id, overlay = ?kind, "Streaming started");
        Ok(self.applied())
    }

    pub(crate) fn stop_streaming(&mut self, app_id: AppId) -> Result<Outcome> {
        let entry = self.registry.entry_mut(app_id)?;
        let kind = overlay::streaming_kind(entry.capabilities());
        entry.pop(kind);
        self.promote_postponed()?;
        tracing::info!(app_id = %app_id, overlay = ?kind, "Streaming stopped");
        Ok(self.applied())
    }

    /// Promote every postponed request once no blocking overlay is active.
    fn promote_postponed(&mut self) -> Result<()> {
        if self.registry.blocking_active() {
            return Ok(());
        }
        let ready: Vec<(AppId, HmiState)> = self
            .registry
            .apps
            .iter_mut()
            .filter_map(|(id, entry)| entry.take_postponed().map(|state| (*id, state)))
            .collect();
        for (app_id, state) in ready {
            tracing::info!(app_id = %app_id, state = %state, "Promoting postponed state");
            self.arbitrate(app_id, &state)?;
        }
        Ok(())
    }
}
