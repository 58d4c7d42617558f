//! The state controller service.
//!
//! [`StateController`] is the single entry point collaborators talk to. It is
//! `Send + Sync` and may be called from any number of threads; one lock guards
//! the whole registry so an arbitration pass always sees a consistent
//! snapshot. Collaborator callbacks run after that lock is released, in the
//! order their causing requests were processed.

use std::sync::Arc;

use chrono::Utc;
use hmi_arbiter_core::{
    AppId, AppProfile, AudioStreamingState, CorrelationId, HmiLevel, HmiState, OverlayKind,
    StateId, SystemContext, VideoStreamingState,
};
use parking_lot::Mutex;

use crate::activation::PendingActivation;
use crate::error::Result;
use crate::event::HmiEvent;
use crate::notify::{AppManager, Notification, Outbox, PolicyProvider};
use crate::registry::{Pass, Registry};
use crate::types::{ControllerConfig, Outcome};

/// Owns the HMI state of every registered application.
pub struct StateController {
    config: ControllerConfig,
    policy: Arc<dyn PolicyProvider>,
    app_manager: Arc<dyn AppManager>,
    registry: Mutex<Registry>,
    outbox: Outbox,
}

impl StateController {
    /// Create a controller that uses `config` as its policy provider.
    #[must_use]
    pub fn new(config: ControllerConfig, app_manager: Arc<dyn AppManager>) -> Self {
        let policy = Arc::new(config.clone());
        Self::with_policy(config, policy, app_manager)
    }

    /// Create a controller with a separate policy provider.
    #[must_use]
    pub fn with_policy(
        config: ControllerConfig,
        policy: Arc<dyn PolicyProvider>,
        app_manager: Arc<dyn AppManager>,
    ) -> Self {
        Self {
            config,
            policy,
            app_manager,
            registry: Mutex::new(Registry::default()),
            outbox: Outbox::new(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register an application starting at `default_level`.
    ///
    /// Active global overlays are applied to the new application and
    /// conflicting applications are resolved in the same pass. Nothing is
    /// sent if the resulting state equals the default state.
    pub fn register(&self, profile: AppProfile, default_level: HmiLevel) -> Outcome {
        self.run("register", |pass| pass.register(profile, default_level))
    }

    /// Register an application at the level the policy provider assigns.
    pub fn register_with_policy_default(&self, profile: AppProfile) -> Outcome {
        let level = self.policy.default_hmi_level(&profile);
        self.register(profile, level)
    }

    /// Forget an application and every activation pending for it.
    pub fn unregister(&self, app_id: AppId) -> Outcome {
        self.run("unregister", |pass| pass.unregister(app_id))
    }

    /// Enter or leave the resumption grace window, during which requests are
    /// applied even while a blocking overlay is active.
    pub fn set_resuming(&self, app_id: AppId, resuming: bool) -> Outcome {
        self.run("set_resuming", |pass| pass.set_resuming(app_id, resuming))
    }

    // =========================================================================
    // Regular state requests
    // =========================================================================

    /// Request a new regular state for an application.
    ///
    /// With `send_activation`, an activation request is sent to the HMI and
    /// the state is applied only when a successful response arrives.
    pub fn request_regular_state(
        &self,
        app_id: AppId,
        state: HmiState,
        send_activation: bool,
    ) -> Outcome {
        let correlation = self.correlation_if(send_activation);
        self.run("request_regular_state", |pass| {
            pass.request(app_id, state, correlation)
        })
    }

    /// Request a new regular state from its four axes, applied immediately.
    pub fn request_regular_axes(
        &self,
        app_id: AppId,
        level: HmiLevel,
        audio: AudioStreamingState,
        video: VideoStreamingState,
        context: SystemContext,
    ) -> Outcome {
        self.request_regular_state(app_id, HmiState::new(level, audio, video, context), false)
    }

    /// Request a level, deriving audio and video from the application's
    /// capabilities. Requests for `FULL` go through the activation handshake.
    pub fn request_level(&self, app_id: AppId, level: HmiLevel) -> Outcome {
        let correlation = self.correlation_if(level == HmiLevel::Full);
        self.run("request_level", |pass| {
            pass.request_level(app_id, level, correlation)
        })
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Route an inbound HMI or mobile event.
    pub fn on_event(&self, event: HmiEvent) -> Outcome {
        let correlation = self.correlation_if(matches!(event, HmiEvent::AppActivated { .. }));
        let timeout = self.config.activation_timeout_seconds;

        self.run(event.name(), |pass| match event {
            HmiEvent::VrStarted => Ok(pass.push_global(OverlayKind::VrSession)),
            HmiEvent::VrStopped => pass.pop_global(OverlayKind::VrSession),
            HmiEvent::TtsStarted => Ok(pass.push_global(OverlayKind::TtsSession)),
            HmiEvent::TtsStopped => pass.pop_global(OverlayKind::TtsSession),
            HmiEvent::EventChanged { event, is_active } => match event.overlay() {
                Some(kind) if is_active => Ok(pass.push_global(kind)),
                Some(kind) => pass.pop_global(kind),
                None => {
                    tracing::debug!(event = ?event, "Ignoring unmapped event");
                    Ok(Outcome::unchanged())
                }
            },
            HmiEvent::StreamingStarted { app_id } => pass.start_streaming(app_id),
            HmiEvent::StreamingStopped { app_id } => pass.stop_streaming(app_id),
            HmiEvent::AppActivated { app_id } => {
                pass.request_level(app_id, HmiLevel::Full, correlation)
            }
            HmiEvent::AppDeactivated { app_id } => pass.deactivate(app_id),
            HmiEvent::ActivateAppResponse {
                correlation_id,
                result,
            } => pass.activation_response(correlation_id, result, timeout),
        })
    }

    /// Drop every activation request older than the configured timeout.
    ///
    /// Returns how many were dropped.
    pub fn expire_pending_activations(&self) -> usize {
        let expired = self
            .registry
            .lock()
            .pending
            .expire(Utc::now(), self.config.activation_timeout_seconds);
        for (correlation_id, pending) in &expired {
            tracing::warn!(
                correlation_id = %correlation_id,
                app_id = %pending.app_id,
                requested_at = %pending.requested_at,
                "Activation request expired"
            );
        }
        expired.len()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether a state is active anywhere in the system.
    ///
    /// `Current` and `Regular` always are; an overlay is active while it is
    /// globally on or on any application's stack.
    #[must_use]
    pub fn is_state_active(&self, state_id: StateId) -> bool {
        match state_id {
            StateId::Current | StateId::Regular => true,
            StateId::Overlay(kind) => self.registry.lock().overlay_active(kind),
        }
    }

    /// Effective state of an application.
    #[must_use]
    pub fn current_state(&self, app_id: AppId) -> Option<HmiState> {
        let attenuated = self.policy.is_attenuated_supported();
        self.registry
            .lock()
            .apps
            .get(&app_id)
            .map(|entry| entry.effective(attenuated))
    }

    /// Regular state of an application.
    #[must_use]
    pub fn regular_state(&self, app_id: AppId) -> Option<HmiState> {
        self.registry
            .lock()
            .apps
            .get(&app_id)
            .map(|entry| *entry.regular())
    }

    /// Postponed request of an application, if any.
    #[must_use]
    pub fn postponed_state(&self, app_id: AppId) -> Option<HmiState> {
        self.registry
            .lock()
            .apps
            .get(&app_id)
            .and_then(|entry| entry.postponed().copied())
    }

    /// Overlay stack of an application, bottom first.
    #[must_use]
    pub fn active_overlays(&self, app_id: AppId) -> Vec<OverlayKind> {
        self.registry
            .lock()
            .apps
            .get(&app_id)
            .map(|entry| entry.overlays().to_vec())
            .unwrap_or_default()
    }

    /// Global overlays in activation order.
    #[must_use]
    pub fn global_overlays(&self) -> Vec<OverlayKind> {
        self.registry.lock().active.clone()
    }

    /// Activation requests awaiting a response.
    #[must_use]
    pub fn pending_activations(&self) -> Vec<(CorrelationId, PendingActivation)> {
        self.registry.lock().pending.snapshot()
    }

    /// Registered applications, ordered by id.
    #[must_use]
    pub fn registered_apps(&self) -> Vec<AppId> {
        self.registry.lock().apps.keys().copied().collect()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn correlation_if(&self, needed: bool) -> Option<CorrelationId> {
        needed.then(|| self.app_manager.next_correlation_id())
    }

    /// Run one locked pass, then deliver what it queued.
    fn run<F>(&self, operation: &'static str, f: F) -> Outcome
    where
        F: FnOnce(&mut Pass<'_>) -> Result<Outcome>,
    {
        let attenuated = self.policy.is_attenuated_supported();
        let result = {
            let mut registry = self.registry.lock();
            let mut pass = Pass::new(&mut registry, attenuated);
            let result = f(&mut pass);
            self.outbox.extend(pass.into_notes());
            result
        };
        self.flush();

        result.unwrap_or_else(|err| {
            tracing::warn!(
                operation,
                error = %err,
                kind = ?err.kind(),
                "Request dropped"
            );
            Outcome::Dropped(err)
        })
    }

    fn flush(&self) {
        self.outbox.drain(|note| {
            if note.deliver(self.app_manager.as_ref()) {
                return;
            }
            if let Notification::ActivateApp(request) = note {
                self.registry.lock().pending.remove(request.correlation_id);
                tracing::warn!(
                    app_id = %request.app_id,
                    correlation_id = %request.correlation_id,
                    "Failed to send activation request"
                );
            }
        });
    }
}

impl std::fmt::Debug for StateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateController")
            .field("config", &self.config)
            .field("registry", &*self.registry.lock())
            .finish_non_exhaustive()
    }
}
