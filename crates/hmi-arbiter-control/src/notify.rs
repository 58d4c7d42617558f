//! Collaborator traits and outbound notification delivery.
//!
//! The controller never calls a collaborator while holding its state lock.
//! Side effects are queued as [`Notification`]s in processing order and
//! delivered once the lock is released.

use std::collections::VecDeque;

use hmi_arbiter_core::{AppId, AppProfile, CorrelationId, HmiLevel, HmiState};
use parking_lot::Mutex;

use crate::activation::ActivateAppRequest;

/// The application manager: receives every side effect of a state change.
pub trait AppManager: Send + Sync {
    /// Send the application its new effective HMI status.
    fn send_hmi_status(&self, app_id: AppId, state: &HmiState);

    /// Inform the application manager that an application's level changed.
    fn on_hmi_level_changed(&self, app_id: AppId, old: HmiLevel, new: HmiLevel);

    /// Drop data an application retains only while visible.
    fn reset_data_in_none(&self, app_id: AppId);

    /// Ask the HMI to switch its audio source back to a resuming application.
    fn send_on_resume_audio_source(&self, app_id: AppId);

    /// Send an activation request to the HMI.
    ///
    /// Returns false if the request could not be sent.
    fn send_activate_app(&self, request: &ActivateAppRequest) -> bool;

    /// Allocate a fresh correlation id for an outbound request.
    fn next_correlation_id(&self) -> CorrelationId;
}

/// Policy and configuration lookups.
pub trait PolicyProvider: Send + Sync {
    /// Whether the head unit supports audio attenuation.
    fn is_attenuated_supported(&self) -> bool;

    /// Level a newly registered application starts at.
    fn default_hmi_level(&self, profile: &AppProfile) -> HmiLevel;
}

/// A side effect waiting to be delivered to the [`AppManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// New effective status for an application.
    HmiStatus {
        /// Application concerned.
        app_id: AppId,
        /// Its new effective state.
        state: HmiState,
    },
    /// Level transition for an application.
    LevelChanged {
        /// Application concerned.
        app_id: AppId,
        /// Level before the change.
        old: HmiLevel,
        /// Level after the change.
        new: HmiLevel,
    },
    /// The application dropped to `NONE`.
    ResetDataInNone(AppId),
    /// A resuming audio application was restored to `LIMITED`.
    ResumeAudioSource(AppId),
    /// Outbound activation request.
    ActivateApp(ActivateAppRequest),
}

impl Notification {
    /// The notifications owed to an application whose effective state moved
    /// from `old` to `new`. Empty if the four axes are unchanged.
    #[must_use]
    pub fn for_change(app_id: AppId, old: &HmiState, new: &HmiState) -> Vec<Self> {
        if old.same_axes(new) {
            return Vec::new();
        }
        let mut notes = vec![
            Self::HmiStatus {
                app_id,
                state: *new,
            },
            Self::LevelChanged {
                app_id,
                old: old.level,
                new: new.level,
            },
        ];
        if new.level == HmiLevel::None {
            notes.push(Self::ResetDataInNone(app_id));
        }
        notes
    }

    /// Deliver this notification.
    ///
    /// Returns false only for an activation request the manager failed to send.
    pub fn deliver(&self, manager: &dyn AppManager) -> bool {
        match self {
            Self::HmiStatus { app_id, state } => manager.send_hmi_status(*app_id, state),
            Self::LevelChanged { app_id, old, new } => {
                manager.on_hmi_level_changed(*app_id, *old, *new);
            }
            Self::ResetDataInNone(app_id) => manager.reset_data_in_none(*app_id),
            Self::ResumeAudioSource(app_id) => manager.send_on_resume_audio_source(*app_id),
            Self::ActivateApp(request) => return manager.send_activate_app(request),
        }
        true
    }
}

/// FIFO of notifications with a single active drainer.
///
/// Producers enqueue while holding the controller's state lock, so queue
/// order is processing order. Whoever wins the drain guard delivers
/// everything, including notifications enqueued by other threads or by
/// callbacks that re-enter the controller mid-delivery.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Mutex<VecDeque<Notification>>,
    draining: Mutex<()>,
}

impl Outbox {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue notifications for delivery.
    pub fn extend(&self, notes: impl IntoIterator<Item = Notification>) {
        self.queue.lock().extend(notes);
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Deliver queued notifications unless another caller already is.
    pub fn drain(&self, mut deliver: impl FnMut(Notification)) {
        loop {
            let Some(guard) = self.draining.try_lock() else {
                return;
            };
            loop {
                let next = self.queue.lock().pop_front();
                let Some(note) = next else { break };
                deliver(note);
            }
            drop(guard);

            // Something may have been queued after our last pop but before
            // the guard was released, while its producer saw us draining.
            if self.is_empty() {
                return;
            }
        }
    }
}

/// Recording [`AppManager`] for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;

    /// An [`AppManager`] that records every call.
    #[derive(Debug)]
    pub struct RecordingAppManager {
        delivered: Mutex<Vec<Notification>>,
        next_id: Mutex<CorrelationId>,
        accept_activations: Mutex<bool>,
    }

    impl Default for RecordingAppManager {
        fn default() -> Self {
            Self::starting_at(CorrelationId::new(1))
        }
    }

    impl RecordingAppManager {
        /// Create a recorder handing out correlation ids from 1.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a recorder handing out correlation ids from `first`.
        #[must_use]
        pub fn starting_at(first: CorrelationId) -> Self {
            Self {
                delivered: Mutex::new(Vec::new()),
                next_id: Mutex::new(first),
                accept_activations: Mutex::new(true),
            }
        }

        /// Make `send_activate_app` succeed or fail.
        pub fn set_accept_activations(&self, accept: bool) {
            *self.accept_activations.lock() = accept;
        }

        /// Everything delivered so far, in order.
        #[must_use]
        pub fn delivered(&self) -> Vec<Notification> {
            self.delivered.lock().clone()
        }

        /// Take and clear everything delivered so far.
        pub fn take(&self) -> Vec<Notification> {
            std::mem::take(&mut *self.delivered.lock())
        }

        /// Statuses sent to one application.
        #[must_use]
        pub fn statuses(&self, app_id: AppId) -> Vec<HmiState> {
            self.delivered
                .lock()
                .iter()
                .filter_map(|n| match n {
                    Notification::HmiStatus { app_id: id, state } if *id == app_id => Some(*state),
                    _ => None,
                })
                .collect()
        }

        /// Level transitions reported for one application.
        #[must_use]
        pub fn level_changes(&self, app_id: AppId) -> Vec<(HmiLevel, HmiLevel)> {
            self.delivered
                .lock()
                .iter()
                .filter_map(|n| match n {
                    Notification::LevelChanged { app_id: id, old, new } if *id == app_id => {
                        Some((*old, *new))
                    }
                    _ => None,
                })
                .collect()
        }

        /// Activation requests sent, successful or not.
        #[must_use]
        pub fn activation_requests(&self) -> Vec<ActivateAppRequest> {
            self.delivered
                .lock()
                .iter()
                .filter_map(|n| match n {
                    Notification::ActivateApp(request) => Some(*request),
                    _ => None,
                })
                .collect()
        }

        /// Applications told to reset their retained data.
        #[must_use]
        pub fn resets(&self) -> Vec<AppId> {
            self.delivered
                .lock()
                .iter()
                .filter_map(|n| match n {
                    Notification::ResetDataInNone(id) => Some(*id),
                    _ => None,
                })
                .collect()
        }

        /// Applications whose audio source the HMI was asked to resume.
        #[must_use]
        pub fn resumed_audio_sources(&self) -> Vec<AppId> {
            self.delivered
                .lock()
                .iter()
                .filter_map(|n| match n {
                    Notification::ResumeAudioSource(id) => Some(*id),
                    _ => None,
                })
                .collect()
        }
    }

    impl AppManager for RecordingAppManager {
        fn send_hmi_status(&self, app_id: AppId, state: &HmiState) {
            self.delivered.lock().push(Notification::HmiStatus {
                app_id,
                state: *state,
            });
        }

        fn on_hmi_level_changed(&self, app_id: AppId, old: HmiLevel, new: HmiLevel) {
            self.delivered
                .lock()
                .push(Notification::LevelChanged { app_id, old, new });
        }

        fn reset_data_in_none(&self, app_id: AppId) {
            self.delivered
                .lock()
                .push(Notification::ResetDataInNone(app_id));
        }

        fn send_on_resume_audio_source(&self, app_id: AppId) {
            self.delivered
                .lock()
                .push(Notification::ResumeAudioSource(app_id));
        }

        fn send_activate_app(&self, request: &ActivateAppRequest) -> bool {
            self.delivered
                .lock()
                .push(Notification::ActivateApp(*request));
            *self.accept_activations.lock()
        }

        fn next_correlation_id(&self) -> CorrelationId {
            let mut next = self.next_id.lock();
            let id = *next;
            *next = id.next();
            id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingAppManager;
    use super::*;
    use hmi_arbiter_core::{AudioStreamingState, SystemContext, VideoStreamingState};

    fn full() -> HmiState {
        HmiState::new(
            HmiLevel::Full,
            AudioStreamingState::Audible,
            VideoStreamingState::NotStreamable,
            SystemContext::Main,
        )
    }

    #[test]
    fn no_notification_for_equal_axes() {
        let app_id = AppId::new(1801);
        let tagged = full().with_kind(hmi_arbiter_core::StateId::Current);
        assert!(Notification::for_change(app_id, &full(), &tagged).is_empty());
    }

    #[test]
    fn change_notifies_status_then_level() {
        let app_id = AppId::new(1801);
        let new = full().with_level(HmiLevel::Limited);
        let notes = Notification::for_change(app_id, &full(), &new);
        assert_eq!(
            notes,
            vec![
                Notification::HmiStatus { app_id, state: new },
                Notification::LevelChanged {
                    app_id,
                    old: HmiLevel::Full,
                    new: HmiLevel::Limited
                },
            ]
        );
    }

    #[test]
    fn level_changed_fires_even_if_level_is_equal() {
        let app_id = AppId::new(1801);
        let mut new = full();
        new.audio = AudioStreamingState::Attenuated;
        let notes = Notification::for_change(app_id, &full(), &new);
        assert!(notes.contains(&Notification::LevelChanged {
            app_id,
            old: HmiLevel::Full,
            new: HmiLevel::Full
        }));
    }

    #[test]
    fn dropping_to_none_resets_data() {
        let app_id = AppId::new(1721);
        let notes = Notification::for_change(app_id, &full(), &HmiState::default());
        assert_eq!(notes.last(), Some(&Notification::ResetDataInNone(app_id)));
    }

    #[test]
    fn deliver_reports_failed_activation() {
        let manager = RecordingAppManager::new();
        let request = ActivateAppRequest {
            correlation_id: CorrelationId::new(314),
            app_id: AppId::new(1721),
            hmi_app_id: hmi_arbiter_core::HmiAppId::new(2718),
            level: HmiLevel::Full,
        };
        assert!(Notification::ActivateApp(request).deliver(&manager));

        manager.set_accept_activations(false);
        assert!(!Notification::ActivateApp(request).deliver(&manager));
        assert_eq!(manager.activation_requests().len(), 2);
    }

    #[test]
    fn resume_audio_source_is_delivered() {
        let manager = RecordingAppManager::new();
        let app_id = AppId::new(1801);
        assert!(Notification::ResumeAudioSource(app_id).deliver(&manager));
        assert_eq!(manager.resumed_audio_sources(), vec![app_id]);
    }

    #[test]
    fn outbox_drains_in_order() {
        let outbox = Outbox::new();
        let a = Notification::ResetDataInNone(AppId::new(1));
        let b = Notification::ResetDataInNone(AppId::new(2));
        outbox.extend([a, b]);
        assert!(!outbox.is_empty());

        let mut seen = Vec::new();
        outbox.drain(|n| seen.push(n));
        assert_eq!(seen, vec![a, b]);
        assert!(outbox.is_empty());
    }

    #[test]
    fn nested_drain_defers_to_outer() {
        let outbox = Outbox::new();
        let first = Notification::ResetDataInNone(AppId::new(1));
        let nested = Notification::ResetDataInNone(AppId::new(2));
        outbox.extend([first]);

        let mut seen = Vec::new();
        outbox.drain(|n| {
            seen.push(n);
            if n == first {
                // A re-entrant producer queues more and tries to drain
                outbox.extend([nested]);
                outbox.drain(|_| panic!("nested drain must not deliver"));
            }
        });
        assert_eq!(seen, vec![first, nested]);
    }

    #[test]
    fn recorder_hands_out_sequential_ids() {
        let manager = RecordingAppManager::starting_at(CorrelationId::new(314));
        assert_eq!(manager.next_correlation_id(), CorrelationId::new(314));
        assert_eq!(manager.next_correlation_id(), CorrelationId::new(315));
    }
}
