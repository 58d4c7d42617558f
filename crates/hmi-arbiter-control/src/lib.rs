//! HMI state controller for hmi-arbiter.
//!
//! This crate owns the HMI-facing state of every registered application:
//! it layers transient overlays (voice recognition, TTS, phone call, safety
//! mode, streaming) on top of each application's regular state, resolves
//! conflicts when applications compete for the display or for audio focus,
//! and drives the asynchronous activation handshake with the HMI.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          HMI / mobile command dispatch (collaborator)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ HmiEvent, requests
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      StateController                         │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  Overlay    │ │ Arbitration │ │    Activation       │    │
//! │  │  stacks     │ │  engine     │ │    handshake        │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! │                 Mutex<Registry>  ──▶  Outbox                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ after unlock, in order
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌──────────────┐             ┌────────────────┐
//!        │  AppManager  │             │ PolicyProvider │
//!        └──────────────┘             └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use hmi_arbiter_control::{
//!     ActivateAppRequest, AppCapabilities, AppId, AppManager, AppProfile, ControllerConfig,
//!     CorrelationId, HmiAppId, HmiEvent, HmiLevel, HmiState, Outcome, StateController,
//! };
//!
//! struct Quiet;
//!
//! impl AppManager for Quiet {
//!     fn send_hmi_status(&self, _: AppId, _: &HmiState) {}
//!     fn on_hmi_level_changed(&self, _: AppId, _: HmiLevel, _: HmiLevel) {}
//!     fn reset_data_in_none(&self, _: AppId) {}
//!     fn send_on_resume_audio_source(&self, _: AppId) {}
//!     fn send_activate_app(&self, _: &ActivateAppRequest) -> bool {
//!         true
//!     }
//!     fn next_correlation_id(&self) -> CorrelationId {
//!         CorrelationId::new(1)
//!     }
//! }
//!
//! let controller = StateController::new(ControllerConfig::default(), Arc::new(Quiet));
//!
//! let media = AppProfile::new(
//!     AppId::new(1801),
//!     HmiAppId::new(2718),
//!     AppCapabilities::new(true, false, false, false),
//! );
//! let outcome = controller.register(media, HmiLevel::Full);
//! assert_eq!(outcome, Outcome::Applied { changed: 1 });
//!
//! // Voice recognition mutes the media app without changing its level
//! let _ = controller.on_event(HmiEvent::VrStarted);
//! let state = controller.current_state(AppId::new(1801)).unwrap();
//! assert_eq!(state.level, HmiLevel::Full);
//! ```
//!
//! # Failure model
//!
//! Nothing here panics or returns `Err` to the caller. Invalid requests,
//! unknown ids and rejected handshakes are logged and reported as
//! [`Outcome::Dropped`], leaving every application's state untouched.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod activation;
pub mod app_state;
pub mod arbitration;
pub mod controller;
pub mod error;
pub mod event;
pub mod notify;
pub mod overlay;
mod registry;
pub mod types;

pub use activation::{ActivateAppRequest, PendingActivation, PendingActivations};
pub use app_state::AppEntry;
pub use controller::StateController;
pub use error::{ErrorKind, Result, StateError};
pub use event::{EventName, HmiEvent, ResultCode};
#[cfg(any(test, feature = "test-utils"))]
pub use notify::mock;
pub use notify::{AppManager, Notification, Outbox, PolicyProvider};
pub use types::{ControllerConfig, Outcome};

// Re-export commonly used types from the core crate for convenience
pub use hmi_arbiter_core::{
    AppCapabilities, AppId, AppProfile, AudioStreamingState, CorrelationId, HmiAppId, HmiLevel,
    HmiState, OverlayKind, StateId, SystemContext, VideoStreamingState,
};
