//! Inbound HMI and mobile notifications.
//!
//! The controller reacts to a closed set of events. Anything the HMI sends
//! that is not listed here is filtered out before it reaches the controller;
//! event names inside [`HmiEvent::EventChanged`] that carry no meaning for HMI
//! state deserialize into [`EventName::Other`] and are ignored.

use hmi_arbiter_core::{AppId, CorrelationId, OverlayKind};
use serde::{Deserialize, Serialize};

/// An inbound event routed to the state controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HmiEvent {
    /// A voice recognition session started.
    VrStarted,
    /// The voice recognition session ended.
    VrStopped,
    /// Text-to-speech playback started.
    TtsStarted,
    /// Text-to-speech playback ended.
    TtsStopped,
    /// Generic "event changed" notification.
    EventChanged {
        /// Which event changed.
        event: EventName,
        /// Whether the event is now active.
        is_active: bool,
    },
    /// An application started streaming video or navigation data.
    StreamingStarted {
        /// Streaming application.
        app_id: AppId,
    },
    /// An application stopped streaming.
    StreamingStopped {
        /// Streaming application.
        app_id: AppId,
    },
    /// The HMI reports that the user activated an application.
    AppActivated {
        /// Activated application.
        app_id: AppId,
    },
    /// The HMI reports that an application was sent away from the foreground.
    AppDeactivated {
        /// Deactivated application.
        app_id: AppId,
    },
    /// Response to an outbound activation request.
    ActivateAppResponse {
        /// Correlation id of the request being answered.
        correlation_id: CorrelationId,
        /// Result reported by the HMI.
        result: ResultCode,
    },
}

impl HmiEvent {
    /// Short name used in log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::VrStarted => "vr_started",
            Self::VrStopped => "vr_stopped",
            Self::TtsStarted => "tts_started",
            Self::TtsStopped => "tts_stopped",
            Self::EventChanged { .. } => "event_changed",
            Self::StreamingStarted { .. } => "streaming_started",
            Self::StreamingStopped { .. } => "streaming_stopped",
            Self::AppActivated { .. } => "app_activated",
            Self::AppDeactivated { .. } => "app_deactivated",
            Self::ActivateAppResponse { .. } => "activate_app_response",
        }
    }
}

/// Payload of the generic "event changed" notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventName {
    /// A phone call.
    PhoneCall,
    /// An emergency event, which puts the head unit into safety mode.
    EmergencyEvent,
    /// The HMI switched audio source.
    AudioSource,
    /// The embedded navigation became active.
    EmbeddedNavi,
    /// The HMI itself was deactivated.
    DeactivateHmi,
    /// Any other event name.
    #[serde(other)]
    Other,
}

impl EventName {
    /// The global overlay this event toggles, if any.
    #[must_use]
    pub const fn overlay(self) -> Option<OverlayKind> {
        match self {
            Self::PhoneCall => Some(OverlayKind::PhoneCall),
            Self::EmergencyEvent => Some(OverlayKind::SafetyMode),
            Self::AudioSource | Self::EmbeddedNavi | Self::DeactivateHmi | Self::Other => None,
        }
    }
}

/// Result code carried by HMI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum ResultCode {
    Success,
    Aborted,
    ApplicationNotRegistered,
    CharLimitExceeded,
    DataNotAvailable,
    Disallowed,
    DuplicateName,
    GenericError,
    Ignored,
    InvalidData,
    InvalidEnum,
    InvalidId,
    InUse,
    NoAppsRegistered,
    NoDevicesConnected,
    OutOfMemory,
    Rejected,
    Retry,
    TimedOut,
    TooManyPendingRequests,
    TruncatedData,
    UnsupportedRequest,
    UnsupportedResource,
    UserDisallowed,
    Warnings,
    WrongLanguage,
    /// Any code this build does not know.
    #[serde(other)]
    Unknown,
}

impl ResultCode {
    /// Returns true only for `SUCCESS`.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}
