//! HMI state value types.
//!
//! An [`HmiState`] combines four orthogonal axes (display level, audio
//! streaming, video streaming and system context) with a [`StateId`] tag that
//! records which layer of an application's state produced it.
//!
//! Every axis carries an explicit `Invalid` variant. Unknown wire values
//! deserialize into it, so a malformed request is representable and can be
//! rejected by [`HmiState::validate`] instead of failing to parse.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Degree of HMI focus held by an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HmiLevel {
    /// No HMI presence at all.
    None,
    /// Registered but not visible.
    Background,
    /// Visible or audible without holding the display.
    Limited,
    /// Owns the foreground display.
    Full,
    /// Unrecognised level.
    #[serde(other)]
    Invalid,
}

impl HmiLevel {
    /// Returns true for `FULL` and `LIMITED`.
    #[must_use]
    pub const fn is_foreground(self) -> bool {
        matches!(self, Self::Full | Self::Limited)
    }

    /// Returns true for `NONE` and `BACKGROUND`.
    #[must_use]
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::None | Self::Background)
    }

    /// Returns false only for the `Invalid` marker.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Wire spelling of this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Background => "BACKGROUND",
            Self::Limited => "LIMITED",
            Self::Full => "FULL",
            Self::Invalid => "INVALID",
        }
    }

    /// Parse a level from its wire spelling, case-insensitively.
    ///
    /// Returns `None` for unknown spellings.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Some(Self::None),
            "BACKGROUND" => Some(Self::Background),
            "LIMITED" => Some(Self::Limited),
            "FULL" => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for HmiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio streaming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioStreamingState {
    /// Audio is muted.
    NotAudible,
    /// Audio plays at reduced volume under another source.
    Attenuated,
    /// Audio plays normally.
    Audible,
    /// Unrecognised audio state.
    #[serde(other)]
    Invalid,
}

impl AudioStreamingState {
    /// Returns false only for the `Invalid` marker.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Video streaming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStreamingState {
    /// Video may not be streamed.
    NotStreamable,
    /// Video may be streamed.
    Streamable,
    /// Unrecognised video state.
    #[serde(other)]
    Invalid,
}

impl VideoStreamingState {
    /// Returns false only for the `Invalid` marker.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// What the HMI is currently showing on top of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemContext {
    /// The application's own screen.
    #[serde(rename = "SYSCTXT_MAIN")]
    Main,
    /// A voice recognition session is in progress.
    #[serde(rename = "SYSCTXT_VRSESSION")]
    VrSession,
    /// A menu is open.
    #[serde(rename = "SYSCTXT_MENU")]
    Menu,
    /// The application is obscured by another HMI element.
    #[serde(rename = "SYSCTXT_HMI_OBSCURED")]
    HmiObscured,
    /// An alert is being shown.
    #[serde(rename = "SYSCTXT_ALERT")]
    Alert,
    /// Unrecognised context.
    #[serde(other)]
    Invalid,
}

impl SystemContext {
    /// Returns false only for the `Invalid` marker.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Transient conditions layered on top of an application's regular state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlayKind {
    /// Voice recognition session.
    VrSession,
    /// Text-to-speech playback.
    TtsSession,
    /// Phone call in progress.
    PhoneCall,
    /// Emergency event (safety mode).
    SafetyMode,
    /// Navigation application streaming.
    NaviStreaming,
    /// Non-navigation application streaming video.
    VideoStreaming,
}

impl OverlayKind {
    /// All overlay kinds.
    pub const ALL: [Self; 6] = [
        Self::VrSession,
        Self::TtsSession,
        Self::PhoneCall,
        Self::SafetyMode,
        Self::NaviStreaming,
        Self::VideoStreaming,
    ];

    /// Whether this overlay, while active anywhere, defers regular-state
    /// requests into the postponed slot.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::VrSession | Self::TtsSession | Self::SafetyMode)
    }

    /// Whether this overlay is applied to every registered application
    /// rather than to a single one.
    #[must_use]
    pub const fn is_global(self) -> bool {
        matches!(
            self,
            Self::VrSession | Self::TtsSession | Self::PhoneCall | Self::SafetyMode
        )
    }
}

/// Identifies which layer of an application's state a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateId {
    /// The effective state currently presented.
    Current,
    /// The baseline state, absent any overlay.
    Regular,
    /// A state produced by an overlay.
    Overlay(OverlayKind),
}

/// A complete HMI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HmiState {
    /// Display level.
    pub level: HmiLevel,
    /// Audio streaming mode.
    pub audio: AudioStreamingState,
    /// Video streaming mode.
    pub video: VideoStreamingState,
    /// System context.
    pub context: SystemContext,
    /// Layer that produced this state.
    #[serde(default = "HmiState::default_kind")]
    pub kind: StateId,
}

impl HmiState {
    /// Create a regular state from its four axes.
    #[must_use]
    pub const fn new(
        level: HmiLevel,
        audio: AudioStreamingState,
        video: VideoStreamingState,
        context: SystemContext,
    ) -> Self {
        Self {
            level,
            audio,
            video,
            context,
            kind: StateId::Regular,
        }
    }

    const fn default_kind() -> StateId {
        StateId::Regular
    }

    /// Return a copy tagged with another kind.
    #[must_use]
    pub const fn with_kind(self, kind: StateId) -> Self {
        Self { kind, ..self }
    }

    /// Return a copy with another level.
    #[must_use]
    pub const fn with_level(self, level: HmiLevel) -> Self {
        Self { level, ..self }
    }

    /// Returns true when no axis is `Invalid`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.level.is_valid()
            && self.audio.is_valid()
            && self.video.is_valid()
            && self.context.is_valid()
    }

    /// Check every axis, naming the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidAxis` if any axis is `Invalid`.
    pub fn validate(&self) -> Result<()> {
        if !self.level.is_valid() {
            return Err(CoreError::InvalidAxis { axis: "hmi_level" });
        }
        if !self.audio.is_valid() {
            return Err(CoreError::InvalidAxis {
                axis: "audio_streaming_state",
            });
        }
        if !self.video.is_valid() {
            return Err(CoreError::InvalidAxis {
                axis: "video_streaming_state",
            });
        }
        if !self.context.is_valid() {
            return Err(CoreError::InvalidAxis {
                axis: "system_context",
            });
        }
        Ok(())
    }

    /// Compare the four axes, ignoring the kind tag.
    #[must_use]
    pub fn same_axes(&self, other: &Self) -> bool {
        self.level == other.level
            && self.audio == other.audio
            && self.video == other.video
            && self.context == other.context
    }
}

impl Default for HmiState {
    fn default() -> Self {
        Self::new(
            HmiLevel::None,
            AudioStreamingState::NotAudible,
            VideoStreamingState::NotStreamable,
            SystemContext::Main,
        )
    }
}

impl fmt::Display for HmiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:?}/{:?}/{:?}",
            self.level, self.audio, self.video, self.context
        )
    }
}
