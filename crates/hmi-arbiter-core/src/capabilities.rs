//! Application capability profiles.
//!
//! The arbitration rules do not look at individual flags directly; they ask
//! whether an application is audio-capable, video-capable, and whether two
//! applications belong to the same capability class.

use serde::{Deserialize, Serialize};

use crate::ids::{AppId, HmiAppId};

/// Capability flags declared by an application at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppCapabilities {
    /// Media playback application.
    #[serde(default)]
    pub media: bool,
    /// Navigation application.
    #[serde(default)]
    pub navigation: bool,
    /// Mobile projection application.
    #[serde(default)]
    pub projection: bool,
    /// Voice communication application.
    #[serde(default)]
    pub voice_communication: bool,
}

impl AppCapabilities {
    /// A plain application with no special capability.
    pub const SIMPLE: Self = Self {
        media: false,
        navigation: false,
        projection: false,
        voice_communication: false,
    };

    /// Create a profile from individual flags.
    #[must_use]
    pub const fn new(
        media: bool,
        navigation: bool,
        projection: bool,
        voice_communication: bool,
    ) -> Self {
        Self {
            media,
            navigation,
            projection,
            voice_communication,
        }
    }

    /// Produces or consumes the audio output.
    #[must_use]
    pub const fn is_audio(&self) -> bool {
        self.media || self.navigation || self.voice_communication
    }

    /// May stream video to the head unit.
    #[must_use]
    pub const fn is_video(&self) -> bool {
        self.navigation || self.projection
    }

    /// Whether two applications compete for the same audio focus.
    ///
    /// Non-audio applications all share one class. Audio applications share a
    /// class when they overlap on media, navigation or voice communication.
    #[must_use]
    pub const fn shares_class_with(&self, other: &Self) -> bool {
        let both_plain = !self.is_audio() && !other.is_audio();
        both_plain
            || (self.media && other.media)
            || (self.navigation && other.navigation)
            || (self.voice_communication && other.voice_communication)
    }
}

/// What the registry hands over when an application registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProfile {
    /// Middleware-side id.
    pub app_id: AppId,
    /// HMI-side id.
    pub hmi_app_id: HmiAppId,
    /// Declared capabilities.
    #[serde(default)]
    pub capabilities: AppCapabilities,
}

impl AppProfile {
    /// Create a new profile.
    #[must_use]
    pub const fn new(app_id: AppId, hmi_app_id: HmiAppId, capabilities: AppCapabilities) -> Self {
        Self {
            app_id,
            hmi_app_id,
            capabilities,
        }
    }
}
