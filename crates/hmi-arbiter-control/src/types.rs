//! Configuration and result types for the state controller.

use hmi_arbiter_core::{AppProfile, CorrelationId, HmiLevel};
use serde::Deserialize;

use crate::error::StateError;
use crate::notify::PolicyProvider;

/// Configuration for the state controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControllerConfig {
    /// Whether the head unit can attenuate audio under TTS or streaming.
    #[serde(default)]
    pub attenuated_supported: bool,

    /// Level given to newly registered applications.
    #[serde(default = "ControllerConfig::default_level")]
    pub default_hmi_level: HmiLevel,

    /// How long an activation request may wait for its response (seconds).
    ///
    /// `None` waits forever.
    #[serde(default = "ControllerConfig::default_activation_timeout")]
    pub activation_timeout_seconds: Option<u64>,
}

impl ControllerConfig {
    const fn default_level() -> HmiLevel {
        HmiLevel::None
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_activation_timeout() -> Option<u64> {
        Some(10)
    }

    /// Load configuration from environment variables.
    ///
    /// See [`ControllerConfig::from_lookup`] for the recognised keys.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a key lookup, starting from the defaults.
    ///
    /// Recognised keys:
    /// - `HMI_ATTENUATED_SUPPORTED`: `true`/`false` (also `1`/`0`)
    /// - `HMI_DEFAULT_LEVEL`: `NONE`, `BACKGROUND`, `LIMITED` or `FULL`
    /// - `HMI_ACTIVATION_TIMEOUT_SECS`: seconds, or `none` to wait forever
    ///
    /// Values that fail to parse leave the default in place.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("HMI_ATTENUATED_SUPPORTED") {
            match val.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => config.attenuated_supported = true,
                "false" | "0" | "no" => config.attenuated_supported = false,
                other => tracing::warn!(value = other, "Ignoring HMI_ATTENUATED_SUPPORTED"),
            }
        }
        if let Some(val) = lookup("HMI_DEFAULT_LEVEL") {
            match HmiLevel::from_wire(&val) {
                Some(level) => config.default_hmi_level = level,
                None => tracing::warn!(value = %val, "Ignoring HMI_DEFAULT_LEVEL"),
            }
        }
        if let Some(val) = lookup("HMI_ACTIVATION_TIMEOUT_SECS") {
            let val = val.trim();
            if val.eq_ignore_ascii_case("none") {
                config.activation_timeout_seconds = None;
            } else if let Ok(n) = val.parse() {
                config.activation_timeout_seconds = Some(n);
            } else {
                tracing::warn!(value = val, "Ignoring HMI_ACTIVATION_TIMEOUT_SECS");
            }
        }

        config
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            attenuated_supported: false,
            default_hmi_level: Self::default_level(),
            activation_timeout_seconds: Self::default_activation_timeout(),
        }
    }
}

impl PolicyProvider for ControllerConfig {
    fn is_attenuated_supported(&self) -> bool {
        self.attenuated_supported
    }

    fn default_hmi_level(&self, _profile: &AppProfile) -> HmiLevel {
        self.default_hmi_level
    }
}

/// What a state controller call did.
///
/// Every mutating entry point returns one of these; none of them fails.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// The request was applied. `changed` applications were notified.
    Applied {
        /// Number of applications whose effective state changed.
        changed: usize,
    },
    /// A blocking overlay is active; the request was stored for later.
    Postponed,
    /// An activation request was sent; state changes on the response.
    AwaitingActivation(CorrelationId),
    /// The request was dropped without touching any state.
    Dropped(StateError),
}

impl Outcome {
    pub(crate) const fn unchanged() -> Self {
        Self::Applied { changed: 0 }
    }

    /// Number of applications notified, zero unless `Applied`.
    #[must_use]
    pub const fn changed(&self) -> usize {
        match self {
            Self::Applied { changed } => *changed,
            _ => 0,
        }
    }

    /// Returns true for `Dropped`.
    #[must_use]
    pub const fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped(_))
    }

    /// The error behind a `Dropped` outcome.
    #[must_use]
    pub const fn error(&self) -> Option<&StateError> {
        match self {
            Self::Dropped(err) => Some(err),
            _ => None,
        }
    }
}
