//! Overlay policy.
//!
//! Each overlay kind maps the state beneath it to a new state, given the
//! application's capabilities and whether the head unit supports audio
//! attenuation. An application's effective state is the fold of its overlay
//! stack over its regular state:
//!
//! ```text
//!   stack[n-1]  ──▶  apply(stack[n-1], apply(stack[n-2], ... ))   = effective
//!      ...
//!   stack[0]    ──▶  apply(stack[0], regular)
//!   regular
//! ```
//!
//! Every layer sees only the layer directly beneath it. The system context
//! always passes through unchanged.

use hmi_arbiter_core::{
    AppCapabilities, AudioStreamingState, HmiLevel, HmiState, OverlayKind, StateId,
    VideoStreamingState,
};

/// Compute the state an overlay produces on top of `parent`.
#[must_use]
pub fn apply(
    kind: OverlayKind,
    caps: &AppCapabilities,
    attenuated_supported: bool,
    parent: &HmiState,
) -> HmiState {
    let mut state = match kind {
        OverlayKind::VrSession => vr_session(parent),
        OverlayKind::TtsSession => tts_session(caps, attenuated_supported, parent),
        OverlayKind::PhoneCall => phone_call(caps, parent),
        OverlayKind::SafetyMode => safety_mode(parent),
        OverlayKind::NaviStreaming | OverlayKind::VideoStreaming => {
            streaming(caps, attenuated_supported, parent)
        }
    };
    state.context = parent.context;
    state.kind = StateId::Overlay(kind);
    state
}

/// Fold an overlay stack, bottom first, over a regular state.
///
/// The result is tagged with the topmost overlay kind, or `Regular` when the
/// stack is empty.
#[must_use]
pub fn fold(
    regular: &HmiState,
    stack: &[OverlayKind],
    caps: &AppCapabilities,
    attenuated_supported: bool,
) -> HmiState {
    stack
        .iter()
        .fold(regular.with_kind(StateId::Regular), |parent, &kind| {
            apply(kind, caps, attenuated_supported, &parent)
        })
}

/// Overlay kind pushed when an application starts streaming.
#[must_use]
pub const fn streaming_kind(caps: &AppCapabilities) -> OverlayKind {
    if caps.navigation {
        OverlayKind::NaviStreaming
    } else {
        OverlayKind::VideoStreaming
    }
}

const fn vr_session(parent: &HmiState) -> HmiState {
    HmiState {
        audio: AudioStreamingState::NotAudible,
        ..*parent
    }
}

const fn tts_session(
    caps: &AppCapabilities,
    attenuated_supported: bool,
    parent: &HmiState,
) -> HmiState {
    let keeps_attenuated = attenuated_supported
        && caps.is_audio()
        && !matches!(parent.audio, AudioStreamingState::NotAudible)
        && parent.level.is_foreground();

    HmiState {
        audio: if keeps_attenuated {
            AudioStreamingState::Attenuated
        } else {
            AudioStreamingState::NotAudible
        },
        ..*parent
    }
}

const fn phone_call(caps: &AppCapabilities, parent: &HmiState) -> HmiState {
    let level = if parent.level.is_hidden() {
        parent.level
    } else if caps.navigation || caps.projection {
        HmiLevel::Limited
    } else if caps.media {
        HmiLevel::Background
    } else {
        parent.level
    };

    HmiState {
        level,
        audio: AudioStreamingState::NotAudible,
        video: if level.is_hidden() {
            VideoStreamingState::NotStreamable
        } else {
            parent.video
        },
        ..*parent
    }
}

const fn safety_mode(parent: &HmiState) -> HmiState {
    HmiState {
        audio: AudioStreamingState::NotAudible,
        video: VideoStreamingState::NotStreamable,
        ..*parent
    }
}

const fn streaming(
    caps: &AppCapabilities,
    attenuated_supported: bool,
    parent: &HmiState,
) -> HmiState {
    let audio = if caps.navigation {
        parent.audio
    } else if matches!(parent.audio, AudioStreamingState::NotAudible) || !attenuated_supported {
        AudioStreamingState::NotAudible
    } else {
        AudioStreamingState::Attenuated
    };

    HmiState {
        audio,
        video: if caps.is_video() {
            parent.video
        } else {
            VideoStreamingState::NotStreamable
        },
        ..*parent
    }
}
