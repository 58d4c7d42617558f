//! Arbitration engine.
//!
//! Given one application's requested regular state, decide the new regular
//! state of every registered application. Two resources are exclusive:
//!
//! - the display: at most one application holds `FULL`
//! - audio focus: at most one audio application per capability class sits
//!   above `BACKGROUND`
//!
//! A foreground request also pushes any `LIMITED` application of the
//! requester's class down to `BACKGROUND`, audio or not.
//!
//! Each competing application is resolved from its own current regular state
//! and the request alone, never from another application's updated state, so
//! the result does not depend on iteration order and applying the same request
//! twice changes nothing the second time.

use hmi_arbiter_core::{
    AppCapabilities, AppId, AudioStreamingState, HmiLevel, HmiState, SystemContext,
    VideoStreamingState,
};

use crate::app_state::AppEntry;
use crate::error::{Result, StateError};

/// New regular state for one application.
pub type Assignment = (AppId, HmiState);

/// Resolve the whole registry against a request from `target`.
///
/// The first assignment is always the target itself; the rest are the
/// applications whose regular state must change.
///
/// # Errors
///
/// Returns `StateError::AppNotFound` if `target` is not among `apps`.
pub fn plan<'a, I>(apps: I, target: AppId, requested: &HmiState) -> Result<Vec<Assignment>>
where
    I: IntoIterator<Item = &'a AppEntry> + Clone,
{
    let requester = apps
        .clone()
        .into_iter()
        .find(|entry| entry.app_id() == target)
        .map(|entry| *entry.capabilities())
        .ok_or(StateError::AppNotFound(target))?;

    let mut assignments = vec![(target, *requested)];
    assignments.extend(
        apps.into_iter()
            .filter(|entry| entry.app_id() != target)
            .filter_map(|entry| {
                resolve(&requester, requested, entry.capabilities(), entry.regular())
                    .map(|state| (entry.app_id(), state))
            }),
    );
    Ok(assignments)
}

/// Resolve a single competing application.
///
/// Returns the demoted regular state, or `None` if the competitor keeps its
/// current one.
#[must_use]
pub fn resolve(
    requester: &AppCapabilities,
    requested: &HmiState,
    caps: &AppCapabilities,
    current: &HmiState,
) -> Option<HmiState> {
    let grabs_display = requested.level == HmiLevel::Full;
    let grabs_audio = requested.level.is_foreground() && requester.is_audio();
    let holds_display = current.level == HmiLevel::Full;
    let holds_audio = current.level.is_foreground() && caps.is_audio();

    let mut level = current.level;
    if grabs_display && holds_display {
        level = if caps.is_audio() {
            HmiLevel::Limited
        } else {
            HmiLevel::Background
        };
    }
    let same_class = requester.shares_class_with(caps);
    if grabs_audio && holds_audio && same_class {
        level = HmiLevel::Background;
    }
    if requested.level.is_foreground() && current.level == HmiLevel::Limited && same_class {
        level = HmiLevel::Background;
    }

    (level != current.level).then(|| demoted(caps, current, level))
}

fn demoted(caps: &AppCapabilities, current: &HmiState, level: HmiLevel) -> HmiState {
    match level {
        HmiLevel::Limited => HmiState {
            level,
            audio: if caps.is_audio() {
                AudioStreamingState::Audible
            } else {
                AudioStreamingState::NotAudible
            },
            video: if caps.is_video() {
                current.video
            } else {
                VideoStreamingState::NotStreamable
            },
            ..*current
        },
        _ => HmiState {
            level,
            audio: AudioStreamingState::NotAudible,
            video: VideoStreamingState::NotStreamable,
            ..*current
        },
    }
}

/// Regular state an application gets at `level` given its capabilities.
///
/// Audio apps are audible and video apps streamable while in the
/// foreground.
#[must_use]
pub const fn state_for_level(
    caps: &AppCapabilities,
    level: HmiLevel,
    context: SystemContext,
) -> HmiState {
    let foreground = level.is_foreground();
    HmiState::new(
        level,
        if foreground && caps.is_audio() {
            AudioStreamingState::Audible
        } else {
            AudioStreamingState::NotAudible
        },
        if foreground && caps.is_video() {
            VideoStreamingState::Streamable
        } else {
            VideoStreamingState::NotStreamable
        },
        context,
    )
}
