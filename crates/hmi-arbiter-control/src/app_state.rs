//! Per-application state record.
//!
//! The record holds the regular state, the ordered overlay stack and the
//! optional postponed request. The effective state is always recomputed by
//! folding the stack; only the last state the application was told about is
//! kept, so the next change is diffed against what it actually saw.

use hmi_arbiter_core::{AppCapabilities, AppId, AppProfile, HmiState, OverlayKind, StateId};

use crate::overlay;

/// State owned by the controller for one registered application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    profile: AppProfile,
    regular: HmiState,
    stack: Vec<OverlayKind>,
    postponed: Option<HmiState>,
    resuming: bool,
    notified: HmiState,
}

impl AppEntry {
    /// Create a record in the default state with an empty stack.
    #[must_use]
    pub fn new(profile: AppProfile) -> Self {
        Self {
            profile,
            regular: HmiState::default(),
            stack: Vec::new(),
            postponed: None,
            resuming: false,
            notified: HmiState::default(),
        }
    }

    /// Registration data.
    #[must_use]
    pub const fn profile(&self) -> &AppProfile {
        &self.profile
    }

    /// Middleware-side id.
    #[must_use]
    pub const fn app_id(&self) -> AppId {
        self.profile.app_id
    }

    /// Declared capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &AppCapabilities {
        &self.profile.capabilities
    }

    /// Baseline state, absent any overlay.
    #[must_use]
    pub const fn regular(&self) -> &HmiState {
        &self.regular
    }

    /// Replace the baseline state.
    pub fn set_regular(&mut self, state: HmiState) {
        self.regular = state.with_kind(StateId::Regular);
    }

    /// Active overlays, bottom first.
    #[must_use]
    pub fn overlays(&self) -> &[OverlayKind] {
        &self.stack
    }

    /// Whether `kind` is on the stack.
    #[must_use]
    pub fn has_overlay(&self, kind: OverlayKind) -> bool {
        self.stack.contains(&kind)
    }

    /// Push an overlay. Returns false if it was already on the stack.
    pub fn push(&mut self, kind: OverlayKind) -> bool {
        if self.has_overlay(kind) {
            return false;
        }
        self.stack.push(kind);
        true
    }

    /// Remove an overlay wherever it sits. Returns false if it was absent.
    pub fn pop(&mut self, kind: OverlayKind) -> bool {
        let before = self.stack.len();
        self.stack.retain(|k| *k != kind);
        self.stack.len() != before
    }

    /// Deferred regular-state request, if any.
    #[must_use]
    pub const fn postponed(&self) -> Option<&HmiState> {
        self.postponed.as_ref()
    }

    /// Store a deferred request, replacing any earlier one.
    pub fn postpone(&mut self, state: HmiState) {
        self.postponed = Some(state.with_kind(StateId::Regular));
    }

    /// Remove and return the deferred request.
    pub fn take_postponed(&mut self) -> Option<HmiState> {
        self.postponed.take()
    }

    /// Whether the application is inside its resumption grace window.
    #[must_use]
    pub const fn is_resuming(&self) -> bool {
        self.resuming
    }

    /// Enter or leave the resumption grace window.
    pub fn set_resuming(&mut self, resuming: bool) {
        self.resuming = resuming;
    }

    /// The effective state last sent to the application.
    #[must_use]
    pub const fn notified(&self) -> &HmiState {
        &self.notified
    }

    /// Record the effective state just sent to the application.
    pub fn set_notified(&mut self, state: HmiState) {
        self.notified = state;
    }

    /// The state currently presented to the application.
    #[must_use]
    pub fn effective(&self, attenuated_supported: bool) -> HmiState {
        overlay::fold(
            &self.regular,
            &self.stack,
            &self.profile.capabilities,
            attenuated_supported,
        )
    }
}
