//! Core types for hmi-arbiter.
//!
//! This crate provides the value types shared by the state controller:
//!
//! - **Identifiers**: `AppId`, `HmiAppId` and `CorrelationId`
//! - **HMI state**: the four state axes, `HmiState` and the `StateId` tag
//! - **Capabilities**: `AppCapabilities` and the capability-class predicate
//! - **Error types**: `CoreError`
//!
//! Nothing here locks or performs side effects.
//!
//! # Example
//!
//! ```
//! use hmi_arbiter_core::{
//!     AppCapabilities, AudioStreamingState, HmiLevel, HmiState, SystemContext,
//!     VideoStreamingState,
//! };
//!
//! let state = HmiState::new(
//!     HmiLevel::Full,
//!     AudioStreamingState::Audible,
//!     VideoStreamingState::NotStreamable,
//!     SystemContext::Main,
//! );
//! assert!(state.is_valid());
//!
//! let media = AppCapabilities::new(true, false, false, false);
//! assert!(media.is_audio());
//! assert!(!media.shares_class_with(&AppCapabilities::SIMPLE));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod capabilities;
pub mod error;
pub mod ids;
pub mod state;

pub use capabilities::{AppCapabilities, AppProfile};
pub use error::{CoreError, Result};
pub use ids::{AppId, CorrelationId, HmiAppId, IdError};
pub use state::{
    AudioStreamingState, HmiLevel, HmiState, OverlayKind, StateId, SystemContext,
    VideoStreamingState,
};
