//! Identifier types for hmi-arbiter.
//!
//! Applications are known under two numeric identifiers: the id the
//! middleware assigns at registration ([`AppId`]) and the id the HMI layer
//! uses in its own messages ([`HmiAppId`]). Activation requests sent to the
//! HMI are paired with their responses through a [`CorrelationId`].
//!
//! All three are plain `u32` newtypes so they can never be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Application identifier assigned by the middleware registry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(u32);

impl AppId {
    /// Create a new `AppId` from its raw value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Return the raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppId({})", self.0)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AppId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u32(s).map(Self)
    }
}

impl From<u32> for AppId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Application identifier used by the HMI layer.
///
/// Activation responses and HMI notifications reference applications by this
/// id, which the registry maps back to an [`AppId`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HmiAppId(u32);

impl HmiAppId {
    /// Create a new `HmiAppId` from its raw value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Return the raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for HmiAppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HmiAppId({})", self.0)
    }
}

impl fmt::Display for HmiAppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HmiAppId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u32(s).map(Self)
    }
}

impl From<u32> for HmiAppId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Token pairing an outbound activation request with its response.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u32);

impl CorrelationId {
    /// Create a new `CorrelationId` from its raw value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Return the raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Return the id following this one, wrapping at `u32::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CorrelationId({})", self.0)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u32(s).map(Self)
    }
}

impl From<u32> for CorrelationId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

fn parse_u32(s: &str) -> Result<u32, IdError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    trimmed
        .parse()
        .map_err(|_| IdError::NotNumeric(trimmed.to_string()))
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input was empty.
    #[error("identifier is empty")]
    Empty,

    /// The input is not an unsigned 32-bit number.
    #[error("identifier is not a u32: {0}")]
    NotNumeric(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_parse_and_display() {
        let id: AppId = "1721".parse().unwrap();
        assert_eq!(id, AppId::new(1721));
        assert_eq!(id.to_string(), "1721");
        assert_eq!(format!("{id:?}"), "AppId(1721)");
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: HmiAppId = " 2718 ".parse().unwrap();
        assert_eq!(id.get(), 2718);
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!("".parse::<AppId>(), Err(IdError::Empty));
        assert_eq!("   ".parse::<CorrelationId>(), Err(IdError::Empty));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        let result = "abc".parse::<HmiAppId>();
        assert!(matches!(result, Err(IdError::NotNumeric(s)) if s == "abc"));

        // Negative numbers are out of range
        assert!("-1".parse::<AppId>().is_err());
    }

    #[test]
    fn correlation_id_next_wraps() {
        assert_eq!(CorrelationId::new(314).next(), CorrelationId::new(315));
        assert_eq!(CorrelationId::new(u32::MAX).next(), CorrelationId::new(0));
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&AppId::new(1801)).unwrap();
        assert_eq!(json, "1801");

        let parsed: CorrelationId = serde_json::from_str("314").unwrap();
        assert_eq!(parsed, CorrelationId::new(314));
    }

    #[test]
    fn app_ids_order_numerically() {
        let mut ids = vec![AppId::new(1801), AppId::new(1721), AppId::new(1762)];
        ids.sort();
        assert_eq!(ids, vec![AppId::new(1721), AppId::new(1762), AppId::new(1801)]);
    }
}
