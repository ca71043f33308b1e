//! Core type definitions for inferoute

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Unique identifier for a hardware backend in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackendId(String);

impl BackendId {
    /// Create a new BackendId from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of the BackendId
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BackendId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for BackendId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Operational status of a backend hardware instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendStatus {
    /// Fully available
    Healthy,
    /// Available but slower; incurs a latency and scoring penalty
    Degraded,
    /// Unavailable; never routed to
    Down,
}

impl BackendStatus {
    /// Parse a status string, case-insensitive.
    ///
    /// Unknown or invalid input maps to `Down`. Failing closed here is a
    /// deliberate policy: a backend whose status cannot be understood must
    /// never receive traffic.
    pub fn from_str(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "healthy" => BackendStatus::Healthy,
            "degraded" => BackendStatus::Degraded,
            _ => BackendStatus::Down,
        }
    }

    /// Lowercase string form, as used in configuration files and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendStatus::Healthy => "healthy",
            BackendStatus::Degraded => "degraded",
            BackendStatus::Down => "down",
        }
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for BackendStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BackendStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(BackendStatus::from_str(&s))
    }
}
