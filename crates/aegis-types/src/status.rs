//! Account status types

use serde::{Deserialize, Serialize};

/// Account status
///
/// `Deactivated` and `Banned` block login but are not terminal: any status
/// is reachable from any other through an explicit status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered but not yet verified; may log in
    PendingVerification,
    /// Fully active account
    Active,
    /// Voluntarily or administratively deactivated; login blocked
    Deactivated,
    /// Banned by an administrator; login blocked
    Banned,
}

impl UserStatus {
    /// Whether this status prevents authentication
    pub const fn blocks_login(&self) -> bool {
        matches!(self, Self::Deactivated | Self::Banned)
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingVerification => write!(f, "pending_verification"),
            Self::Active => write!(f, "active"),
            Self::Deactivated => write!(f, "deactivated"),
            Self::Banned => write!(f, "banned"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending_verification" | "pending" => Ok(Self::PendingVerification),
            "active" => Ok(Self::Active),
            "deactivated" => Ok(Self::Deactivated),
            "banned" => Ok(Self::Banned),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a status string
#[derive(Debug, Clone)]
pub struct StatusParseError(pub String);

impl std::fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid status: {}", self.0)
    }
}

impl std::error::Error for StatusParseError {}
