//! User identity types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Role, UserStatus};

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Sanitized public view of an identity record.
///
/// This is the only user shape that crosses the API boundary. It never
/// carries the credential hash or the password history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    /// User ID
    pub id: UserId,
    /// Normalized email address
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Optional date of birth
    pub date_of_birth: Option<NaiveDate>,
    /// Optional normalized phone number
    pub phone: Option<String>,
    /// User role
    pub role: Role,
    /// Account status
    pub status: UserStatus,
    /// Optimistic-concurrency version counter
    pub version: i64,
    /// Record creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl PublicUser {
    /// Full name for display purposes
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
