//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Role and status are stored as strings and parsed into the typed enums at
//! the domain boundary.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use aegis_types::{PublicUser, Role, SessionId, UserId, UserStatus};

/// Identity row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub role: String,
    pub status: String,
    pub version: i64,
    pub password_history: Vec<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session row from the database
///
/// `token_hash` holds the SHA-256 digest of the opaque refresh-token value;
/// the value itself is never stored.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Parse the stored role, defaulting to the least-privileged one
    pub fn parsed_role(&self) -> Role {
        self.role.parse().unwrap_or(Role::User)
    }

    /// Parse the stored status, defaulting to the pre-verification state
    pub fn parsed_status(&self) -> UserStatus {
        self.status.parse().unwrap_or(UserStatus::PendingVerification)
    }

    /// Build the sanitized public view of this record
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.user_id(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            display_name: self.display_name.clone(),
            date_of_birth: self.date_of_birth,
            phone: self.phone.clone(),
            role: self.parsed_role(),
            status: self.parsed_status(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl SessionRow {
    /// Convert to domain SessionId
    pub fn session_id(&self) -> SessionId {
        SessionId(self.id)
    }

    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.user_id)
    }

    /// Check if the session is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the session is valid (not revoked and not expired)
    pub fn is_valid(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}
