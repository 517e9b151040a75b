//! Repository traits
//!
//! Async repository interfaces over the identity and session stores. These
//! are the only seams the business logic depends on; every operation maps to
//! a single atomic statement in the Postgres implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{SessionRow, UserRow};

/// Visibility of soft-deleted identities in read queries.
///
/// Every identity read names its visibility explicitly; there is no implicit
/// default that could leak (or hide) deleted records by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedFilter {
    /// Only records whose soft-delete flag is unset
    ActiveOnly,
    /// All records, soft-deleted included
    IncludeDeleted,
}

/// Identity repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find an identity by ID
    async fn find_by_id(&self, id: Uuid, filter: DeletedFilter) -> DbResult<Option<UserRow>>;

    /// Find an identity by normalized email
    async fn find_by_email(&self, email: &str, filter: DeletedFilter)
        -> DbResult<Option<UserRow>>;

    /// Check whether a normalized phone number is already held by another
    /// record. `exclude` skips the record being updated, if any.
    async fn exists_by_phone(&self, phone: &str, exclude: Option<Uuid>) -> DbResult<bool>;

    /// Insert a new identity. Fails with [`crate::DbError::Duplicate`] when a
    /// concurrent writer already holds one of the unique keys.
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Replace the mutable profile fields iff the stored version still equals
    /// `expected_version`. Returns whether a row matched; `false` means
    /// another writer won the race.
    async fn replace_if_version(
        &self,
        id: Uuid,
        expected_version: i64,
        row: &UserRow,
    ) -> DbResult<bool>;

    /// Swap the credential hash and history, bumping version and `updated_at`.
    /// Matches active records only.
    async fn update_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> DbResult<bool>;

    /// Directly transition the account status, bumping version and `updated_at`
    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<bool>;

    /// Set the soft-delete flag, bumping version and `updated_at`. Matches
    /// already-deleted records too, so the operation is idempotent.
    async fn set_deleted(&self, id: Uuid) -> DbResult<bool>;
}

/// Create identity input
#[derive(Debug, Clone)]
pub struct CreateUser {
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
}

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Find a session by refresh-token digest.
    ///
    /// Returns revoked and expired rows as well; the caller decides which
    /// failure to surface.
    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<SessionRow>>;

    /// Find all sessions for a user, newest first
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SessionRow>>;

    /// Create a new session
    async fn create(&self, session: CreateSession) -> DbResult<SessionRow>;

    /// Revoke a session. Returns whether a row matched; revoking an
    /// already-revoked session matches without moving `revoked_at`.
    async fn revoke(&self, id: Uuid) -> DbResult<bool>;

    /// Revoke every non-revoked session owned by a user, returning the count
    async fn revoke_all_for_user(&self, user_id: Uuid) -> DbResult<u64>;

    /// Delete sessions past their expiry, returning the count
    async fn delete_expired(&self) -> DbResult<u64>;
}

/// Create session input
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}
