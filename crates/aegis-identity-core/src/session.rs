//! Session ledger for refresh tokens
//!
//! Persisted record of every issued refresh token. The ledger stores only a
//! SHA-256 digest of the token value; the bearer secret itself never reaches
//! the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use aegis_db::{CreateSession, SessionRepository, SessionRow};
use aegis_types::UserId;

use crate::AuthError;

/// Digest a refresh-token value for storage and lookup
pub fn hash_token(token: &str) -> String {
    use sha2::Digest;
    let mut hasher = sha2::Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Session ledger over a session store
#[derive(Clone)]
pub struct SessionLedger<R: SessionRepository> {
    repo: Arc<R>,
    refresh_ttl: Duration,
}

impl<R: SessionRepository> SessionLedger<R> {
    /// Create a new session ledger
    pub fn new(repo: Arc<R>, refresh_ttl: Duration) -> Self {
        Self { repo, refresh_ttl }
    }

    /// Record a freshly issued refresh token
    pub async fn open(
        &self,
        user_id: UserId,
        token: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<SessionRow, AuthError> {
        let expires_at = Utc::now() + ChronoDuration::seconds(self.refresh_ttl.as_secs() as i64);
        let create = CreateSession {
            id: Uuid::new_v4(),
            user_id: user_id.0,
            token_hash: hash_token(token),
            ip_address,
            user_agent,
            expires_at,
        };

        Ok(self.repo.create(create).await?)
    }

    /// Look up a refresh token and require it to be exchangeable.
    ///
    /// Unknown values, revoked records and expired records each surface
    /// their own failure, in that priority order: a revoked session stays
    /// revoked even once its expiry passes.
    pub async fn lookup(&self, token: &str) -> Result<SessionRow, AuthError> {
        let session = self.repo.find_by_token_hash(&hash_token(token)).await?;

        match session {
            None => Err(AuthError::InvalidRefreshToken),
            Some(s) if s.revoked => {
                tracing::debug!(session_id = %s.id, "refresh token already revoked");
                Err(AuthError::TokenRevoked)
            }
            Some(s) if s.is_expired() => {
                tracing::debug!(session_id = %s.id, "refresh token expired");
                Err(AuthError::TokenExpired)
            }
            Some(s) => Ok(s),
        }
    }

    /// Revoke a session record by ID
    pub async fn revoke_by_id(&self, id: Uuid) -> Result<(), AuthError> {
        if !self.repo.revoke(id).await? {
            return Err(AuthError::InvalidRefreshToken);
        }
        Ok(())
    }

    /// Revoke the session holding the given refresh token.
    ///
    /// Requires only that the record exists; revoking an already-revoked or
    /// expired session is not an error.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let session = self
            .repo
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        self.revoke_by_id(session.id).await
    }

    /// Revoke every non-revoked session for a user.
    ///
    /// Zero affected rows is a valid outcome, not an error.
    pub async fn revoke_all(&self, user_id: UserId) -> Result<u64, AuthError> {
        let count = self.repo.revoke_all_for_user(user_id.0).await?;
        tracing::info!(%user_id, count, "revoked all sessions");
        Ok(count)
    }

    /// List all sessions for a user
    pub async fn sessions_for(&self, user_id: UserId) -> Result<Vec<SessionRow>, AuthError> {
        Ok(self.repo.find_by_user_id(user_id.0).await?)
    }

    /// Delete sessions past their expiry. Maintenance only; correctness
    /// never depends on this running.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        Ok(self.repo.delete_expired().await?)
    }
}

impl<R: SessionRepository> std::fmt::Debug for SessionLedger<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLedger")
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
