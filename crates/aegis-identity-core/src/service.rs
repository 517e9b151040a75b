//! Authentication orchestration
//!
//! Ties together token issuance, the session ledger and the identity store
//! for login, refresh-with-rotation, revoke and revoke-all. Holds no
//! persistent state of its own.

use std::sync::Arc;

use aegis_db::{DeletedFilter, SessionRepository, SessionRow, UserRepository, UserRow};
use aegis_types::{AccessClaims, PublicUser, TokenPair, UserId};

use crate::{AuthConfig, AuthError, CredentialHasher, SessionLedger, TokenIssuer};

/// Successful login: token pair plus the sanitized identity view
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub tokens: TokenPair,
    pub user: PublicUser,
}

/// Authentication service
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    tokens: TokenIssuer,
    ledger: SessionLedger<S>,
    hasher: CredentialHasher,
    users: Arc<U>,
    access_ttl_secs: u64,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    /// Create a new authentication service
    pub fn new(config: AuthConfig, users: Arc<U>, sessions: Arc<S>) -> Result<Self, AuthError> {
        config.validate()?;
        let hasher = CredentialHasher::new(config.hash_cost)?;
        let ledger = SessionLedger::new(sessions, config.refresh_ttl);
        let access_ttl_secs = config.access_ttl.as_secs();
        Ok(Self {
            tokens: TokenIssuer::new(config),
            ledger,
            hasher,
            users,
            access_ttl_secs,
        })
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Authenticate an email/password pair and open a session.
    ///
    /// An unknown email and a wrong password fail identically so callers
    /// cannot enumerate accounts.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<AuthSession, AuthError> {
        let email = crate::identity::normalize_email(email);

        let user = self
            .users
            .find_by_email(&email, DeletedFilter::IncludeDeleted)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.deleted {
            return Err(AuthError::UserDeleted);
        }

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        match user.parsed_status() {
            aegis_types::UserStatus::Deactivated => return Err(AuthError::UserDeactivated),
            aegis_types::UserStatus::Banned => return Err(AuthError::UserBanned),
            _ => {}
        }

        let tokens = self.issue_pair(&user, ip_address, user_agent).await?;
        Ok(AuthSession {
            tokens,
            user: user.to_public(),
        })
    }

    // =========================================================================
    // Refresh with rotation
    // =========================================================================

    /// Exchange a refresh token for a new access+refresh pair.
    ///
    /// The old session record is revoked *before* the new pair is minted:
    /// a refresh-token value, once exchanged, is never exchangeable again,
    /// so a stolen-but-already-used token cannot be replayed.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let record = self.ledger.lookup(refresh_token).await?;

        let user = self
            .users
            .find_by_id(record.user_id, DeletedFilter::IncludeDeleted)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.deleted {
            return Err(AuthError::UserDeleted);
        }

        self.ledger.revoke_by_id(record.id).await?;

        self.issue_pair(&user, record.ip_address.clone(), record.user_agent.clone())
            .await
    }

    // =========================================================================
    // Revocation
    // =========================================================================

    /// Revoke exactly one session by its refresh token
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.ledger.revoke(refresh_token).await
    }

    /// Revoke every active session owned by an identity. Zero sessions is a
    /// valid end state, not an error.
    pub async fn revoke_all(&self, user_id: UserId) -> Result<u64, AuthError> {
        self.ledger.revoke_all(user_id).await
    }

    // =========================================================================
    // Token and session queries
    // =========================================================================

    /// Verify an access token and return its claims
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.tokens.verify(token)
    }

    /// List session records for an identity
    pub async fn sessions_for(&self, user_id: UserId) -> Result<Vec<SessionRow>, AuthError> {
        self.ledger.sessions_for(user_id).await
    }

    /// Delete sessions past their expiry (maintenance)
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        self.ledger.purge_expired().await
    }

    async fn issue_pair(
        &self,
        user: &UserRow,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<TokenPair, AuthError> {
        let access = self.tokens.issue_access(user)?;
        let refresh = self.tokens.issue_refresh();

        self.ledger
            .open(user.user_id(), &refresh, ip_address, user_agent)
            .await?;

        Ok(TokenPair::new(access, refresh, self.access_ttl_secs))
    }
}

impl<U: UserRepository, S: SessionRepository> std::fmt::Debug for AuthService<U, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}
