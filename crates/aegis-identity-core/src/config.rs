//! Configuration types for the identity engine

use std::time::Duration;

use crate::crypto::CredentialHasher;
use crate::error::AuthError;

/// Identity engine configuration
///
/// Built once at startup and injected into the mutator and orchestrator;
/// there is no global settings object. The refresh TTL configured here is
/// the only source of refresh-token lifetime anywhere in the engine.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for access-token signing
    pub token_secret: String,
    /// Issuer claim embedded in and required from access tokens
    pub issuer: String,
    /// Audience claim embedded in and required from access tokens
    pub audience: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
    /// bcrypt work factor for credential hashing
    pub hash_cost: u32,
    /// How many previous credential hashes are retained and checked
    pub password_history_limit: usize,
}

impl AuthConfig {
    /// Minimum allowed signing-secret length in bytes (256 bits)
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create a new config with default lifetimes
    pub fn new(
        token_secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            token_secret: token_secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            hash_cost: CredentialHasher::MIN_COST,
            password_history_limit: 5,
        }
    }

    /// Set access token lifetime
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set refresh token lifetime
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Set bcrypt work factor
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Set the credential history depth
    pub fn with_password_history_limit(mut self, limit: usize) -> Self {
        self.password_history_limit = limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.token_secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(AuthError::Configuration(format!(
                "token secret too short: got {} bytes, need at least {}",
                self.token_secret.len(),
                Self::MIN_SECRET_LENGTH
            )));
        }
        if self.hash_cost < CredentialHasher::MIN_COST {
            return Err(AuthError::Configuration(format!(
                "hash cost too low: got {}, need at least {}",
                self.hash_cost,
                CredentialHasher::MIN_COST
            )));
        }
        if self.issuer.is_empty() || self.audience.is_empty() {
            return Err(AuthError::Configuration(
                "issuer and audience must be set".to_string(),
            ));
        }
        Ok(())
    }
}
