//! Credential hashing
//!
//! bcrypt is adaptive and self-salting: every hash embeds its own salt and
//! work factor, so two plaintexts can only ever be compared through
//! [`CredentialHasher::verify`] — never hash against hash.

use thiserror::Error;

use crate::error::AuthError;

/// One-way credential hasher with a pre-validated work factor.
///
/// Construction rejects work factors below [`CredentialHasher::MIN_COST`] so
/// a misconfigured deployment cannot silently weaken stored credentials.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    /// Minimum allowed bcrypt work factor
    pub const MIN_COST: u32 = 12;

    /// Create a new hasher
    ///
    /// # Errors
    /// Returns an error if `cost` is below [`Self::MIN_COST`].
    pub fn new(cost: u32) -> Result<Self, HashCostError> {
        if cost < Self::MIN_COST {
            return Err(HashCostError::CostTooLow {
                actual: cost,
                minimum: Self::MIN_COST,
            });
        }
        Ok(Self { cost })
    }

    /// Hash a plaintext credential
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| {
            tracing::error!("credential hashing failed: {}", e);
            AuthError::Internal("credential hashing failed".to_string())
        })
    }

    /// Verify a plaintext credential against a stored hash.
    ///
    /// Never fails: a malformed or truncated hash verifies as `false`.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}

/// Errors that can occur when creating a credential hasher
#[derive(Debug, Clone, Error)]
pub enum HashCostError {
    #[error("bcrypt cost too low: got {actual}, need at least {minimum}")]
    CostTooLow { actual: u32, minimum: u32 },
}

impl From<HashCostError> for AuthError {
    fn from(err: HashCostError) -> Self {
        Self::Configuration(err.to_string())
    }
}
