//! Identity mutations
//!
//! Orchestrates register / update / password-change / soft-delete / status
//! transitions against the identity store, running the validation pipeline
//! and enforcing optimistic concurrency. No operation here takes a lock;
//! lost-update races are detected by the store's conditional write.

use std::sync::Arc;

use uuid::Uuid;

use aegis_db::{CreateUser, DeletedFilter, UserRepository, UserRow};
use aegis_types::{PublicUser, Role, UserId, UserStatus};

use crate::validate::{IdentityDraft, ValidationPipeline};
use crate::{AuthConfig, AuthError, CredentialHasher};

/// Registration input. The password arrives as plaintext and leaves this
/// module only as a hash.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub phone: Option<String>,
}

/// Profile patch for an optimistically-guarded update.
///
/// `None` leaves a field unchanged. Email, credentials, role and status are
/// immutable through this path.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub phone: Option<String>,
}

/// Normalize an email address: trimmed, ASCII-lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Normalize a phone number: digits only, keeping one leading `+`.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut normalized = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() || (c == '+' && i == 0) {
            normalized.push(c);
        }
    }
    normalized
}

/// Identity mutator over an identity store
pub struct IdentityMutator<R: UserRepository> {
    config: AuthConfig,
    hasher: CredentialHasher,
    pipeline: ValidationPipeline,
    repo: Arc<R>,
}

impl<R: UserRepository + 'static> IdentityMutator<R> {
    /// Create a mutator with the standard validation pipeline
    pub fn new(config: AuthConfig, repo: Arc<R>) -> Result<Self, AuthError> {
        config.validate()?;
        let hasher = CredentialHasher::new(config.hash_cost)?;
        let pipeline = ValidationPipeline::standard(Arc::clone(&repo));
        Ok(Self {
            config,
            hasher,
            pipeline,
            repo,
        })
    }

    /// Replace the validation pipeline (extensibility point for additional
    /// business rules)
    pub fn with_pipeline(mut self, pipeline: ValidationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new identity.
    ///
    /// The insert relies on the store's unique keys: if a concurrent racer
    /// registered the same email between pipeline and insert, the duplicate
    /// surfaces as [`AuthError::Duplicate`] rather than being retried here.
    pub async fn register(&self, input: NewIdentity) -> Result<PublicUser, AuthError> {
        let email = normalize_email(&input.email);
        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if input.password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let phone = input
            .phone
            .as_deref()
            .map(normalize_phone)
            .filter(|p| !p.is_empty());

        let draft = IdentityDraft {
            id: None,
            email: email.clone(),
            phone: phone.clone(),
        };
        self.pipeline.run(&draft).await?;

        let password_hash = self.hasher.hash(&input.password)?;

        let create = CreateUser {
            id: Uuid::new_v4(),
            email,
            phone,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            display_name: input.display_name,
            date_of_birth: input.date_of_birth,
            role: Role::User.to_string(),
            status: UserStatus::PendingVerification.to_string(),
        };

        let row = self.repo.create(create).await?;
        tracing::info!(user_id = %row.id, "registered new identity");
        Ok(row.to_public())
    }

    // =========================================================================
    // Profile update (optimistic concurrency)
    // =========================================================================

    /// Apply a profile patch iff the caller read the current version.
    ///
    /// A version mismatch — detected either up front or by the conditional
    /// write — fails with `CONCURRENCY_CONFLICT` and leaves the stored
    /// record untouched; the caller re-reads and retries.
    pub async fn update(
        &self,
        id: UserId,
        version: i64,
        patch: UpdateProfile,
    ) -> Result<PublicUser, AuthError> {
        let current = self
            .repo
            .find_by_id(id.0, DeletedFilter::IncludeDeleted)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if current.version != version {
            return Err(AuthError::ConcurrencyConflict);
        }

        let candidate = apply_patch(&current, patch);

        let draft = IdentityDraft {
            id: Some(id.0),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
        };
        self.pipeline.run(&draft).await?;

        // Conditional write: zero matched rows means another writer
        // committed after our read.
        let matched = self
            .repo
            .replace_if_version(id.0, version, &candidate)
            .await?;
        if !matched {
            return Err(AuthError::ConcurrencyConflict);
        }

        let updated = self
            .repo
            .find_by_id(id.0, DeletedFilter::IncludeDeleted)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(updated.to_public())
    }

    // =========================================================================
    // Credential change
    // =========================================================================

    /// Change a credential after verifying the current one.
    ///
    /// The new plaintext is verified against the active hash and every hash
    /// in the history; a match anywhere fails `PASSWORD_USED_BEFORE`.
    pub async fn change_password(
        &self,
        id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::MissingField("new_password"));
        }

        let row = self
            .repo
            .find_by_id(id.0, DeletedFilter::ActiveOnly)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.hasher.verify(current_password, &row.password_hash) {
            return Err(AuthError::InvalidPassword);
        }

        // Plaintext against each stored hash; the hashes themselves are
        // salted and can never be compared to each other.
        if self.hasher.verify(new_password, &row.password_hash) {
            return Err(AuthError::PasswordUsedBefore);
        }
        for old_hash in &row.password_history {
            if self.hasher.verify(new_password, old_hash) {
                return Err(AuthError::PasswordUsedBefore);
            }
        }

        let new_hash = self.hasher.hash(new_password)?;

        let mut history = row.password_history.clone();
        history.push(row.password_hash.clone());
        while history.len() > self.config.password_history_limit {
            history.remove(0); // oldest first
        }

        let matched = self
            .repo
            .update_credentials(id.0, &new_hash, &history)
            .await?;
        if !matched {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(user_id = %id, "credential changed");
        Ok(())
    }

    // =========================================================================
    // Soft delete and status
    // =========================================================================

    /// Mark an identity soft-deleted. Deleting an already-deleted record
    /// re-sets the flag without error.
    pub async fn soft_delete(&self, id: UserId) -> Result<(), AuthError> {
        let matched = self.repo.set_deleted(id.0).await?;
        if !matched {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(user_id = %id, "identity soft-deleted");
        Ok(())
    }

    /// Directly transition the account status. Requires only existence; no
    /// pipeline run.
    pub async fn update_status(
        &self,
        id: UserId,
        status: UserStatus,
        reason: Option<&str>,
    ) -> Result<(), AuthError> {
        let matched = self.repo.update_status(id.0, &status.to_string()).await?;
        if !matched {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(user_id = %id, %status, reason, "status changed");
        Ok(())
    }
}

/// Build the update candidate: immutable fields preserved from the current
/// record, mutable fields taken from the patch where present.
fn apply_patch(current: &UserRow, patch: UpdateProfile) -> UserRow {
    let mut candidate = current.clone();
    if let Some(first_name) = patch.first_name {
        candidate.first_name = first_name;
    }
    if let Some(last_name) = patch.last_name {
        candidate.last_name = last_name;
    }
    if let Some(display_name) = patch.display_name {
        candidate.display_name = Some(display_name);
    }
    if let Some(date_of_birth) = patch.date_of_birth {
        candidate.date_of_birth = Some(date_of_birth);
    }
    if let Some(phone) = patch.phone {
        let phone = normalize_phone(&phone);
        candidate.phone = if phone.is_empty() { None } else { Some(phone) };
    }
    candidate
}

impl<R: UserRepository> std::fmt::Debug for IdentityMutator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityMutator")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
