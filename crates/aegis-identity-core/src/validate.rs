//! Business-rule validation pipeline
//!
//! Validators are independent rules run against a candidate identity before
//! a mutation commits. The pipeline holds an explicit ordered collection
//! built at startup; adding or removing a rule touches only the registration
//! site.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use aegis_db::{DeletedFilter, UserRepository};

use crate::AuthError;

/// A coded business-rule failure
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationFailure {
    /// Stable failure code (e.g. `EMAIL_ALREADY_EXISTS`)
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationFailure {
    /// Create a new validation failure
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Candidate identity as seen by business validators.
///
/// Carries the fields business rules inspect; `id` is `None` for a record
/// being created and `Some` for one being updated, so uniqueness rules can
/// skip the record itself.
#[derive(Debug, Clone)]
pub struct IdentityDraft {
    /// Id of the record being updated, if any
    pub id: Option<Uuid>,
    /// Normalized email
    pub email: String,
    /// Normalized phone, if present
    pub phone: Option<String>,
}

/// A single business rule over a candidate identity
#[async_trait]
pub trait IdentityValidator: Send + Sync {
    /// Stable failure code this validator emits
    fn code(&self) -> &'static str;

    /// Check the candidate; the first failing rule stops the pipeline
    async fn validate(&self, candidate: &IdentityDraft) -> Result<(), AuthError>;
}

/// Ordered, short-circuiting set of business validators
pub struct ValidationPipeline {
    validators: Vec<Box<dyn IdentityValidator>>,
}

impl ValidationPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// The standard rule set: email uniqueness, then phone uniqueness
    pub fn standard<R: UserRepository + 'static>(repo: Arc<R>) -> Self {
        Self::new()
            .register(Box::new(EmailUniqueness::new(Arc::clone(&repo))))
            .register(Box::new(PhoneUniqueness::new(repo)))
    }

    /// Append a validator; pipeline order is registration order
    pub fn register(mut self, validator: Box<dyn IdentityValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Run all validators in order, returning the first failure
    pub async fn run(&self, candidate: &IdentityDraft) -> Result<(), AuthError> {
        for validator in &self.validators {
            validator.validate(candidate).await?;
        }
        Ok(())
    }

    /// Number of registered validators
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the pipeline is empty
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<&str> = self.validators.iter().map(|v| v.code()).collect();
        f.debug_struct("ValidationPipeline")
            .field("validators", &codes)
            .finish()
    }
}

/// Rejects a candidate whose email is already held by a different record.
///
/// Uniqueness spans soft-deleted records. Blank emails are ignored; shape
/// validation happens upstream of this engine.
pub struct EmailUniqueness<R: UserRepository> {
    repo: Arc<R>,
}

impl<R: UserRepository> EmailUniqueness<R> {
    /// Create a new email-uniqueness validator
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: UserRepository + 'static> IdentityValidator for EmailUniqueness<R> {
    fn code(&self) -> &'static str {
        "EMAIL_ALREADY_EXISTS"
    }

    async fn validate(&self, candidate: &IdentityDraft) -> Result<(), AuthError> {
        if candidate.email.is_empty() {
            return Ok(());
        }

        let existing = self
            .repo
            .find_by_email(&candidate.email, DeletedFilter::IncludeDeleted)
            .await?;

        match existing {
            Some(row) if Some(row.id) != candidate.id => {
                Err(ValidationFailure::new(
                    self.code(),
                    format!("email '{}' is already registered", candidate.email),
                )
                .into())
            }
            _ => Ok(()),
        }
    }
}

/// Rejects a candidate whose phone is already held by a different record.
/// No-op when the candidate has no phone.
pub struct PhoneUniqueness<R: UserRepository> {
    repo: Arc<R>,
}

impl<R: UserRepository> PhoneUniqueness<R> {
    /// Create a new phone-uniqueness validator
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: UserRepository + 'static> IdentityValidator for PhoneUniqueness<R> {
    fn code(&self) -> &'static str {
        "PHONE_ALREADY_EXISTS"
    }

    async fn validate(&self, candidate: &IdentityDraft) -> Result<(), AuthError> {
        let Some(phone) = candidate.phone.as_deref() else {
            return Ok(());
        };

        if self.repo.exists_by_phone(phone, candidate.id).await? {
            return Err(ValidationFailure::new(
                self.code(),
                format!("phone '{phone}' is already registered"),
            )
            .into());
        }

        Ok(())
    }
}
