//! Aegis Identity Core - credential & session lifecycle engine
//!
//! The engineered heart of the Aegis identity service:
//! - Token issuance, validation, rotation and revocation
//! - Pluggable business-rule validation gating identity mutations
//! - Optimistic-concurrency mutation protocol over the identity store
//!
//! Everything here is transport-agnostic: operations take plain inputs and
//! return `Result<_, AuthError>`. The HTTP layer and the stores are external
//! collaborators.

pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod service;
pub mod session;
pub mod token;
pub mod validate;

pub use config::AuthConfig;
pub use crypto::{CredentialHasher, HashCostError};
pub use error::AuthError;
pub use identity::{
    normalize_email, normalize_phone, IdentityMutator, NewIdentity, UpdateProfile,
};
pub use service::{AuthService, AuthSession};
pub use session::{hash_token, SessionLedger};
pub use token::{TokenIssuer, REFRESH_TOKEN_BYTES};
pub use validate::{
    EmailUniqueness, IdentityDraft, IdentityValidator, PhoneUniqueness, ValidationFailure,
    ValidationPipeline,
};
