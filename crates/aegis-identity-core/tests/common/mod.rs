//! Shared test fixtures

// Not every test binary exercises every fixture
#![allow(dead_code)]

pub mod mock_repos;

pub use mock_repos::{MockSessionRepository, MockUserRepository};

use aegis_identity_core::{AuthConfig, NewIdentity};

/// A config every test can start from
pub fn test_config() -> AuthConfig {
    AuthConfig::new(
        "test-secret-that-is-long-enough-0123456789",
        "aegis",
        "aegis-api",
    )
}

/// A registration input with sensible defaults
pub fn new_identity(email: &str, password: &str) -> NewIdentity {
    NewIdentity {
        email: email.to_string(),
        password: password.to_string(),
        first_name: "Alice".to_string(),
        last_name: "Doe".to_string(),
        display_name: None,
        date_of_birth: None,
        phone: None,
    }
}
