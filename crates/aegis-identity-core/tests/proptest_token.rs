//! Property-based tests for tokens, hashing and normalization
//!
//! These tests verify:
//! - Issued access tokens roundtrip through verification
//! - Malformed tokens and hashes never cause panics
//! - Refresh tokens are opaque, fixed-entropy and collision-free
//! - Normalization is idempotent

mod common;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use aegis_db::UserRow;
use aegis_identity_core::{
    hash_token, normalize_email, normalize_phone, CredentialHasher, TokenIssuer,
    REFRESH_TOKEN_BYTES,
};

use common::test_config;

fn issuer() -> TokenIssuer {
    TokenIssuer::new(test_config())
}

fn user_row(email: &str, first_name: &str, last_name: &str) -> UserRow {
    UserRow {
        id: Uuid::new_v4(),
        email: email.to_string(),
        phone: None,
        password_hash: "$2b$12$unused".to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        display_name: None,
        date_of_birth: None,
        role: "user".to_string(),
        status: "active".to_string(),
        version: 1,
        password_history: vec![],
        deleted: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ============================================================================
// Access token properties
// ============================================================================

proptest! {
    /// Property: issued tokens always verify, and the claims match the input
    #[test]
    fn prop_access_token_roundtrips(
        email in "[a-z0-9._-]{1,20}@[a-z0-9-]{1,15}\\.[a-z]{2,4}",
        first_name in "[A-Za-z]{1,20}",
        last_name in "[A-Za-z]{1,20}",
    ) {
        let issuer = issuer();
        let user = user_row(&email, &first_name, &last_name);

        let token = issuer.issue_access(&user).unwrap();
        let claims = issuer.verify(&token).unwrap();

        prop_assert_eq!(claims.sub, user.id.to_string());
        prop_assert_eq!(claims.email, email);
        prop_assert_eq!(claims.given_name, first_name);
        prop_assert_eq!(claims.family_name, last_name);
        prop_assert!(claims.exp > claims.iat);
    }

    /// Property: arbitrary input never panics verification, and never passes
    #[test]
    fn prop_garbage_tokens_rejected(token in "[ -~]{0,120}") {
        let issuer = issuer();
        // Printable garbage is not a signed token
        prop_assert!(issuer.verify(&token).is_err());
    }

    /// Property: flipping any signature byte invalidates the token
    #[test]
    fn prop_tampered_signature_rejected(tamper in 0usize..16usize) {
        let issuer = issuer();
        let token = issuer.issue_access(&user_row("a@b.com", "A", "B")).unwrap();

        // Tamper inside the signature segment
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        let idx = sig_start + (tamper % (bytes.len() - sig_start));
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        prop_assert!(issuer.verify(&tampered).is_err());
    }
}

// ============================================================================
// Refresh token properties
// ============================================================================

proptest! {
    /// Property: refresh tokens decode to exactly the configured entropy and
    /// carry no embedded structure
    #[test]
    fn prop_refresh_tokens_opaque(_i in 0u8..20u8) {
        let token = issuer().issue_refresh();

        let decoded = URL_SAFE_NO_PAD.decode(&token).unwrap();
        prop_assert_eq!(decoded.len(), REFRESH_TOKEN_BYTES);
        prop_assert!(!token.contains('.'));
        prop_assert!(!token.contains('='));
    }
}

#[test]
fn refresh_tokens_do_not_collide() {
    let issuer = issuer();
    let mut seen = std::collections::HashSet::new();
    for _ in 0..1000 {
        assert!(seen.insert(issuer.issue_refresh()));
    }
}

// ============================================================================
// Digest and hashing properties
// ============================================================================

proptest! {
    /// Property: the ledger digest is deterministic and fixed-width
    #[test]
    fn prop_token_digest_stable(token in "[ -~]{0,100}") {
        let first = hash_token(&token);
        prop_assert_eq!(first.len(), 64);
        prop_assert_eq!(first, hash_token(&token));
    }

    /// Property: verifying arbitrary plaintext against arbitrary hash input
    /// never panics and never errors (malformed hashes are simply false)
    #[test]
    fn prop_credential_verify_total(
        plaintext in "[ -~]{0,60}",
        not_a_hash in "[ -~]{0,80}",
    ) {
        let hasher = CredentialHasher::new(CredentialHasher::MIN_COST).unwrap();
        prop_assert!(!hasher.verify(&plaintext, &not_a_hash));
    }
}

// ============================================================================
// Normalization properties
// ============================================================================

proptest! {
    /// Property: email normalization is idempotent and produces no
    /// uppercase or surrounding whitespace
    #[test]
    fn prop_normalize_email_idempotent(raw in "\\PC{0,40}") {
        let once = normalize_email(&raw);
        prop_assert_eq!(&once, &normalize_email(&once));
        prop_assert_eq!(&once, once.trim());
        prop_assert!(!once.chars().any(|c| c.is_ascii_uppercase()));
    }

    /// Property: phone normalization keeps only digits plus one leading '+'
    #[test]
    fn prop_normalize_phone_shape(raw in "\\PC{0,40}") {
        let once = normalize_phone(&raw);
        for (i, c) in once.chars().enumerate() {
            prop_assert!(c.is_ascii_digit() || (c == '+' && i == 0));
        }
        prop_assert_eq!(&once, &normalize_phone(&once));
    }
}
