//! Access-token signing and refresh-token generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;

use aegis_db::UserRow;
use aegis_types::AccessClaims;

use crate::{AuthConfig, AuthError};

/// Entropy drawn for each refresh token (256 bits)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Stateless signer and verifier of access tokens, and generator of opaque
/// refresh-token values.
///
/// Access tokens are HS256-signed claim sets; refresh tokens carry no
/// structure at all and are only meaningful to the session ledger.
#[derive(Clone)]
pub struct TokenIssuer {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    /// Create a new token issuer
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.token_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.token_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Sign an access token for the given identity
    pub fn issue_access(&self, user: &UserRow) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            role: user.role.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now,
            exp: now + self.config.access_ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("access token signing failed: {}", e);
            AuthError::Internal("access token signing failed".to_string())
        })
    }

    /// Generate an opaque refresh-token value.
    ///
    /// 256 bits from the OS RNG, base64url-encoded without padding. The
    /// value embeds no claims; clients cannot introspect it.
    pub fn issue_refresh(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Verify an access token and return its claims.
    ///
    /// Signature, issuer, audience and expiry are all checked with zero
    /// leeway. Every failure collapses into the single invalid outcome;
    /// the subtype is visible only in the debug log.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.leeway = 0;

        match decode::<AccessClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                tracing::debug!("access token rejected: {}", e);
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Extract a single claim from a verified token
    pub fn extract_claim(&self, token: &str, name: &str) -> Option<serde_json::Value> {
        let claims = self.verify(token).ok()?;
        serde_json::to_value(claims).ok()?.get(name).cloned()
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig::new("test-secret-test-secret-test-secret!", "aegis", "aegis-api")
    }

    fn user_row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            phone: None,
            password_hash: "$2b$12$unused".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Doe".to_string(),
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

    #[test]
    fn test_issue_verify_roundtrip() {
        let issuer = TokenIssuer::new(config());
        let user = user_row();

        let token = issuer.issue_access(&user).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.given_name, "Alice");
        assert_eq!(claims.family_name, "Doe");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.iss, "aegis");
        assert_eq!(claims.aud, "aegis-api");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::new(config());
        let other = TokenIssuer::new(AuthConfig::new(
            "other-secret-other-secret-other-sec!",
            "aegis",
            "aegis-api",
        ));

        let token = issuer.issue_access(&user_row()).unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let issuer = TokenIssuer::new(config());
        let other = TokenIssuer::new(AuthConfig::new(
            "test-secret-test-secret-test-secret!",
            "aegis",
            "someone-else",
        ));

        let token = issuer.issue_access(&user_row()).unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(config());
        let user = user_row();

        // Hand-craft an already-expired claim set with the right secret
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            role: user.role.clone(),
            iss: "aegis".to_string(),
            aud: "aegis-api".to_string(),
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config().token_secret.as_bytes()),
        )
        .unwrap();

        // Expiry collapses into the same invalid outcome as any other failure
        assert!(matches!(issuer.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let issuer = TokenIssuer::new(config());
        assert!(matches!(issuer.verify(""), Err(AuthError::InvalidToken)));
        assert!(matches!(
            issuer.verify("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_refresh_token_is_opaque() {
        let issuer = TokenIssuer::new(config());
        let token = issuer.issue_refresh();

        // 256 bits, base64url, no padding, no embedded structure
        let decoded = URL_SAFE_NO_PAD.decode(&token).unwrap();
        assert_eq!(decoded.len(), REFRESH_TOKEN_BYTES);
        assert!(!token.contains('.'));
        assert!(!token.contains('='));

        // Two generations never collide
        assert_ne!(token, issuer.issue_refresh());
    }

    #[test]
    fn test_extract_claim() {
        let issuer = TokenIssuer::new(config());
        let token = issuer.issue_access(&user_row()).unwrap();

        assert_eq!(
            issuer.extract_claim(&token, "email").unwrap(),
            serde_json::json!("alice@example.com")
        );
        assert!(issuer.extract_claim(&token, "no_such_claim").is_none());
        assert!(issuer.extract_claim("garbage", "email").is_none());
    }
}
