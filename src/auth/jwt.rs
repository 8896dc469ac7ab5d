//! JWT issuance and verification.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{FinchatError, Result};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Issued at timestamp.
    pub iat: u64,
    /// Not valid before timestamp.
    pub nbf: u64,
    /// Expiration timestamp.
    pub exp: u64,
}

/// Identity established by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User ID.
    pub user_id: String,
    /// Display name.
    pub username: String,
}

/// Signs and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
}

impl JwtService {
    /// Create a new service from a secret key and token lifetime.
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_secs,
        }
    }

    /// Issue a token for a user.
    pub fn generate_token(&self, user_id: &str, username: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(self.expiry_secs),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| FinchatError::Auth(format!("failed to sign token: {e}")))
    }

    /// Verify a token and return the identity it carries.
    pub fn verify_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            FinchatError::Auth("invalid or expired token".to_string())
        })?;

        if data.claims.user_id.is_empty() {
            return Err(FinchatError::Auth("token has no user_id".to_string()));
        }

        Ok(AuthenticatedUser {
            user_id: data.claims.user_id,
            username: data.claims.username,
        })
    }
}
