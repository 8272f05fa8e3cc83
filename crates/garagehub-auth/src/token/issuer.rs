//! Access token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use garagehub_core::config::auth::AuthConfig;
use garagehub_core::error::AppError;
use garagehub_entity::user::{User, UserRole};

use crate::error::AuthError;

use super::claims::Claims;

/// A freshly issued access token together with its client-facing metadata.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedAccessToken {
    /// The signed token string.
    pub token: String,
    /// Seconds until expiry.
    pub expires_in: u64,
    /// The claims that were signed.
    pub claims: Claims,
}

/// Issues and verifies HS256-signed access tokens.
///
/// Verification is stateless by design: it checks signature and expiry
/// only, never revocation. Remember-me does not change the access-token
/// TTL; only the refresh token's lifetime is extended.
#[derive(Clone)]
pub struct TokenIssuer {
    /// HMAC key for signing.
    encoding_key: EncodingKey,
    /// HMAC key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
    /// Access token TTL in seconds.
    access_ttl_seconds: u64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .finish()
    }
}

impl TokenIssuer {
    /// Minimum accepted signing key length in bytes.
    pub const MIN_SECRET_LEN: usize = 32;

    /// Creates a new issuer from auth configuration.
    ///
    /// Fails if the signing secret is shorter than [`Self::MIN_SECRET_LEN`]
    /// bytes, so a weak or missing key stops the process at startup.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.jwt_secret.len() < Self::MIN_SECRET_LEN {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {} bytes",
                Self::MIN_SECRET_LEN
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            access_ttl_seconds: config.access_ttl_seconds,
        })
    }

    /// Issues a signed access token for the given user.
    pub fn issue_access(&self, user: &User) -> Result<IssuedAccessToken, AuthError> {
        self.issue_access_for(user.id, &user.email, &user.roles)
    }

    /// Issues a signed access token from raw identity parts.
    pub fn issue_access_for(
        &self,
        user_id: Uuid,
        email: &str,
        roles: &[UserRole],
    ) -> Result<IssuedAccessToken, AuthError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::seconds(self.access_ttl_seconds as i64);

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            roles: roles.to_vec(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok(IssuedAccessToken {
            token,
            expires_in: self.access_ttl_seconds,
            claims,
        })
    }

    /// Decodes and validates an access token string.
    ///
    /// Checks signature validity and expiry; does not check revocation.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::SignatureInvalid,
                }
            })?;

        Ok(token_data.claims)
    }

    /// The configured access token TTL in seconds.
    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl_seconds
    }
}
