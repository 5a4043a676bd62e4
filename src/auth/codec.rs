use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, state::AppState};

/// Why a token failed verification.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("malformed token")]
    Malformed,
    #[error("token could not be signed")]
    Signing,
}

/// Signs and verifies identity tokens with a single shared HS256 secret.
///
/// The secret is injected at construction time; every process that mints or
/// verifies tokens (this gateway and the backend RPC servers) must be
/// configured with the same value.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.secret_key)
    }
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a signed token valid from now until `now + ttl`.
    pub fn issue(&self, email: &str, subject_id: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl.whole_seconds(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)?;
        debug!(subject_id = %subject_id, "jwt signed");
        Ok(token)
    }

    /// Verify signature and time bounds, returning the embedded claims.
    ///
    /// Only HS256 is accepted; a token signed with any other algorithm or
    /// any other secret fails with `InvalidSignature`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                _ => TokenError::Malformed,
            }
        })?;
        debug!(subject_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
