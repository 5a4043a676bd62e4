use serde::{Deserialize, Serialize};

/// JWT payload carried by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // rider ID
    pub email: String,
    pub iat: i64, // issued at (unix timestamp)
    pub nbf: i64, // not valid before
    pub exp: i64, // expires at
}

/// Verified caller identity for a single request.
///
/// The same value is threaded through both layers: the HTTP guard hands it
/// to handlers via the `AuthIdentity` extractor, the RPC guard inserts it
/// into the call's request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            email: claims.email,
        }
    }
}
