use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    auth::{
        claims::Identity,
        codec::TokenCodec,
        credential::{Credential, ACCESS_TOKEN_COOKIE},
    },
    error::ApiError,
};

/// Extracts the raw bearer credential without verifying it.
///
/// Used by endpoints that only relay the credential to a backend which does
/// its own verification at the RPC boundary.
#[async_trait]
impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value());
        Credential::from_parts(header, cookie)
            .ok_or_else(|| ApiError::Unauthorized("missing authorization token".into()))
    }
}

/// HTTP ingress guard: extracts the credential, verifies it and hands the
/// verified identity to the handler. Runs fully before the handler body and
/// never touches the request body.
#[derive(Debug)]
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let credential = Credential::from_request_parts(parts, state).await?;
        let codec = TokenCodec::from_ref(state);
        let claims = codec.verify(credential.token()).map_err(|err| {
            warn!(error = %err, "token verification failed");
            ApiError::Unauthorized(format!("invalid or expired token: {err}"))
        })?;
        Ok(AuthIdentity(Identity::from(claims)))
    }
}
