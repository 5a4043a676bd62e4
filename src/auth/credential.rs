/// Name of the cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Name of the cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Bearer credential as presented by the caller, valid for one request.
///
/// `as_str` keeps the exact trimmed string (scheme prefix included) so it
/// can be forwarded verbatim as outbound call metadata; `token` strips the
/// `Bearer` prefix for local verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    raw: String,
}

impl Credential {
    /// Pull a credential out of an `Authorization` header value or an
    /// `access_token` cookie value. The header wins when both are present;
    /// the cookie is only consulted when the header is empty or absent.
    pub fn from_parts(header: Option<&str>, cookie: Option<&str>) -> Option<Self> {
        let raw = header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .or_else(|| cookie.map(str::trim).filter(|c| !c.is_empty()))?;
        if strip_bearer(raw).is_empty() {
            return None;
        }
        Some(Self { raw: raw.to_string() })
    }

    /// The credential exactly as presented, after trimming.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The token with any leading `Bearer` scheme removed.
    pub fn token(&self) -> &str {
        strip_bearer(&self.raw)
    }
}

fn strip_bearer(raw: &str) -> &str {
    raw.strip_prefix("Bearer").map(str::trim).unwrap_or(raw)
}
