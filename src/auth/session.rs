use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::auth::credential::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

pub const ACCESS_COOKIE_TTL: Duration = Duration::days(3);
pub const REFRESH_COOKIE_TTL: Duration = Duration::days(7);

fn scoped(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .build()
}

/// Attach the session pair minted by the auth backend as scoped cookies.
pub fn establish(
    jar: CookieJar,
    token_type: &str,
    access_token: &str,
    refresh_token: &str,
) -> CookieJar {
    jar.add(scoped(
        ACCESS_TOKEN_COOKIE,
        format!("{token_type} {access_token}"),
        ACCESS_COOKIE_TTL,
    ))
    .add(scoped(
        REFRESH_TOKEN_COOKIE,
        format!("{token_type} {refresh_token}"),
        REFRESH_COOKIE_TTL,
    ))
}

/// Overwrite both session cookies with empty values and a negative max-age
/// so stale cookies are dropped client-side.
pub fn clear(jar: CookieJar) -> CookieJar {
    jar.add(scoped(ACCESS_TOKEN_COOKIE, String::new(), -ACCESS_COOKIE_TTL))
        .add(scoped(REFRESH_TOKEN_COOKIE, String::new(), -REFRESH_COOKIE_TTL))
}
