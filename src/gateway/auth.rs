use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use tonic::metadata::AsciiMetadataValue;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{session, Credential},
    error::{http_status, ApiError, ErrorResponse},
    gateway::{
        dto::{AuthResponse, LoginRequest, RegisterRequest, UserDto},
        map_transport_error, method_not_allowed,
    },
    rpc::pb,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register).fallback(method_not_allowed))
        .route("/api/auth/login", post(login).fallback(method_not_allowed))
        .route("/api/auth/rider", get(rider_details).fallback(method_not_allowed))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_lowercase();

    let mut missing = Vec::new();
    if payload.email.is_empty() {
        missing.push("email");
    }
    if payload.password.is_empty() {
        missing.push("password");
    }
    if payload.full_name.trim().is_empty() {
        missing.push("full_name");
    }
    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("invalid email"));
    }

    let request = pb::RegisterRequest {
        user: Some(pb::User {
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
            phone_number: payload.phone_number,
            birth_month: payload.birth_month,
            birth_year: payload.birth_year,
            ..Default::default()
        }),
    };

    let response = state
        .auth
        .clone()
        .register(request)
        .await
        .map_err(|status| {
            error!(error = %status, "register rpc failed");
            ApiError::internal("failed to register rider", status.message())
        })?
        .into_inner();

    let pb::AuthResponse {
        success,
        message,
        status,
        user,
        token,
    } = response;

    if !success {
        let code = http_status(status, StatusCode::BAD_REQUEST);
        warn!(%message, "registration rejected by auth service");
        return Ok((code, Json(ErrorResponse::new(code, message))).into_response());
    }

    let tokens = token.ok_or_else(|| ApiError::Internal {
        message: "auth service response missing session tokens".into(),
        detail: None,
    })?;
    let jar = session::establish(
        jar,
        &tokens.token_type,
        &tokens.access_token,
        &tokens.refresh_token,
    );

    info!("rider registered");
    let code = http_status(status, StatusCode::CREATED);
    let body = AuthResponse {
        success,
        message,
        status,
        user: user.map(UserDto::from),
    };
    Ok((code, jar, Json(body)).into_response())
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_lowercase();

    let mut missing = Vec::new();
    if payload.email.is_empty() {
        missing.push("email");
    }
    if payload.password.is_empty() {
        missing.push("password");
    }
    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let request = pb::LoginRequest {
        email: payload.email,
        password: payload.password,
    };

    let response = state
        .auth
        .clone()
        .login(request)
        .await
        .map_err(|status| {
            error!(error = %status, "login rpc failed");
            ApiError::internal("failed to login", status.message())
        })?
        .into_inner();

    let pb::AuthResponse {
        success,
        message,
        status,
        user,
        token,
    } = response;

    if !success {
        // Drop any stale session the client may still hold.
        let jar = session::clear(jar);
        let code = http_status(status, StatusCode::UNAUTHORIZED);
        warn!(%message, "login rejected by auth service");
        return Ok((code, jar, Json(ErrorResponse::new(code, message))).into_response());
    }

    let tokens = token.ok_or_else(|| ApiError::Internal {
        message: "auth service response missing session tokens".into(),
        detail: None,
    })?;
    let jar = session::establish(
        jar,
        &tokens.token_type,
        &tokens.access_token,
        &tokens.refresh_token,
    );

    info!("rider logged in");
    let code = http_status(status, StatusCode::OK);
    let body = AuthResponse {
        success,
        message,
        status,
        user: user.map(UserDto::from),
    };
    Ok((code, jar, Json(body)).into_response())
}

/// Relays the caller's credential to the auth backend, whose own ingress
/// guard verifies it and resolves the rider from the token.
#[instrument(skip_all)]
pub async fn rider_details(
    State(state): State<AppState>,
    credential: Credential,
) -> Result<Response, ApiError> {
    let mut request = tonic::Request::new(pb::GetRiderDetailsRequest::default());
    let value = credential
        .as_str()
        .parse::<AsciiMetadataValue>()
        .map_err(|_| ApiError::Unauthorized("invalid authorization token".into()))?;
    request.metadata_mut().insert("authorization", value);

    let response = state
        .auth
        .clone()
        .get_rider_details(request)
        .await
        .map_err(map_transport_error)?
        .into_inner();

    let pb::GetRiderDetailsResponse {
        success,
        message,
        status,
        user,
    } = response;
    let code = http_status(status, StatusCode::OK);
    let body = AuthResponse {
        success,
        message,
        status,
        user: user.map(UserDto::from),
    };
    Ok((code, Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, gateway::testing};
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::{Response as TonicResponse, Status};
    use tower::ServiceExt;

    #[derive(Clone)]
    struct MockAuth;

    #[tonic::async_trait]
    impl pb::auth_service_server::AuthService for MockAuth {
        async fn register(
            &self,
            request: tonic::Request<pb::RegisterRequest>,
        ) -> Result<TonicResponse<pb::AuthResponse>, Status> {
            let user = request.into_inner().user.unwrap_or_default();
            Ok(TonicResponse::new(pb::AuthResponse {
                success: true,
                message: "registered".into(),
                status: 201,
                user: Some(pb::User {
                    id: "rider-42".into(),
                    email: user.email,
                    full_name: user.full_name,
                    ..Default::default()
                }),
                token: Some(pb::Tokens {
                    access_token: "acc.jwt".into(),
                    refresh_token: "ref.jwt".into(),
                    token_type: "Bearer".into(),
                }),
            }))
        }

        async fn login(
            &self,
            request: tonic::Request<pb::LoginRequest>,
        ) -> Result<TonicResponse<pb::AuthResponse>, Status> {
            let req = request.into_inner();
            if req.password == "correct" {
                Ok(TonicResponse::new(pb::AuthResponse {
                    success: true,
                    message: "welcome back".into(),
                    status: 200,
                    user: Some(pb::User {
                        id: "rider-42".into(),
                        email: req.email,
                        ..Default::default()
                    }),
                    token: Some(pb::Tokens {
                        access_token: "acc.jwt".into(),
                        refresh_token: "ref.jwt".into(),
                        token_type: "Bearer".into(),
                    }),
                }))
            } else {
                Ok(TonicResponse::new(pb::AuthResponse {
                    success: false,
                    message: "invalid credentials".into(),
                    status: 401,
                    user: None,
                    token: None,
                }))
            }
        }

        async fn get_rider_details(
            &self,
            request: tonic::Request<pb::GetRiderDetailsRequest>,
        ) -> Result<TonicResponse<pb::GetRiderDetailsResponse>, Status> {
            match request
                .metadata()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
            {
                None => return Err(Status::unauthenticated("missing authorization token")),
                Some("Bearer bad.jwt") => {
                    return Err(Status::unauthenticated("invalid or expired token"))
                }
                Some(_) => {}
            }
            Ok(TonicResponse::new(pb::GetRiderDetailsResponse {
                success: true,
                message: "ok".into(),
                status: 200,
                user: Some(pb::User {
                    id: "rider-42".into(),
                    email: "a@b.com".into(),
                    ..Default::default()
                }),
            }))
        }
    }

    async fn spawn_backend() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(pb::auth_service_server::AuthServiceServer::new(MockAuth))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .expect("serve mock backend");
        });
        addr
    }

    async fn app_with_backend() -> axum::Router {
        let addr = spawn_backend().await;
        let state = testing::state_with(&format!("http://{addr}"), "http://127.0.0.1:1");
        build_app(state).expect("app")
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn max_age_of(cookie: &str) -> i64 {
        cookie
            .split("Max-Age=")
            .nth(1)
            .and_then(|rest| rest.split(';').next())
            .and_then(|v| v.trim().parse().ok())
            .expect("Max-Age attribute")
    }

    fn set_cookies(response: &axum::response::Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().expect("ascii cookie").to_string())
            .collect()
    }

    #[tokio::test]
    async fn register_sets_session_cookies() {
        let app = app_with_backend().await;
        let response = app
            .oneshot(post_json(
                "/api/auth/register",
                r#"{"email":"a@b.com","password":"x","full_name":"A B"}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=Bearer acc.jwt")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=Bearer ref.jwt")));

        let body = response.into_body().collect().await.expect("body").to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["success"], true);
        assert_eq!(json["user"]["id"], "rider-42");
    }

    #[tokio::test]
    async fn register_with_missing_fields_never_reaches_backend() {
        let app = build_app(testing::disconnected_state()).expect("app");
        let response = app
            .oneshot(post_json("/api/auth/register", r#"{"email":"a@b.com"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.expect("body").to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["success"], false);
        let message = json["message"].as_str().expect("message");
        assert!(message.contains("password"));
        assert!(message.contains("full_name"));
    }

    #[tokio::test]
    async fn failed_login_clears_session_cookies() {
        let app = app_with_backend().await;
        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email":"a@b.com","password":"wrong"}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookies = set_cookies(&response);
        let access = cookies
            .iter()
            .find(|c| c.starts_with("access_token="))
            .expect("access cookie");
        assert!(access.starts_with("access_token=;"));
        assert!(max_age_of(access) <= 0);
        let refresh = cookies
            .iter()
            .find(|c| c.starts_with("refresh_token="))
            .expect("refresh cookie");
        assert!(refresh.starts_with("refresh_token=;"));
        assert!(max_age_of(refresh) <= 0);

        let body = response.into_body().collect().await.expect("body").to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn successful_login_sets_session_cookies() {
        let app = app_with_backend().await;
        let response = app
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email":"a@b.com","password":"correct"}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=Bearer acc.jwt")));
    }

    #[tokio::test]
    async fn rider_details_forwards_credential() {
        let app = app_with_backend().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/rider")
                    .header(header::AUTHORIZATION, "Bearer some.jwt")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.expect("body").to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["user"]["id"], "rider-42");
    }

    #[tokio::test]
    async fn rider_details_transport_failure_is_internal_error() {
        // Credential present, but the auth endpoint is unroutable, so the
        // outbound RPC itself fails.
        let app = build_app(testing::disconnected_state()).expect("app");
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/rider")
                    .header(header::AUTHORIZATION, "Bearer some.jwt")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.expect("body").to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "backend call failed");
        assert_eq!(json["status"], 500);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn rider_details_backend_rejection_is_unauthorized() {
        let app = app_with_backend().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/rider")
                    .header(header::AUTHORIZATION, "Bearer bad.jwt")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.expect("body").to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "invalid or expired token");
    }

    #[tokio::test]
    async fn rider_details_without_credential_is_unauthorized() {
        let app = build_app(testing::disconnected_state()).expect("app");
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/rider")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_verb_is_method_not_allowed() {
        let app = build_app(testing::disconnected_state()).expect("app");
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/register")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
    }
}
