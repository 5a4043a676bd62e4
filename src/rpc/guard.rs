use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::{header::AUTHORIZATION, HeaderMap, HeaderValue, Request, Response};
use tonic::{
    body::{empty_body, BoxBody},
    Status,
};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::auth::{claims::Identity, codec::TokenCodec, credential::Credential};

/// Closed set of RPC operations exposed by the backend services.
///
/// The allow-list is matched against this enum rather than raw dispatch
/// strings so an audit of who may call without a token is a single `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    Register,
    Login,
    GetRiderDetails,
    CreateCheckoutSession,
}

impl RpcMethod {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/rider_auth.AuthService/Register" => Some(Self::Register),
            "/rider_auth.AuthService/Login" => Some(Self::Login),
            "/rider_auth.AuthService/GetRiderDetails" => Some(Self::GetRiderDetails),
            "/rider_auth.PaymentService/CreateCheckOutSession" => Some(Self::CreateCheckoutSession),
            _ => None,
        }
    }

    /// Login and registration are the only calls a tokenless caller may make.
    pub fn requires_auth(self) -> bool {
        !matches!(self, Self::Register | Self::Login)
    }
}

/// RPC ingress guard, attached to a tonic server as a tower layer.
///
/// Reads the credential from the `authorization` call metadata, verifies it
/// with the shared [`TokenCodec`] and attaches the resulting [`Identity`] to
/// the request before any operation runs. Allow-listed operations pass
/// through untouched. Unknown paths are treated as protected.
#[derive(Clone)]
pub struct RpcAuthLayer {
    codec: Arc<TokenCodec>,
}

impl RpcAuthLayer {
    pub fn new(codec: TokenCodec) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }
}

impl<S> Layer<S> for RpcAuthLayer {
    type Service = RpcAuthGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RpcAuthGuard {
            inner,
            codec: self.codec.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RpcAuthGuard<S> {
    inner: S,
    codec: Arc<TokenCodec>,
}

impl<S, B> Service<Request<B>> for RpcAuthGuard<S>
where
    S: Service<Request<B>, Response = Response<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response<BoxBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let needs_auth =
            RpcMethod::from_path(req.uri().path()).map_or(true, RpcMethod::requires_auth);
        if needs_auth {
            match authenticate(&self.codec, req.headers()) {
                Ok(identity) => {
                    debug!(subject_id = %identity.subject_id, "rpc caller authenticated");
                    req.extensions_mut().insert(identity);
                }
                Err(status) => return Box::pin(async move { Ok(reject(status)) }),
            }
        }
        Box::pin(async move { inner.call(req).await })
    }
}

fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<Identity, Status> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let credential = Credential::from_parts(header, None)
        .ok_or_else(|| Status::unauthenticated("missing authorization token"))?;
    match codec.verify(credential.token()) {
        Ok(claims) => Ok(Identity::from(claims)),
        Err(err) => {
            // Log the precise failure, report only a generic message.
            warn!(error = %err, "rpc token verification failed");
            Err(Status::unauthenticated("invalid or expired token"))
        }
    }
}

/// Trailers-only gRPC error response, short-circuiting the inner service.
fn reject(status: Status) -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/grpc"),
    );
    headers.insert("grpc-status", HeaderValue::from(status.code() as i32));
    if let Ok(message) = HeaderValue::from_str(status.message()) {
        headers.insert("grpc-message", message);
    }
    response
}

/// Access to the identity the guard attached to a call.
pub trait IdentityExt {
    fn identity(&self) -> Result<&Identity, Status>;
}

impl<T> IdentityExt for tonic::Request<T> {
    fn identity(&self) -> Result<&Identity, Status> {
        self.extensions()
            .get::<Identity>()
            .ok_or_else(|| Status::unauthenticated("no verified identity on call"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use time::Duration;
    use tonic::Code;
    use tower::{service_fn, ServiceExt};

    fn guard() -> RpcAuthLayer {
        RpcAuthLayer::new(TokenCodec::new("dev-secret"))
    }

    async fn echo(req: Request<()>) -> Result<Response<BoxBody>, Infallible> {
        let mut response = Response::new(empty_body());
        if let Some(identity) = req.extensions().get::<Identity>() {
            response.headers_mut().insert(
                "x-test-subject",
                HeaderValue::from_str(&identity.subject_id).expect("ascii subject"),
            );
        }
        response
            .headers_mut()
            .insert("x-test-reached", HeaderValue::from_static("1"));
        Ok(response)
    }

    fn request(path: &str, auth: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri(format!("http://localhost{path}"));
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(()).expect("request")
    }

    fn grpc_status(response: &Response<BoxBody>) -> Option<i32> {
        response
            .headers()
            .get("grpc-status")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }

    #[test]
    fn allow_list_is_closed() {
        assert_eq!(
            RpcMethod::from_path("/rider_auth.AuthService/Login"),
            Some(RpcMethod::Login)
        );
        assert!(!RpcMethod::Login.requires_auth());
        assert!(!RpcMethod::Register.requires_auth());
        assert!(RpcMethod::GetRiderDetails.requires_auth());
        assert!(RpcMethod::CreateCheckoutSession.requires_auth());
        assert_eq!(RpcMethod::from_path("/rider_auth.AuthService/LoginX"), None);
    }

    #[tokio::test]
    async fn allow_listed_methods_bypass_verification() {
        for path in [
            "/rider_auth.AuthService/Login",
            "/rider_auth.AuthService/Register",
        ] {
            let service = guard().layer(service_fn(echo));
            let response = service.oneshot(request(path, None)).await.expect("call");
            assert!(response.headers().contains_key("x-test-reached"), "{path}");
        }
    }

    #[tokio::test]
    async fn missing_token_fails_before_the_operation() {
        let service = guard().layer(service_fn(echo));
        let response = service
            .oneshot(request("/rider_auth.PaymentService/CreateCheckOutSession", None))
            .await
            .expect("call");
        assert!(!response.headers().contains_key("x-test-reached"));
        assert_eq!(grpc_status(&response), Some(Code::Unauthenticated as i32));
    }

    #[tokio::test]
    async fn invalid_token_is_reported_generically() {
        let token = TokenCodec::new("other-secret")
            .issue("a@b.com", "rider-42", Duration::hours(1))
            .expect("issue");
        let service = guard().layer(service_fn(echo));
        let response = service
            .oneshot(request(
                "/rider_auth.AuthService/GetRiderDetails",
                Some(&format!("Bearer {token}")),
            ))
            .await
            .expect("call");
        assert_eq!(grpc_status(&response), Some(Code::Unauthenticated as i32));
        let message = response
            .headers()
            .get("grpc-message")
            .and_then(|v| v.to_str().ok())
            .expect("message");
        assert_eq!(message, "invalid or expired token");
    }

    #[tokio::test]
    async fn valid_token_attaches_identity() {
        let token = TokenCodec::new("dev-secret")
            .issue("a@b.com", "rider-42", Duration::hours(1))
            .expect("issue");
        let service = guard().layer(service_fn(echo));
        let response = service
            .oneshot(request(
                "/rider_auth.AuthService/GetRiderDetails",
                Some(&format!("Bearer {token}")),
            ))
            .await
            .expect("call");
        let subject = response
            .headers()
            .get("x-test-subject")
            .and_then(|v| v.to_str().ok())
            .expect("subject");
        assert_eq!(subject, "rider-42");
    }

    #[tokio::test]
    async fn unknown_methods_require_a_token() {
        let service = guard().layer(service_fn(echo));
        let response = service
            .oneshot(request("/rider_auth.AuthService/DeleteRider", None))
            .await
            .expect("call");
        assert_eq!(grpc_status(&response), Some(Code::Unauthenticated as i32));
    }

    #[test]
    fn identity_ext_reads_extension() {
        let mut request = tonic::Request::new(());
        assert!(request.identity().is_err());
        request.extensions_mut().insert(Identity {
            subject_id: "rider-42".into(),
            email: "a@b.com".into(),
        });
        assert_eq!(request.identity().expect("identity").subject_id, "rider-42");
    }
}
