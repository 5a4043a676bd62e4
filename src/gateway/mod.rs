pub mod auth;
pub mod dto;
pub mod payment;

use tracing::{error, warn};

use crate::error::ApiError;

pub(crate) async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Map a failed outbound RPC to an API error. A gRPC `Unauthenticated`
/// status is the backend guard rejecting the forwarded credential and stays
/// a 401; anything else is a transport failure.
pub(crate) fn map_transport_error(status: tonic::Status) -> ApiError {
    if status.code() == tonic::Code::Unauthenticated {
        warn!(error = %status, "backend rejected credential");
        ApiError::Unauthorized("invalid or expired token".into())
    } else {
        error!(error = %status, "rpc transport failure");
        ApiError::internal("backend call failed", status.message())
    }
}
