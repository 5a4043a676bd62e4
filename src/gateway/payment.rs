use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tonic::metadata::AsciiMetadataValue;
use tracing::{info, instrument, warn};

use crate::{
    auth::{AuthIdentity, Credential},
    error::{http_status, ApiError},
    gateway::{
        dto::{CreateCheckoutSessionRequest, CreateCheckoutSessionResponse, PaymentErrorDto},
        map_transport_error, method_not_allowed,
    },
    rpc::pb,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/payment/create-checkout-session",
        post(create_checkout_session).fallback(method_not_allowed),
    )
}

/// Gated by the HTTP ingress guard: the rider identity comes from the
/// verified token, never from the client body. The original credential is
/// forwarded so the payment backend's guard re-verifies it.
#[instrument(skip_all)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    credential: Credential,
    payload: Result<Json<CreateCheckoutSessionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;

    if payload.estimated_price <= 0.0 {
        return Err(ApiError::bad_request(
            "estimated_price must be greater than 0",
        ));
    }

    let body = pb::CreateCheckOutSessionRequest {
        rider_id: identity.subject_id.clone(),
        rider_name: payload.rider_name,
        rider_age: payload.rider_age,
        gender: payload.gender,
        estimated_price: payload.estimated_price,
        pickup_location: payload.pickup_location,
        dropoff_location: payload.dropoff_location,
        estimated_distance_km: payload.estimated_distance_km,
        estimated_duration_min: payload.estimated_duration_min,
        pickup_coords_lat_lng: Some(pb::Coordinates {
            lat: payload.pickup_coords.lat,
            lng: payload.pickup_coords.lng,
        }),
        dropoff_coords_lat_lng: Some(pb::Coordinates {
            lat: payload.dropoff_coords.lat,
            lng: payload.dropoff_coords.lng,
        }),
    };

    let mut request = tonic::Request::new(body);
    let value = credential
        .as_str()
        .parse::<AsciiMetadataValue>()
        .map_err(|_| ApiError::Unauthorized("invalid authorization token".into()))?;
    request.metadata_mut().insert("authorization", value);

    let response = state
        .payment
        .clone()
        .create_check_out_session(request)
        .await
        .map_err(map_transport_error)?
        .into_inner();

    let pb::CreateCheckOutSessionResponse {
        success,
        checkout_url,
        session_id,
        payment_intent_id,
        status,
        error,
    } = response;
    let error = error.map(|e| PaymentErrorDto {
        code: e.code,
        message: e.message,
        stripe_code: e.stripe_code,
    });

    let code = if success {
        info!(rider_id = %identity.subject_id, "checkout session created");
        StatusCode::OK
    } else {
        warn!(rider_id = %identity.subject_id, "checkout session declined");
        // Honor a provider-reported HTTP error code when it is one.
        match error.as_ref() {
            Some(e) if (400..=599).contains(&e.code) => {
                http_status(i64::from(e.code), StatusCode::BAD_REQUEST)
            }
            _ => StatusCode::BAD_REQUEST,
        }
    };

    let body = CreateCheckoutSessionResponse {
        success,
        checkout_url,
        session_id,
        payment_intent_id,
        status,
        error,
    };
    Ok((code, Json(body)).into_response())
}
