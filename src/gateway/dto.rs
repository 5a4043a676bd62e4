use serde::{Deserialize, Serialize};

use crate::rpc::pb;

/// Request body for rider registration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: String,
    pub birth_month: String,
    pub birth_year: i64,
}

/// Request body for login.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public rider payload relayed to clients. Never carries the password the
/// wire-level `User` message reserves for registration.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub birth_month: String,
    pub birth_year: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<pb::User> for UserDto {
    fn from(user: pb::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            birth_month: user.birth_month,
            birth_year: user.birth_year,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response for registration, login and rider lookup.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub status: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDto>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Request body for creating a payment checkout session.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CreateCheckoutSessionRequest {
    pub estimated_price: f32,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub estimated_distance_km: f32,
    pub estimated_duration_min: i64,
    pub pickup_coords: Coordinates,
    pub dropoff_coords: Coordinates,
    pub rider_name: String,
    pub rider_age: i32,
    pub gender: String,
}

/// Structured payment failure relayed unmodified from the backend.
#[derive(Debug, Serialize)]
pub struct PaymentErrorDto {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stripe_code: String,
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutSessionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub checkout_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub payment_intent_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PaymentErrorDto>,
}
