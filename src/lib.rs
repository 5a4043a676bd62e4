//! Edge gateway for the rider platform.
//!
//! Terminates HTTP at the edge, verifies JWT credentials, manages session
//! cookies, and translates REST calls into gRPC requests against the auth
//! and payment backends. The [`rpc`] module additionally ships the guard
//! backends use to protect their own gRPC surface with the same tokens.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod rpc;
pub mod state;
