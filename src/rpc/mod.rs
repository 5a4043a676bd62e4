pub mod guard;

/// Generated protobuf bindings for the auth and payment backends.
pub mod pb {
    tonic::include_proto!("rider_auth");
}

pub use guard::{IdentityExt, RpcAuthLayer, RpcMethod};
