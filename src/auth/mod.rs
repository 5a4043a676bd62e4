pub mod claims;
pub mod codec;
pub mod credential;
pub mod extract;
pub mod session;

pub use claims::{Claims, Identity};
pub use codec::{TokenCodec, TokenError};
pub use credential::Credential;
pub use extract::AuthIdentity;
