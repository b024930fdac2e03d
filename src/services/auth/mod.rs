pub mod authorizer;
pub mod error;
pub mod factory;
pub mod header;
pub mod jwks;
pub mod key_cache;

pub use authorizer::{Authorizer, AuthorizerSettings, TokenClaims};
pub use error::AuthError;
pub use factory::build_authorizer;
pub use jwks::{HttpKeySetSource, KeySetError, KeySetSource, RetryPolicy};
pub use key_cache::KeySetCache;
