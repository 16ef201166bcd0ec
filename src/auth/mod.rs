pub mod claims;
pub mod context;
pub mod jwks;
pub mod middleware;

pub use claims::Claims;
pub use context::{sha512_hex, AuthContext};
pub use jwks::TokenVerifier;
pub use middleware::{AccessToken, MaybeAuth, RequireAuth};
