pub mod access_jwt;
pub mod jwks;

pub use access_jwt::{AccessJwtError, AuthService, KeySource, VerifiedAccessToken};
pub use jwks::JwksCache;
