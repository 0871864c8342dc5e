//! CIAM demo client core.
//!
//! Login with OAuth2 authorization code + PKCE, a consent gate, identity
//! (profile) selection over deterministic customer data, simulated step-up
//! verification, and a client for the bearer-protected resource server.
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod repos;
pub mod services;
pub mod state;

pub use error::AppError;
pub use state::AppState;
