//! Resource server for the CIAM demo: `/public` for everyone, `/protected`
//! for requests carrying a valid bearer access token.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
