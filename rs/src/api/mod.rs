/*
 * Responsibility
 * - Public surface of the HTTP API (routes() re-export, extractors)
 */
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
