/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hands the verified request context (AuthCtx) to handlers
 * - axum plumbing lives in core, the type in types
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::AuthCtx;
