mod selector;
mod types;

pub use selector::ProfileSelector;
pub use types::{CustomerType, Identity, IdentityKind};
