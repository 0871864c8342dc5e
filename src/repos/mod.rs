pub mod consent_repo;
pub mod error;

pub use consent_repo::{CONSENT_STORAGE_KEY, ConsentStore, FileConsentStore, MemoryConsentStore};
