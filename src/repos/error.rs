use thiserror::Error;

/// Local persistence errors.
///
/// Kept apart from `ConsentError` so the gate can decide between fail-open and fail-closed.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
