use async_trait::async_trait;

use crate::artifact::{ArtifactRecord, RecordError};
use crate::policy::AqlQuery;

/// Errors from the remote artifact store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport failure before a response was received
    #[error("HTTP error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Store answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the store
        message: String,
    },
    /// Request could not be addressed to the store
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Response body could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    /// Response decoded but a record breaks the record contract
    #[error("Invalid artifact record: {0}")]
    Record(#[from] RecordError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Api { status: 404, .. })
    }
}

/// Session against the remote store, shared by every rule of a run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Read repository metadata; `Ok` means the repository exists
    async fn check_repository(&self, repo: &str) -> Result<(), StoreError>;

    /// Execute one `items.find(...)` request
    async fn find_items(&self, query: &AqlQuery) -> Result<Vec<ArtifactRecord>, StoreError>;
}
