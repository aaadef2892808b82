//! Error types shared across the Leasewell workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeasewellError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Audit write failed: {0}")]
    AuditWrite(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type LeasewellResult<T> = Result<T, LeasewellError>;
