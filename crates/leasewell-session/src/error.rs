//! Session engine error types.

use leasewell_core::error::LeasewellError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The authentication provider rejected the credentials. Surfaced to
    /// the caller of `login`/`register`; the session stays Anonymous.
    #[error("authentication failed: {reason}")]
    AuthFailure { reason: String },

    /// Non-fatal: the session proceeds with an empty tenant list.
    #[error("tenancy lookup failed: {0}")]
    TenancyLookup(String),

    /// Non-fatal: tier and feature flags are treated as unknown.
    #[error("entitlement lookup failed: {0}")]
    EntitlementLookup(String),

    #[error("actor is not privileged to impersonate")]
    NotPrivileged,

    #[error("invalid impersonation target")]
    InvalidTarget,

    /// Fatal to the impersonation transition only: the transition rolls
    /// back rather than proceed unaudited.
    #[error("audit write failed: {0}")]
    AuditWrite(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<SessionError> for LeasewellError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AuthFailure { reason } => LeasewellError::AuthenticationFailed { reason },
            SessionError::NotPrivileged | SessionError::InvalidTarget => {
                LeasewellError::AuthorizationDenied {
                    reason: err.to_string(),
                }
            }
            SessionError::AuditWrite(msg) => LeasewellError::AuditWrite(msg),
            SessionError::TenancyLookup(msg)
            | SessionError::EntitlementLookup(msg)
            | SessionError::Backend(msg) => LeasewellError::Backend(msg),
        }
    }
}
