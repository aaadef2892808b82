//! Audit log domain model.
//!
//! Entries record privileged impersonation transitions. They are
//! append-only: no update or delete exists in this subsystem's contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ImpersonateUser,
    ExitImpersonation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub target_email: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// The privileged actor performing the transition.
    pub admin_user_id: Uuid,
    pub action: AuditAction,
    pub target_user_id: Uuid,
    pub metadata: AuditMetadata,
}

/// Fields required to append a new audit entry. The sink assigns the id
/// and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEntry {
    pub admin_user_id: Uuid,
    pub action: AuditAction,
    pub target_user_id: Uuid,
    pub target_email: Option<String>,
}
