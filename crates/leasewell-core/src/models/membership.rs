//! Membership domain model — the (Identity, Tenant) → Role relation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tenant::Tenant;

/// Closed role set. Unknown roles coming off the wire fail
/// deserialization rather than silently mapping to a stringly value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    PropertyManager,
    Accounting,
    Viewer,
}

/// The domain-level membership relation.
///
/// `role` is `None` when the backend record carries no explicit role and
/// the identity is not the tenant's creator; the permission engine treats
/// that as default-deny.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub identity_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Option<Role>,
}

/// Raw membership row as returned by the backend, including bookkeeping
/// fields the domain model does not carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub tenant_id: Uuid,
    /// Absent in the simplified business-centric model, where ownership
    /// alone implies `owner`.
    pub role: Option<Role>,
    pub invited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MembershipRecord {
    /// Explicit DTO-to-domain mapping. The effective role falls back to
    /// `Owner` when the identity created the tenant.
    pub fn into_domain(self, tenant: &Tenant) -> Membership {
        let role = self
            .role
            .or_else(|| (self.identity_id == tenant.created_by).then_some(Role::Owner));
        Membership {
            identity_id: self.identity_id,
            tenant_id: self.tenant_id,
            role,
        }
    }
}

/// Transient impersonation marker: which actor is operating as which
/// target. Lives only in process-lifetime storage, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationMarker {
    pub actor_id: Uuid,
    pub target_id: Uuid,
}
