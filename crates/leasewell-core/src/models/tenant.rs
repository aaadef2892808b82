//! Tenant domain model.
//!
//! A tenant is a business/organization owning rental properties. All
//! record data in the wider application is scoped to a tenant; this
//! subsystem only reads tenants and tracks which one is current.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A business/organization that scopes data and memberships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable display name.
    pub name: String,
    /// The identity that created the tenant. Creation implies ownership
    /// in the business-centric model.
    pub created_by: Uuid,
    /// Preferred tenant when no persisted selection exists.
    pub is_default: bool,
    /// Public-page configuration, opaque to the session engine.
    pub public_page: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
