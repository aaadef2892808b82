//! Identity domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated principal.
///
/// The id is immutable from registration onward. Profile fields are
/// mutable elsewhere; identities are never deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Super-admin flag. Required for impersonation; re-checked against
    /// the backend whenever a transient impersonation marker is honored.
    pub privileged: bool,
    pub display_name: Option<String>,
    /// Arbitrary profile metadata, opaque to the session engine.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
