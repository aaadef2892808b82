//! Narrow key-value storage interface.
//!
//! Two instances are injected into the engine: a persisted store that
//! survives process restarts (tenant selection) and a transient store
//! that lives only for the process lifetime (impersonation markers).
//! Single-writer rule: only TenancyStore writes the persisted keys and
//! only ImpersonationController writes the transient ones.

/// String-keyed storage with get/set/clear semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn clear(&self);
}

/// Well-known storage keys.
pub mod keys {
    /// Persisted: last-selected tenant id (business-centric model).
    pub const CURRENT_BUSINESS_ID: &str = "currentBusinessId";
    /// Persisted: last-selected tenant id (organization model). Read as
    /// a fallback for selections written by older clients.
    pub const CURRENT_ORGANIZATION_ID: &str = "currentOrganizationId";
    /// Transient: target identity id of an active impersonation.
    pub const IMPERSONATING_USER_ID: &str = "impersonating_user_id";
    /// Transient: actor identity id, used for marker revalidation.
    pub const ADMIN_USER_ID: &str = "admin_user_id";
}
