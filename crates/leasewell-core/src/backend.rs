//! Backend trait definitions for data access abstraction.
//!
//! The hosted backend is an external collaborator; these traits pin down
//! the exact query surface the session engine consumes. Every call is an
//! opaque remote operation that may fail independently — degraded-mode
//! handling is the caller's responsibility.

use uuid::Uuid;

use crate::error::LeasewellResult;
use crate::models::{
    audit::{AuditEntry, CreateAuditEntry},
    entitlement::{EntitlementRecord, PackageTier},
    identity::Identity,
    membership::MembershipRecord,
    tenant::Tenant,
};

/// Fields required to register a new identity.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub email: String,
    pub secret: String,
    pub display_name: Option<String>,
    /// Tier the registrant self-selected during onboarding, used as the
    /// entitlement fallback before any tenant exists.
    pub selected_tier: Option<PackageTier>,
}

/// The authentication provider boundary.
///
/// Credential storage and verification live entirely on the provider
/// side; the session engine only orchestrates around its results.
pub trait AuthProvider: Send + Sync {
    /// The identity behind an existing credential, if one is present at
    /// process start.
    fn current_identity(&self) -> impl Future<Output = LeasewellResult<Option<Identity>>> + Send;
    fn login(
        &self,
        email: &str,
        secret: &str,
    ) -> impl Future<Output = LeasewellResult<Identity>> + Send;
    fn register(
        &self,
        input: NewRegistration,
    ) -> impl Future<Output = LeasewellResult<Identity>> + Send;
    fn logout(&self) -> impl Future<Output = LeasewellResult<()>> + Send;
}

/// Subject of an entitlement lookup: the current tenant, or the identity
/// itself during onboarding before a tenant exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementSubject {
    Tenant(Uuid),
    Identity(Uuid),
}

/// The backend query surface consumed by the session engine.
pub trait Directory: Send + Sync {
    fn get_identity(&self, id: Uuid) -> impl Future<Output = LeasewellResult<Identity>> + Send;

    /// All tenants the identity owns or has a membership in, in backend
    /// order (the order matters: it is the last-resort current-tenant
    /// fallback).
    fn tenants_for_identity(
        &self,
        id: Uuid,
    ) -> impl Future<Output = LeasewellResult<Vec<Tenant>>> + Send;

    fn membership(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = LeasewellResult<Option<MembershipRecord>>> + Send;

    fn effective_entitlement(
        &self,
        subject: EntitlementSubject,
    ) -> impl Future<Output = LeasewellResult<Option<EntitlementRecord>>> + Send;

    /// Whether the identity is currently privileged (super-admin).
    /// Always re-checked at marker revalidation time, never trusted from
    /// stored state.
    fn check_privileged(&self, id: Uuid) -> impl Future<Output = LeasewellResult<bool>> + Send;

    /// Whether the identity belongs to the restricted property-owner
    /// class (hard `view_reports` ceiling).
    fn is_restricted_owner_class(
        &self,
        id: Uuid,
    ) -> impl Future<Output = LeasewellResult<bool>> + Send;
}

/// Append-only audit sink.
pub trait AuditLog: Send + Sync {
    /// Append a new audit entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditEntry,
    ) -> impl Future<Output = LeasewellResult<AuditEntry>> + Send;
}
