//! Domain models for Leasewell.
//!
//! These are the core types shared across all crates. The session engine
//! computes over them; the store crate materializes them.

pub mod audit;
pub mod capability;
pub mod entitlement;
pub mod identity;
pub mod membership;
pub mod tenant;

pub use audit::{AuditAction, AuditEntry, AuditMetadata, CreateAuditEntry};
pub use capability::{Capability, CapabilitySet};
pub use entitlement::{Entitlement, EntitlementRecord, PackageTier};
pub use identity::Identity;
pub use membership::{ImpersonationMarker, Membership, MembershipRecord, Role};
pub use tenant::Tenant;
