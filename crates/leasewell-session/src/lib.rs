//! Leasewell Session — identity, tenancy, and privilege resolution.
//!
//! This crate decides, at any moment, which authenticated identity is in
//! control, which tenant its data operations are scoped to, what
//! capability set that identity–tenant pair is allowed, and how a
//! privileged operator may temporarily assume another identity's context
//! with a compulsory audit trail.
//!
//! The engine is a convenience and UX layer: the backend's own row-level
//! enforcement remains the authoritative security boundary.

pub mod config;
pub mod entitlement;
pub mod error;
pub mod impersonation;
pub mod manager;
pub mod permissions;
pub mod tenancy;

pub use config::SessionConfig;
pub use entitlement::EntitlementResolver;
pub use error::SessionError;
pub use impersonation::ImpersonationController;
pub use manager::{AuthEvent, SessionContext, SessionManager, SessionState};
pub use permissions::resolve_capabilities;
pub use tenancy::TenancyStore;
