//! Leasewell Core — domain models and backend abstractions.
//!
//! This crate holds the types shared across the workspace: the identity,
//! tenancy, and entitlement domain models, the shared error type, the
//! abstract backend query surface ([`AuthProvider`], [`Directory`],
//! [`AuditLog`]), and the [`KeyValueStore`] interface wrapping client-side
//! persisted and transient storage.
//!
//! The hosted relational backend itself is an external collaborator; this
//! crate only specifies its interface boundary.

pub mod backend;
pub mod error;
pub mod kv;
pub mod models;

pub use backend::{AuditLog, AuthProvider, Directory, EntitlementSubject, NewRegistration};
pub use error::{LeasewellError, LeasewellResult};
pub use kv::{KeyValueStore, keys};
