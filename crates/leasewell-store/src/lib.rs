//! Leasewell Store — in-memory implementations of the core traits.
//!
//! The hosted backend and the browser's storage layer are external to
//! this workspace; these implementations stand in for them in tests and
//! in the server binary. Each type is cheaply cloneable and shares its
//! state across clones, mirroring how handles to the real backends
//! behave.

mod audit;
mod directory;
mod memory;
mod provider;

pub use audit::MemoryAuditLog;
pub use directory::MemoryDirectory;
pub use memory::MemoryKeyValueStore;
pub use provider::MemoryAuthProvider;
