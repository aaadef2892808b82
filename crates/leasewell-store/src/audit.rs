//! In-memory append-only audit log.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use leasewell_core::backend::AuditLog;
use leasewell_core::error::LeasewellResult;
use leasewell_core::models::{AuditEntry, AuditMetadata, CreateAuditEntry};
use uuid::Uuid;

/// Append-only in-memory audit sink. Entries are never updated or
/// removed; `entries()` returns a snapshot in append order.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit log poisoned").clone()
    }
}

impl AuditLog for MemoryAuditLog {
    async fn append(&self, input: CreateAuditEntry) -> LeasewellResult<AuditEntry> {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            admin_user_id: input.admin_user_id,
            action: input.action,
            target_user_id: input.target_user_id,
            metadata: AuditMetadata {
                target_email: input.target_email,
                timestamp: Utc::now(),
            },
        };
        self.entries
            .lock()
            .expect("audit log poisoned")
            .push(entry.clone());
        Ok(entry)
    }
}
