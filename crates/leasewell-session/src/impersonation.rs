//! Impersonation — a privileged actor operating as another identity.
//!
//! Every entry and exit writes an audit record before the marker (and
//! therefore the visible identity) changes. If the audit write fails the
//! transition fails: impersonation without a trail is a worse outcome
//! than a denied attempt.

use std::sync::Arc;

use leasewell_core::backend::AuditLog;
use leasewell_core::kv::{KeyValueStore, keys};
use leasewell_core::models::{AuditAction, CreateAuditEntry, Identity, ImpersonationMarker};
use tracing::info;
use uuid::Uuid;

use crate::error::SessionError;

/// Controls impersonation transitions and owns the transient marker.
///
/// The marker survives only for the process lifetime by design: an
/// attacker with access to persisted storage alone cannot resume an
/// impersonation session.
pub struct ImpersonationController<A, K> {
    audit: Arc<A>,
    transient: Arc<K>,
}

impl<A: AuditLog, K: KeyValueStore> ImpersonationController<A, K> {
    pub fn new(audit: Arc<A>, transient: Arc<K>) -> Self {
        Self { audit, transient }
    }

    /// Begin impersonating `target`. The audit append happens first; the
    /// marker is only written once the entry is durable.
    pub async fn start(&self, actor: &Identity, target: &Identity) -> Result<(), SessionError> {
        if !actor.privileged {
            return Err(SessionError::NotPrivileged);
        }
        if actor.id == target.id {
            return Err(SessionError::InvalidTarget);
        }

        self.audit
            .append(CreateAuditEntry {
                admin_user_id: actor.id,
                action: AuditAction::ImpersonateUser,
                target_user_id: target.id,
                target_email: Some(target.email.clone()),
            })
            .await
            .map_err(|err| SessionError::AuditWrite(err.to_string()))?;

        self.write_marker(actor.id, target.id);
        info!(actor = %actor.id, target = %target.id, "impersonation started");
        Ok(())
    }

    /// End impersonation. Idempotent: with no active marker this is a
    /// no-op and writes no duplicate audit entry.
    pub async fn stop(&self, actor: &Identity, target: &Identity) -> Result<(), SessionError> {
        if self.active_marker().is_none() {
            return Ok(());
        }

        self.audit
            .append(CreateAuditEntry {
                admin_user_id: actor.id,
                action: AuditAction::ExitImpersonation,
                target_user_id: target.id,
                target_email: Some(target.email.clone()),
            })
            .await
            .map_err(|err| SessionError::AuditWrite(err.to_string()))?;

        self.clear_markers();
        info!(actor = %actor.id, target = %target.id, "impersonation ended");
        Ok(())
    }

    /// The transient marker, if both halves are present and parseable.
    /// A partially written or mangled marker reads as absent.
    pub fn active_marker(&self) -> Option<ImpersonationMarker> {
        let target_id = self
            .transient
            .get(keys::IMPERSONATING_USER_ID)
            .and_then(|raw| Uuid::parse_str(&raw).ok())?;
        let actor_id = self
            .transient
            .get(keys::ADMIN_USER_ID)
            .and_then(|raw| Uuid::parse_str(&raw).ok())?;
        Some(ImpersonationMarker {
            actor_id,
            target_id,
        })
    }

    /// Discard the marker without an audit entry. Used when revalidation
    /// rejects a stale or forged marker, and on sign-out teardown.
    pub fn clear_markers(&self) {
        self.transient.remove(keys::IMPERSONATING_USER_ID);
        self.transient.remove(keys::ADMIN_USER_ID);
    }

    fn write_marker(&self, actor_id: Uuid, target_id: Uuid) {
        self.transient
            .set(keys::IMPERSONATING_USER_ID, &target_id.to_string());
        self.transient.set(keys::ADMIN_USER_ID, &actor_id.to_string());
    }
}
