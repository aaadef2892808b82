//! Tenancy resolution and current-tenant bookkeeping.

use std::sync::Arc;

use leasewell_core::backend::Directory;
use leasewell_core::kv::{KeyValueStore, keys};
use leasewell_core::models::Tenant;
use tracing::debug;
use uuid::Uuid;

use crate::error::SessionError;

/// Resolves which tenants an identity belongs to and which one is
/// current, persisting the selection across process restarts.
///
/// Single writer of the persisted selection keys; everything else treats
/// them as read-only.
pub struct TenancyStore<D, K> {
    directory: Arc<D>,
    persisted: Arc<K>,
}

impl<D: Directory, K: KeyValueStore> TenancyStore<D, K> {
    pub fn new(directory: Arc<D>, persisted: Arc<K>) -> Self {
        Self {
            directory,
            persisted,
        }
    }

    /// All tenants the identity owns or has a membership in. Failure is
    /// non-fatal for session resolution: the caller degrades to an empty
    /// tenant list.
    pub async fn load_tenants(&self, identity_id: Uuid) -> Result<Vec<Tenant>, SessionError> {
        self.directory
            .tenants_for_identity(identity_id)
            .await
            .map_err(|err| SessionError::TenancyLookup(err.to_string()))
    }

    /// Selection order: persisted id if still present, then the tenant
    /// flagged default, then the first tenant in backend order. `None`
    /// with an empty list is a valid, fully authenticated tenant-less
    /// state.
    pub fn resolve_current(&self, tenants: &[Tenant]) -> Option<Tenant> {
        if let Some(id) = self.persisted_selection() {
            if let Some(tenant) = tenants.iter().find(|t| t.id == id) {
                return Some(tenant.clone());
            }
            debug!(%id, "persisted tenant selection no longer applies");
        }
        tenants
            .iter()
            .find(|t| t.is_default)
            .or_else(|| tenants.first())
            .cloned()
    }

    /// Validate a switch target against the loaded tenant list and
    /// persist it. The caller recomputes capabilities and entitlement
    /// before publishing, so consumers never observe a mixed state.
    pub fn select(&self, tenants: &[Tenant], tenant_id: Uuid) -> Result<Tenant, SessionError> {
        let tenant = tenants
            .iter()
            .find(|t| t.id == tenant_id)
            .cloned()
            .ok_or_else(|| {
                SessionError::TenancyLookup(format!(
                    "identity has no membership in tenant {tenant_id}"
                ))
            })?;
        self.persist_selection(tenant_id);
        Ok(tenant)
    }

    /// The persisted selection, reading the business-centric key first
    /// and the organization-model key written by older clients second.
    fn persisted_selection(&self) -> Option<Uuid> {
        self.persisted
            .get(keys::CURRENT_BUSINESS_ID)
            .or_else(|| self.persisted.get(keys::CURRENT_ORGANIZATION_ID))
            .and_then(|raw| Uuid::parse_str(&raw).ok())
    }

    fn persist_selection(&self, tenant_id: Uuid) {
        let raw = tenant_id.to_string();
        self.persisted.set(keys::CURRENT_BUSINESS_ID, &raw);
        self.persisted.set(keys::CURRENT_ORGANIZATION_ID, &raw);
    }

    /// Drop the persisted selection (sign-out, expiry).
    pub fn clear_selection(&self) {
        self.persisted.remove(keys::CURRENT_BUSINESS_ID);
        self.persisted.remove(keys::CURRENT_ORGANIZATION_ID);
    }
}
