//! In-memory [`Directory`] with a fixture-staging API.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use leasewell_core::backend::{Directory, EntitlementSubject};
use leasewell_core::error::{LeasewellError, LeasewellResult};
use leasewell_core::models::{
    EntitlementRecord, Identity, MembershipRecord, Role, Tenant,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct DirectoryData {
    identities: HashMap<Uuid, Identity>,
    /// Insertion order preserved: backend order is the last-resort
    /// current-tenant fallback.
    tenants: Vec<Tenant>,
    memberships: Vec<MembershipRecord>,
    tenant_entitlements: HashMap<Uuid, EntitlementRecord>,
    identity_entitlements: HashMap<Uuid, EntitlementRecord>,
    privileged: HashSet<Uuid>,
    restricted_owners: HashSet<Uuid>,
}

/// In-memory backend directory. Stands in for the hosted relational
/// backend's query surface.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<Mutex<DirectoryData>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_identity(&self, identity: Identity) {
        let mut data = self.inner.lock().expect("directory poisoned");
        if identity.privileged {
            data.privileged.insert(identity.id);
        }
        data.identities.insert(identity.id, identity);
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        let mut data = self.inner.lock().expect("directory poisoned");
        data.tenants.retain(|t| t.id != tenant.id);
        data.tenants.push(tenant);
    }

    pub fn insert_membership(&self, identity_id: Uuid, tenant_id: Uuid, role: Option<Role>) {
        let now = Utc::now();
        let mut data = self.inner.lock().expect("directory poisoned");
        data.memberships.push(MembershipRecord {
            id: Uuid::new_v4(),
            identity_id,
            tenant_id,
            role,
            invited_by: None,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn set_tenant_entitlement(&self, tenant_id: Uuid, record: EntitlementRecord) {
        self.inner
            .lock()
            .expect("directory poisoned")
            .tenant_entitlements
            .insert(tenant_id, record);
    }

    pub fn set_identity_entitlement(&self, identity_id: Uuid, record: EntitlementRecord) {
        self.inner
            .lock()
            .expect("directory poisoned")
            .identity_entitlements
            .insert(identity_id, record);
    }

    pub fn set_privileged(&self, identity_id: Uuid, privileged: bool) {
        let mut data = self.inner.lock().expect("directory poisoned");
        if privileged {
            data.privileged.insert(identity_id);
        } else {
            data.privileged.remove(&identity_id);
        }
        if let Some(identity) = data.identities.get_mut(&identity_id) {
            identity.privileged = privileged;
        }
    }

    pub fn set_restricted_owner(&self, identity_id: Uuid, restricted: bool) {
        let mut data = self.inner.lock().expect("directory poisoned");
        if restricted {
            data.restricted_owners.insert(identity_id);
        } else {
            data.restricted_owners.remove(&identity_id);
        }
    }
}

impl Directory for MemoryDirectory {
    async fn get_identity(&self, id: Uuid) -> LeasewellResult<Identity> {
        self.inner
            .lock()
            .expect("directory poisoned")
            .identities
            .get(&id)
            .cloned()
            .ok_or_else(|| LeasewellError::NotFound {
                entity: "identity".into(),
                id: id.to_string(),
            })
    }

    async fn tenants_for_identity(&self, id: Uuid) -> LeasewellResult<Vec<Tenant>> {
        let data = self.inner.lock().expect("directory poisoned");
        let member_of: HashSet<Uuid> = data
            .memberships
            .iter()
            .filter(|m| m.identity_id == id)
            .map(|m| m.tenant_id)
            .collect();
        Ok(data
            .tenants
            .iter()
            .filter(|t| t.created_by == id || member_of.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn membership(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> LeasewellResult<Option<MembershipRecord>> {
        Ok(self
            .inner
            .lock()
            .expect("directory poisoned")
            .memberships
            .iter()
            .find(|m| m.identity_id == identity_id && m.tenant_id == tenant_id)
            .cloned())
    }

    async fn effective_entitlement(
        &self,
        subject: EntitlementSubject,
    ) -> LeasewellResult<Option<EntitlementRecord>> {
        let data = self.inner.lock().expect("directory poisoned");
        let record = match subject {
            EntitlementSubject::Tenant(id) => data.tenant_entitlements.get(&id),
            EntitlementSubject::Identity(id) => data.identity_entitlements.get(&id),
        };
        Ok(record.cloned())
    }

    async fn check_privileged(&self, id: Uuid) -> LeasewellResult<bool> {
        Ok(self
            .inner
            .lock()
            .expect("directory poisoned")
            .privileged
            .contains(&id))
    }

    async fn is_restricted_owner_class(&self, id: Uuid) -> LeasewellResult<bool> {
        Ok(self
            .inner
            .lock()
            .expect("directory poisoned")
            .restricted_owners
            .contains(&id))
    }
}
