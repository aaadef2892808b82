//! Integration tests for session orchestration: resolution pipeline,
//! tenant selection, marker revalidation, expiry, and stale-chain
//! discarding.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use leasewell_core::backend::{AuthProvider, Directory, EntitlementSubject, NewRegistration};
use leasewell_core::error::{LeasewellError, LeasewellResult};
use leasewell_core::kv::keys;
use leasewell_core::models::{
    CapabilitySet, EntitlementRecord, Identity, MembershipRecord, PackageTier, Role, Tenant,
};
use leasewell_core::KeyValueStore;
use leasewell_session::{AuthEvent, SessionConfig, SessionError, SessionManager, SessionState};
use leasewell_store::{MemoryAuditLog, MemoryAuthProvider, MemoryDirectory, MemoryKeyValueStore};
use tokio::sync::Notify;
use uuid::Uuid;

fn identity(email: &str, privileged: bool) -> Identity {
    let now = Utc::now();
    Identity {
        id: Uuid::new_v4(),
        email: email.into(),
        privileged,
        display_name: None,
        metadata: serde_json::Value::Null,
        created_at: now,
        updated_at: now,
    }
}

fn tenant(name: &str, created_by: Uuid, is_default: bool) -> Tenant {
    Tenant {
        id: Uuid::new_v4(),
        name: name.into(),
        created_by,
        is_default,
        public_page: serde_json::Value::Null,
        created_at: Utc::now(),
    }
}

fn entitlement_record(tier: PackageTier) -> EntitlementRecord {
    EntitlementRecord {
        tier,
        features: Default::default(),
    }
}

struct Fixture {
    provider: Arc<MemoryAuthProvider>,
    directory: Arc<MemoryDirectory>,
    audit: Arc<MemoryAuditLog>,
    persisted: Arc<MemoryKeyValueStore>,
    transient: Arc<MemoryKeyValueStore>,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            provider: Arc::new(MemoryAuthProvider::new()),
            directory: Arc::new(MemoryDirectory::new()),
            audit: Arc::new(MemoryAuditLog::new()),
            persisted: Arc::new(MemoryKeyValueStore::new()),
            transient: Arc::new(MemoryKeyValueStore::new()),
        }
    }

    fn manager(
        &self,
    ) -> Arc<
        SessionManager<
            MemoryAuthProvider,
            MemoryDirectory,
            MemoryAuditLog,
            MemoryKeyValueStore,
            MemoryKeyValueStore,
        >,
    > {
        Arc::new(SessionManager::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.directory),
            Arc::clone(&self.audit),
            Arc::clone(&self.persisted),
            Arc::clone(&self.transient),
            SessionConfig::default(),
        ))
    }
}

#[tokio::test]
async fn initialize_without_credential_stays_anonymous() {
    let fixture = Fixture::new();
    let manager = fixture.manager();

    manager.initialize().await;

    let context = manager.context();
    assert_eq!(context.state, SessionState::Anonymous);
    assert!(context.identity.is_none());
    assert!(context.capabilities.is_empty());
}

#[tokio::test]
async fn login_failure_leaves_session_anonymous() {
    let fixture = Fixture::new();
    let alice = identity("alice@leasewell.test", false);
    fixture.provider.insert_account(alice, "correct-secret");
    let manager = fixture.manager();

    let err = manager
        .login("alice@leasewell.test", "wrong-secret")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::AuthFailure { .. }));
    assert_eq!(manager.context().state, SessionState::Anonymous);
}

#[tokio::test]
async fn fresh_registrant_is_authenticated_and_tenantless() {
    let fixture = Fixture::new();
    let manager = fixture.manager();

    let registrant = manager
        .register(NewRegistration {
            email: "new@leasewell.test".into(),
            secret: "s3cret-enough".into(),
            display_name: Some("New Landlord".into()),
            selected_tier: Some(PackageTier::Starter),
        })
        .await
        .unwrap();

    // The onboarding flow stages the self-selected tier backend-side.
    fixture
        .directory
        .set_identity_entitlement(registrant.id, entitlement_record(PackageTier::Starter));
    manager.refetch().await;

    let context = manager.context();
    assert_eq!(context.state, SessionState::Authenticated);
    assert!(context.tenants.is_empty());
    assert!(context.current_tenant.is_none());
    assert!(context.capabilities.is_empty());
    assert_eq!(context.entitlement.tier, Some(PackageTier::Starter));
}

#[tokio::test]
async fn current_tenant_selection_order() {
    let fixture = Fixture::new();
    let alice = identity("alice@leasewell.test", false);
    let first = tenant("First", alice.id, false);
    let preferred = tenant("Preferred", alice.id, true);
    let other = tenant("Other", alice.id, false);
    fixture.directory.insert_identity(alice.clone());
    fixture.directory.insert_tenant(first.clone());
    fixture.directory.insert_tenant(preferred.clone());
    fixture.directory.insert_tenant(other.clone());
    fixture.provider.set_current(alice.clone());

    // No persisted selection: the default flag wins over backend order.
    let manager = fixture.manager();
    manager.initialize().await;
    assert_eq!(manager.context().current_tenant.unwrap().id, preferred.id);

    // A switch persists; a fresh manager over the same persisted store
    // (simulated restart) resumes the selection.
    manager.switch_tenant(other.id).await.unwrap();
    let restarted = fixture.manager();
    restarted.initialize().await;
    assert_eq!(restarted.context().current_tenant.unwrap().id, other.id);

    // A stale persisted id that no longer applies falls back to default.
    fixture
        .persisted
        .set(keys::CURRENT_BUSINESS_ID, &Uuid::new_v4().to_string());
    fixture.persisted.remove(keys::CURRENT_ORGANIZATION_ID);
    let restarted = fixture.manager();
    restarted.initialize().await;
    assert_eq!(
        restarted.context().current_tenant.unwrap().id,
        preferred.id
    );

    // No default flag and no persisted selection: first in backend order.
    fixture.persisted.clear();
    let no_default = Fixture::new();
    let bob = identity("bob@leasewell.test", false);
    let t1 = tenant("One", bob.id, false);
    let t2 = tenant("Two", bob.id, false);
    no_default.directory.insert_identity(bob.clone());
    no_default.directory.insert_tenant(t1.clone());
    no_default.directory.insert_tenant(t2);
    no_default.provider.set_current(bob);
    let manager = no_default.manager();
    manager.initialize().await;
    assert_eq!(manager.context().current_tenant.unwrap().id, t1.id);
}

#[tokio::test]
async fn switching_to_unknown_tenant_is_rejected() {
    let fixture = Fixture::new();
    let alice = identity("alice@leasewell.test", false);
    fixture.directory.insert_identity(alice.clone());
    fixture
        .directory
        .insert_tenant(tenant("Mine", alice.id, true));
    fixture.provider.set_current(alice);
    let manager = fixture.manager();
    manager.initialize().await;

    let err = manager.switch_tenant(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SessionError::TenancyLookup(_)));
}

#[tokio::test]
async fn tenant_switch_round_trip_restores_capabilities() {
    let fixture = Fixture::new();
    let owner = identity("owner@leasewell.test", false);
    let alice = identity("alice@leasewell.test", false);
    let managed = tenant("Managed", owner.id, true);
    let viewed = tenant("Viewed", owner.id, false);
    fixture.directory.insert_identity(owner);
    fixture.directory.insert_identity(alice.clone());
    fixture.directory.insert_tenant(managed.clone());
    fixture.directory.insert_tenant(viewed.clone());
    fixture
        .directory
        .insert_membership(alice.id, managed.id, Some(Role::Admin));
    fixture
        .directory
        .insert_membership(alice.id, viewed.id, Some(Role::Viewer));
    fixture.directory.set_tenant_entitlement(
        managed.id,
        EntitlementRecord {
            tier: PackageTier::Premium,
            features: [("online_payments".to_string(), true)].into_iter().collect(),
        },
    );
    fixture.provider.set_current(alice);

    let manager = fixture.manager();
    manager.initialize().await;

    let before = manager.context();
    assert_eq!(before.current_tenant.as_ref().unwrap().id, managed.id);
    let caps_before = before.capabilities;
    let entitlement_before = before.entitlement.clone();
    assert!(caps_before.can_manage_properties());
    assert!(before.entitlement.feature_enabled("online_payments"));

    manager.switch_tenant(viewed.id).await.unwrap();
    let mid = manager.context();
    assert_eq!(
        mid.capabilities,
        [leasewell_core::models::Capability::ViewReports]
            .into_iter()
            .collect::<CapabilitySet>()
    );
    // The un-entitled tenant resolves to unknown: flags read as unset.
    assert!(!mid.entitlement.feature_enabled("online_payments"));

    manager.switch_tenant(managed.id).await.unwrap();
    let after = manager.context();
    assert_eq!(after.capabilities, caps_before);
    assert_eq!(after.entitlement, entitlement_before);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let fixture = Fixture::new();
    let alice = identity("alice@leasewell.test", false);
    let home = tenant("Home", alice.id, true);
    fixture.directory.insert_identity(alice.clone());
    fixture.directory.insert_tenant(home.clone());
    fixture.provider.insert_account(alice.clone(), "secret-pw");
    let manager = fixture.manager();

    manager
        .login("alice@leasewell.test", "secret-pw")
        .await
        .unwrap();
    assert!(manager.context().is_authenticated());
    manager.switch_tenant(home.id).await.unwrap();
    assert!(fixture.persisted.get(keys::CURRENT_BUSINESS_ID).is_some());

    manager.logout().await;
    manager.logout().await;

    let context = manager.context();
    assert_eq!(context.state, SessionState::Anonymous);
    assert!(!context.is_authenticated());
    assert!(context.identity.is_none());
    assert!(fixture.persisted.get(keys::CURRENT_BUSINESS_ID).is_none());
    assert!(fixture
        .persisted
        .get(keys::CURRENT_ORGANIZATION_ID)
        .is_none());
    assert!(fixture.transient.get(keys::IMPERSONATING_USER_ID).is_none());
    assert!(fixture.transient.get(keys::ADMIN_USER_ID).is_none());
}

#[tokio::test]
async fn signed_out_event_tears_down_session() {
    let fixture = Fixture::new();
    let alice = identity("alice@leasewell.test", false);
    fixture.directory.insert_identity(alice.clone());
    fixture.provider.set_current(alice.clone());
    let manager = fixture.manager();
    manager.initialize().await;
    assert_eq!(manager.context().state, SessionState::Authenticated);

    manager.on_auth_event(AuthEvent::SignedOut).await;
    assert_eq!(manager.context().state, SessionState::Anonymous);

    manager.on_auth_event(AuthEvent::SignedIn(alice)).await;
    assert_eq!(manager.context().state, SessionState::Authenticated);
}

// -------------------------------------------------------------------------
// Impersonation marker revalidation across a simulated restart
// -------------------------------------------------------------------------

#[tokio::test]
async fn marker_is_resumed_for_the_same_privileged_actor() {
    let fixture = Fixture::new();
    let admin = identity("admin@leasewell.test", true);
    let target = identity("landlord@leasewell.test", false);
    fixture.directory.insert_identity(admin.clone());
    fixture.directory.insert_identity(target.clone());
    fixture.provider.set_current(admin.clone());

    let manager = fixture.manager();
    manager.initialize().await;
    manager.impersonate(target.id).await.unwrap();

    // Same process-lifetime stores, fresh manager: marker honored.
    let resumed = fixture.manager();
    resumed.initialize().await;
    let context = resumed.context();
    assert!(context.impersonating);
    assert_eq!(context.identity.as_ref().unwrap().id, admin.id);
    assert_eq!(context.effective_identity.as_ref().unwrap().id, target.id);
}

#[tokio::test]
async fn marker_for_a_different_actor_is_discarded() {
    let fixture = Fixture::new();
    let admin = identity("admin@leasewell.test", true);
    let target = identity("landlord@leasewell.test", false);
    let bystander = identity("bystander@leasewell.test", false);
    fixture.directory.insert_identity(admin.clone());
    fixture.directory.insert_identity(target.clone());
    fixture.directory.insert_identity(bystander.clone());
    fixture.provider.set_current(admin.clone());

    let manager = fixture.manager();
    manager.initialize().await;
    manager.impersonate(target.id).await.unwrap();

    // Sign out, sign in as somebody else: the marker must not survive.
    fixture.provider.set_current(bystander.clone());
    let hijacked = fixture.manager();
    hijacked.initialize().await;

    let context = hijacked.context();
    assert!(!context.impersonating);
    assert_eq!(context.effective_identity.unwrap().id, bystander.id);
    assert!(fixture.transient.get(keys::IMPERSONATING_USER_ID).is_none());
    assert!(fixture.transient.get(keys::ADMIN_USER_ID).is_none());
}

#[tokio::test]
async fn marker_is_discarded_when_privilege_was_revoked() {
    let fixture = Fixture::new();
    let admin = identity("admin@leasewell.test", true);
    let target = identity("landlord@leasewell.test", false);
    fixture.directory.insert_identity(admin.clone());
    fixture.directory.insert_identity(target.clone());
    fixture.provider.set_current(admin.clone());

    let manager = fixture.manager();
    manager.initialize().await;
    manager.impersonate(target.id).await.unwrap();

    // Privilege revoked out-of-band: stored state is never trusted.
    fixture.directory.set_privileged(admin.id, false);
    let resumed = fixture.manager();
    resumed.initialize().await;

    let context = resumed.context();
    assert!(!context.impersonating);
    assert_eq!(context.effective_identity.unwrap().id, admin.id);
    assert!(fixture.transient.get(keys::IMPERSONATING_USER_ID).is_none());
}

// -------------------------------------------------------------------------
// Inactivity expiry
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn inactivity_forces_expiry_into_anonymous() {
    let fixture = Fixture::new();
    let alice = identity("alice@leasewell.test", false);
    fixture.directory.insert_identity(alice.clone());
    fixture
        .directory
        .insert_tenant(tenant("Home", alice.id, true));
    fixture.provider.set_current(alice);

    let manager = fixture.manager();
    manager.initialize().await;
    assert_eq!(manager.context().state, SessionState::Authenticated);

    let mut contexts = manager.subscribe();
    let timer = tokio::spawn(Arc::clone(&manager).run_expiry_timer());

    // 29 minutes of idle time: still authenticated.
    tokio::time::advance(Duration::from_secs(29 * 60)).await;
    tokio::task::yield_now().await;
    assert_eq!(manager.context().state, SessionState::Authenticated);

    // Activity resets the clock; the timer tick must not.
    manager.record_activity();
    tokio::time::advance(Duration::from_secs(29 * 60)).await;
    tokio::task::yield_now().await;
    assert_eq!(manager.context().state, SessionState::Authenticated);

    // Past the 30-minute threshold the next tick forces logout. The
    // paused clock auto-advances while we wait on the watch channel.
    contexts
        .wait_for(|context| context.state == SessionState::Anonymous)
        .await
        .unwrap();

    assert!(fixture.persisted.get(keys::CURRENT_BUSINESS_ID).is_none());
    let signed_in = fixture.provider.current_identity().await.unwrap();
    assert!(signed_in.is_none(), "provider logout must have run");
    timer.abort();
}

// -------------------------------------------------------------------------
// Stale resolution chains
// -------------------------------------------------------------------------

/// Directory wrapper that blocks the entitlement lookup for one tenant
/// until released, to force a superseded chain to finish late.
#[derive(Clone)]
struct GatedDirectory {
    inner: MemoryDirectory,
    gated_tenant: Uuid,
    gate: Arc<Notify>,
}

impl Directory for GatedDirectory {
    async fn get_identity(&self, id: Uuid) -> LeasewellResult<Identity> {
        self.inner.get_identity(id).await
    }

    async fn tenants_for_identity(&self, id: Uuid) -> LeasewellResult<Vec<Tenant>> {
        self.inner.tenants_for_identity(id).await
    }

    async fn membership(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> LeasewellResult<Option<MembershipRecord>> {
        self.inner.membership(identity_id, tenant_id).await
    }

    async fn effective_entitlement(
        &self,
        subject: EntitlementSubject,
    ) -> LeasewellResult<Option<EntitlementRecord>> {
        if subject == EntitlementSubject::Tenant(self.gated_tenant) {
            self.gate.notified().await;
        }
        self.inner.effective_entitlement(subject).await
    }

    async fn check_privileged(&self, id: Uuid) -> LeasewellResult<bool> {
        self.inner.check_privileged(id).await
    }

    async fn is_restricted_owner_class(&self, id: Uuid) -> LeasewellResult<bool> {
        self.inner.is_restricted_owner_class(id).await
    }
}

#[tokio::test]
async fn superseded_tenant_switch_is_discarded() {
    let inner = MemoryDirectory::new();
    let alice = identity("alice@leasewell.test", false);
    let start = tenant("Start", alice.id, true);
    let slow = tenant("Slow", alice.id, false);
    let fast = tenant("Fast", alice.id, false);
    inner.insert_identity(alice.clone());
    inner.insert_tenant(start.clone());
    inner.insert_tenant(slow.clone());
    inner.insert_tenant(fast.clone());
    inner.set_tenant_entitlement(slow.id, entitlement_record(PackageTier::Premium));
    inner.set_tenant_entitlement(fast.id, entitlement_record(PackageTier::Starter));

    let gate = Arc::new(Notify::new());
    let directory = GatedDirectory {
        inner,
        gated_tenant: slow.id,
        gate: Arc::clone(&gate),
    };

    let provider = Arc::new(MemoryAuthProvider::new());
    provider.set_current(alice);
    let persisted = Arc::new(MemoryKeyValueStore::new());
    let manager = Arc::new(SessionManager::new(
        provider,
        Arc::new(directory),
        Arc::new(MemoryAuditLog::new()),
        Arc::clone(&persisted),
        Arc::new(MemoryKeyValueStore::new()),
        SessionConfig::default(),
    ));
    manager.initialize().await;
    assert_eq!(manager.context().current_tenant.as_ref().unwrap().id, start.id);

    // First switch parks on the gated entitlement lookup.
    let slow_switch = {
        let manager = Arc::clone(&manager);
        let slow_id = slow.id;
        tokio::spawn(async move { manager.switch_tenant(slow_id).await })
    };
    tokio::task::yield_now().await;

    // A later-requested switch completes first.
    manager.switch_tenant(fast.id).await.unwrap();
    assert_eq!(manager.context().current_tenant.as_ref().unwrap().id, fast.id);

    // Release the first chain: its completion must be discarded, not
    // overwrite the newer selection.
    gate.notify_one();
    slow_switch.await.unwrap().unwrap();

    let context = manager.context();
    assert_eq!(context.current_tenant.unwrap().id, fast.id);
    assert_eq!(context.entitlement.tier, Some(PackageTier::Starter));
    assert_eq!(
        persisted.get(keys::CURRENT_BUSINESS_ID).as_deref(),
        Some(fast.id.to_string().as_str())
    );
}

// -------------------------------------------------------------------------
// Degraded-mode resolution
// -------------------------------------------------------------------------

/// Directory wrapper whose tenant listing always fails.
#[derive(Clone)]
struct TenantLookupDown {
    inner: MemoryDirectory,
}

impl Directory for TenantLookupDown {
    async fn get_identity(&self, id: Uuid) -> LeasewellResult<Identity> {
        self.inner.get_identity(id).await
    }

    async fn tenants_for_identity(&self, _id: Uuid) -> LeasewellResult<Vec<Tenant>> {
        Err(LeasewellError::Backend("tenant listing unavailable".into()))
    }

    async fn membership(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> LeasewellResult<Option<MembershipRecord>> {
        self.inner.membership(identity_id, tenant_id).await
    }

    async fn effective_entitlement(
        &self,
        subject: EntitlementSubject,
    ) -> LeasewellResult<Option<EntitlementRecord>> {
        self.inner.effective_entitlement(subject).await
    }

    async fn check_privileged(&self, id: Uuid) -> LeasewellResult<bool> {
        self.inner.check_privileged(id).await
    }

    async fn is_restricted_owner_class(&self, id: Uuid) -> LeasewellResult<bool> {
        self.inner.is_restricted_owner_class(id).await
    }
}

#[tokio::test]
async fn tenancy_failure_degrades_to_tenantless_session() {
    let inner = MemoryDirectory::new();
    let alice = identity("alice@leasewell.test", false);
    inner.insert_identity(alice.clone());
    inner.insert_tenant(tenant("Unreachable", alice.id, true));

    let provider = Arc::new(MemoryAuthProvider::new());
    provider.set_current(alice);
    let manager = Arc::new(SessionManager::new(
        provider,
        Arc::new(TenantLookupDown { inner }),
        Arc::new(MemoryAuditLog::new()),
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(MemoryKeyValueStore::new()),
        SessionConfig::default(),
    ));
    manager.initialize().await;

    // Non-fatal: the session is usable, just tenant-less and capability-
    // free until the backend recovers.
    let context = manager.context();
    assert_eq!(context.state, SessionState::Authenticated);
    assert!(context.tenants.is_empty());
    assert!(context.current_tenant.is_none());
    assert!(context.capabilities.is_empty());
    assert_eq!(context.entitlement.tier, None);
}

// -------------------------------------------------------------------------
// Restricted owner class
// -------------------------------------------------------------------------

#[tokio::test]
async fn restricted_owner_is_capped_even_as_tenant_creator() {
    let fixture = Fixture::new();
    let restricted = identity("investor@leasewell.test", false);
    fixture.directory.insert_identity(restricted.clone());
    fixture
        .directory
        .insert_tenant(tenant("Portfolio", restricted.id, true));
    fixture.directory.set_restricted_owner(restricted.id, true);
    fixture.provider.set_current(restricted);

    let manager = fixture.manager();
    manager.initialize().await;

    let caps = manager.context().capabilities;
    assert!(caps.can_view_reports());
    assert!(!caps.can_manage_properties());
    assert!(!caps.can_manage_payments());
    assert!(!caps.can_manage_businesses());
}
