//! Session orchestration — the single source of truth for "who is
//! acting, as whom, with what rights, and for how long".
//!
//! The manager composes tenancy, entitlement, permission, and
//! impersonation resolution into one consolidated [`SessionContext`]
//! published through a watch channel. Consumers only ever see whole
//! snapshots: a tenant switch or impersonation transition is atomic from
//! their point of view.
//!
//! Resolution chains are asynchronous and can interleave (a switch
//! requested mid-flight of `initialize`, a sign-out racing a refetch).
//! Every chain captures the session generation at its start and publishes
//! only if the generation is unchanged at completion, so a superseded
//! chain discards itself instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use leasewell_core::backend::{AuditLog, AuthProvider, Directory, NewRegistration};
use leasewell_core::error::LeasewellError;
use leasewell_core::kv::KeyValueStore;
use leasewell_core::models::{CapabilitySet, Entitlement, Identity, Role, Tenant};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::entitlement::EntitlementResolver;
use crate::error::SessionError;
use crate::impersonation::ImpersonationController;
use crate::permissions;
use crate::tenancy::TenancyStore;

/// Lifecycle state of the session.
///
/// `Expired` is terminal for the session that reached it; a fresh
/// sign-in creates a new one. Impersonation is a sub-state of
/// `Authenticated`, carried as a flag on the context rather than a
/// distinct variant, because the actual identity stays authenticated
/// while only the effective-identity view changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
    Expired,
}

/// Provider-pushed authentication notification.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

/// The consolidated session snapshot published to consumers.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub state: SessionState,
    /// The actual authenticated identity, never the impersonated one.
    pub identity: Option<Identity>,
    /// The impersonated target if impersonation is active, else the
    /// actual identity. Capabilities are always computed from this one.
    pub effective_identity: Option<Identity>,
    pub impersonating: bool,
    pub tenants: Vec<Tenant>,
    pub current_tenant: Option<Tenant>,
    pub capabilities: CapabilitySet,
    pub entitlement: Entitlement,
}

impl SessionContext {
    fn anonymous() -> Self {
        SessionContext {
            state: SessionState::Anonymous,
            identity: None,
            effective_identity: None,
            impersonating: false,
            tenants: Vec::new(),
            current_tenant: None,
            capabilities: CapabilitySet::empty(),
            entitlement: Entitlement::unknown(),
        }
    }

    fn authenticating(identity: Option<Identity>) -> Self {
        SessionContext {
            state: SessionState::Authenticating,
            identity,
            ..SessionContext::anonymous()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.state,
            SessionState::Authenticated | SessionState::Authenticating
        )
    }
}

/// Top-level session orchestrator. One per running client process.
pub struct SessionManager<P, D, A, KP, KT> {
    provider: Arc<P>,
    directory: Arc<D>,
    tenancy: TenancyStore<D, KP>,
    entitlements: EntitlementResolver<D>,
    impersonation: ImpersonationController<A, KT>,
    config: SessionConfig,
    /// Monotonically increasing token; every resolution chain captures it
    /// at start and publishes only if it still matches at completion.
    generation: AtomicU64,
    last_activity: Mutex<Instant>,
    context_tx: watch::Sender<SessionContext>,
}

impl<P, D, A, KP, KT> SessionManager<P, D, A, KP, KT>
where
    P: AuthProvider,
    D: Directory,
    A: AuditLog,
    KP: KeyValueStore,
    KT: KeyValueStore,
{
    pub fn new(
        provider: Arc<P>,
        directory: Arc<D>,
        audit: Arc<A>,
        persisted: Arc<KP>,
        transient: Arc<KT>,
        config: SessionConfig,
    ) -> Self {
        let (context_tx, _) = watch::channel(SessionContext::anonymous());
        Self {
            provider,
            tenancy: TenancyStore::new(Arc::clone(&directory), persisted),
            entitlements: EntitlementResolver::new(Arc::clone(&directory)),
            impersonation: ImpersonationController::new(audit, transient),
            directory,
            config,
            generation: AtomicU64::new(0),
            last_activity: Mutex::new(Instant::now()),
            context_tx,
        }
    }

    /// The current consolidated snapshot.
    pub fn context(&self) -> SessionContext {
        self.context_tx.borrow().clone()
    }

    /// Subscribe to context revisions (sign-in, sign-out, tenant switch,
    /// impersonation start/stop, expiry).
    pub fn subscribe(&self) -> watch::Receiver<SessionContext> {
        self.context_tx.subscribe()
    }

    /// Resolve the session at process start from any existing credential.
    /// Also revalidates impersonation markers left in transient storage.
    pub async fn initialize(&self) {
        let generation = self.bump_generation();
        match self.provider.current_identity().await {
            Ok(Some(identity)) => {
                self.record_activity();
                self.resolve_session(identity).await;
            }
            Ok(None) => {
                self.impersonation.clear_markers();
                self.publish_if_current(generation, SessionContext::anonymous());
            }
            Err(err) => {
                warn!(error = %err, "credential lookup failed at initialize");
                self.publish_if_current(generation, SessionContext::anonymous());
            }
        }
    }

    /// React to a provider-pushed sign-in/sign-out notification.
    pub async fn on_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(identity) => {
                self.record_activity();
                self.resolve_session(identity).await;
            }
            AuthEvent::SignedOut => {
                let generation = self.bump_generation();
                self.teardown(generation).await;
            }
        }
    }

    /// Authenticate with the provider and resolve the session.
    pub async fn login(&self, email: &str, secret: &str) -> Result<Identity, SessionError> {
        let generation = self.bump_generation();
        self.publish_if_current(generation, SessionContext::authenticating(None));

        match self.provider.login(email, secret).await {
            Ok(identity) => {
                self.record_activity();
                self.resolve_session(identity.clone()).await;
                Ok(identity)
            }
            Err(err) => {
                self.publish_if_current(generation, SessionContext::anonymous());
                Err(SessionError::AuthFailure {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Register a new identity with the provider and resolve the session.
    pub async fn register(&self, input: NewRegistration) -> Result<Identity, SessionError> {
        let generation = self.bump_generation();
        self.publish_if_current(generation, SessionContext::authenticating(None));

        match self.provider.register(input).await {
            Ok(identity) => {
                self.record_activity();
                self.resolve_session(identity.clone()).await;
                Ok(identity)
            }
            Err(err) => {
                self.publish_if_current(generation, SessionContext::anonymous());
                Err(SessionError::AuthFailure {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Sign out and clear all persisted selection and transient markers.
    /// Idempotent: a second call lands in the same Anonymous end state.
    pub async fn logout(&self) {
        let generation = self.bump_generation();
        self.teardown(generation).await;
    }

    /// Called on any user interaction (pointer, key, scroll, touch).
    pub fn record_activity(&self) {
        let mut last = self.last_activity.lock().expect("activity clock poisoned");
        *last = Instant::now();
    }

    /// Re-run the full resolution pipeline on demand, e.g. after an
    /// administrative action changed entitlements out-of-band.
    pub async fn refetch(&self) {
        let actual = self.context().identity;
        if let Some(identity) = actual {
            self.resolve_session(identity).await;
        }
    }

    /// Switch the current tenant. Capability set and entitlement are
    /// recomputed for the new tenant before the context is published, so
    /// consumers never observe a mixed state; a later-requested switch
    /// supersedes this one via the generation token.
    pub async fn switch_tenant(&self, tenant_id: Uuid) -> Result<(), SessionError> {
        let current = self.context();
        let Some(effective) = current.effective_identity.clone() else {
            return Err(SessionError::TenancyLookup(
                "no authenticated session".into(),
            ));
        };

        let tenant = self.tenancy.select(&current.tenants, tenant_id)?;
        let generation = self.bump_generation();

        let (capabilities, entitlement) = self.resolve_for_tenant(&effective, Some(&tenant)).await;

        let mut next = current;
        next.current_tenant = Some(tenant);
        next.capabilities = capabilities;
        next.entitlement = entitlement;
        if self.publish_if_current(generation, next) {
            info!(%tenant_id, "switched current tenant");
        }
        Ok(())
    }

    /// Begin impersonating `target_id`. The audit entry is written before
    /// the visible identity changes. Re-requesting the active target is a
    /// no-op; requesting a different target first ends the active
    /// impersonation so audit entries stay balanced.
    pub async fn impersonate(&self, target_id: Uuid) -> Result<(), SessionError> {
        let current = self.context();
        let Some(actor) = current.identity.clone() else {
            return Err(SessionError::NotPrivileged);
        };

        if current.impersonating {
            if let Some(active) = current.effective_identity.as_ref() {
                if active.id == target_id {
                    return Ok(());
                }
            }
        }

        // Every precondition is checked before the active impersonation
        // is touched: a rejected request leaves the session exactly as it
        // was, including any impersonation already in progress.
        if !actor.privileged {
            return Err(SessionError::NotPrivileged);
        }
        if actor.id == target_id {
            return Err(SessionError::InvalidTarget);
        }

        let target = self
            .directory
            .get_identity(target_id)
            .await
            .map_err(|err| match err {
                LeasewellError::NotFound { .. } => SessionError::InvalidTarget,
                other => SessionError::Backend(other.to_string()),
            })?;

        if current.impersonating {
            self.stop_impersonating().await?;
        }

        // Audit first. A failed append aborts the transition and the
        // session stays exactly as it was.
        self.impersonation.start(&actor, &target).await?;

        let generation = self.bump_generation();
        let context = self.resolve_context(actor, target, true).await;
        self.publish_if_current(generation, context);
        Ok(())
    }

    /// End impersonation and re-resolve using the actor's own identity.
    /// Idempotent when no impersonation is active.
    pub async fn stop_impersonating(&self) -> Result<(), SessionError> {
        let current = self.context();
        if !current.impersonating {
            return Ok(());
        }
        let (Some(actor), Some(target)) = (current.identity, current.effective_identity) else {
            return Ok(());
        };

        self.impersonation.stop(&actor, &target).await?;

        let generation = self.bump_generation();
        let context = self.resolve_context(actor.clone(), actor, false).await;
        self.publish_if_current(generation, context);
        Ok(())
    }

    /// Background inactivity loop. Reads the latest activity timestamp at
    /// each tick (never reset by its own tick) and forces expiry past the
    /// threshold.
    pub async fn run_expiry_timer(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.timer_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.context().state != SessionState::Authenticated {
                continue;
            }

            let idle = {
                let last = self.last_activity.lock().expect("activity clock poisoned");
                last.elapsed()
            };

            if idle >= self.config.inactivity_timeout {
                self.expire().await;
            } else if idle + self.config.expiry_warning >= self.config.inactivity_timeout {
                // TODO: surface this through a warning channel once the
                // pre-expiry prompt UI exists.
                debug!(idle_secs = idle.as_secs(), "session nearing inactivity expiry");
            }
        }
    }

    /// Timer-driven expiry: publish the terminal `Expired` state, then
    /// force logout so the end state matches a signed-out process.
    async fn expire(&self) {
        let generation = self.bump_generation();
        let mut expired = self.context();
        expired.state = SessionState::Expired;
        if !self.publish_if_current(generation, expired) {
            return;
        }
        info!("session expired after inactivity; forcing logout");
        self.teardown(generation).await;
    }

    /// Full resolution pipeline for an authenticated identity, including
    /// transient impersonation marker revalidation.
    async fn resolve_session(&self, actual: Identity) {
        let generation = self.bump_generation();
        self.publish_if_current(
            generation,
            SessionContext::authenticating(Some(actual.clone())),
        );

        let (effective, impersonating) = self.revalidate_marker(&actual).await;
        let context = self.resolve_context(actual, effective, impersonating).await;
        self.publish_if_current(generation, context);
    }

    /// A transient marker is honored only if its stored actor id equals
    /// the authenticated identity's id and that identity is privileged at
    /// the moment of check. Anything else is discarded silently.
    async fn revalidate_marker(&self, actual: &Identity) -> (Identity, bool) {
        let Some(marker) = self.impersonation.active_marker() else {
            return (actual.clone(), false);
        };

        if marker.actor_id != actual.id {
            warn!(
                marker_actor = %marker.actor_id,
                authenticated = %actual.id,
                "discarding impersonation marker for a different actor"
            );
            self.impersonation.clear_markers();
            return (actual.clone(), false);
        }

        let still_privileged = self
            .directory
            .check_privileged(actual.id)
            .await
            .unwrap_or(false);
        if !still_privileged {
            warn!(actor = %actual.id, "discarding impersonation marker; actor no longer privileged");
            self.impersonation.clear_markers();
            return (actual.clone(), false);
        }

        match self.directory.get_identity(marker.target_id).await {
            Ok(target) => {
                info!(actor = %actual.id, target = %target.id, "resuming impersonation from marker");
                (target, true)
            }
            Err(err) => {
                warn!(error = %err, "impersonation target lookup failed; discarding marker");
                self.impersonation.clear_markers();
                (actual.clone(), false)
            }
        }
    }

    /// Resolve tenants, current tenant, capabilities, and entitlement for
    /// an effective identity into a publishable context.
    async fn resolve_context(
        &self,
        actual: Identity,
        effective: Identity,
        impersonating: bool,
    ) -> SessionContext {
        let tenants = match self.tenancy.load_tenants(effective.id).await {
            Ok(tenants) => tenants,
            Err(err) => {
                warn!(error = %err, "tenant lookup failed; continuing with empty tenant list");
                Vec::new()
            }
        };
        let current_tenant = self.tenancy.resolve_current(&tenants);
        let (capabilities, entitlement) = self
            .resolve_for_tenant(&effective, current_tenant.as_ref())
            .await;

        SessionContext {
            state: SessionState::Authenticated,
            identity: Some(actual),
            effective_identity: Some(effective),
            impersonating,
            tenants,
            current_tenant,
            capabilities,
            entitlement,
        }
    }

    /// Capability set and entitlement for one (identity, tenant) pair.
    async fn resolve_for_tenant(
        &self,
        effective: &Identity,
        tenant: Option<&Tenant>,
    ) -> (CapabilitySet, Entitlement) {
        let restricted = match self.directory.is_restricted_owner_class(effective.id).await {
            Ok(restricted) => restricted,
            Err(err) => {
                warn!(error = %err, "restricted-class lookup failed; treating as unrestricted");
                false
            }
        };

        let (role, owns_tenant) = match tenant {
            Some(tenant) => {
                let owns = tenant.created_by == effective.id;
                let role = self.effective_role(effective.id, tenant, owns).await;
                (role, owns)
            }
            None => (None, false),
        };

        let capabilities = permissions::resolve_capabilities(role, owns_tenant, restricted);
        let entitlement = self
            .entitlements
            .resolve(tenant.map(|t| t.id), effective.id)
            .await;
        (capabilities, entitlement)
    }

    async fn effective_role(
        &self,
        identity_id: Uuid,
        tenant: &Tenant,
        owns_tenant: bool,
    ) -> Option<Role> {
        match self.directory.membership(identity_id, tenant.id).await {
            Ok(Some(record)) => record.into_domain(tenant).role,
            // Business-centric model: the creator may have no membership
            // row at all.
            Ok(None) => owns_tenant.then_some(Role::Owner),
            Err(err) => {
                warn!(error = %err, "membership lookup failed; defaulting to no role");
                None
            }
        }
    }

    /// Common sign-out teardown: provider logout, storage cleanup, and an
    /// Anonymous publish under the caller's generation. An active
    /// impersonation gets a best-effort exit entry first; a failed append
    /// never blocks sign-out.
    async fn teardown(&self, generation: u64) {
        let current = self.context();
        if current.impersonating {
            if let (Some(actor), Some(target)) = (current.identity, current.effective_identity) {
                if let Err(err) = self.impersonation.stop(&actor, &target).await {
                    warn!(error = %err, "exit audit entry failed during teardown; clearing markers anyway");
                }
            }
        }
        if let Err(err) = self.provider.logout().await {
            warn!(error = %err, "provider logout failed; clearing local state anyway");
        }
        self.tenancy.clear_selection();
        self.impersonation.clear_markers();
        self.publish_if_current(generation, SessionContext::anonymous());
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a context revision unless a newer chain superseded this
    /// one while it was suspended.
    fn publish_if_current(&self, generation: u64, context: SessionContext) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale session resolution");
            return false;
        }
        self.context_tx.send_replace(context);
        true
    }
}
