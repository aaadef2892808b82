//! Entitlement resolution — package tier and feature flags per tenant.

use std::sync::Arc;

use leasewell_core::backend::{Directory, EntitlementSubject};
use leasewell_core::models::Entitlement;
use tracing::warn;
use uuid::Uuid;

/// Resolves the effective entitlement for the current tenant, falling
/// back to the identity's self-selected tier during onboarding.
///
/// Non-critical by contract: failures degrade to [`Entitlement::unknown`]
/// and never block session resolution.
pub struct EntitlementResolver<D> {
    directory: Arc<D>,
}

impl<D: Directory> EntitlementResolver<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Resolve the entitlement for `tenant_id` if present, else for the
    /// identity itself. Premium flags fail closed; baseline CRUD is not
    /// gated here and stays usable when lookup is down.
    pub async fn resolve(&self, tenant_id: Option<Uuid>, identity_id: Uuid) -> Entitlement {
        if let Some(tenant_id) = tenant_id {
            match self
                .directory
                .effective_entitlement(EntitlementSubject::Tenant(tenant_id))
                .await
            {
                Ok(Some(record)) => return record.into(),
                Ok(None) => {}
                Err(err) => {
                    warn!(%tenant_id, error = %err, "tenant entitlement lookup failed");
                }
            }
        }

        // Onboarding fallback: the tier the identity picked before any
        // tenant existed.
        match self
            .directory
            .effective_entitlement(EntitlementSubject::Identity(identity_id))
            .await
        {
            Ok(Some(record)) => record.into(),
            Ok(None) => Entitlement::unknown(),
            Err(err) => {
                warn!(%identity_id, error = %err, "identity entitlement lookup failed");
                Entitlement::unknown()
            }
        }
    }
}
