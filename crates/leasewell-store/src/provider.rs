//! In-memory [`AuthProvider`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use leasewell_core::backend::{AuthProvider, NewRegistration};
use leasewell_core::error::{LeasewellError, LeasewellResult};
use leasewell_core::models::Identity;
use uuid::Uuid;

#[derive(Debug, Default)]
struct ProviderData {
    /// email → (secret, identity)
    accounts: HashMap<String, (String, Identity)>,
    current: Option<Identity>,
}

/// In-memory authentication provider. Credential checks are plain string
/// comparisons; this is test scaffolding, not a credential store.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthProvider {
    inner: Arc<Mutex<ProviderData>>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an account without going through `register`.
    pub fn insert_account(&self, identity: Identity, secret: &str) {
        self.inner
            .lock()
            .expect("provider poisoned")
            .accounts
            .insert(identity.email.clone(), (secret.to_string(), identity));
    }

    /// Pre-authenticate an identity, as if a credential survived from a
    /// previous process run.
    pub fn set_current(&self, identity: Identity) {
        self.inner.lock().expect("provider poisoned").current = Some(identity);
    }
}

impl AuthProvider for MemoryAuthProvider {
    async fn current_identity(&self) -> LeasewellResult<Option<Identity>> {
        Ok(self.inner.lock().expect("provider poisoned").current.clone())
    }

    async fn login(&self, email: &str, secret: &str) -> LeasewellResult<Identity> {
        let mut data = self.inner.lock().expect("provider poisoned");
        match data.accounts.get(email) {
            Some((stored, identity)) if stored == secret => {
                let identity = identity.clone();
                data.current = Some(identity.clone());
                Ok(identity)
            }
            _ => Err(LeasewellError::AuthenticationFailed {
                reason: "invalid credentials".into(),
            }),
        }
    }

    async fn register(&self, input: NewRegistration) -> LeasewellResult<Identity> {
        let mut data = self.inner.lock().expect("provider poisoned");
        if data.accounts.contains_key(&input.email) {
            return Err(LeasewellError::AuthenticationFailed {
                reason: "email already registered".into(),
            });
        }
        let now = Utc::now();
        let metadata = match input.selected_tier {
            Some(tier) => serde_json::json!({ "selected_tier": tier }),
            None => serde_json::Value::Null,
        };
        let identity = Identity {
            id: Uuid::new_v4(),
            email: input.email.clone(),
            privileged: false,
            display_name: input.display_name,
            metadata,
            created_at: now,
            updated_at: now,
        };
        data.accounts
            .insert(input.email, (input.secret, identity.clone()));
        data.current = Some(identity.clone());
        Ok(identity)
    }

    async fn logout(&self) -> LeasewellResult<()> {
        self.inner.lock().expect("provider poisoned").current = None;
        Ok(())
    }
}
