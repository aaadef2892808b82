//! Leasewell Server — application entry point.
//!
//! Wires the session engine against the in-memory stores, resolves a
//! seeded session, and keeps the inactivity timer running. The hosted
//! backend integration replaces the in-memory stores at deployment.

use std::sync::Arc;

use chrono::Utc;
use leasewell_core::models::{Identity, Tenant};
use leasewell_session::{SessionConfig, SessionManager};
use leasewell_store::{MemoryAuditLog, MemoryAuthProvider, MemoryDirectory, MemoryKeyValueStore};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("leasewell=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Leasewell server...");

    let provider = Arc::new(MemoryAuthProvider::new());
    let directory = Arc::new(MemoryDirectory::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let persisted = Arc::new(MemoryKeyValueStore::new());
    let transient = Arc::new(MemoryKeyValueStore::new());

    seed_demo_fixture(&provider, &directory);

    let manager = Arc::new(SessionManager::new(
        provider,
        directory,
        audit,
        persisted,
        transient,
        SessionConfig::default(),
    ));

    manager.initialize().await;
    let context = manager.context();
    tracing::info!(
        state = ?context.state,
        tenant = ?context.current_tenant.as_ref().map(|t| t.name.clone()),
        "session resolved"
    );

    let timer = tokio::spawn(Arc::clone(&manager).run_expiry_timer());

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    timer.abort();

    tracing::info!("Leasewell server stopped.");
}

fn seed_demo_fixture(provider: &MemoryAuthProvider, directory: &MemoryDirectory) {
    let now = Utc::now();
    let landlord = Identity {
        id: Uuid::new_v4(),
        email: "owner@acme-rentals.test".into(),
        privileged: false,
        display_name: Some("Acme Rentals".into()),
        metadata: serde_json::Value::Null,
        created_at: now,
        updated_at: now,
    };
    let tenant = Tenant {
        id: Uuid::new_v4(),
        name: "Acme Rentals".into(),
        created_by: landlord.id,
        is_default: true,
        public_page: serde_json::Value::Null,
        created_at: now,
    };
    directory.insert_identity(landlord.clone());
    directory.insert_tenant(tenant);
    provider.insert_account(landlord.clone(), "demo-secret");
    provider.set_current(landlord);
}
