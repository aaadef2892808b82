//! Entitlement domain model — resolved package tier and feature flags.
//!
//! Entitlements are advisory display data, not a security boundary.
//! The backend's own enforcement remains authoritative.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Closed set of package tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Starter,
    Growth,
    Premium,
}

/// Entitlement row as resolved by the backend for a tenant (or, during
/// onboarding, for an identity's self-selected tier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementRecord {
    pub tier: PackageTier,
    pub features: BTreeMap<String, bool>,
}

/// The effective entitlement carried in the session context.
///
/// `tier == None` means "no tier known" — premium feature flags read as
/// unset (fail closed) while baseline CRUD stays usable (fail open).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub tier: Option<PackageTier>,
    pub features: BTreeMap<String, bool>,
}

impl Entitlement {
    /// Degraded-mode entitlement used whenever resolution fails.
    pub fn unknown() -> Self {
        Entitlement {
            tier: None,
            features: BTreeMap::new(),
        }
    }

    /// Whether a named feature flag is enabled. Missing flags are unset.
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

impl From<EntitlementRecord> for Entitlement {
    fn from(record: EntitlementRecord) -> Self {
        Entitlement {
            tier: Some(record.tier),
            features: record.features,
        }
    }
}
