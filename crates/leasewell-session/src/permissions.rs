//! Pure permission derivation.
//!
//! Maps (role, tenant ownership, restricted-owner class) to a capability
//! set. Impersonation does not change the algorithm — it changes which
//! identity's data feeds it. This module never fails: unknown or missing
//! inputs resolve to the empty set (default deny).

use leasewell_core::models::{Capability, CapabilitySet, Role};

/// The fixed role table. Exhaustive match so an added role cannot be
/// silently unmapped.
pub fn role_capabilities(role: Role) -> CapabilitySet {
    match role {
        Role::Owner => CapabilitySet::all(),
        Role::Admin => [
            Capability::ManageTeam,
            Capability::ManageProperties,
            Capability::ManagePayments,
            Capability::ViewReports,
            Capability::ManageSettings,
        ]
        .into_iter()
        .collect(),
        Role::PropertyManager => [Capability::ManageProperties, Capability::ViewReports]
            .into_iter()
            .collect(),
        Role::Accounting => [Capability::ManagePayments, Capability::ViewReports]
            .into_iter()
            .collect(),
        Role::Viewer => CapabilitySet::only(Capability::ViewReports),
    }
}

/// Derive the capability set for an effective identity in the current
/// tenant.
///
/// Rule order is load-bearing:
/// 1. the restricted property-owner class is a hard `view_reports`
///    ceiling that short-circuits everything else;
/// 2. owning the current tenant grants all capabilities;
/// 3. otherwise the fixed role table applies, with no role meaning no
///    capabilities.
pub fn resolve_capabilities(
    role: Option<Role>,
    owns_tenant: bool,
    restricted_owner: bool,
) -> CapabilitySet {
    if restricted_owner {
        return CapabilitySet::only(Capability::ViewReports);
    }
    if owns_tenant {
        return CapabilitySet::all();
    }
    match role {
        Some(role) => role_capabilities(role),
        None => CapabilitySet::empty(),
    }
}
