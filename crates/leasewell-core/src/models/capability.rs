//! Capability tokens and the capability-set value type.

use serde::{Deserialize, Serialize};

/// A single permission token granted to an effective identity within the
/// current tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageTeam,
    ManageProperties,
    ManagePayments,
    ViewReports,
    ManageSettings,
    ManageBusinesses,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::ManageTeam,
        Capability::ManageProperties,
        Capability::ManagePayments,
        Capability::ViewReports,
        Capability::ManageSettings,
        Capability::ManageBusinesses,
    ];

    fn bit(self) -> u8 {
        match self {
            Capability::ManageTeam => 1 << 0,
            Capability::ManageProperties => 1 << 1,
            Capability::ManagePayments => 1 << 2,
            Capability::ViewReports => 1 << 3,
            Capability::ManageSettings => 1 << 4,
            Capability::ManageBusinesses => 1 << 5,
        }
    }
}

/// A small set of [`Capability`] tokens.
///
/// Copyable value type so a published session context snapshot never
/// shares mutable permission state with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set (default deny).
    pub fn empty() -> Self {
        CapabilitySet(0)
    }

    /// Every capability (ownership implies full control).
    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    /// A set containing exactly one capability.
    pub fn only(capability: Capability) -> Self {
        CapabilitySet(capability.bit())
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// OR semantics: any match grants.
    pub fn contains_any(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().any(|c| self.contains(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }

    // Convenience predicates. Thin wrappers over `contains`; no
    // independent logic that could diverge from the role table.

    pub fn can_manage_properties(&self) -> bool {
        self.contains(Capability::ManageProperties)
    }

    pub fn can_manage_payments(&self) -> bool {
        self.contains(Capability::ManagePayments)
    }

    pub fn can_view_reports(&self) -> bool {
        self.contains(Capability::ViewReports)
    }

    pub fn can_manage_businesses(&self) -> bool {
        self.contains(Capability::ManageBusinesses)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}
