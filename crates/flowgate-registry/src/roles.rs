//! The manager role table.
//!
//! An explicit access-control set keyed by address, mutated only through
//! the registry's entry points. No ambient global state.

use std::collections::BTreeSet;

use flowgate_core::Address;

/// The set of addresses holding the manager role on one registry.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    managers: BTreeSet<Address>,
}

impl RoleTable {
    /// Create a table with a single initial manager.
    pub fn new(initial: Address) -> Self {
        let mut managers = BTreeSet::new();
        managers.insert(initial);
        Self { managers }
    }

    /// Whether an address holds the manager role.
    pub fn is_manager(&self, address: &Address) -> bool {
        self.managers.contains(address)
    }

    /// Grant the manager role. Idempotent.
    pub fn grant(&mut self, address: Address) {
        self.managers.insert(address);
    }

    /// Remove the manager role. Returns whether it was held.
    pub fn revoke(&mut self, address: &Address) -> bool {
        self.managers.remove(address)
    }

    /// All current managers, in address order.
    pub fn managers(&self) -> Vec<Address> {
        self.managers.iter().copied().collect()
    }

    /// How many managers are assigned.
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Whether no managers remain.
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}
