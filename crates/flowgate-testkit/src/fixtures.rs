//! Test fixtures and helpers.
//!
//! Common setup code for integration and property tests: a host ledger
//! with one provisioned bundle and deep-pocketed payers.

use std::sync::Arc;

use flowgate::{Bundler, KeyCap, ProvisionConfig, Provisioned, RejectAllHook};
use flowgate_core::{Address, TokenId};
use flowgate_ledger::MemoryLedger;
use flowgate_registry::MembershipRegistry;
use flowgate_relay::StreamRelay;

/// Balance minted to payers created through the fixture. Large enough
/// that deposits and long settlements never run a payer dry.
pub const PAYER_FUNDS: u128 = 1u128 << 100;

/// A provisioned world: ledger, bundler, and one registry/relay pair.
pub struct TestWorld {
    pub ledger: Arc<MemoryLedger>,
    pub bundler: Bundler,
    pub owner: Address,
    pub token: TokenId,
    pub provisioned: Provisioned,
}

impl TestWorld {
    /// Provision a bundle with an unlimited key cap.
    pub fn new() -> Self {
        Self::with_key_cap(KeyCap::Unlimited)
    }

    /// Provision a bundle with the given key cap.
    pub fn with_key_cap(key_cap: KeyCap) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let bundler = Bundler::new(Address::random(), ledger.clone());
        let owner = Address::random();
        let token = TokenId::from_address(Address::random());

        let provisioned = bundler
            .provision(
                owner,
                ProvisionConfig {
                    expiration_duration: 1000,
                    token,
                    base_price: 0,
                    key_cap,
                    name: "Test".to_string(),
                    hook: Arc::new(RejectAllHook),
                },
            )
            .expect("provisioning a valid config");

        Self {
            ledger,
            bundler,
            owner,
            token,
            provisioned,
        }
    }

    /// The provisioned registry.
    pub fn registry(&self) -> Arc<MembershipRegistry> {
        self.bundler
            .registry_at(self.provisioned.registry)
            .expect("provisioned registry in directory")
    }

    /// The provisioned relay.
    pub fn relay(&self) -> Arc<StreamRelay> {
        self.bundler
            .relay_at(self.provisioned.relay)
            .expect("provisioned relay in directory")
    }

    /// A fresh payer holding [`PAYER_FUNDS`].
    pub fn funded_payer(&self) -> Address {
        let payer = Address::random();
        self.ledger.mint(self.token, payer, PAYER_FUNDS);
        payer
    }

    /// A batch of fresh funded payers.
    pub fn funded_payers(&self, count: usize) -> Vec<Address> {
        (0..count).map(|_| self.funded_payer()).collect()
    }

    /// The relay's outbound rate to the registry, read from the host.
    pub fn outbound_rate(&self) -> flowgate_core::FlowRate {
        self.ledger
            .flow_rate(self.token, self.provisioned.relay, self.provisioned.registry)
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
