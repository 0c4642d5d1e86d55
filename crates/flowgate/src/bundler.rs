//! The bundler: one-shot provisioning of a registry/relay pair.
//!
//! Each call instantiates a fresh MembershipRegistry and StreamRelay
//! from templates, wires the relay and the calling owner as registry
//! managers, renounces the bundler's own role, and surfaces both
//! addresses through a single terminal log entry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use flowgate_core::{
    decode_address_pair, encode_address_pair, Address, CoreError, LogEntry,
};
use flowgate_ledger::MemoryLedger;
use flowgate_registry::{MembershipRegistry, RegistryParams};
use flowgate_relay::StreamRelay;

use crate::config::ProvisionConfig;
use crate::error::Result;

/// The addresses produced by one provisioning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provisioned {
    /// The new membership registry.
    pub registry: Address,

    /// The new stream relay, already registered as a host app.
    pub relay: Address,
}

/// One-shot factory for stream-gated membership bundles.
pub struct Bundler {
    address: Address,
    ledger: Arc<MemoryLedger>,
    inner: RwLock<BundlerInner>,
}

struct BundlerInner {
    /// Instantiation salt, bumped per deployed component.
    nonce: u64,

    /// Deployed registries by address.
    registries: HashMap<Address, Arc<MembershipRegistry>>,

    /// Deployed relays by address.
    relays: HashMap<Address, Arc<StreamRelay>>,
}

impl Bundler {
    /// Create a bundler bound to a host ledger.
    pub fn new(address: Address, ledger: Arc<MemoryLedger>) -> Self {
        Self {
            address,
            ledger,
            inner: RwLock::new(BundlerInner {
                nonce: 0,
                registries: HashMap::new(),
                relays: HashMap::new(),
            }),
        }
    }

    /// The bundler's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Provision a wired registry/relay pair for `caller`.
    ///
    /// Fails atomically: inputs are validated and the relay's app slot
    /// is claimed before any directory entry or role is written, so an
    /// error leaves no partial deployment behind. Each call yields a
    /// fresh independent pair.
    pub fn provision(&self, caller: Address, config: ProvisionConfig) -> Result<Provisioned> {
        config.validate()?;

        let mut inner = self.inner.write().unwrap();
        let registry_addr = Address::derive(&self.address, inner.nonce);
        let relay_addr = Address::derive(&self.address, inner.nonce + 1);
        inner.nonce += 2;

        let registry = Arc::new(MembershipRegistry::new(
            registry_addr,
            RegistryParams {
                name: config.name,
                token: config.token,
                base_price: config.base_price,
                key_cap: config.key_cap,
                expiration_duration: config.expiration_duration,
            },
            config.hook,
            self.address,
        ));
        let relay = Arc::new(StreamRelay::new(relay_addr, config.token, registry.clone()));

        // The only fallible host interaction; nothing is visible yet if
        // the app slot turns out to be taken.
        self.ledger.register_app(relay_addr, relay.clone())?;

        registry.add_manager(self.address, relay_addr)?;
        registry.add_manager(self.address, caller)?;
        registry.renounce_manager(self.address)?;

        inner.registries.insert(registry_addr, registry);
        inner.relays.insert(relay_addr, relay);

        self.ledger
            .emit(self.address, encode_address_pair(&registry_addr, &relay_addr));
        info!(registry = %registry_addr, relay = %relay_addr, owner = %caller, "bundle provisioned");

        Ok(Provisioned {
            registry: registry_addr,
            relay: relay_addr,
        })
    }

    /// Look up a registry this bundler deployed.
    pub fn registry_at(&self, address: Address) -> Option<Arc<MembershipRegistry>> {
        self.inner.read().unwrap().registries.get(&address).cloned()
    }

    /// Look up a relay this bundler deployed.
    pub fn relay_at(&self, address: Address) -> Option<Arc<StreamRelay>> {
        self.inner.read().unwrap().relays.get(&address).cloned()
    }
}

/// Recover the provisioned pair from the terminal log entry.
pub fn decode_provision_log(entry: &LogEntry) -> std::result::Result<Provisioned, CoreError> {
    let (registry, relay) = decode_address_pair(&entry.data)?;
    Ok(Provisioned { registry, relay })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BundleError, ConfigError};
    use flowgate_core::TokenId;
    use flowgate_registry::{KeyCap, RejectAllHook};

    fn setup() -> (Arc<MemoryLedger>, Bundler) {
        let ledger = Arc::new(MemoryLedger::new());
        let bundler = Bundler::new(Address::random(), ledger.clone());
        (ledger, bundler)
    }

    fn config() -> ProvisionConfig {
        ProvisionConfig {
            expiration_duration: 1000,
            token: TokenId::from_address(Address::from_bytes([0x01; 20])),
            base_price: 0,
            key_cap: KeyCap::Limited(20),
            name: "Test".to_string(),
            hook: Arc::new(RejectAllHook),
        }
    }

    #[test]
    fn test_provision_populates_directories() {
        let (_ledger, bundler) = setup();
        let provisioned = bundler.provision(Address::random(), config()).unwrap();

        assert!(bundler.registry_at(provisioned.registry).is_some());
        assert!(bundler.relay_at(provisioned.relay).is_some());
        assert!(bundler.registry_at(provisioned.relay).is_none());
    }

    #[test]
    fn test_provision_emits_decodable_log() {
        let (ledger, bundler) = setup();
        let provisioned = bundler.provision(Address::random(), config()).unwrap();

        let entry = ledger.last_log().unwrap();
        assert_eq!(entry.emitter, bundler.address());
        assert_eq!(decode_provision_log(&entry).unwrap(), provisioned);
    }

    #[test]
    fn test_invalid_config_leaves_no_state() {
        let (ledger, bundler) = setup();
        let mut cfg = config();
        cfg.expiration_duration = 0;

        let err = bundler.provision(Address::random(), cfg).unwrap_err();
        assert!(matches!(
            err,
            BundleError::Config(ConfigError::InvalidDuration)
        ));
        assert!(ledger.last_log().is_none());
    }

    #[test]
    fn test_each_call_yields_fresh_pair() {
        let (_ledger, bundler) = setup();
        let first = bundler.provision(Address::random(), config()).unwrap();
        let second = bundler.provision(Address::random(), config()).unwrap();

        assert_ne!(first.registry, second.registry);
        assert_ne!(first.relay, second.relay);
    }
}
