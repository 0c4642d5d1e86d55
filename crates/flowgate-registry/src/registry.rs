//! The membership registry.
//!
//! Holds one expiring key per holder address. Grants and confiscations
//! go through manager-gated entry points; direct purchase goes through
//! the installed hook.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use flowgate_core::{Address, TokenId};

use crate::error::{RegistryError, Result};
use crate::hook::{PurchaseContext, PurchaseHook};
use crate::roles::RoleTable;

/// Maximum number of keys a registry may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCap {
    /// No limit.
    Unlimited,

    /// At most this many concurrently held keys. Never zero.
    Limited(u64),
}

impl KeyCap {
    fn has_capacity(&self, held: usize) -> Result<()> {
        match self {
            KeyCap::Unlimited => Ok(()),
            KeyCap::Limited(cap) => {
                if (held as u64) < *cap {
                    Ok(())
                } else {
                    Err(RegistryError::SoldOut { cap: *cap })
                }
            }
        }
    }
}

/// Construction parameters for a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryParams {
    /// Display label.
    pub name: String,

    /// The asset memberships are denominated in.
    pub token: TokenId,

    /// Price floor for direct purchase. Ignored on the stream path.
    pub base_price: u128,

    /// Cap on concurrently held keys.
    pub key_cap: KeyCap,

    /// Validity extension per grant, in seconds.
    pub expiration_duration: u64,
}

/// State of one holder's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    /// When the key stops being valid (host clock, seconds).
    pub expires_at: i64,
}

/// A capability registry granting and revoking expiring keys.
pub struct MembershipRegistry {
    address: Address,
    params: RegistryParams,
    inner: RwLock<RegistryInner>,
}

struct RegistryInner {
    keys: HashMap<Address, KeyState>,
    roles: RoleTable,
    hook: Arc<dyn PurchaseHook>,
}

impl MembershipRegistry {
    /// Create a registry with `creator` as its initial manager.
    pub fn new(
        address: Address,
        params: RegistryParams,
        hook: Arc<dyn PurchaseHook>,
        creator: Address,
    ) -> Self {
        Self {
            address,
            params,
            inner: RwLock::new(RegistryInner {
                keys: HashMap::new(),
                roles: RoleTable::new(creator),
                hook,
            }),
        }
    }

    /// The registry's own address: where relayed streams land.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The display label.
    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// The registry's streaming asset.
    pub fn token(&self) -> TokenId {
        self.params.token
    }

    /// Construction parameters.
    pub fn params(&self) -> &RegistryParams {
        &self.params
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether an address holds the manager role.
    pub fn is_manager(&self, address: Address) -> bool {
        self.inner.read().unwrap().roles.is_manager(&address)
    }

    /// All current managers.
    pub fn managers(&self) -> Vec<Address> {
        self.inner.read().unwrap().roles.managers()
    }

    /// Grant the manager role to `who`. Manager-only.
    pub fn add_manager(&self, caller: Address, who: Address) -> Result<()> {
        let mut inner = self.write_as_manager(caller)?;
        inner.roles.grant(who);
        Ok(())
    }

    /// Remove the manager role from `who`. Manager-only.
    pub fn remove_manager(&self, caller: Address, who: Address) -> Result<()> {
        let mut inner = self.write_as_manager(caller)?;
        inner.roles.revoke(&who);
        Ok(())
    }

    /// Give up the caller's own manager role.
    pub fn renounce_manager(&self, caller: Address) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.roles.revoke(&caller) {
            return Err(RegistryError::NotManager(caller));
        }
        Ok(())
    }

    /// Replace the purchase hook. Manager-only.
    pub fn set_purchase_hook(&self, caller: Address, hook: Arc<dyn PurchaseHook>) -> Result<()> {
        let mut inner = self.write_as_manager(caller)?;
        inner.hook = hook;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `holder` has a live key.
    pub fn is_valid(&self, holder: Address, now: i64) -> bool {
        let inner = self.inner.read().unwrap();
        inner
            .keys
            .get(&holder)
            .map(|k| k.expires_at > now)
            .unwrap_or(false)
    }

    /// When `holder`'s key expires, if one exists.
    pub fn key_expiration(&self, holder: Address) -> Option<i64> {
        self.inner.read().unwrap().keys.get(&holder).map(|k| k.expires_at)
    }

    /// How many keys are currently issued, live or expired.
    pub fn key_count(&self) -> usize {
        self.inner.read().unwrap().keys.len()
    }

    /// Create or extend `holder`'s key. Manager-only.
    ///
    /// A live key is extended from its current expiry; an expired or
    /// absent key restarts from `now`. Only brand-new holders count
    /// against the key cap.
    pub fn grant_or_renew(&self, caller: Address, holder: Address, now: i64) -> Result<i64> {
        let mut inner = self.write_as_manager(caller)?;
        let expires_at = issue_key(&mut inner, &self.params, holder, now)?;
        debug!(registry = %self.address, %holder, expires_at, "key granted");
        Ok(expires_at)
    }

    /// Revoke `holder`'s key immediately. Manager-only.
    pub fn confiscate(&self, caller: Address, holder: Address) -> Result<()> {
        let mut inner = self.write_as_manager(caller)?;
        if inner.keys.remove(&holder).is_none() {
            return Err(RegistryError::NoSuchKey(holder));
        }
        debug!(registry = %self.address, %holder, "key confiscated");
        Ok(())
    }

    /// Buy a key directly, bypassing the stream path.
    ///
    /// The installed hook is consulted first; rejection surfaces as
    /// [`RegistryError::PurchaseDisabled`].
    pub fn purchase_direct(
        &self,
        caller: Address,
        recipient: Address,
        value: u128,
        now: i64,
    ) -> Result<i64> {
        let mut inner = self.inner.write().unwrap();

        let ctx = PurchaseContext {
            caller,
            recipient,
            value,
        };
        if !inner.hook.allow(&ctx) {
            return Err(RegistryError::PurchaseDisabled);
        }
        if value < self.params.base_price {
            return Err(RegistryError::PriceTooLow {
                required: self.params.base_price,
                got: value,
            });
        }
        issue_key(&mut inner, &self.params, recipient, now)
    }

    fn write_as_manager(
        &self,
        caller: Address,
    ) -> Result<std::sync::RwLockWriteGuard<'_, RegistryInner>> {
        let inner = self.inner.write().unwrap();
        if !inner.roles.is_manager(&caller) {
            return Err(RegistryError::NotManager(caller));
        }
        Ok(inner)
    }
}

fn issue_key(
    inner: &mut RegistryInner,
    params: &RegistryParams,
    holder: Address,
    now: i64,
) -> Result<i64> {
    let duration = params.expiration_duration as i64;
    let expires_at = match inner.keys.get(&holder) {
        Some(key) if key.expires_at > now => key.expires_at + duration,
        Some(_) => now + duration,
        None => {
            params.key_cap.has_capacity(inner.keys.len())?;
            now + duration
        }
    };
    inner.keys.insert(holder, KeyState { expires_at });
    Ok(expires_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{AllowAllHook, RejectAllHook};

    fn params(cap: KeyCap) -> RegistryParams {
        RegistryParams {
            name: "Test".to_string(),
            token: TokenId::from_address(Address::from_bytes([0x01; 20])),
            base_price: 50,
            key_cap: cap,
            expiration_duration: 1000,
        }
    }

    fn registry(hook: Arc<dyn PurchaseHook>, cap: KeyCap) -> (MembershipRegistry, Address) {
        let creator = Address::from_bytes([0xaa; 20]);
        let registry = MembershipRegistry::new(
            Address::from_bytes([0xbb; 20]),
            params(cap),
            hook,
            creator,
        );
        (registry, creator)
    }

    #[test]
    fn test_grant_and_validity() {
        let (reg, creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);
        let holder = Address::random();

        let expires = reg.grant_or_renew(creator, holder, 100).unwrap();
        assert_eq!(expires, 1100);
        assert!(reg.is_valid(holder, 100));
        assert!(reg.is_valid(holder, 1099));
        assert!(!reg.is_valid(holder, 1100));
    }

    #[test]
    fn test_renew_extends_live_key() {
        let (reg, creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);
        let holder = Address::random();

        reg.grant_or_renew(creator, holder, 0).unwrap();
        let expires = reg.grant_or_renew(creator, holder, 500).unwrap();
        assert_eq!(expires, 2000);
    }

    #[test]
    fn test_regrant_after_expiry_restarts() {
        let (reg, creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);
        let holder = Address::random();

        reg.grant_or_renew(creator, holder, 0).unwrap();
        let expires = reg.grant_or_renew(creator, holder, 5000).unwrap();
        assert_eq!(expires, 6000);
    }

    #[test]
    fn test_confiscate() {
        let (reg, creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);
        let holder = Address::random();

        reg.grant_or_renew(creator, holder, 0).unwrap();
        reg.confiscate(creator, holder).unwrap();
        assert!(!reg.is_valid(holder, 0));

        let err = reg.confiscate(creator, holder).unwrap_err();
        assert!(matches!(err, RegistryError::NoSuchKey(_)));
    }

    #[test]
    fn test_non_manager_denied() {
        let (reg, _creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);
        let stranger = Address::random();
        let holder = Address::random();

        let err = reg.grant_or_renew(stranger, holder, 0).unwrap_err();
        assert!(matches!(err, RegistryError::NotManager(_)));

        let err = reg.confiscate(stranger, holder).unwrap_err();
        assert!(matches!(err, RegistryError::NotManager(_)));
    }

    #[test]
    fn test_manager_wiring() {
        let (reg, creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);
        let relay = Address::random();
        let owner = Address::random();

        reg.add_manager(creator, relay).unwrap();
        reg.add_manager(creator, owner).unwrap();
        reg.renounce_manager(creator).unwrap();

        assert!(reg.is_manager(relay));
        assert!(reg.is_manager(owner));
        assert!(!reg.is_manager(creator));

        // The creator is locked out for good.
        let err = reg.grant_or_renew(creator, Address::random(), 0).unwrap_err();
        assert!(matches!(err, RegistryError::NotManager(_)));
    }

    #[test]
    fn test_renounce_without_role() {
        let (reg, _creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);
        let err = reg.renounce_manager(Address::random()).unwrap_err();
        assert!(matches!(err, RegistryError::NotManager(_)));
    }

    #[test]
    fn test_purchase_disabled_by_bundled_hook() {
        let (reg, creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);

        // The hook answer does not depend on who calls or how much they pay.
        for (caller, value) in [(creator, 1_000_000u128), (Address::random(), 0)] {
            let err = reg
                .purchase_direct(caller, Address::random(), value, 0)
                .unwrap_err();
            assert!(matches!(err, RegistryError::PurchaseDisabled));
        }
        assert_eq!(reg.key_count(), 0);
    }

    #[test]
    fn test_purchase_allowed_path() {
        let (reg, _creator) = registry(Arc::new(AllowAllHook), KeyCap::Unlimited);
        let buyer = Address::random();

        let err = reg.purchase_direct(buyer, buyer, 10, 0).unwrap_err();
        assert!(matches!(err, RegistryError::PriceTooLow { required: 50, got: 10 }));

        let expires = reg.purchase_direct(buyer, buyer, 50, 0).unwrap();
        assert_eq!(expires, 1000);
        assert!(reg.is_valid(buyer, 0));
    }

    #[test]
    fn test_key_cap_enforced() {
        let (reg, creator) = registry(Arc::new(RejectAllHook), KeyCap::Limited(2));

        let a = Address::random();
        let b = Address::random();
        reg.grant_or_renew(creator, a, 0).unwrap();
        reg.grant_or_renew(creator, b, 0).unwrap();

        let err = reg.grant_or_renew(creator, Address::random(), 0).unwrap_err();
        assert!(matches!(err, RegistryError::SoldOut { cap: 2 }));

        // Renewal of an existing holder does not count against the cap.
        reg.grant_or_renew(creator, a, 0).unwrap();

        // Confiscation frees a slot.
        reg.confiscate(creator, b).unwrap();
        reg.grant_or_renew(creator, Address::random(), 0).unwrap();
    }

    #[test]
    fn test_set_purchase_hook() {
        let (reg, creator) = registry(Arc::new(RejectAllHook), KeyCap::Unlimited);
        let buyer = Address::random();

        reg.set_purchase_hook(creator, Arc::new(AllowAllHook)).unwrap();
        reg.purchase_direct(buyer, buyer, 50, 0).unwrap();

        let err = reg
            .set_purchase_hook(Address::random(), Arc::new(RejectAllHook))
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotManager(_)));
    }
}
