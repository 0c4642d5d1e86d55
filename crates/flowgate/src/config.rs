//! Provisioning configuration.

use std::fmt;
use std::sync::Arc;

use flowgate_core::TokenId;
use flowgate_registry::{KeyCap, PurchaseHook};

use crate::error::ConfigError;

/// Inputs to one provisioning call.
pub struct ProvisionConfig {
    /// Validity extension per grant, in seconds. Must be positive.
    pub expiration_duration: u64,

    /// The streaming asset the bundle is denominated in.
    pub token: TokenId,

    /// Price floor for direct purchase. Ignored on the stream path.
    pub base_price: u128,

    /// Cap on concurrently held keys.
    pub key_cap: KeyCap,

    /// Display label for the registry. Must not be empty.
    pub name: String,

    /// The purchase hook to install. The bundled configuration passes
    /// a hook that rejects every direct purchase.
    pub hook: Arc<dyn PurchaseHook>,
}

impl ProvisionConfig {
    /// Validate all inputs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expiration_duration == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        if self.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if let KeyCap::Limited(0) = self.key_cap {
            return Err(ConfigError::InvalidKeyCap);
        }
        Ok(())
    }
}

impl fmt::Debug for ProvisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionConfig")
            .field("expiration_duration", &self.expiration_duration)
            .field("token", &self.token)
            .field("base_price", &self.base_price)
            .field("key_cap", &self.key_cap)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgate_core::Address;
    use flowgate_registry::RejectAllHook;

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
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut cfg = config();
        cfg.expiration_duration = 0;
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::InvalidDuration);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut cfg = config();
        cfg.name = String::new();
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::EmptyName);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let mut cfg = config();
        cfg.key_cap = KeyCap::Limited(0);
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::InvalidKeyCap);
    }

    #[test]
    fn test_unlimited_cap_accepted() {
        let mut cfg = config();
        cfg.key_cap = KeyCap::Unlimited;
        assert!(cfg.validate().is_ok());
    }
}
