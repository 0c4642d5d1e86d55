//! Error types for the registry.

use flowgate_core::Address;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Caller does not hold the manager role.
    #[error("not a manager: {0}")]
    NotManager(Address),

    /// Direct purchase rejected by the installed purchase hook.
    ///
    /// Distinct from [`NotManager`](Self::NotManager) so callers can tell
    /// "purchases are disabled here" apart from "wrong caller".
    #[error("purchases disabled")]
    PurchaseDisabled,

    /// The registry's key cap is exhausted.
    #[error("sold out: cap of {cap} keys reached")]
    SoldOut { cap: u64 },

    /// The offered value is below the base price.
    #[error("price too low: need {required}, got {got}")]
    PriceTooLow { required: u128, got: u128 },

    /// The holder has no key to confiscate.
    #[error("no key held by {0}")]
    NoSuchKey(Address),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
