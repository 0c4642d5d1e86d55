//! Error types for provisioning.

use flowgate_ledger::LedgerError;
use flowgate_registry::RegistryError;
use thiserror::Error;

/// Rejected provisioning inputs.
///
/// Raised before any component is created, so a failed provisioning
/// call leaves no state behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The expiration duration must be positive.
    #[error("expiration duration must be positive")]
    InvalidDuration,

    /// The display name must not be empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A limited key cap must be positive.
    #[error("key cap must be positive")]
    InvalidKeyCap,
}

/// Errors that can occur during bundler operations.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Ledger error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Result type for bundler operations.
pub type Result<T> = std::result::Result<T, BundleError>;
