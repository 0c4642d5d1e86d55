//! Error types for the relay.
//!
//! [`RelayError`] never crosses the callback boundary: the relay converts
//! every instance into a recorded degradation before acknowledging the
//! host.

use flowgate_ledger::LedgerError;
use flowgate_registry::RegistryError;
use thiserror::Error;

/// Internal relay failures.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A registry call failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An outbound flow operation failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Summing per-payer forwarded rates overflowed.
    #[error("aggregate rate overflow")]
    AggregateOverflow,
}
