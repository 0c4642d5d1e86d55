//! Error types for the ledger.

use flowgate_core::Address;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Sender balance cannot cover the required flow deposit.
    #[error("deposit required: need {required}, have {available}")]
    DepositRequired { required: u128, available: u128 },

    /// No flow exists for the given (token, sender, receiver).
    #[error("flow not found")]
    FlowNotFound,

    /// A flow already exists for the given (token, sender, receiver).
    #[error("flow already exists")]
    FlowExists,

    /// Sender and receiver are the same address.
    #[error("flow to self is not allowed")]
    SelfFlow,

    /// Zero-rate flows are deleted, not created or updated.
    #[error("flow rate must be non-zero")]
    ZeroRate,

    /// Flow rate arithmetic overflowed.
    #[error("flow rate overflow")]
    RateOverflow,

    /// An app is already registered at this address.
    #[error("app already registered at {0}")]
    AppAlreadyRegistered(Address),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
