//! # Flowgate Core
//!
//! Pure primitives shared across the Flowgate workspace: addresses, flow
//! rates, flow identities, and host log entries.
//!
//! This crate contains no I/O and no host logic. It is pure computation
//! over small value types.
//!
//! ## Key Types
//!
//! - [`Address`] - 20-byte account/component identifier
//! - [`TokenId`] - Streaming-asset identifier
//! - [`FlowRate`] - Tokens per second, unsigned
//! - [`FlowKey`] - Unique identity of a flow: (token, sender, receiver)
//! - [`LogEntry`] - An event emitted into the host's log

pub mod error;
pub mod event;
pub mod flow;
pub mod types;

pub use error::CoreError;
pub use event::{decode_address_pair, encode_address_pair, LogEntry};
pub use flow::{Flow, FlowKey};
pub use types::{Address, FlowRate, TokenId};
