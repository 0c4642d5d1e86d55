//! # Flowgate
//!
//! The unified API for the Flowgate system - membership gated on the
//! liveness of a continuous payment stream.
//!
//! ## Overview
//!
//! One provisioning call wires up the whole bundle:
//!
//! - **MembershipRegistry**: expiring validity keys, manager-gated
//!   grant/confiscate, and a purchase hook that rejects every direct
//!   purchase in the bundled configuration
//! - **StreamRelay**: mirrors each payer's inbound flow to the registry
//!   and keeps their key in step with the stream
//! - **Bundler**: the one-shot factory that instantiates both, wires
//!   their roles, and renounces its own
//!
//! ## Key Concepts
//!
//! - **Stream-gated**: opening a flow to the relay grants membership;
//!   closing it (voluntarily or by liquidation) revokes membership.
//! - **Never revert**: the relay acknowledges every host callback, even
//!   when it has to degrade internally. A reverting relay would be
//!   jailed by the host, stranding all current members.
//! - **Least privilege**: after provisioning, the bundler holds no role
//!   on the registry; only the relay and the designated owner do.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flowgate::{Bundler, ProvisionConfig, KeyCap, RejectAllHook};
//! use flowgate::core::{Address, TokenId};
//! use flowgate::ledger::MemoryLedger;
//!
//! let ledger = Arc::new(MemoryLedger::new());
//! let bundler = Bundler::new(Address::random(), ledger.clone());
//!
//! let owner = Address::random();
//! let provisioned = bundler
//!     .provision(
//!         owner,
//!         ProvisionConfig {
//!             expiration_duration: 1000,
//!             token: TokenId::from_address(Address::random()),
//!             base_price: 0,
//!             key_cap: KeyCap::Limited(20),
//!             name: "Test".to_string(),
//!             hook: Arc::new(RejectAllHook),
//!         },
//!     )
//!     .unwrap();
//!
//! // Stream into `provisioned.relay` to become a member.
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `flowgate::core` - Core primitives (Address, FlowRate, etc.)
//! - `flowgate::ledger` - The streaming host
//! - `flowgate::registry` - The membership registry
//! - `flowgate::relay` - The stream relay

pub mod bundler;
pub mod config;
pub mod error;

// Re-export component crates
pub use flowgate_core as core;
pub use flowgate_ledger as ledger;
pub use flowgate_relay as relay;
pub use flowgate_registry as registry;

// Re-export main types for convenience
pub use bundler::{decode_provision_log, Bundler, Provisioned};
pub use config::ProvisionConfig;
pub use error::{BundleError, ConfigError, Result};

// Re-export commonly used component types
pub use flowgate_core::{Address, FlowRate, LogEntry, TokenId};
pub use flowgate_ledger::MemoryLedger;
pub use flowgate_registry::{
    AllowAllHook, KeyCap, MembershipRegistry, PurchaseHook, RejectAllHook,
};
pub use flowgate_relay::StreamRelay;
