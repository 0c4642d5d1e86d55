//! # Flowgate Registry
//!
//! The membership registry: a capability registry granting and revoking
//! per-holder validity keys with expiration.
//!
//! Grant, renewal, and confiscation are gated on an explicit manager
//! role table. The direct purchase path is gated on a pluggable
//! [`PurchaseHook`]; the bundled configuration installs [`RejectAllHook`]
//! so that the only way in is the stream relay.
//!
//! ## Key Types
//!
//! - [`MembershipRegistry`] - Keys, roles, and the purchase path
//! - [`RoleTable`] - Explicit manager set
//! - [`PurchaseHook`] - Capability predicate consulted before direct purchase

pub mod error;
pub mod hook;
pub mod registry;
pub mod roles;

pub use error::{RegistryError, Result};
pub use hook::{AllowAllHook, PurchaseContext, PurchaseHook, RejectAllHook};
pub use registry::{KeyCap, KeyState, MembershipRegistry, RegistryParams};
pub use roles::RoleTable;
