//! # Flowgate Relay
//!
//! The stream relay: reacts to inbound flow lifecycle callbacks from the
//! host and maintains a mirrored outbound flow to the membership
//! registry's receiving address, keeping membership validity synchronized
//! with stream liveness.
//!
//! The relay's one hard rule is that its callbacks never fail. A relay
//! that fails a lifecycle callback gets jailed by the host, stranding
//! every current member. Internal failures degrade: the relay records
//! what went wrong, leaves prior forwarding state unchanged, and
//! acknowledges the callback anyway.

pub mod error;
pub mod relay;

pub use error::RelayError;
pub use relay::{Degradation, StreamRelay};
