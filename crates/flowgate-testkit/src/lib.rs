//! # Flowgate Testkit
//!
//! Testing utilities for the Flowgate workspace: provisioned-world
//! fixtures, proptest generators, and the adversarial callback-sequence
//! harness used to pound on the relay's never-revert contract.

pub mod fixtures;
pub mod generators;

pub use fixtures::TestWorld;
pub use generators::{apply_action, FlowAction};
