//! Proptest generators for property-based testing.

use proptest::prelude::*;

use flowgate_core::{Address, FlowRate, TokenId};

use crate::fixtures::TestWorld;

/// Generate a random address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// Generate a random token.
pub fn token_id() -> impl Strategy<Value = TokenId> {
    address().prop_map(TokenId::from_address)
}

/// Generate a non-zero flow rate up to `max`.
pub fn flow_rate(max: u128) -> impl Strategy<Value = FlowRate> {
    (1..=max).prop_map(FlowRate::new)
}

/// One step of an adversarial lifecycle sequence.
///
/// Payers are indices into a fixed roster so sequences can revisit the
/// same payer: open-then-open, close-without-open, confiscate-then-close
/// and every other ordering the host could ever produce.
#[derive(Debug, Clone)]
pub enum FlowAction {
    /// Open a flow from the payer to the relay.
    Open { payer: usize, rate: u128 },

    /// Change the rate of the payer's flow.
    Retune { payer: usize, rate: u128 },

    /// Close the payer's flow.
    Close { payer: usize },

    /// A human manager confiscates the payer's key out-of-band.
    Confiscate { payer: usize },

    /// Advance the host clock and settle.
    Advance { secs: u64 },
}

/// Generate one action against a roster of `payers` payers.
pub fn flow_action(payers: usize) -> impl Strategy<Value = FlowAction> {
    prop_oneof![
        (0..payers, 1u128..=1_000_000u128)
            .prop_map(|(payer, rate)| FlowAction::Open { payer, rate }),
        (0..payers, 1u128..=1_000_000u128)
            .prop_map(|(payer, rate)| FlowAction::Retune { payer, rate }),
        (0..payers).prop_map(|payer| FlowAction::Close { payer }),
        (0..payers).prop_map(|payer| FlowAction::Confiscate { payer }),
        (0u64..=10_000u64).prop_map(|secs| FlowAction::Advance { secs }),
    ]
}

/// Generate an action sequence of up to `len` steps.
pub fn flow_actions(payers: usize, len: usize) -> impl Strategy<Value = Vec<FlowAction>> {
    prop::collection::vec(flow_action(payers), 1..=len)
}

/// Apply one action to a provisioned world.
///
/// Returns whether the host accepted it. Rejected actions (double open,
/// close of a missing flow) are part of the adversarial surface and are
/// deliberately not errors here.
pub fn apply_action(world: &TestWorld, payers: &[Address], action: &FlowAction) -> bool {
    match action {
        FlowAction::Open { payer, rate } => world
            .ledger
            .create_flow(
                world.token,
                payers[*payer],
                world.provisioned.relay,
                FlowRate::new(*rate),
            )
            .is_ok(),
        FlowAction::Retune { payer, rate } => world
            .ledger
            .update_flow(
                world.token,
                payers[*payer],
                world.provisioned.relay,
                FlowRate::new(*rate),
            )
            .is_ok(),
        FlowAction::Close { payer } => world
            .ledger
            .delete_flow(world.token, payers[*payer], world.provisioned.relay)
            .is_ok(),
        FlowAction::Confiscate { payer } => world
            .registry()
            .confiscate(world.owner, payers[*payer])
            .is_ok(),
        FlowAction::Advance { secs } => {
            world.ledger.advance(*secs);
            true
        }
    }
}
