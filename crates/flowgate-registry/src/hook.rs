//! Purchase hooks.
//!
//! A hook is a stateless predicate consulted before any direct (non-stream)
//! purchase. The bundled configuration always installs [`RejectAllHook`],
//! which forces all membership acquisition through the relay.

use flowgate_core::Address;

/// What a hook gets to look at before a direct purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseContext {
    /// Who is paying.
    pub caller: Address,

    /// Who would receive the key.
    pub recipient: Address,

    /// The offered value.
    pub value: u128,
}

/// Capability predicate gating the direct purchase path.
pub trait PurchaseHook: Send + Sync {
    /// Whether the purchase may proceed.
    fn allow(&self, ctx: &PurchaseContext) -> bool;
}

/// Rejects every direct purchase.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAllHook;

impl PurchaseHook for RejectAllHook {
    fn allow(&self, _ctx: &PurchaseContext) -> bool {
        false
    }
}

/// Permits every direct purchase.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllHook;

impl PurchaseHook for AllowAllHook {
    fn allow(&self, _ctx: &PurchaseContext) -> bool {
        true
    }
}
