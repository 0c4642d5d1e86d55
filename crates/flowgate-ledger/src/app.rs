//! The app callback seam.
//!
//! Apps register at an address and receive synchronous lifecycle
//! callbacks for inbound flows. During a callback the app acts through
//! [`FlowOps`], a borrow-scoped handle that moves the app's own outbound
//! flows within the same unit of work.
//!
//! Returning `Err` from a callback causes the host to jail the app:
//! the host stops delivering callbacks to it permanently. A conforming
//! app converts every internal failure into a degraded-but-successful
//! outcome and returns `Ok(())`.

use std::collections::HashMap;

use thiserror::Error;

use flowgate_core::{Address, Flow, FlowKey, FlowRate, TokenId};

use crate::error::LedgerError;

/// Why an inbound flow was closed.
///
/// Apps must not branch on this: a liquidation is handled exactly like a
/// voluntary close. It exists so the host can report what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The sender closed the flow.
    Voluntary,

    /// The host force-closed the flow because the sender's balance
    /// could not cover what was owed.
    Liquidation,
}

/// Error returned by a failing app callback.
///
/// Produced only by misbehaving apps; the host jails the emitter.
#[derive(Debug, Error)]
#[error("app callback failed: {0}")]
pub struct AppError(pub String);

/// Callback interface for stream-reactive apps.
///
/// `user_data` is caller-supplied context attached to the lifecycle
/// call, passed through verbatim; apps that don't need it ignore it.
pub trait FlowApp: Send + Sync {
    /// An inbound flow to this app was created or its rate changed.
    ///
    /// `old_rate` is zero on creation.
    fn on_flow_changed(
        &self,
        ops: &mut FlowOps<'_>,
        token: TokenId,
        sender: Address,
        old_rate: FlowRate,
        new_rate: FlowRate,
        user_data: &[u8],
    ) -> Result<(), AppError>;

    /// An inbound flow to this app was deleted.
    fn on_flow_deleted(
        &self,
        ops: &mut FlowOps<'_>,
        token: TokenId,
        sender: Address,
        old_rate: FlowRate,
        reason: CloseReason,
        user_data: &[u8],
    ) -> Result<(), AppError>;
}

/// In-callback handle for moving the app's own outbound flows.
///
/// The sender side of every operation is fixed to the app's address.
/// Outbound moves made here are covered by host-granted app credit, so
/// no deposit check applies; the credit is bounded by the inbound
/// deposit the host already holds.
pub struct FlowOps<'a> {
    flows: &'a mut HashMap<FlowKey, Flow>,
    app: Address,
    now: i64,
}

impl<'a> FlowOps<'a> {
    pub(crate) fn new(flows: &'a mut HashMap<FlowKey, Flow>, app: Address, now: i64) -> Self {
        Self { flows, app, now }
    }

    /// The app's own address.
    pub fn app_address(&self) -> Address {
        self.app
    }

    /// The host clock, in seconds.
    pub fn now(&self) -> i64 {
        self.now
    }

    /// Current rate of the app's outbound flow to `receiver`, zero if none.
    pub fn flow_rate(&self, token: TokenId, receiver: Address) -> FlowRate {
        let key = FlowKey::new(token, self.app, receiver);
        self.flows.get(&key).map(|f| f.rate).unwrap_or(FlowRate::ZERO)
    }

    /// Open or retarget the app's outbound flow to `receiver`.
    pub fn create_or_update_flow(
        &mut self,
        token: TokenId,
        receiver: Address,
        rate: FlowRate,
    ) -> Result<(), LedgerError> {
        if receiver == self.app {
            return Err(LedgerError::SelfFlow);
        }
        if rate.is_zero() {
            return Err(LedgerError::ZeroRate);
        }

        let key = FlowKey::new(token, self.app, receiver);
        match self.flows.get_mut(&key) {
            Some(flow) => {
                flow.rate = rate;
                flow.updated_at = self.now;
            }
            None => {
                self.flows.insert(key, Flow::new(key, rate, self.now));
            }
        }
        Ok(())
    }

    /// Tear down the app's outbound flow to `receiver`.
    pub fn delete_flow(&mut self, token: TokenId, receiver: Address) -> Result<(), LedgerError> {
        let key = FlowKey::new(token, self.app, receiver);
        self.flows
            .remove(&key)
            .map(|_| ())
            .ok_or(LedgerError::FlowNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (HashMap<FlowKey, Flow>, TokenId, Address, Address) {
        let token = TokenId::from_address(Address::from_bytes([0x01; 20]));
        let app = Address::from_bytes([0x02; 20]);
        let receiver = Address::from_bytes([0x03; 20]);
        (HashMap::new(), token, app, receiver)
    }

    #[test]
    fn test_ops_create_and_read() {
        let (mut flows, token, app, receiver) = fixture();
        let mut ops = FlowOps::new(&mut flows, app, 100);

        assert_eq!(ops.flow_rate(token, receiver), FlowRate::ZERO);
        ops.create_or_update_flow(token, receiver, FlowRate::new(42))
            .unwrap();
        assert_eq!(ops.flow_rate(token, receiver), FlowRate::new(42));
    }

    #[test]
    fn test_ops_update_in_place() {
        let (mut flows, token, app, receiver) = fixture();
        let mut ops = FlowOps::new(&mut flows, app, 100);

        ops.create_or_update_flow(token, receiver, FlowRate::new(42))
            .unwrap();
        ops.create_or_update_flow(token, receiver, FlowRate::new(7))
            .unwrap();
        assert_eq!(ops.flow_rate(token, receiver), FlowRate::new(7));
        assert_eq!(flows.len(), 1);
    }

    #[test]
    fn test_ops_rejects_self_flow() {
        let (mut flows, token, app, _) = fixture();
        let mut ops = FlowOps::new(&mut flows, app, 100);

        let err = ops
            .create_or_update_flow(token, app, FlowRate::new(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::SelfFlow));
    }

    #[test]
    fn test_ops_rejects_zero_rate() {
        let (mut flows, token, app, receiver) = fixture();
        let mut ops = FlowOps::new(&mut flows, app, 100);

        let err = ops
            .create_or_update_flow(token, receiver, FlowRate::ZERO)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ZeroRate));
    }

    #[test]
    fn test_ops_delete_missing_flow() {
        let (mut flows, token, app, receiver) = fixture();
        let mut ops = FlowOps::new(&mut flows, app, 100);

        let err = ops.delete_flow(token, receiver).unwrap_err();
        assert!(matches!(err, LedgerError::FlowNotFound));
    }
}
