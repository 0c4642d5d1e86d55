//! The relay state machine.
//!
//! Per payer the relay is either idle (no entry in the forwarding map)
//! or forwarding at a mapped rate. The outbound flow to the registry
//! carries the sum of all per-payer forwarded rates; the last payer
//! draining tears it down entirely.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::warn;

use flowgate_core::{Address, FlowRate, TokenId};
use flowgate_ledger::{AppError, CloseReason, FlowApp, FlowOps, LedgerError};
use flowgate_registry::{MembershipRegistry, RegistryError};

use crate::error::RelayError;

/// A degraded outcome the relay absorbed instead of failing its callback.
#[derive(Debug, Clone)]
pub struct Degradation {
    /// The payer whose event could not be fully applied.
    pub payer: Address,

    /// Host clock at the time, seconds.
    pub at: i64,

    /// What went wrong.
    pub reason: String,
}

/// The payment-stream relay.
///
/// Registered as an app on the host ledger; mirrors each inbound flow to
/// the registry's receiving address and keeps the payer's membership key
/// in step with the stream.
pub struct StreamRelay {
    address: Address,
    token: TokenId,
    registry: Arc<MembershipRegistry>,
    rate_fn: fn(FlowRate) -> FlowRate,
    inner: RwLock<RelayInner>,
}

struct RelayInner {
    /// payer -> forwarded rate. Entries are removed on full drain.
    forwarded: HashMap<Address, FlowRate>,

    /// Absorbed failures, oldest first.
    degradations: Vec<Degradation>,
}

fn identity(rate: FlowRate) -> FlowRate {
    rate
}

impl StreamRelay {
    /// Create a relay forwarding at the identity rate.
    pub fn new(address: Address, token: TokenId, registry: Arc<MembershipRegistry>) -> Self {
        Self::with_rate_fn(address, token, registry, identity)
    }

    /// Create a relay with a custom inbound-to-outbound rate mapping.
    pub fn with_rate_fn(
        address: Address,
        token: TokenId,
        registry: Arc<MembershipRegistry>,
        rate_fn: fn(FlowRate) -> FlowRate,
    ) -> Self {
        Self {
            address,
            token,
            registry,
            rate_fn,
            inner: RwLock::new(RelayInner {
                forwarded: HashMap::new(),
                degradations: Vec::new(),
            }),
        }
    }

    /// The relay's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The token this relay forwards.
    pub fn token(&self) -> TokenId {
        self.token
    }

    /// The rate currently forwarded for a payer, zero if idle.
    pub fn forwarded_rate(&self, payer: Address) -> FlowRate {
        self.inner
            .read()
            .unwrap()
            .forwarded
            .get(&payer)
            .copied()
            .unwrap_or(FlowRate::ZERO)
    }

    /// Sum of all per-payer forwarded rates.
    pub fn aggregate_rate(&self) -> FlowRate {
        let inner = self.inner.read().unwrap();
        inner
            .forwarded
            .values()
            .fold(FlowRate::ZERO, |acc, r| {
                acc.checked_add(*r).unwrap_or(FlowRate::new(u128::MAX))
            })
    }

    /// All payers currently forwarding.
    pub fn active_payers(&self) -> Vec<Address> {
        self.inner.read().unwrap().forwarded.keys().copied().collect()
    }

    /// Absorbed failures, oldest first.
    pub fn degradations(&self) -> Vec<Degradation> {
        self.inner.read().unwrap().degradations.clone()
    }

    /// How many failures have been absorbed.
    pub fn degradation_count(&self) -> usize {
        self.inner.read().unwrap().degradations.len()
    }

    /// Begin or retune forwarding for a payer.
    ///
    /// Membership is granted before the outbound flow moves so a payer
    /// never pays into a dead registry slot; if the outbound move then
    /// fails, prior forwarding is left unchanged and the failure is
    /// reported for absorption.
    fn try_forward(
        &self,
        ops: &mut FlowOps<'_>,
        payer: Address,
        new_rate: FlowRate,
    ) -> Result<(), RelayError> {
        let forwarded = (self.rate_fn)(new_rate);
        if forwarded.is_zero() {
            // The mapping zeroed the rate out: nothing to mirror.
            return self.try_drain(ops, payer);
        }

        {
            let inner = self.inner.read().unwrap();
            if inner.forwarded.get(&payer) == Some(&forwarded) {
                return Ok(());
            }
        }

        self.registry
            .grant_or_renew(self.address, payer, ops.now())?;

        let mut inner = self.inner.write().unwrap();
        let aggregate = sum_with(&inner.forwarded, payer, forwarded)
            .ok_or(RelayError::AggregateOverflow)?;
        ops.create_or_update_flow(self.token, self.registry.address(), aggregate)?;
        inner.forwarded.insert(payer, forwarded);
        Ok(())
    }

    /// Stop forwarding for a payer and revoke their membership.
    fn try_drain(&self, ops: &mut FlowOps<'_>, payer: Address) -> Result<(), RelayError> {
        let flow_result = {
            let mut inner = self.inner.write().unwrap();
            if inner.forwarded.remove(&payer).is_none() {
                return Ok(());
            }

            let aggregate = sum_with(&inner.forwarded, payer, FlowRate::ZERO)
                .unwrap_or(FlowRate::new(u128::MAX));
            if aggregate.is_zero() {
                match ops.delete_flow(self.token, self.registry.address()) {
                    // Already gone from an earlier degraded event.
                    Err(LedgerError::FlowNotFound) => Ok(()),
                    other => other,
                }
            } else {
                ops.create_or_update_flow(self.token, self.registry.address(), aggregate)
            }
        };

        // Revoke membership even when the outbound adjustment failed: the
        // inbound stream is gone either way.
        let key_result = match self.registry.confiscate(self.address, payer) {
            Err(RegistryError::NoSuchKey(_)) => Ok(()),
            other => other,
        };

        flow_result?;
        key_result?;
        Ok(())
    }

    /// Convert any internal failure into a recorded degradation.
    ///
    /// This is the single exit point of both callbacks; no code path
    /// returns an error to the host.
    fn absorb(&self, result: Result<(), RelayError>, payer: Address, now: i64) -> Result<(), AppError> {
        if let Err(e) = result {
            warn!(relay = %self.address, %payer, error = %e, "degraded: absorbing callback failure");
            self.inner.write().unwrap().degradations.push(Degradation {
                payer,
                at: now,
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}

impl FlowApp for StreamRelay {
    fn on_flow_changed(
        &self,
        ops: &mut FlowOps<'_>,
        token: TokenId,
        sender: Address,
        _old_rate: FlowRate,
        new_rate: FlowRate,
        _user_data: &[u8],
    ) -> Result<(), AppError> {
        if token != self.token {
            return Ok(());
        }
        let result = if new_rate.is_zero() {
            // A zero-rate flow is semantically deleted.
            self.try_drain(ops, sender)
        } else {
            self.try_forward(ops, sender, new_rate)
        };
        self.absorb(result, sender, ops.now())
    }

    fn on_flow_deleted(
        &self,
        ops: &mut FlowOps<'_>,
        token: TokenId,
        sender: Address,
        _old_rate: FlowRate,
        _reason: CloseReason,
        _user_data: &[u8],
    ) -> Result<(), AppError> {
        // Liquidation and voluntary close take the same path: the relay
        // cannot distinguish intent and must not try.
        if token != self.token {
            return Ok(());
        }
        let result = self.try_drain(ops, sender);
        self.absorb(result, sender, ops.now())
    }
}

fn sum_with(
    forwarded: &HashMap<Address, FlowRate>,
    payer: Address,
    rate: FlowRate,
) -> Option<FlowRate> {
    forwarded
        .iter()
        .filter(|(p, _)| **p != payer)
        .try_fold(rate, |acc, (_, r)| acc.checked_add(*r))
}
