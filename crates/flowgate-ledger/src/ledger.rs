//! In-memory host ledger.
//!
//! Owns the flow table, token balances, app registrations, the jailed
//! set, the event log, and the clock. Thread-safe via RwLock, though the
//! execution model is single-threaded: one external call, one atomic
//! unit of work.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use tracing::{debug, warn};

use flowgate_core::{Address, Flow, FlowKey, FlowRate, LogEntry, TokenId};

use crate::app::{CloseReason, FlowApp, FlowOps};
use crate::error::{LedgerError, Result};

/// Seconds of streaming a sender must be able to cover up front when
/// opening or raising a flow.
pub const DEPOSIT_SECONDS: u64 = 3600;

/// The in-memory streaming host.
pub struct MemoryLedger {
    inner: RwLock<LedgerInner>,
}

struct LedgerInner {
    /// All active flows. A flow with rate zero never appears here.
    flows: HashMap<FlowKey, Flow>,

    /// Token balances per account.
    balances: HashMap<(TokenId, Address), u128>,

    /// Registered apps by address.
    apps: HashMap<Address, Arc<dyn FlowApp>>,

    /// Apps whose callbacks have failed. Jailing is permanent.
    jailed: HashSet<Address>,

    /// Event log.
    log: Vec<LogEntry>,

    /// Host clock, seconds.
    now: i64,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                flows: HashMap::new(),
                balances: HashMap::new(),
                apps: HashMap::new(),
                jailed: HashSet::new(),
                log: Vec::new(),
                now: 0,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accounts and apps
    // ─────────────────────────────────────────────────────────────────────────

    /// Credit an account with tokens.
    pub fn mint(&self, token: TokenId, account: Address, amount: u128) {
        let mut inner = self.inner.write().unwrap();
        *inner.balances.entry((token, account)).or_insert(0) += amount;
    }

    /// Current balance of an account.
    pub fn balance_of(&self, token: TokenId, account: Address) -> u128 {
        let inner = self.inner.read().unwrap();
        inner.balances.get(&(token, account)).copied().unwrap_or(0)
    }

    /// Register an app to receive flow lifecycle callbacks.
    pub fn register_app(&self, address: Address, app: Arc<dyn FlowApp>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if inner.apps.contains_key(&address) {
            return Err(LedgerError::AppAlreadyRegistered(address));
        }
        inner.apps.insert(address, app);
        Ok(())
    }

    /// Whether an app address is registered.
    pub fn is_app(&self, address: Address) -> bool {
        self.inner.read().unwrap().apps.contains_key(&address)
    }

    /// Whether an app has been jailed.
    pub fn is_jailed(&self, address: Address) -> bool {
        self.inner.read().unwrap().jailed.contains(&address)
    }

    /// The host clock, in seconds.
    pub fn now(&self) -> i64 {
        self.inner.read().unwrap().now
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Flow lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Open a flow from `sender` to `receiver`.
    ///
    /// The sender must hold a deposit of `rate × DEPOSIT_SECONDS`. If the
    /// receiver is a registered app its callback runs within this call.
    pub fn create_flow(
        &self,
        token: TokenId,
        sender: Address,
        receiver: Address,
        rate: FlowRate,
    ) -> Result<()> {
        self.create_flow_with_data(token, sender, receiver, rate, &[])
    }

    /// [`create_flow`](Self::create_flow) with caller context attached.
    pub fn create_flow_with_data(
        &self,
        token: TokenId,
        sender: Address,
        receiver: Address,
        rate: FlowRate,
        user_data: &[u8],
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        if rate.is_zero() {
            return Err(LedgerError::ZeroRate);
        }
        if sender == receiver {
            return Err(LedgerError::SelfFlow);
        }
        let key = FlowKey::new(token, sender, receiver);
        if inner.flows.contains_key(&key) {
            return Err(LedgerError::FlowExists);
        }
        check_deposit(&inner, token, sender, rate)?;

        let now = inner.now;
        inner.flows.insert(key, Flow::new(key, rate, now));
        notify_changed(
            &mut inner,
            token,
            sender,
            receiver,
            FlowRate::ZERO,
            rate,
            user_data,
        );
        Ok(())
    }

    /// Change the rate of an existing flow.
    pub fn update_flow(
        &self,
        token: TokenId,
        sender: Address,
        receiver: Address,
        rate: FlowRate,
    ) -> Result<()> {
        self.update_flow_with_data(token, sender, receiver, rate, &[])
    }

    /// [`update_flow`](Self::update_flow) with caller context attached.
    pub fn update_flow_with_data(
        &self,
        token: TokenId,
        sender: Address,
        receiver: Address,
        rate: FlowRate,
        user_data: &[u8],
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        if rate.is_zero() {
            return Err(LedgerError::ZeroRate);
        }
        let key = FlowKey::new(token, sender, receiver);
        let old_rate = match inner.flows.get(&key) {
            Some(flow) => flow.rate,
            None => return Err(LedgerError::FlowNotFound),
        };
        check_deposit(&inner, token, sender, rate)?;

        let now = inner.now;
        if let Some(flow) = inner.flows.get_mut(&key) {
            flow.rate = rate;
            flow.updated_at = now;
        }
        notify_changed(&mut inner, token, sender, receiver, old_rate, rate, user_data);
        Ok(())
    }

    /// Close a flow.
    pub fn delete_flow(&self, token: TokenId, sender: Address, receiver: Address) -> Result<()> {
        self.delete_flow_with_data(token, sender, receiver, &[])
    }

    /// [`delete_flow`](Self::delete_flow) with caller context attached.
    pub fn delete_flow_with_data(
        &self,
        token: TokenId,
        sender: Address,
        receiver: Address,
        user_data: &[u8],
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        let key = FlowKey::new(token, sender, receiver);
        let flow = inner.flows.remove(&key).ok_or(LedgerError::FlowNotFound)?;
        notify_deleted(
            &mut inner,
            token,
            sender,
            receiver,
            flow.rate,
            CloseReason::Voluntary,
            user_data,
        );
        Ok(())
    }

    /// Current rate of a flow, zero if none exists.
    pub fn flow_rate(&self, token: TokenId, sender: Address, receiver: Address) -> FlowRate {
        let inner = self.inner.read().unwrap();
        inner
            .flows
            .get(&FlowKey::new(token, sender, receiver))
            .map(|f| f.rate)
            .unwrap_or(FlowRate::ZERO)
    }

    /// Look up a flow record.
    pub fn flow(&self, token: TokenId, sender: Address, receiver: Address) -> Option<Flow> {
        let inner = self.inner.read().unwrap();
        inner.flows.get(&FlowKey::new(token, sender, receiver)).cloned()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Time and settlement
    // ─────────────────────────────────────────────────────────────────────────

    /// Advance the clock by `secs` and settle all flows.
    ///
    /// Flows whose sender is not an app settle first: app outbound flows
    /// are backed by inbound streaming, so their funding arrives within
    /// the same window. An external sender that cannot cover what a flow
    /// owes has the payment clamped to its balance and the flow is
    /// liquidated through the normal delete path.
    pub fn advance(&self, secs: u64) {
        let mut inner = self.inner.write().unwrap();
        inner.now += secs as i64;

        let mut keys: Vec<FlowKey> = inner.flows.keys().copied().collect();
        keys.sort_by_key(|k| (inner.apps.contains_key(&k.sender), *k));

        let mut liquidations: Vec<FlowKey> = Vec::new();
        for key in keys {
            let rate = match inner.flows.get(&key) {
                Some(flow) => flow.rate,
                None => continue,
            };
            let owed = rate.checked_amount(secs).unwrap_or(u128::MAX);
            let available = inner
                .balances
                .get(&(key.token, key.sender))
                .copied()
                .unwrap_or(0);
            let paid = owed.min(available);

            *inner.balances.entry((key.token, key.sender)).or_insert(0) -= paid;
            *inner.balances.entry((key.token, key.receiver)).or_insert(0) += paid;

            // App-sent flows ride on app credit and are never liquidated
            // here: the app tears them down itself when its inbound
            // flows die. The receiver bears any shortfall.
            if paid < owed && !inner.apps.contains_key(&key.sender) {
                liquidations.push(key);
            }
        }

        for key in liquidations {
            let Some(flow) = inner.flows.remove(&key) else {
                continue;
            };
            debug!(sender = %key.sender, receiver = %key.receiver, "liquidating insolvent flow");
            notify_deleted(
                &mut inner,
                key.token,
                key.sender,
                key.receiver,
                flow.rate,
                CloseReason::Liquidation,
                &[],
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event log
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an entry to the event log.
    pub fn emit(&self, emitter: Address, data: Bytes) {
        let mut inner = self.inner.write().unwrap();
        inner.log.push(LogEntry::new(emitter, data));
    }

    /// All log entries, oldest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.inner.read().unwrap().log.clone()
    }

    /// The most recent log entry.
    pub fn last_log(&self) -> Option<LogEntry> {
        self.inner.read().unwrap().log.last().cloned()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn check_deposit(
    inner: &LedgerInner,
    token: TokenId,
    sender: Address,
    rate: FlowRate,
) -> Result<()> {
    // App credit: outbound flows opened inside a callback go through
    // FlowOps, never here, so this always checks a real external sender.
    let required = rate
        .checked_amount(DEPOSIT_SECONDS)
        .ok_or(LedgerError::RateOverflow)?;
    let available = inner.balances.get(&(token, sender)).copied().unwrap_or(0);
    if available < required {
        return Err(LedgerError::DepositRequired {
            required,
            available,
        });
    }
    Ok(())
}

fn notify_changed(
    inner: &mut LedgerInner,
    token: TokenId,
    sender: Address,
    receiver: Address,
    old_rate: FlowRate,
    new_rate: FlowRate,
    user_data: &[u8],
) {
    let Some(app) = inner.apps.get(&receiver).cloned() else {
        return;
    };
    if inner.jailed.contains(&receiver) {
        return;
    }
    let now = inner.now;
    let mut ops = FlowOps::new(&mut inner.flows, receiver, now);
    if let Err(e) = app.on_flow_changed(&mut ops, token, sender, old_rate, new_rate, user_data) {
        warn!(app = %receiver, error = %e, "flow-changed callback failed, jailing app");
        inner.jailed.insert(receiver);
    }
}

fn notify_deleted(
    inner: &mut LedgerInner,
    token: TokenId,
    sender: Address,
    receiver: Address,
    old_rate: FlowRate,
    reason: CloseReason,
    user_data: &[u8],
) {
    let Some(app) = inner.apps.get(&receiver).cloned() else {
        return;
    };
    if inner.jailed.contains(&receiver) {
        return;
    }
    let now = inner.now;
    let mut ops = FlowOps::new(&mut inner.flows, receiver, now);
    if let Err(e) = app.on_flow_deleted(&mut ops, token, sender, old_rate, reason, user_data) {
        warn!(app = %receiver, error = %e, "flow-deleted callback failed, jailing app");
        inner.jailed.insert(receiver);
    }
}
