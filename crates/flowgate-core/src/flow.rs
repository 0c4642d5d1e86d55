//! Flow identity and host-side flow records.
//!
//! A flow is uniquely identified by (token, sender, receiver). The host
//! ledger owns flow records; everything else only observes them.

use serde::{Deserialize, Serialize};

use crate::types::{Address, FlowRate, TokenId};

/// Unique identity of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowKey {
    /// The streaming asset.
    pub token: TokenId,

    /// The paying side.
    pub sender: Address,

    /// The receiving side.
    pub receiver: Address,
}

impl FlowKey {
    /// Create a new flow key.
    pub const fn new(token: TokenId, sender: Address, receiver: Address) -> Self {
        Self {
            token,
            sender,
            receiver,
        }
    }
}

/// A host-owned flow record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    /// The flow's identity.
    pub key: FlowKey,

    /// Current rate. Never zero: a zero-rate flow is deleted instead.
    pub rate: FlowRate,

    /// When the rate was last set (host clock, seconds).
    pub updated_at: i64,
}

impl Flow {
    /// Create a new flow record.
    pub fn new(key: FlowKey, rate: FlowRate, now: i64) -> Self {
        Self {
            key,
            rate,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_key_identity() {
        let token = TokenId::from_address(Address::from_bytes([0x01; 20]));
        let sender = Address::from_bytes([0x02; 20]);
        let receiver = Address::from_bytes([0x03; 20]);

        let k1 = FlowKey::new(token, sender, receiver);
        let k2 = FlowKey::new(token, sender, receiver);
        assert_eq!(k1, k2);

        let k3 = FlowKey::new(token, receiver, sender);
        assert_ne!(k1, k3);
    }
}
