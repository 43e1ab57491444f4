//! Plain values exchanged with the chain client

use std::fmt;

use alloy::primitives::{Address, B256};

/// Outcome of a mined write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
}

/// How the dashboard identifies the user
#[derive(Clone, PartialEq, Eq)]
pub enum WalletSource {
    /// Hex secret key of a local signer
    PrivateKey(String),
    /// Read-only view of an address; writes are refused
    WatchOnly(Address),
}

impl WalletSource {
    pub fn is_watch_only(&self) -> bool {
        matches!(self, WalletSource::WatchOnly(_))
    }
}

impl fmt::Debug for WalletSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletSource::PrivateKey(_) => f.write_str("PrivateKey(<redacted>)"),
            WalletSource::WatchOnly(address) => write!(f, "WatchOnly({address})"),
        }
    }
}
