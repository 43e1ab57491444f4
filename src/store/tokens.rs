//! Token metadata: configured symbols/decimals plus decimals read from chain

use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::Address;

use crate::domain::contract::{NATIVE_DECIMALS, NATIVE_TOKEN};
use crate::domain::decoder::TokenInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedToken {
    pub address: Address,
    pub symbol: String,
    pub decimals: Option<u8>,
}

#[derive(Debug, Default)]
pub struct TokenBook {
    listed: Vec<ListedToken>,
    fetched: BTreeMap<Address, u8>,
    requested: BTreeSet<Address>,
}

impl TokenBook {
    pub fn new(listed: Vec<ListedToken>) -> Self {
        Self {
            listed,
            ..Self::default()
        }
    }

    pub fn listed(&self) -> &[ListedToken] {
        &self.listed
    }

    fn find(&self, token: Address) -> Option<&ListedToken> {
        self.listed.iter().find(|t| t.address == token)
    }

    /// Configured decimals win over fetched ones; 18 when neither is known
    pub fn decimals(&self, token: Address) -> u8 {
        if token == NATIVE_TOKEN {
            return NATIVE_DECIMALS;
        }
        self.find(token)
            .and_then(|t| t.decimals)
            .or_else(|| self.fetched.get(&token).copied())
            .unwrap_or(NATIVE_DECIMALS)
    }

    pub fn info(&self, token: Address) -> TokenInfo {
        if token == NATIVE_TOKEN {
            return TokenInfo::native();
        }
        TokenInfo {
            symbol: self.find(token).map(|t| t.symbol.clone()),
            decimals: self.decimals(token),
        }
    }

    /// True the first time a token without known decimals is seen
    pub fn should_fetch(&mut self, token: Address) -> bool {
        if token == NATIVE_TOKEN
            || self.find(token).and_then(|t| t.decimals).is_some()
            || self.fetched.contains_key(&token)
        {
            return false;
        }
        self.requested.insert(token)
    }

    /// Record a lookup result; a failed lookup settles on the default
    pub fn record(&mut self, token: Address, decimals: Option<u8>) {
        self.fetched.insert(token, decimals.unwrap_or(NATIVE_DECIMALS));
    }

    /// Drop a request that was never answered so the next lookup goes out
    pub fn forget(&mut self, token: Address) {
        self.requested.remove(&token);
    }

    /// Decimals are final: native, configured, or looked up
    pub fn is_resolved(&self, token: Address) -> bool {
        token == NATIVE_TOKEN
            || self.find(token).and_then(|t| t.decimals).is_some()
            || self.fetched.contains_key(&token)
    }
}
