//! Client-side cache of contract reads, keyed by the connected owner

use std::collections::BTreeMap;
use std::time::Instant;

use alloy::primitives::Address;

use crate::domain::contract::RawTransaction;

/// One contract read the dashboard keeps fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryKey {
    Nonce,
    PendingIds,
    UserIds,
    Transaction(u64),
}

impl QueryKey {
    pub fn label(&self) -> String {
        match self {
            QueryKey::Nonce => "nonce".to_string(),
            QueryKey::PendingIds => "pending transactions".to_string(),
            QueryKey::UserIds => "transaction history".to_string(),
            QueryKey::Transaction(id) => format!("transaction #{id}"),
        }
    }
}

/// Loading state of a single read
#[derive(Debug, Clone)]
pub struct Query<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub updated_at: Option<Instant>,
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            updated_at: None,
        }
    }
}

impl<T> Query<T> {
    /// Mark a fetch in progress; previous data stays visible until replaced
    pub fn begin(&mut self) {
        self.loading = true;
    }

    pub fn resolve(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
        self.updated_at = Some(Instant::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Default)]
pub struct Queries {
    owner: Option<Address>,
    pub nonce: Query<u64>,
    pub pending: Query<Vec<u64>>,
    pub history: Query<Vec<u64>>,
    pub details: BTreeMap<u64, Query<RawTransaction>>,
}

impl Queries {
    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    /// Switch owner; every cached read belongs to the previous owner and is dropped
    pub fn set_owner(&mut self, owner: Option<Address>) {
        if self.owner == owner {
            return;
        }
        self.owner = owner;
        self.nonce.reset();
        self.pending.reset();
        self.history.reset();
        self.details.clear();
    }

    pub fn is_inert(&self, key: QueryKey) -> bool {
        self.owner.is_none() || matches!(key, QueryKey::Transaction(0))
    }

    /// Mark `key` as loading and return the owner to fetch it for.
    /// Inert queries return `None` and are left untouched.
    pub fn refetch(&mut self, key: QueryKey) -> Option<Address> {
        if self.is_inert(key) {
            return None;
        }
        match key {
            QueryKey::Nonce => self.nonce.begin(),
            QueryKey::PendingIds => self.pending.begin(),
            QueryKey::UserIds => self.history.begin(),
            QueryKey::Transaction(id) => self.details.entry(id).or_default().begin(),
        }
        self.owner
    }

    /// Results for an owner other than the current one are stale and ignored
    pub fn accepts(&self, owner: Address) -> bool {
        self.owner == Some(owner)
    }

    pub fn fail(&mut self, key: QueryKey, message: &str) {
        match key {
            QueryKey::Nonce => self.nonce.fail(message),
            QueryKey::PendingIds => self.pending.fail(message),
            QueryKey::UserIds => self.history.fail(message),
            QueryKey::Transaction(id) => self.details.entry(id).or_default().fail(message),
        }
    }

    pub fn detail(&self, id: u64) -> Option<&RawTransaction> {
        self.details.get(&id).and_then(|query| query.data.as_ref())
    }

    /// Ids referenced by the lists whose details have not been requested yet
    pub fn missing_details(&self) -> Vec<u64> {
        let pending = self.pending.data.iter().flatten();
        let history = self.history.data.iter().flatten();
        let mut ids: Vec<u64> = pending
            .chain(history)
            .copied()
            .filter(|id| *id != 0 && !self.details.contains_key(id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn current_nonce(&self) -> Option<u64> {
        self.nonce.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const OWNER: Address = address!("00000000000000000000000000000000000000aa");

    #[test]
    fn test_queries_inert_without_owner() {
        let mut queries = Queries::default();
        assert_eq!(queries.refetch(QueryKey::Nonce), None);
        assert!(!queries.nonce.loading);
    }

    #[test]
    fn test_transaction_zero_is_inert() {
        let mut queries = Queries::default();
        queries.set_owner(Some(OWNER));
        assert_eq!(queries.refetch(QueryKey::Transaction(0)), None);
        assert!(queries.details.is_empty());
        assert_eq!(queries.refetch(QueryKey::Transaction(4)), Some(OWNER));
        assert!(queries.details[&4].loading);
    }

    #[test]
    fn test_resolve_and_fail() {
        let mut queries = Queries::default();
        queries.set_owner(Some(OWNER));
        queries.refetch(QueryKey::Nonce);
        queries.nonce.resolve(3);
        assert_eq!(queries.current_nonce(), Some(3));
        assert!(queries.nonce.updated_at.is_some());

        queries.refetch(QueryKey::Nonce);
        queries.fail(QueryKey::Nonce, "timeout");
        assert_eq!(queries.current_nonce(), Some(3));
        assert_eq!(queries.nonce.error.as_deref(), Some("timeout"));
        assert!(!queries.nonce.loading);
    }

    #[test]
    fn test_owner_switch_drops_cache() {
        let mut queries = Queries::default();
        queries.set_owner(Some(OWNER));
        queries.nonce.resolve(1);
        queries.pending.resolve(vec![1, 2]);
        queries.set_owner(Some(address!("00000000000000000000000000000000000000bb")));
        assert_eq!(queries.current_nonce(), None);
        assert!(queries.pending.data.is_none());
        assert!(!queries.accepts(OWNER));
    }

    #[test]
    fn test_missing_details() {
        let mut queries = Queries::default();
        queries.set_owner(Some(OWNER));
        queries.pending.resolve(vec![3, 1]);
        queries.history.resolve(vec![1, 2, 3, 0]);
        queries.refetch(QueryKey::Transaction(2));
        assert_eq!(queries.missing_details(), vec![1, 3]);
    }
}
