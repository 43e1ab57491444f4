//! Read fetching and the post-confirmation refresh policy

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use tracing::{debug, warn};

use crate::infrastructure::ethereum::MultisigClient;
use crate::infrastructure::runtime::bridge::{RuntimeEvent, WriteKind};
use crate::store::QueryKey;

/// Run one read and report the result as an event
pub async fn fetch_query(
    client: &dyn MultisigClient,
    owner: Address,
    query: QueryKey,
    evt_tx: &Sender<RuntimeEvent>,
) {
    let result = match query {
        QueryKey::Nonce => client
            .current_nonce(owner)
            .await
            .map(|nonce| RuntimeEvent::NonceReady { owner, nonce }),
        QueryKey::PendingIds => client
            .pending_transactions(owner)
            .await
            .map(|ids| RuntimeEvent::PendingReady { owner, ids }),
        QueryKey::UserIds => client
            .user_transactions(owner)
            .await
            .map(|ids| RuntimeEvent::HistoryReady { owner, ids }),
        QueryKey::Transaction(0) => return,
        QueryKey::Transaction(id) => client
            .transaction(id)
            .await
            .map(|tx| RuntimeEvent::TransactionReady { id, tx }),
    };

    let event = result.unwrap_or_else(|err| {
        warn!(query = %query.label(), error = %format!("{err:#}"), "read failed");
        RuntimeEvent::QueryFailed {
            query,
            message: format!("{err:#}"),
        }
    });
    let _ = evt_tx.send(event);
}

/// Queries invalidated by a confirmed write
pub fn invalidated_by(kind: WriteKind) -> Vec<QueryKey> {
    let mut keys = vec![QueryKey::Nonce, QueryKey::PendingIds, QueryKey::UserIds];
    if let Some(id) = kind.target() {
        keys.push(QueryKey::Transaction(id));
    }
    keys
}

async fn refresh_pass(
    client: &dyn MultisigClient,
    owner: Address,
    keys: &[QueryKey],
    evt_tx: &Sender<RuntimeEvent>,
) {
    let fetches = keys
        .iter()
        .map(|key| fetch_query(client, owner, *key, evt_tx));
    futures::future::join_all(fetches).await;
}

/// Refetch what a confirmed write touched: once now, once after `delay`
pub async fn refresh_after_confirmation(
    client: Arc<dyn MultisigClient>,
    kind: WriteKind,
    delay: Duration,
    evt_tx: Sender<RuntimeEvent>,
) {
    let owner = client.account();
    let keys = invalidated_by(kind);

    debug!(kind = %kind.label(), "refreshing after confirmation");
    refresh_pass(client.as_ref(), owner, &keys, &evt_tx).await;

    tokio::time::sleep(delay).await;
    debug!(kind = %kind.label(), delay_ms = delay.as_millis() as u64, "delayed refresh");
    refresh_pass(client.as_ref(), owner, &keys, &evt_tx).await;
}
