//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI never awaits. It sends [`RuntimeCommand`]s over a channel and
//! drains [`RuntimeEvent`]s once per frame.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use tokio::runtime::Runtime;

use crate::domain::contract::RawTransaction;
use crate::domain::proposal::ProposalCall;
use crate::error::ChainError;
use crate::infrastructure::ethereum::{ProviderConfig, WalletSource};
use crate::infrastructure::runtime::worker::run_async_worker;
use crate::store::QueryKey;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Connect the given wallet to the current endpoint
    Connect { wallet: WalletSource },
    Disconnect,
    /// Switch to a different endpoint, reconnecting if a wallet is attached
    SwitchEndpoint { index: usize },
    /// Run one contract read for `owner`
    Fetch { owner: Address, query: QueryKey },
    /// Read ERC-20 decimals for a token
    FetchDecimals { token: Address },
    /// Sign and send a write, then follow it to its receipt
    Write(WriteRequest),
    /// Shutdown the worker
    Shutdown,
}

/// A state-changing contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteRequest {
    Propose(ProposalCall),
    Approve(u64),
    Cancel(u64),
}

impl WriteRequest {
    pub fn kind(&self) -> WriteKind {
        match self {
            WriteRequest::Propose(_) => WriteKind::Propose,
            WriteRequest::Approve(id) => WriteKind::Approve(*id),
            WriteRequest::Cancel(id) => WriteKind::Cancel(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Propose,
    Approve(u64),
    Cancel(u64),
}

impl WriteKind {
    pub fn label(&self) -> String {
        match self {
            WriteKind::Propose => "Proposal".to_string(),
            WriteKind::Approve(id) => format!("Approval of #{id}"),
            WriteKind::Cancel(id) => format!("Cancellation of #{id}"),
        }
    }

    /// Transaction id the write acts on, if any
    pub fn target(&self) -> Option<u64> {
        match self {
            WriteKind::Propose => None,
            WriteKind::Approve(id) | WriteKind::Cancel(id) => Some(*id),
        }
    }
}

/// Where a write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    /// Signing or broadcasting; nothing reached the chain
    Submission,
    /// The transaction was sent but reverted or was never mined
    Receipt,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Connected {
        endpoint: String,
        account: Address,
        chain_id: u64,
        can_sign: bool,
    },
    Disconnected,
    NonceReady { owner: Address, nonce: u64 },
    PendingReady { owner: Address, ids: Vec<u64> },
    HistoryReady { owner: Address, ids: Vec<u64> },
    TransactionReady { id: u64, tx: RawTransaction },
    /// `None` when the token does not answer `decimals()`
    DecimalsReady { token: Address, decimals: Option<u8> },
    /// The lookup never ran; the token may be requested again
    DecimalsUnavailable { token: Address },
    QueryFailed { query: QueryKey, message: String },
    WriteSubmitted { kind: WriteKind, tx_hash: B256 },
    WriteConfirmed {
        kind: WriteKind,
        tx_hash: B256,
        block_number: Option<u64>,
    },
    WriteFailed {
        kind: WriteKind,
        stage: WriteStage,
        error: ChainError,
    },
    /// Error occurred
    Error { message: String },
}

/// Settings the worker needs for its whole lifetime
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub endpoints: Vec<ProviderConfig>,
    pub endpoint_index: usize,
    pub contract: Address,
    pub refresh_delay: Duration,
    pub receipt_timeout: Duration,
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime
    pub fn new(config: WorkerConfig) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        thread::Builder::new()
            .name("sigdash-worker".into())
            .spawn(move || {
                let rt = match Runtime::new() {
                    Ok(rt) => rt,
                    Err(err) => {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Failed to create Tokio runtime: {err}"),
                        });
                        return;
                    }
                };
                rt.block_on(async {
                    if let Err(err) = run_async_worker(config, cmd_rx, evt_tx.clone()).await {
                        tracing::error!(error = %format!("{err:#}"), "worker exited");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_kind_targets() {
        assert_eq!(WriteRequest::Approve(4).kind(), WriteKind::Approve(4));
        assert_eq!(WriteKind::Cancel(2).target(), Some(2));
        assert_eq!(WriteKind::Propose.target(), None);
        assert_eq!(WriteKind::Approve(7).label(), "Approval of #7");
    }
}
