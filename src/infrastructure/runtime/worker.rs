//! Async worker - runs in Tokio runtime and handles RPC operations

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use anyhow::Result;
use tracing::{error, info, warn};

use crate::domain::contract::approval_value;
use crate::error::ChainError;
use crate::infrastructure::ethereum::{connect, MultisigClient, WalletSource};
use crate::infrastructure::runtime::bridge::{
    RuntimeCommand, RuntimeEvent, WorkerConfig, WriteRequest, WriteStage,
};
use crate::infrastructure::runtime::refresh::{fetch_query, refresh_after_confirmation};

/// Run the async worker loop
pub async fn run_async_worker(
    config: WorkerConfig,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    if config.endpoints.is_empty() {
        anyhow::bail!("No endpoints configured");
    }

    let mut endpoint_index = config.endpoint_index.min(config.endpoints.len() - 1);
    let mut wallet: Option<WalletSource> = None;
    let mut client: Option<Arc<dyn MultisigClient>> = None;

    loop {
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                RuntimeCommand::Shutdown => return Ok(()),

                RuntimeCommand::Connect { wallet: source } => {
                    client = connect_wallet(&config, endpoint_index, &source, &evt_tx).await;
                    wallet = Some(source);
                }

                RuntimeCommand::Disconnect => {
                    client = None;
                    wallet = None;
                    info!("wallet disconnected");
                    let _ = evt_tx.send(RuntimeEvent::Disconnected);
                }

                RuntimeCommand::SwitchEndpoint { index } => {
                    if index >= config.endpoints.len() {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!(
                                "Invalid endpoint index {} ({} total)",
                                index,
                                config.endpoints.len()
                            ),
                        });
                        continue;
                    }
                    endpoint_index = index;
                    if let Some(ref source) = wallet {
                        client = connect_wallet(&config, endpoint_index, source, &evt_tx).await;
                    }
                }

                RuntimeCommand::Fetch { owner, query } => {
                    let Some(ref c) = client else {
                        let _ = evt_tx.send(RuntimeEvent::QueryFailed {
                            query,
                            message: ChainError::Disconnected.to_string(),
                        });
                        continue;
                    };
                    let c = Arc::clone(c);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        fetch_query(c.as_ref(), owner, query, &evt_tx).await;
                    });
                }

                RuntimeCommand::FetchDecimals { token } => {
                    let Some(ref c) = client else {
                        let _ = evt_tx.send(RuntimeEvent::DecimalsUnavailable { token });
                        continue;
                    };
                    let c = Arc::clone(c);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let decimals = match c.token_decimals(token).await {
                            Ok(decimals) => Some(decimals),
                            Err(err) => {
                                warn!(%token, error = %format!("{err:#}"), "decimals() unavailable");
                                None
                            }
                        };
                        let _ = evt_tx.send(RuntimeEvent::DecimalsReady { token, decimals });
                    });
                }

                RuntimeCommand::Write(request) => {
                    let Some(ref c) = client else {
                        let _ = evt_tx.send(RuntimeEvent::WriteFailed {
                            kind: request.kind(),
                            stage: WriteStage::Submission,
                            error: ChainError::Disconnected,
                        });
                        continue;
                    };
                    let c = Arc::clone(c);
                    let evt_tx = evt_tx.clone();
                    let delay = config.refresh_delay;
                    tokio::spawn(async move {
                        run_write(c, request, delay, evt_tx).await;
                    });
                }
            }
        }

        // Small yield to prevent busy loop
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Connect and announce the new client; failures are reported, never fatal
async fn connect_wallet(
    config: &WorkerConfig,
    index: usize,
    source: &WalletSource,
    evt_tx: &Sender<RuntimeEvent>,
) -> Option<Arc<dyn MultisigClient>> {
    let endpoint = &config.endpoints[index];
    let attempt = async {
        let client = connect(endpoint, config.contract, source, config.receipt_timeout).await?;
        let chain_id = client.chain_id().await?;
        Ok::<_, anyhow::Error>((client, chain_id))
    };

    match attempt.await {
        Ok((client, chain_id)) => {
            info!(endpoint = %client.endpoint_name(), chain_id, account = %client.account(), "connected");
            let _ = evt_tx.send(RuntimeEvent::Connected {
                endpoint: client.endpoint_name(),
                account: client.account(),
                chain_id,
                can_sign: client.can_sign(),
            });
            Some(client)
        }
        Err(err) => {
            error!(endpoint = %endpoint.display(), error = %format!("{err:#}"), "connection failed");
            let _ = evt_tx.send(RuntimeEvent::Error {
                message: format!("Connection failed ({}): {:#}", endpoint.display(), err),
            });
            None
        }
    }
}

/// Sign and broadcast one write, returning its transaction hash
///
/// Proposals re-read the contract nonce first and are refused when it moved
/// since the draft was staged. Approvals read the stored transaction to learn
/// the value to attach.
pub async fn execute_write(client: &dyn MultisigClient, request: &WriteRequest) -> Result<B256> {
    if !client.can_sign() {
        return Err(ChainError::ReadOnly.into());
    }
    match request {
        WriteRequest::Propose(call) => {
            let current = client.current_nonce(client.account()).await?;
            if current != call.nonce {
                return Err(ChainError::StaleNonce {
                    staged: call.nonce,
                    current,
                }
                .into());
            }
            client.propose(call).await
        }
        WriteRequest::Approve(id) => {
            let stored = client.transaction(*id).await?;
            client.approve(*id, approval_value(&stored)).await
        }
        WriteRequest::Cancel(id) => client.cancel(*id).await,
    }
}

/// Follow a write from submission through its receipt, then refresh
pub async fn run_write(
    client: Arc<dyn MultisigClient>,
    request: WriteRequest,
    refresh_delay: Duration,
    evt_tx: Sender<RuntimeEvent>,
) {
    let kind = request.kind();

    let tx_hash = match execute_write(client.as_ref(), &request).await {
        Ok(hash) => hash,
        Err(err) => {
            let error = ChainError::classify(&err);
            warn!(kind = %kind.label(), %error, "write not submitted");
            let _ = evt_tx.send(RuntimeEvent::WriteFailed {
                kind,
                stage: WriteStage::Submission,
                error,
            });
            return;
        }
    };
    info!(kind = %kind.label(), %tx_hash, "write submitted");
    let _ = evt_tx.send(RuntimeEvent::WriteSubmitted { kind, tx_hash });

    let receipt = match client.wait_for_receipt(tx_hash).await {
        Ok(receipt) if receipt.success => receipt,
        Ok(receipt) => {
            warn!(kind = %kind.label(), %tx_hash, "transaction reverted");
            let _ = evt_tx.send(RuntimeEvent::WriteFailed {
                kind,
                stage: WriteStage::Receipt,
                error: ChainError::Reverted(format!(
                    "transaction {} reverted",
                    receipt.tx_hash
                )),
            });
            return;
        }
        Err(err) => {
            let error = ChainError::classify(&err);
            warn!(kind = %kind.label(), %tx_hash, %error, "receipt failed");
            let _ = evt_tx.send(RuntimeEvent::WriteFailed {
                kind,
                stage: WriteStage::Receipt,
                error,
            });
            return;
        }
    };

    info!(kind = %kind.label(), %tx_hash, block = ?receipt.block_number, "write confirmed");
    let _ = evt_tx.send(RuntimeEvent::WriteConfirmed {
        kind,
        tx_hash,
        block_number: receipt.block_number,
    });

    refresh_after_confirmation(client, kind, refresh_delay, evt_tx).await;
}
