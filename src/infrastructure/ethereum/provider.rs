//! Chain capability used by the worker, and its alloy implementation
//!
//! The worker only ever talks to [`MultisigClient`]; tests substitute an
//! in-memory implementation.

use std::sync::Arc;
use std::time::Duration;

use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::domain::contract::{IERC20Metadata, ISingleSigWallet, RawTransaction};
use crate::domain::proposal::ProposalCall;
use crate::error::ChainError;
use crate::infrastructure::ethereum::types::{Receipt, WalletSource};

const RECEIPT_POLL: Duration = Duration::from_millis(1500);

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
        }
    }

    pub fn is_websocket(&self) -> bool {
        matches!(self, ProviderConfig::WebSocket(_))
    }
}

/// Everything the dashboard needs from the wallet contract and the node
#[async_trait::async_trait]
pub trait MultisigClient: Send + Sync + 'static {
    /// Address whose transactions are shown and who signs writes
    fn account(&self) -> Address;

    /// False for watch-only connections
    fn can_sign(&self) -> bool;

    fn endpoint_name(&self) -> String;

    async fn chain_id(&self) -> Result<u64>;

    async fn current_nonce(&self, owner: Address) -> Result<u64>;

    async fn pending_transactions(&self, owner: Address) -> Result<Vec<u64>>;

    async fn user_transactions(&self, owner: Address) -> Result<Vec<u64>>;

    async fn transaction(&self, id: u64) -> Result<RawTransaction>;

    /// ERC-20 `decimals()`
    async fn token_decimals(&self, token: Address) -> Result<u8>;

    async fn propose(&self, call: &ProposalCall) -> Result<B256>;

    async fn approve(&self, id: u64, value: U256) -> Result<B256>;

    async fn cancel(&self, id: u64) -> Result<B256>;

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt>;
}

pub struct AlloyClient {
    provider: DynProvider,
    contract: ISingleSigWallet::ISingleSigWalletInstance<DynProvider>,
    account: Address,
    can_sign: bool,
    endpoint: String,
    receipt_timeout: Duration,
}

/// Connect to `config` and bind the wallet contract at `contract`
pub async fn connect(
    config: &ProviderConfig,
    contract: Address,
    wallet: &WalletSource,
    receipt_timeout: Duration,
) -> Result<Arc<dyn MultisigClient>> {
    let (account, signer) = match wallet {
        WalletSource::PrivateKey(key) => {
            let key = key.trim();
            let signer: PrivateKeySigner = key
                .strip_prefix("0x")
                .unwrap_or(key)
                .parse()
                .context("Invalid private key")?;
            (signer.address(), Some(EthereumWallet::from(signer)))
        }
        WalletSource::WatchOnly(address) => (*address, None),
    };

    let provider = match (config, signer) {
        (ProviderConfig::Http(url), Some(wallet)) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            ProviderBuilder::new().wallet(wallet).connect_http(rpc_url).erased()
        }
        (ProviderConfig::Http(url), None) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            ProviderBuilder::new().connect_http(rpc_url).erased()
        }
        (ProviderConfig::WebSocket(url), Some(wallet)) => ProviderBuilder::new()
            .wallet(wallet)
            .connect_ws(WsConnect::new(url.clone()))
            .await
            .context("Failed to create WebSocket provider")?
            .erased(),
        (ProviderConfig::WebSocket(url), None) => ProviderBuilder::new()
            .connect_ws(WsConnect::new(url.clone()))
            .await
            .context("Failed to create WebSocket provider")?
            .erased(),
    };

    let can_sign = matches!(wallet, WalletSource::PrivateKey(_));
    info!(endpoint = %config.display(), %account, can_sign, "provider ready");

    Ok(Arc::new(AlloyClient {
        contract: ISingleSigWallet::new(contract, provider.clone()),
        provider,
        account,
        can_sign,
        endpoint: config.display(),
        receipt_timeout,
    }))
}

impl AlloyClient {
    fn ensure_signer(&self) -> Result<()> {
        if self.can_sign {
            Ok(())
        } else {
            Err(ChainError::ReadOnly.into())
        }
    }
}

fn ids(values: Vec<U256>) -> Vec<u64> {
    values.into_iter().map(|v| v.saturating_to::<u64>()).collect()
}

#[async_trait::async_trait]
impl MultisigClient for AlloyClient {
    fn account(&self) -> Address {
        self.account
    }

    fn can_sign(&self) -> bool {
        self.can_sign
    }

    fn endpoint_name(&self) -> String {
        self.endpoint.clone()
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn current_nonce(&self, owner: Address) -> Result<u64> {
        let nonce = self.contract.getCurrentNonce(owner).call().await?;
        Ok(nonce.saturating_to::<u64>())
    }

    async fn pending_transactions(&self, owner: Address) -> Result<Vec<u64>> {
        Ok(ids(self.contract.getPendingTransactions(owner).call().await?))
    }

    async fn user_transactions(&self, owner: Address) -> Result<Vec<u64>> {
        Ok(ids(self.contract.getUserTransactions(owner).call().await?))
    }

    async fn transaction(&self, id: u64) -> Result<RawTransaction> {
        let tx = self.contract.getTransaction(U256::from(id)).call().await?;
        Ok(tx.into())
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        let erc20 = IERC20Metadata::new(token, self.provider.clone());
        Ok(erc20.decimals().call().await?)
    }

    async fn propose(&self, call: &ProposalCall) -> Result<B256> {
        self.ensure_signer()?;
        let pending = self
            .contract
            .proposeTnx(call.to, call.token, call.amount, U256::from(call.nonce))
            .send()
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn approve(&self, id: u64, value: U256) -> Result<B256> {
        self.ensure_signer()?;
        let pending = self
            .contract
            .approveTnx(U256::from(id))
            .value(value)
            .send()
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn cancel(&self, id: u64) -> Result<B256> {
        self.ensure_signer()?;
        let pending = self.contract.cancelTnx(U256::from(id)).send().await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt> {
        let poll = async {
            loop {
                if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                    return Ok::<_, anyhow::Error>(Receipt {
                        tx_hash,
                        success: ReceiptResponse::status(&receipt),
                        block_number: ReceiptResponse::block_number(&receipt),
                    });
                }
                debug!(%tx_hash, "receipt not available yet");
                tokio::time::sleep(RECEIPT_POLL).await;
            }
        };

        tokio::time::timeout(self.receipt_timeout, poll)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "transaction {tx_hash} was not confirmed within {}s",
                    self.receipt_timeout.as_secs()
                )
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_display() {
        let http = ProviderConfig::Http("https://rpc.sepolia.org".into());
        assert_eq!(http.display(), "https://rpc.sepolia.org");
        assert!(!http.is_websocket());
        assert!(ProviderConfig::WebSocket("wss://example".into()).is_websocket());
    }

    #[test]
    fn test_ids_saturate() {
        assert_eq!(ids(vec![U256::from(3u64), U256::MAX]), vec![3, u64::MAX]);
    }
}
