//! In-memory `MultisigClient` for driving the worker without a node

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use alloy::primitives::{address, Address, B256, U256};
use anyhow::{anyhow, Result};
use tokio::time::Instant;

use sigdash::domain::contract::RawTransaction;
use sigdash::domain::proposal::ProposalCall;
use sigdash::infrastructure::ethereum::{MultisigClient, Receipt};

pub const OWNER: Address = address!("00000000000000000000000000000000000000aa");
pub const RECIPIENT: Address = address!("000000000000000000000000000000000000dead");
pub const USDC: Address = address!("a0b86a33e6417c94be4e4a20ac5b0f8c2c9a8e8b");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ChainId,
    Nonce,
    Pending,
    History,
    Transaction(u64),
    Decimals(Address),
    Propose(ProposalCall),
    Approve { id: u64, value: U256 },
    Cancel(u64),
    Receipt(B256),
}

pub struct FakeClient {
    pub can_sign: bool,
    pub nonce: Mutex<u64>,
    pub pending: Mutex<Vec<u64>>,
    pub transactions: Mutex<BTreeMap<u64, RawTransaction>>,
    pub receipt_success: bool,
    /// Error returned by every write, as the wallet would phrase it
    pub write_error: Option<String>,
    calls: Mutex<Vec<(Call, Instant)>>,
}

impl FakeClient {
    pub fn new(can_sign: bool) -> Self {
        Self {
            can_sign,
            nonce: Mutex::new(0),
            pending: Mutex::new(Vec::new()),
            transactions: Mutex::new(BTreeMap::new()),
            receipt_success: true,
            write_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        *self.nonce.lock().unwrap() = nonce;
        self
    }

    pub fn with_transaction(self, id: u64, tx: RawTransaction) -> Self {
        self.transactions.lock().unwrap().insert(id, tx);
        self.pending.lock().unwrap().push(id);
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    /// When each matching call happened
    pub fn times(&self, matches: impl Fn(&Call) -> bool) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| matches(c))
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Propose(_) | Call::Approve { .. } | Call::Cancel(_)))
            .collect()
    }

    fn write_result(&self, seed: u8) -> Result<B256> {
        match &self.write_error {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(B256::repeat_byte(seed)),
        }
    }
}

pub fn raw(token: Address, amount: U256, state: u8) -> RawTransaction {
    RawTransaction {
        owner: OWNER,
        to: RECIPIENT,
        token,
        amount,
        nonce: U256::from(1u64),
        state,
        timestamp: U256::from(1_700_000_000u64),
    }
}

#[async_trait::async_trait]
impl MultisigClient for FakeClient {
    fn account(&self) -> Address {
        OWNER
    }

    fn can_sign(&self) -> bool {
        self.can_sign
    }

    fn endpoint_name(&self) -> String {
        "fake".to_string()
    }

    async fn chain_id(&self) -> Result<u64> {
        self.record(Call::ChainId);
        Ok(11_155_111)
    }

    async fn current_nonce(&self, _owner: Address) -> Result<u64> {
        self.record(Call::Nonce);
        Ok(*self.nonce.lock().unwrap())
    }

    async fn pending_transactions(&self, _owner: Address) -> Result<Vec<u64>> {
        self.record(Call::Pending);
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn user_transactions(&self, _owner: Address) -> Result<Vec<u64>> {
        self.record(Call::History);
        Ok(self.transactions.lock().unwrap().keys().copied().collect())
    }

    async fn transaction(&self, id: u64) -> Result<RawTransaction> {
        self.record(Call::Transaction(id));
        self.transactions
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("execution reverted: no such transaction"))
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        self.record(Call::Decimals(token));
        if token == USDC {
            Ok(6)
        } else {
            Err(anyhow!("execution reverted"))
        }
    }

    async fn propose(&self, call: &ProposalCall) -> Result<B256> {
        self.record(Call::Propose(call.clone()));
        self.write_result(0x11)
    }

    async fn approve(&self, id: u64, value: U256) -> Result<B256> {
        self.record(Call::Approve { id, value });
        self.write_result(0x22)
    }

    async fn cancel(&self, id: u64) -> Result<B256> {
        self.record(Call::Cancel(id));
        self.write_result(0x33)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt> {
        self.record(Call::Receipt(tx_hash));
        Ok(Receipt {
            tx_hash,
            success: self.receipt_success,
            block_number: Some(42),
        })
    }
}

/// Stand-in for the worker thread: run every queued command against the
/// fake client and feed the resulting events back until nothing is queued.
pub async fn pump(app: &mut sigdash::app::App, client: &std::sync::Arc<FakeClient>) {
    use sigdash::infrastructure::runtime::{refresh, run_write, RuntimeCommand, RuntimeEvent};
    use std::sync::mpsc;
    use std::time::Duration;

    for _ in 0..16 {
        let commands = app.take_commands();
        if commands.is_empty() {
            return;
        }
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();
        for cmd in commands {
            match cmd {
                RuntimeCommand::Fetch { owner, query } => {
                    refresh::fetch_query(client.as_ref(), owner, query, &evt_tx).await;
                }
                RuntimeCommand::FetchDecimals { token } => {
                    let decimals = client.token_decimals(token).await.ok();
                    let _ = evt_tx.send(RuntimeEvent::DecimalsReady { token, decimals });
                }
                RuntimeCommand::Write(request) => {
                    let shared: std::sync::Arc<dyn MultisigClient> = client.clone();
                    run_write(shared, request, Duration::ZERO, evt_tx.clone()).await;
                }
                _ => {}
            }
        }
        drop(evt_tx);
        for event in evt_rx.try_iter() {
            app.apply_runtime_event(event);
        }
    }
}

/// App connected to the fake client's account, with its first reads applied
pub async fn connected_app(client: &std::sync::Arc<FakeClient>) -> sigdash::app::App {
    use sigdash::config::{Config, Overrides, Settings, TokenSpec};
    use sigdash::infrastructure::ethereum::WalletSource;
    use sigdash::infrastructure::runtime::RuntimeEvent;

    let config = Config {
        tokens: vec![TokenSpec {
            address: format!("{USDC:#x}"),
            symbol: Some("USDC".to_string()),
            decimals: Some(6),
        }],
        ..Config::default()
    };
    let settings = Settings::resolve(&config, &Overrides::default()).unwrap();
    let mut app = sigdash::app::App::new(settings);
    app.request_connect(WalletSource::WatchOnly(OWNER));
    app.take_commands();
    app.apply_runtime_event(RuntimeEvent::Connected {
        endpoint: "fake".to_string(),
        account: OWNER,
        chain_id: 11_155_111,
        can_sign: client.can_sign,
    });
    pump(&mut app, client).await;
    app
}
