//! Read-only checks against a live node. Ignored by default; run with
//! `RPC_URL=... cargo test --test live_rpc_test -- --ignored`.

use std::time::Duration;

use alloy::primitives::address;
use sigdash::config::{DEFAULT_CHAIN_ID, DEFAULT_CONTRACT, DEFAULT_RPC};
use sigdash::domain::validate::parse_address;
use sigdash::infrastructure::ethereum::{connect, MultisigClient, ProviderConfig, WalletSource};

#[tokio::test]
#[ignore = "needs a Sepolia RPC endpoint"]
async fn test_watch_only_reads_against_sepolia() {
    let rpc = std::env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC.to_string());
    let contract = parse_address(DEFAULT_CONTRACT).expect("valid contract");
    let owner = address!("00000000000000000000000000000000000000aa");

    let client = connect(
        &ProviderConfig::Http(rpc),
        contract,
        &WalletSource::WatchOnly(owner),
        Duration::from_secs(30),
    )
    .await
    .expect("should connect");

    assert!(!client.can_sign());
    assert_eq!(client.chain_id().await.expect("chain id"), DEFAULT_CHAIN_ID);

    let nonce = client.current_nonce(owner).await.expect("nonce");
    let history = client.user_transactions(owner).await.expect("history");
    println!("✓ nonce {nonce}, {} transactions", history.len());
}
