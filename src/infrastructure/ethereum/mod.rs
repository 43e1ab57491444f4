//! Ethereum infrastructure - Alloy provider implementations

mod provider;
mod types;

pub use provider::{connect, AlloyClient, MultisigClient, ProviderConfig};
pub use types::{Receipt, WalletSource};
