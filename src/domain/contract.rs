//! Callable surface of the single-signer wallet contract

use alloy::primitives::{Address, U256};
use alloy::sol;

/// The all-zero address stands for the chain's native currency
pub const NATIVE_TOKEN: Address = Address::ZERO;
pub const NATIVE_SYMBOL: &str = "ETH";
pub const NATIVE_DECIMALS: u8 = 18;

sol! {
    #[sol(rpc)]
    interface ISingleSigWallet {
        struct Transaction {
            address owner;
            address to;
            address token;
            uint256 amount;
            uint256 nonce;
            uint8 state;
            uint256 timestamp;
        }

        function getCurrentNonce(address user) external view returns (uint256);
        function getPendingTransactions(address user) external view returns (uint256[] memory);
        function getUserTransactions(address user) external view returns (uint256[] memory);
        function getTransaction(uint256 id) external view returns (Transaction memory);

        function proposeTnx(address to, address token, uint256 amount, uint256 nonce) external;
        function approveTnx(uint256 id) external payable;
        function cancelTnx(uint256 id) external;
    }

    #[sol(rpc)]
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
    }
}

/// Lifecycle of a proposed transaction; terminal once not Pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Pending,
    Approved,
    Cancelled,
}

impl TxState {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TxState::Pending),
            1 => Some(TxState::Approved),
            2 => Some(TxState::Cancelled),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TxState::Pending => "Pending",
            TxState::Approved => "Approved",
            TxState::Cancelled => "Cancelled",
        }
    }
}

/// Transaction record as stored by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub owner: Address,
    pub to: Address,
    pub token: Address,
    pub amount: U256,
    pub nonce: U256,
    pub state: u8,
    pub timestamp: U256,
}

impl RawTransaction {
    pub fn is_native(&self) -> bool {
        self.token == NATIVE_TOKEN
    }
}

impl From<ISingleSigWallet::Transaction> for RawTransaction {
    fn from(tx: ISingleSigWallet::Transaction) -> Self {
        Self {
            owner: tx.owner,
            to: tx.to,
            token: tx.token,
            amount: tx.amount,
            nonce: tx.nonce,
            state: tx.state,
            timestamp: tx.timestamp,
        }
    }
}

/// Value to attach to `approveTnx`: the stored amount for native transfers, zero otherwise
pub fn approval_value(tx: &RawTransaction) -> U256 {
    if tx.is_native() {
        tx.amount
    } else {
        U256::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn raw(token: Address, amount: u64) -> RawTransaction {
        RawTransaction {
            owner: address!("00000000000000000000000000000000000000aa"),
            to: address!("00000000000000000000000000000000000000bb"),
            token,
            amount: U256::from(amount),
            nonce: U256::from(1),
            state: 0,
            timestamp: U256::from(1_700_000_000u64),
        }
    }

    #[test]
    fn test_approval_value_native_pays_amount() {
        let tx = raw(NATIVE_TOKEN, 42);
        assert_eq!(approval_value(&tx), U256::from(42));
    }

    #[test]
    fn test_approval_value_token_pays_nothing() {
        let tx = raw(address!("a0b86a33e6417c94be4e4a20ac5b0f8c2c9a8e8b"), 42);
        assert_eq!(approval_value(&tx), U256::ZERO);
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(TxState::from_code(0), Some(TxState::Pending));
        assert_eq!(TxState::from_code(1), Some(TxState::Approved));
        assert_eq!(TxState::from_code(2), Some(TxState::Cancelled));
        assert_eq!(TxState::from_code(5), None);
    }
}
