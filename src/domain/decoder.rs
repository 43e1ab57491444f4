//! Decode contract transaction records into display-ready values

use alloy::primitives::{Address, U256};

use crate::domain::contract::{RawTransaction, TxState, NATIVE_DECIMALS, NATIVE_SYMBOL, NATIVE_TOKEN};
use crate::domain::units::format_units;
use crate::error::DecodeError;

/// How to treat state codes outside the known set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Unknown codes fall back to Pending
    #[default]
    Lenient,
    /// Unknown codes are reported as errors
    Strict,
}

/// What the decoder knows about a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: Option<String>,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn native() -> Self {
        Self {
            symbol: Some(NATIVE_SYMBOL.to_string()),
            decimals: NATIVE_DECIMALS,
        }
    }
}

impl Default for TokenInfo {
    fn default() -> Self {
        Self {
            symbol: None,
            decimals: NATIVE_DECIMALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTransaction {
    pub id: u64,
    pub owner: Address,
    pub to: Address,
    pub token: Address,
    pub token_name: String,
    pub amount: String,
    pub raw_amount: U256,
    pub nonce: u64,
    pub state: TxState,
    pub timestamp_ms: u64,
}

impl NormalizedTransaction {
    pub fn is_native(&self) -> bool {
        self.token == NATIVE_TOKEN
    }
}

pub fn decode_transaction(
    id: u64,
    raw: &RawTransaction,
    token: &TokenInfo,
    mode: DecodeMode,
) -> Result<NormalizedTransaction, DecodeError> {
    let state = match (TxState::from_code(raw.state), mode) {
        (Some(state), _) => state,
        (None, DecodeMode::Lenient) => TxState::Pending,
        (None, DecodeMode::Strict) => return Err(DecodeError::UnknownState(raw.state)),
    };

    Ok(NormalizedTransaction {
        id,
        owner: raw.owner,
        to: raw.to,
        token: raw.token,
        token_name: token_display(raw.token, token.symbol.as_deref()),
        amount: format_amount(raw.amount, raw.token, token),
        raw_amount: raw.amount,
        nonce: raw.nonce.saturating_to::<u64>(),
        state,
        timestamp_ms: raw.timestamp.saturating_to::<u64>().saturating_mul(1000),
    })
}

/// Human amount: native values carry an `ETH` suffix, tokens their symbol when known.
/// Amounts that cannot be scaled are shown raw.
pub fn format_amount(amount: U256, token: Address, info: &TokenInfo) -> String {
    let (decimals, suffix) = if token == NATIVE_TOKEN {
        (NATIVE_DECIMALS, Some(NATIVE_SYMBOL))
    } else {
        (info.decimals, info.symbol.as_deref())
    };
    match (format_units(amount, decimals), suffix) {
        (Some(value), Some(suffix)) => format!("{value} {suffix}"),
        (Some(value), None) => value,
        (None, _) => format!("{amount} (Raw)"),
    }
}

pub fn token_display(token: Address, symbol: Option<&str>) -> String {
    if token == NATIVE_TOKEN {
        return NATIVE_SYMBOL.to_string();
    }
    if let Some(symbol) = symbol.filter(|s| !s.trim().is_empty()) {
        return symbol.to_string();
    }
    short_addr(&format!("0x{}", hex::encode(token.as_slice())))
}

/// `first6…last4` for strings of at least 10 characters
pub fn short_addr(value: &str) -> String {
    let value = value.trim();
    if value.chars().count() < 10 {
        return value.to_string();
    }
    let start: String = value.chars().take(6).collect();
    let end: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{start}…{end}")
}
