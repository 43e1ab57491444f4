//! Error taxonomy shared by the workflow, the decoder and the chain worker

use thiserror::Error;

/// Form fields that can carry an inline validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Recipient,
    Token,
    CustomToken,
    Amount,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Recipient => "Recipient",
            Field::Token => "Token",
            Field::CustomToken => "Custom token",
            Field::Amount => "Amount",
        }
    }
}

/// A validation failure attached to one form field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", .field.label())]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Decimal string to base-unit conversion failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid number: {0}")]
    Invalid(String),
    #[error("unsupported decimals: {0}")]
    Decimals(u8),
    #[error("amount does not fit in 256 bits")]
    Overflow,
}

/// Raised only by strict decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown transaction state code {0}")]
    UnknownState(u8),
}

/// Failures reported by the wallet, the node or the contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("request rejected by wallet: {0}")]
    Rejected(String),
    #[error("wallet disconnected")]
    Disconnected,
    #[error("wallet is watch-only")]
    ReadOnly,
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("stale nonce: staged {staged}, contract now expects {current}")]
    StaleNonce { staged: u64, current: u64 },
    #[error("{0}")]
    Rpc(String),
    /// The worker went away before the write reported back
    #[error("outcome unknown, the worker restarted while the write was in flight")]
    Interrupted,
}

impl ChainError {
    /// Map an arbitrary worker error onto the taxonomy, keeping the message verbatim
    pub fn classify(err: &anyhow::Error) -> Self {
        if let Some(chain) = err.downcast_ref::<ChainError>() {
            return chain.clone();
        }
        let message = format!("{err:#}");
        let lower = message.to_lowercase();
        if lower.contains("user rejected") || lower.contains("user denied") {
            ChainError::Rejected(message)
        } else if lower.contains("revert") {
            ChainError::Reverted(message)
        } else {
            ChainError::Rpc(message)
        }
    }

    /// Wallet/user errors are shown as a dismissable banner without remediation text
    pub fn is_wallet_error(&self) -> bool {
        matches!(
            self,
            ChainError::Rejected(_) | ChainError::Disconnected | ChainError::ReadOnly
        )
    }

    pub fn hint(&self) -> &'static str {
        match self {
            ChainError::Rejected(_) => "Resubmit when ready.",
            ChainError::Disconnected => "Reconnect the wallet with 'c'.",
            ChainError::ReadOnly => "Connect with a private key to send transactions.",
            ChainError::Reverted(_) => {
                "Check the recipient, the token allowance and that the transaction is still pending."
            }
            ChainError::StaleNonce { .. } => {
                "Another proposal landed first. Refresh with 'r' and stage the proposal again."
            }
            ChainError::Rpc(_) => "Check the RPC endpoint and your balance for gas, then retry.",
            ChainError::Interrupted => {
                "The transaction may still land. Check the explorer and refresh with 'r' before retrying."
            }
        }
    }
}

/// Errors raised by proposal workflow transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{} field(s) need attention", .0.len())]
    Invalid(Vec<FieldError>),
    #[error("a proposal is already staged for review")]
    AlreadyStaged,
    #[error("a proposal is already in flight")]
    InFlight,
    #[error("no proposal is staged")]
    NothingStaged,
    #[error("current nonce is not loaded yet")]
    NonceUnavailable,
    #[error("amount rounds to zero base units")]
    ZeroAmount,
    #[error("invalid amount: {0}")]
    Amount(#[from] UnitsError),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl WorkflowError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            WorkflowError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keeps_typed_errors() {
        let err = anyhow::Error::new(ChainError::StaleNonce {
            staged: 3,
            current: 4,
        });
        assert_eq!(
            ChainError::classify(&err),
            ChainError::StaleNonce {
                staged: 3,
                current: 4
            }
        );
    }

    #[test]
    fn test_classify_by_message() {
        let rejected = anyhow::anyhow!("User rejected the request.");
        assert!(matches!(
            ChainError::classify(&rejected),
            ChainError::Rejected(_)
        ));

        let reverted = anyhow::anyhow!("server returned an error response: execution reverted: Not owner");
        assert!(matches!(
            ChainError::classify(&reverted),
            ChainError::Reverted(_)
        ));

        let rpc = anyhow::anyhow!("connection refused");
        assert_eq!(
            ChainError::classify(&rpc),
            ChainError::Rpc("connection refused".to_string())
        );
    }

    #[test]
    fn test_wallet_errors() {
        assert!(ChainError::ReadOnly.is_wallet_error());
        assert!(ChainError::Rejected("no".into()).is_wallet_error());
        assert!(!ChainError::Rpc("timeout".into()).is_wallet_error());
    }
}
