//! Domain layer: contract surface, unit math, validation, decoding and the proposal workflow

pub mod contract;
pub mod decoder;
pub mod proposal;
pub mod units;
pub mod validate;

pub use contract::{RawTransaction, TxState, NATIVE_DECIMALS, NATIVE_SYMBOL, NATIVE_TOKEN};
pub use decoder::{decode_transaction, DecodeMode, NormalizedTransaction, TokenInfo};
pub use proposal::{
    ProposalCall, ProposalDraft, ProposalRules, ProposalWorkflow, StagedProposal, TokenSelector,
    WorkflowState,
};
