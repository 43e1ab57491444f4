//! Proposal workflow: edit a draft, stage it for review, then submit on confirmation
//!
//! ```text
//! Editing -> Reviewing -> Submitting -> Confirming -> Settled
//!    ^          |             |             |
//!    +-- cancel +   (fail: back to Reviewing)   (fail: back to Editing)
//! ```
//!
//! Unit conversion only happens in [`ProposalWorkflow::confirm`], so the
//! review screen always shows exactly what was typed.

use alloy::primitives::{Address, B256, U256};

use crate::domain::contract::{NATIVE_DECIMALS, NATIVE_SYMBOL, NATIVE_TOKEN};
use crate::domain::units::parse_units;
use crate::domain::validate::{
    is_positive_amount, validate_amount, validate_custom_token, validate_recipient,
};
use crate::error::{Field, FieldError, WorkflowError};

/// Which asset the proposal moves
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenSelector {
    #[default]
    Native,
    /// A token from the configured token list
    Listed { address: Address, symbol: String },
    /// Address typed into the custom token field
    Custom,
}

impl TokenSelector {
    pub fn label(&self) -> String {
        match self {
            TokenSelector::Native => NATIVE_SYMBOL.to_string(),
            TokenSelector::Listed { symbol, .. } => symbol.clone(),
            TokenSelector::Custom => "Custom token address…".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProposalDraft {
    pub recipient: String,
    pub token: TokenSelector,
    pub custom_token: String,
    pub amount: String,
}

impl ProposalDraft {
    /// Validate every field, collecting one error per offending field
    pub fn validate(&self, rules: &ProposalRules) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Err(err) = validate_recipient(&self.recipient) {
            errors.push(err);
        }
        if self.token == TokenSelector::Custom {
            if let Err(err) = validate_custom_token(&self.custom_token) {
                errors.push(err);
            }
        }
        let cap = match self.token {
            TokenSelector::Native => rules.max_native_amount,
            _ => None,
        };
        if let Err(err) = validate_amount(&self.amount, cap) {
            errors.push(err);
        }
        errors
    }

    /// Effective token address, if it can be resolved
    pub fn token_address(&self) -> Option<Address> {
        match &self.token {
            TokenSelector::Native => Some(NATIVE_TOKEN),
            TokenSelector::Listed { address, .. } => Some(*address),
            TokenSelector::Custom => validate_custom_token(&self.custom_token).ok(),
        }
    }

    /// Token as shown on the review screen
    pub fn token_label(&self) -> String {
        match &self.token {
            TokenSelector::Custom => self.custom_token.trim().to_string(),
            other => other.label(),
        }
    }
}

/// Input rules that are sanity checks rather than protocol rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRules {
    /// Upper bound for native amounts, in wei
    pub max_native_amount: Option<U256>,
}

impl Default for ProposalRules {
    fn default() -> Self {
        Self {
            max_native_amount: parse_units("1000", NATIVE_DECIMALS).ok(),
        }
    }
}

/// A draft frozen for review together with the nonce seen at staging time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedProposal {
    pub draft: ProposalDraft,
    pub token_label: String,
    pub nonce: u64,
}

impl StagedProposal {
    /// Resolve addresses and convert the amount to base units
    pub fn to_call(&self, token_decimals: u8) -> Result<ProposalCall, WorkflowError> {
        let to = validate_recipient(&self.draft.recipient)
            .map_err(|err| WorkflowError::Invalid(vec![err]))?;
        let token = match &self.draft.token {
            TokenSelector::Native => NATIVE_TOKEN,
            TokenSelector::Listed { address, .. } => *address,
            TokenSelector::Custom => validate_custom_token(&self.draft.custom_token)
                .map_err(|err| WorkflowError::Invalid(vec![err]))?,
        };

        let amount_text = self.draft.amount.trim();
        if !is_positive_amount(amount_text) {
            return Err(WorkflowError::Invalid(vec![FieldError::new(
                Field::Amount,
                "Amount must be greater than zero",
            )]));
        }
        let decimals = if token == NATIVE_TOKEN {
            NATIVE_DECIMALS
        } else {
            token_decimals
        };
        let amount = parse_units(amount_text, decimals)?;
        if amount.is_zero() {
            return Err(WorkflowError::ZeroAmount);
        }

        Ok(ProposalCall {
            to,
            token,
            amount,
            nonce: self.nonce,
        })
    }
}

/// Arguments of `proposeTnx`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalCall {
    pub to: Address,
    pub token: Address,
    pub amount: U256,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Editing,
    Reviewing(StagedProposal),
    Submitting(StagedProposal),
    Confirming { staged: StagedProposal, tx_hash: B256 },
    /// Receipt confirmed; the form is editable again
    Settled { tx_hash: B256 },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Editing => "Editing",
            WorkflowState::Reviewing(_) => "Reviewing",
            WorkflowState::Submitting(_) => "Submitting",
            WorkflowState::Confirming { .. } => "Confirming",
            WorkflowState::Settled { .. } => "Settled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProposalWorkflow {
    state: WorkflowState,
    draft: ProposalDraft,
    rules: ProposalRules,
    field_errors: Vec<FieldError>,
    last_error: Option<WorkflowError>,
}

impl ProposalWorkflow {
    pub fn new(rules: ProposalRules) -> Self {
        Self {
            state: WorkflowState::Editing,
            draft: ProposalDraft::default(),
            rules,
            field_errors: Vec::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn draft(&self) -> &ProposalDraft {
        &self.draft
    }

    pub fn rules(&self) -> &ProposalRules {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: ProposalRules) {
        self.rules = rules;
    }

    pub fn is_editable(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Editing | WorkflowState::Settled { .. }
        )
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Submitting(_) | WorkflowState::Confirming { .. }
        )
    }

    /// Mutable access to the draft, only while the form is editable
    pub fn draft_mut(&mut self) -> Option<&mut ProposalDraft> {
        if !self.is_editable() {
            return None;
        }
        if matches!(self.state, WorkflowState::Settled { .. }) {
            self.state = WorkflowState::Editing;
        }
        Some(&mut self.draft)
    }

    pub fn staged(&self) -> Option<&StagedProposal> {
        match &self.state {
            WorkflowState::Reviewing(staged) | WorkflowState::Submitting(staged) => Some(staged),
            WorkflowState::Confirming { staged, .. } => Some(staged),
            _ => None,
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn field_error(&self, field: Field) -> Option<&FieldError> {
        self.field_errors.iter().find(|err| err.field == field)
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Re-run validation so inline errors track edits once they are on screen
    pub fn revalidate(&mut self) {
        if !self.field_errors.is_empty() {
            self.field_errors = self.draft.validate(&self.rules);
        }
    }

    /// Editing -> Reviewing. Rejected while a draft is staged or in flight.
    pub fn review(&mut self, nonce: Option<u64>) -> Result<StagedProposal, WorkflowError> {
        match self.state {
            WorkflowState::Reviewing(_) => return Err(WorkflowError::AlreadyStaged),
            WorkflowState::Submitting(_) | WorkflowState::Confirming { .. } => {
                return Err(WorkflowError::InFlight)
            }
            WorkflowState::Editing | WorkflowState::Settled { .. } => {}
        }

        let errors = self.draft.validate(&self.rules);
        if !errors.is_empty() {
            self.field_errors = errors.clone();
            return Err(WorkflowError::Invalid(errors));
        }
        self.field_errors.clear();

        let Some(nonce) = nonce else {
            return Err(WorkflowError::NonceUnavailable);
        };

        let staged = StagedProposal {
            draft: self.draft.clone(),
            token_label: self.draft.token_label(),
            nonce,
        };
        self.last_error = None;
        self.state = WorkflowState::Reviewing(staged.clone());
        Ok(staged)
    }

    /// Reviewing -> Editing, keeping the draft
    pub fn cancel_review(&mut self) -> bool {
        if matches!(self.state, WorkflowState::Reviewing(_)) {
            self.state = WorkflowState::Editing;
            true
        } else {
            false
        }
    }

    /// Reviewing -> Submitting. On failure the workflow stays in Reviewing
    /// with the draft intact and the error recorded.
    pub fn confirm(&mut self, token_decimals: u8) -> Result<ProposalCall, WorkflowError> {
        let staged = match &self.state {
            WorkflowState::Reviewing(staged) => staged,
            WorkflowState::Submitting(_) | WorkflowState::Confirming { .. } => {
                return Err(WorkflowError::InFlight)
            }
            WorkflowState::Editing | WorkflowState::Settled { .. } => {
                return Err(WorkflowError::NothingStaged)
            }
        };

        match staged.to_call(token_decimals) {
            Ok(call) => {
                let staged = staged.clone();
                self.last_error = None;
                self.state = WorkflowState::Submitting(staged);
                Ok(call)
            }
            Err(err) => {
                self.field_errors = err.field_errors().to_vec();
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Submitting -> Confirming once the write returned a transaction hash
    pub fn submitted(&mut self, tx_hash: B256) -> bool {
        let state = std::mem::replace(&mut self.state, WorkflowState::Editing);
        match state {
            WorkflowState::Submitting(staged) => {
                self.state = WorkflowState::Confirming { staged, tx_hash };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// The write or the signature failed: Submitting -> Reviewing
    pub fn submit_failed(&mut self, err: WorkflowError) {
        let state = std::mem::replace(&mut self.state, WorkflowState::Editing);
        self.state = match state {
            WorkflowState::Submitting(staged) => WorkflowState::Reviewing(staged),
            other => other,
        };
        self.last_error = Some(err);
    }

    /// Receipt confirmed: clear the draft and settle. Returns false for an unknown hash.
    pub fn confirmed(&mut self, tx_hash: B256) -> bool {
        match &self.state {
            WorkflowState::Confirming { tx_hash: pending, .. } if *pending == tx_hash => {
                self.draft = ProposalDraft::default();
                self.field_errors.clear();
                self.last_error = None;
                self.state = WorkflowState::Settled { tx_hash };
                true
            }
            _ => false,
        }
    }

    /// Hard error at any point: back to Editing with the draft kept
    pub fn abort(&mut self, err: WorkflowError) {
        self.state = WorkflowState::Editing;
        self.last_error = Some(err);
    }
}
