use std::time::{Duration, Instant};

use alloy::primitives::{Address, B256};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::core::{parse_command, Command};
use crate::domain::contract::{TxState, NATIVE_TOKEN};
use crate::domain::decoder::{decode_transaction, NormalizedTransaction};
use crate::domain::proposal::{ProposalWorkflow, TokenSelector, WorkflowState};
use crate::domain::validate::parse_address;
use crate::error::{ChainError, DecodeError, Field, WorkflowError};
use crate::infrastructure::ethereum::WalletSource;
use crate::infrastructure::runtime::{
    RuntimeCommand, RuntimeEvent, WriteKind, WriteRequest, WriteStage,
};
use crate::store::{ListedToken, Queries, QueryKey, TokenBook};

/// Panels of the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Propose,
    Pending,
    History,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Propose, Panel::Pending, Panel::History];

    pub fn title(&self) -> &'static str {
        match self {
            Panel::Propose => "Propose",
            Panel::Pending => "Pending",
            Panel::History => "History",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Panel::Propose => '1',
            Panel::Pending => '2',
            Panel::History => '3',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the proposal form
    Editing,
    Command,
    Prompt(PromptKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    PrivateKey,
    WatchAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// Sticky error shown until dismissed with Esc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    pub hint: Option<&'static str>,
    pub level: StatusLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Disconnected,
    Connecting,
    Connected {
        endpoint: String,
        account: Address,
        chain_id: u64,
        can_sign: bool,
    },
}

/// Most recent write sent by this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWrite {
    pub kind: WriteKind,
    pub tx_hash: B256,
    pub confirmed: bool,
    pub block_number: Option<u64>,
}

#[derive(Debug)]
pub struct App {
    pub settings: Settings,
    pub connection: Connection,
    /// Wallet of the current connection, reused on reload
    pub wallet: Option<WalletSource>,
    pub queries: Queries,
    pub tokens: TokenBook,
    pub workflow: ProposalWorkflow,
    pub panel: Panel,
    pub form_field: Field,
    pub selected_pending: usize,
    pub selected_history: usize,
    /// Transaction opened with `:tx <id>`
    pub inspected: Option<u64>,
    /// Approve or cancel waiting for its receipt
    pub action_in_flight: Option<WriteKind>,
    pub last_write: Option<LastWrite>,
    pub banner: Option<Banner>,
    pub status: Option<StatusMessage>,
    pub command: CommandBar,
    pub input_mode: InputMode,
    pub prompt_input: String,
    pub endpoint_index: usize,
    pub help_open: bool,
    pub settings_open: bool,
    pub should_quit: bool,
    outbox: Vec<RuntimeCommand>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let tokens = TokenBook::new(settings.tokens.clone());
        let workflow = ProposalWorkflow::new(settings.rules.clone());
        Self {
            settings,
            connection: Connection::Disconnected,
            wallet: None,
            queries: Queries::default(),
            tokens,
            workflow,
            panel: Panel::Propose,
            form_field: Field::Recipient,
            selected_pending: 0,
            selected_history: 0,
            inspected: None,
            action_in_flight: None,
            last_write: None,
            banner: None,
            status: None,
            command: CommandBar::default(),
            input_mode: InputMode::Normal,
            prompt_input: String::new(),
            endpoint_index: 0,
            help_open: false,
            settings_open: false,
            should_quit: false,
            outbox: Vec::new(),
        }
    }

    // === Status ===

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > Duration::from_secs(4) {
                self.status = None;
            }
        }
    }

    fn show_chain_error(&mut self, context: &str, error: &ChainError) {
        let level = if error.is_wallet_error() {
            StatusLevel::Warn
        } else {
            StatusLevel::Error
        };
        self.banner = Some(Banner {
            text: format!("{context}: {error}"),
            hint: Some(error.hint()),
            level,
        });
    }

    pub fn dismiss_banner(&mut self) -> bool {
        self.workflow.clear_error();
        self.banner.take().is_some()
    }

    // === Worker commands ===

    fn send(&mut self, cmd: RuntimeCommand) {
        self.outbox.push(cmd);
    }

    /// Drain commands queued for the worker
    pub fn take_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.outbox)
    }

    // === Connection ===

    pub fn account(&self) -> Option<Address> {
        match &self.connection {
            Connection::Connected { account, .. } => Some(*account),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Connected { .. })
    }

    pub fn can_sign(&self) -> bool {
        matches!(self.connection, Connection::Connected { can_sign: true, .. })
    }

    pub fn request_connect(&mut self, wallet: WalletSource) {
        debug!(wallet = ?wallet, "connect requested");
        self.connection = Connection::Connecting;
        self.wallet = Some(wallet.clone());
        self.send(RuntimeCommand::Connect { wallet });
        self.set_status("Connecting…", StatusLevel::Info);
    }

    /// Connect with the key from the environment, or ask for one
    pub fn begin_connect(&mut self, env_key: Option<String>) {
        match env_key.filter(|key| !key.trim().is_empty()) {
            Some(key) => self.request_connect(WalletSource::PrivateKey(key)),
            None => self.enter_prompt(PromptKind::PrivateKey),
        }
    }

    pub fn disconnect(&mut self) {
        if matches!(self.connection, Connection::Disconnected) {
            return;
        }
        self.send(RuntimeCommand::Disconnect);
        self.wallet = None;
        self.connection = Connection::Disconnected;
        self.queries.set_owner(None);
        self.action_in_flight = None;
        self.set_status("Disconnected", StatusLevel::Info);
    }

    pub fn cycle_endpoint(&mut self, forward: bool) {
        let len = self.settings.endpoints.len();
        if len == 0 {
            self.set_status("No RPC endpoints configured", StatusLevel::Warn);
            return;
        }
        let next = if forward {
            (self.endpoint_index + 1) % len
        } else {
            (self.endpoint_index + len - 1) % len
        };
        self.endpoint_index = next;
        self.send(RuntimeCommand::SwitchEndpoint { index: next });
        if self.wallet.is_some() {
            self.connection = Connection::Connecting;
        }
        let label = self.settings.endpoints[next].name.clone();
        self.set_status(format!("Switching RPC endpoint: {label}"), StatusLevel::Info);
    }

    /// Swap in freshly loaded settings; chain state is kept
    pub fn apply_settings(&mut self, settings: Settings) {
        self.tokens = TokenBook::new(settings.tokens.clone());
        self.workflow.set_rules(settings.rules.clone());
        if self.endpoint_index >= settings.endpoints.len() {
            self.endpoint_index = 0;
        }
        self.settings = settings;
        self.request_missing_decimals();
        self.set_status(
            format!(
                "Reloaded config: {} tokens, {} endpoints",
                self.settings.tokens.len(),
                self.settings.endpoints.len()
            ),
            StatusLevel::Info,
        );
    }

    // === Reads ===

    pub fn refetch(&mut self, key: QueryKey) -> bool {
        match self.queries.refetch(key) {
            Some(owner) => {
                self.send(RuntimeCommand::Fetch { owner, query: key });
                true
            }
            None => false,
        }
    }

    pub fn refresh(&mut self) {
        if !self.is_connected() {
            self.set_status("Connect a wallet first", StatusLevel::Warn);
            return;
        }
        self.refetch(QueryKey::Nonce);
        self.refetch(QueryKey::PendingIds);
        self.refetch(QueryKey::UserIds);
        let ids: Vec<u64> = self.queries.details.keys().copied().collect();
        for id in ids {
            self.refetch(QueryKey::Transaction(id));
        }
        self.set_status("Refreshing…", StatusLevel::Info);
    }

    fn request_missing_details(&mut self) {
        for id in self.queries.missing_details() {
            self.refetch(QueryKey::Transaction(id));
        }
    }

    fn request_decimals(&mut self, token: Address) {
        if self.tokens.should_fetch(token) {
            self.send(RuntimeCommand::FetchDecimals { token });
        }
    }

    fn request_missing_decimals(&mut self) {
        let tokens: Vec<Address> = self
            .queries
            .details
            .values()
            .filter_map(|query| query.data.as_ref().map(|tx| tx.token))
            .collect();
        for token in tokens {
            self.request_decimals(token);
        }
    }

    /// Decoded view of a cached transaction; decoding happens on every read
    pub fn transaction(&self, id: u64) -> Option<Result<NormalizedTransaction, DecodeError>> {
        let raw = self.queries.detail(id)?;
        let info = self.tokens.info(raw.token);
        Some(decode_transaction(id, raw, &info, self.settings.decode_mode))
    }

    pub fn pending_ids(&self) -> Vec<u64> {
        self.queries.pending.data.clone().unwrap_or_default()
    }

    /// Newest first
    pub fn history_ids(&self) -> Vec<u64> {
        let mut ids = self.queries.history.data.clone().unwrap_or_default();
        ids.reverse();
        ids
    }

    pub fn selected_id(&self) -> Option<u64> {
        if let Some(id) = self.inspected {
            return Some(id);
        }
        match self.panel {
            Panel::Pending => self.pending_ids().get(self.selected_pending).copied(),
            Panel::History => self.history_ids().get(self.selected_history).copied(),
            Panel::Propose => None,
        }
    }

    pub fn move_selection(&mut self, down: bool) {
        self.inspected = None;
        let (selection, len) = match self.panel {
            Panel::Pending => (&mut self.selected_pending, self.queries.pending.data.as_ref().map_or(0, Vec::len)),
            Panel::History => (&mut self.selected_history, self.queries.history.data.as_ref().map_or(0, Vec::len)),
            Panel::Propose => return,
        };
        if len == 0 {
            *selection = 0;
        } else if down {
            *selection = (*selection + 1).min(len - 1);
        } else {
            *selection = selection.saturating_sub(1);
        }
    }

    fn clamp_selections(&mut self) {
        let pending = self.queries.pending.data.as_ref().map_or(0, Vec::len);
        let history = self.queries.history.data.as_ref().map_or(0, Vec::len);
        self.selected_pending = self.selected_pending.min(pending.saturating_sub(1));
        self.selected_history = self.selected_history.min(history.saturating_sub(1));
    }

    pub fn set_panel(&mut self, panel: Panel) {
        self.panel = panel;
        self.inspected = None;
    }

    pub fn cycle_panel(&mut self, forward: bool) {
        let idx = Panel::ALL.iter().position(|p| *p == self.panel).unwrap_or(0);
        let len = Panel::ALL.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        self.set_panel(Panel::ALL[next]);
    }

    // === Proposal form ===

    pub fn token_options(&self) -> Vec<TokenSelector> {
        let mut options = vec![TokenSelector::Native];
        options.extend(self.tokens.listed().iter().map(|t: &ListedToken| {
            TokenSelector::Listed {
                address: t.address,
                symbol: t.symbol.clone(),
            }
        }));
        options.push(TokenSelector::Custom);
        options
    }

    /// Fields shown for the current token choice, top to bottom
    pub fn visible_fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::Recipient, Field::Token];
        if self.workflow.draft().token == TokenSelector::Custom {
            fields.push(Field::CustomToken);
        }
        fields.push(Field::Amount);
        fields
    }

    pub fn start_editing(&mut self) {
        if !self.workflow.is_editable() {
            self.set_status(
                format!("Proposal is {}", self.workflow.state().name().to_lowercase()),
                StatusLevel::Warn,
            );
            return;
        }
        self.set_panel(Panel::Propose);
        self.input_mode = InputMode::Editing;
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn focus_field(&mut self, forward: bool) {
        let fields = self.visible_fields();
        let idx = fields.iter().position(|f| *f == self.form_field).unwrap_or(0);
        let next = if forward {
            (idx + 1) % fields.len()
        } else {
            (idx + fields.len() - 1) % fields.len()
        };
        self.form_field = fields[next];
    }

    pub fn cycle_token(&mut self, forward: bool) {
        let options = self.token_options();
        let Some(draft) = self.workflow.draft_mut() else {
            return;
        };
        let idx = options.iter().position(|o| *o == draft.token).unwrap_or(0);
        let next = if forward {
            (idx + 1) % options.len()
        } else {
            (idx + options.len() - 1) % options.len()
        };
        draft.token = options[next].clone();
        self.workflow.revalidate();
    }

    pub fn input_char(&mut self, c: char) {
        if self.form_field == Field::Token {
            if c == ' ' {
                self.cycle_token(true);
            }
            return;
        }
        let field = self.form_field;
        let Some(draft) = self.workflow.draft_mut() else {
            return;
        };
        match field {
            Field::Recipient => draft.recipient.push(c),
            Field::CustomToken => draft.custom_token.push(c),
            Field::Amount => draft.amount.push(c),
            Field::Token => {}
        }
        self.workflow.revalidate();
    }

    pub fn backspace(&mut self) {
        let field = self.form_field;
        let Some(draft) = self.workflow.draft_mut() else {
            return;
        };
        match field {
            Field::Recipient => {
                draft.recipient.pop();
            }
            Field::CustomToken => {
                draft.custom_token.pop();
            }
            Field::Amount => {
                draft.amount.pop();
            }
            Field::Token => {}
        }
        self.workflow.revalidate();
    }

    /// Editing -> Reviewing
    pub fn submit_form(&mut self) {
        if !self.is_connected() {
            self.set_status("Connect a wallet first", StatusLevel::Warn);
            return;
        }
        let nonce = self.queries.current_nonce();
        match self.workflow.review(nonce) {
            Ok(staged) => {
                debug!(nonce = staged.nonce, token = %staged.token_label, "proposal staged");
                self.input_mode = InputMode::Normal;
                if let Some(token) = staged.draft.token_address() {
                    self.request_decimals(token);
                }
                self.set_status("Review the proposal: Enter to confirm, Esc to edit", StatusLevel::Info);
            }
            Err(WorkflowError::Invalid(errors)) => {
                if let Some(first) = errors.first() {
                    self.form_field = first.field;
                }
                self.set_status(
                    format!("{} field(s) need attention", errors.len()),
                    StatusLevel::Warn,
                );
            }
            Err(WorkflowError::NonceUnavailable) => {
                self.refetch(QueryKey::Nonce);
                self.set_status("Nonce is still loading, try again", StatusLevel::Warn);
            }
            Err(err) => self.set_status(err.to_string(), StatusLevel::Warn),
        }
    }

    /// Reviewing -> Submitting
    pub fn confirm_proposal(&mut self) {
        let Some(staged) = self.workflow.staged().cloned() else {
            self.set_status("Nothing to confirm", StatusLevel::Warn);
            return;
        };
        if !matches!(self.workflow.state(), WorkflowState::Reviewing(_)) {
            self.set_status("A proposal is already in flight", StatusLevel::Warn);
            return;
        }
        if !self.can_sign() {
            self.show_chain_error("Proposal not sent", &ChainError::ReadOnly);
            return;
        }

        let token = staged.draft.token_address().unwrap_or(NATIVE_TOKEN);
        if !self.tokens.is_resolved(token) {
            self.request_decimals(token);
            self.set_status("Reading token decimals, confirm again in a moment", StatusLevel::Info);
            return;
        }

        match self.workflow.confirm(self.tokens.decimals(token)) {
            Ok(call) => {
                debug!(nonce = call.nonce, amount = %call.amount, "proposal confirmed");
                self.send(RuntimeCommand::Write(WriteRequest::Propose(call)));
                self.set_status("Waiting for signature…", StatusLevel::Info);
            }
            Err(err) => {
                self.set_status(format!("Proposal not sent: {err}"), StatusLevel::Error);
            }
        }
    }

    pub fn cancel_review(&mut self) {
        if self.workflow.cancel_review() {
            self.input_mode = InputMode::Editing;
            self.set_status("Back to editing", StatusLevel::Info);
        }
    }

    // === Actions ===

    pub fn approve(&mut self, id: u64) {
        self.trigger_action(WriteKind::Approve(id));
    }

    pub fn cancel(&mut self, id: u64) {
        self.trigger_action(WriteKind::Cancel(id));
    }

    pub fn approve_selected(&mut self) {
        match self.selected_id() {
            Some(id) => self.approve(id),
            None => self.set_status("No transaction selected", StatusLevel::Warn),
        }
    }

    pub fn cancel_selected(&mut self) {
        match self.selected_id() {
            Some(id) => self.cancel(id),
            None => self.set_status("No transaction selected", StatusLevel::Warn),
        }
    }

    fn trigger_action(&mut self, kind: WriteKind) {
        if let Some(active) = self.action_in_flight {
            self.set_status(
                format!("{} is still in flight", active.label()),
                StatusLevel::Warn,
            );
            return;
        }
        if !self.is_connected() {
            self.set_status("Connect a wallet first", StatusLevel::Warn);
            return;
        }
        if !self.can_sign() {
            self.show_chain_error(&kind.label(), &ChainError::ReadOnly);
            return;
        }
        let Some(id) = kind.target() else {
            return;
        };
        if let Some(Ok(tx)) = self.transaction(id) {
            if tx.state != TxState::Pending {
                self.set_status(
                    format!("#{id} is already {}", tx.state.label().to_lowercase()),
                    StatusLevel::Warn,
                );
                return;
            }
        }

        let request = match kind {
            WriteKind::Approve(id) => WriteRequest::Approve(id),
            WriteKind::Cancel(id) => WriteRequest::Cancel(id),
            WriteKind::Propose => return,
        };
        self.action_in_flight = Some(kind);
        self.send(RuntimeCommand::Write(request));
        self.set_status(format!("{}: waiting for signature…", kind.label()), StatusLevel::Info);
    }

    /// Release writes owned by a worker that was shut down; their events never arrive
    pub fn abandon_writes(&mut self) {
        let proposal = self.workflow.is_in_flight();
        if proposal {
            self.workflow.abort(ChainError::Interrupted.into());
        }
        let action = self.action_in_flight.take();
        let label = match (proposal, action) {
            (true, _) => WriteKind::Propose.label(),
            (false, Some(kind)) => kind.label(),
            (false, None) => return,
        };
        warn!(write = %label, "abandoning in-flight write");
        self.show_chain_error(&label, &ChainError::Interrupted);
    }

    pub fn is_action_pending(&self, id: u64) -> bool {
        self.action_in_flight
            .and_then(|kind| kind.target())
            .is_some_and(|target| target == id)
    }

    pub fn explorer_link(&self) -> Option<String> {
        self.last_write
            .as_ref()
            .map(|write| self.settings.explorer_tx_url(&format!("{:#x}", write.tx_hash)))
    }

    // === Worker events ===

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Connected {
                endpoint,
                account,
                chain_id,
                can_sign,
            } => {
                if let Some(index) = self
                    .settings
                    .endpoints
                    .iter()
                    .position(|e| e.provider.display() == endpoint)
                {
                    self.endpoint_index = index;
                }
                self.connection = Connection::Connected {
                    endpoint,
                    account,
                    chain_id,
                    can_sign,
                };
                self.queries.set_owner(Some(account));
                if chain_id != self.settings.chain_id {
                    self.banner = Some(Banner {
                        text: format!(
                            "Connected to chain {chain_id}, expected {}",
                            self.settings.chain_id
                        ),
                        hint: Some("Switch endpoint with '[' / ']' in settings."),
                        level: StatusLevel::Warn,
                    });
                }
                self.refresh();
                let mode = if can_sign { "signer" } else { "watch-only" };
                self.set_status(format!("Connected ({mode})"), StatusLevel::Success);
            }
            RuntimeEvent::Disconnected => {
                self.connection = Connection::Disconnected;
                self.queries.set_owner(None);
            }
            RuntimeEvent::NonceReady { owner, nonce } => {
                if self.queries.accepts(owner) {
                    self.queries.nonce.resolve(nonce);
                }
            }
            RuntimeEvent::PendingReady { owner, ids } => {
                if self.queries.accepts(owner) {
                    self.queries.pending.resolve(ids);
                    self.clamp_selections();
                    self.request_missing_details();
                }
            }
            RuntimeEvent::HistoryReady { owner, ids } => {
                if self.queries.accepts(owner) {
                    self.queries.history.resolve(ids);
                    self.clamp_selections();
                    self.request_missing_details();
                }
            }
            RuntimeEvent::TransactionReady { id, tx } => {
                if self.queries.owner().is_some() {
                    let token = tx.token;
                    self.queries.details.entry(id).or_default().resolve(tx);
                    self.request_decimals(token);
                }
            }
            RuntimeEvent::DecimalsReady { token, decimals } => {
                self.tokens.record(token, decimals);
            }
            RuntimeEvent::DecimalsUnavailable { token } => {
                self.tokens.forget(token);
            }
            RuntimeEvent::QueryFailed { query, message } => {
                self.queries.fail(query, &message);
                self.set_status(
                    format!("Failed to load {}: {message}", query.label()),
                    StatusLevel::Warn,
                );
            }
            RuntimeEvent::WriteSubmitted { kind, tx_hash } => {
                if kind == WriteKind::Propose {
                    self.workflow.submitted(tx_hash);
                }
                self.last_write = Some(LastWrite {
                    kind,
                    tx_hash,
                    confirmed: false,
                    block_number: None,
                });
                self.set_status(
                    format!("{} sent, waiting for confirmation…", kind.label()),
                    StatusLevel::Info,
                );
            }
            RuntimeEvent::WriteConfirmed {
                kind,
                tx_hash,
                block_number,
            } => {
                if kind == WriteKind::Propose && self.workflow.confirmed(tx_hash) {
                    self.form_field = Field::Recipient;
                }
                if self.action_in_flight == Some(kind) {
                    self.action_in_flight = None;
                }
                if let Some(write) = self.last_write.as_mut().filter(|w| w.tx_hash == tx_hash) {
                    write.confirmed = true;
                    write.block_number = block_number;
                }
                self.set_status(
                    format!("{} confirmed. Press 'y' to copy the explorer link", kind.label()),
                    StatusLevel::Success,
                );
            }
            RuntimeEvent::WriteFailed { kind, stage, error } => {
                if kind == WriteKind::Propose {
                    match stage {
                        WriteStage::Submission => self.workflow.submit_failed(error.clone().into()),
                        WriteStage::Receipt => self.workflow.abort(error.clone().into()),
                    }
                }
                if self.action_in_flight == Some(kind) {
                    self.action_in_flight = None;
                }
                if matches!(error, ChainError::Disconnected) {
                    self.connection = Connection::Disconnected;
                    self.queries.set_owner(None);
                }
                self.show_chain_error(&format!("{} failed", kind.label()), &error);
            }
            RuntimeEvent::Error { message } => {
                if matches!(self.connection, Connection::Connecting) {
                    self.connection = Connection::Disconnected;
                }
                self.set_status(message, StatusLevel::Error);
            }
        }
    }

    // === Input modes ===

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn enter_prompt(&mut self, kind: PromptKind) {
        self.input_mode = InputMode::Prompt(kind);
        self.prompt_input.clear();
    }

    pub fn exit_prompt(&mut self) {
        self.input_mode = InputMode::Normal;
        self.prompt_input.clear();
    }

    pub fn apply_prompt(&mut self, kind: PromptKind) {
        let value = std::mem::take(&mut self.prompt_input);
        let value = value.trim();
        self.input_mode = InputMode::Normal;
        if value.is_empty() {
            return;
        }
        match kind {
            PromptKind::PrivateKey => self.request_connect(WalletSource::PrivateKey(value.to_string())),
            PromptKind::WatchAddress => self.watch(value),
        }
    }

    fn watch(&mut self, value: &str) {
        match parse_address(value) {
            Some(address) => self.request_connect(WalletSource::WatchOnly(address)),
            None => self.set_status("Invalid Ethereum address", StatusLevel::Warn),
        }
    }

    pub fn apply_command(&mut self, env_key: Option<String>) {
        let input = self.command.input.trim().to_string();
        self.exit_command();
        if input.is_empty() {
            return;
        }
        let cmd = parse_command(&input);
        self.command.last = Some(input);
        self.execute_command(cmd, env_key);
    }

    pub fn execute_command(&mut self, cmd: Command, env_key: Option<String>) {
        match cmd {
            Command::Propose => self.start_editing(),
            Command::Pending => self.set_panel(Panel::Pending),
            Command::History => self.set_panel(Panel::History),
            Command::Tx(id) => {
                if self.queries.detail(id).is_none() && !self.refetch(QueryKey::Transaction(id)) {
                    self.set_status("Connect a wallet first", StatusLevel::Warn);
                    return;
                }
                if self.panel == Panel::Propose {
                    self.panel = Panel::History;
                }
                self.inspected = Some(id);
            }
            Command::Approve(id) => self.approve(id),
            Command::Cancel(id) => self.cancel(id),
            Command::Refresh => self.refresh(),
            Command::Connect => self.begin_connect(env_key),
            Command::Watch(address) => self.watch(&address),
            Command::Disconnect => self.disconnect(),
            Command::Endpoint(Some(index)) => {
                if index < self.settings.endpoints.len() {
                    self.endpoint_index = index;
                    self.send(RuntimeCommand::SwitchEndpoint { index });
                    if self.wallet.is_some() {
                        self.connection = Connection::Connecting;
                    }
                } else {
                    self.set_status(format!("No endpoint #{index}"), StatusLevel::Warn);
                }
            }
            Command::Endpoint(None) => self.cycle_endpoint(true),
            Command::Help => self.help_open = true,
            Command::Quit => self.should_quit = true,
            Command::Unknown(input) => {
                self.set_status(format!("Unknown command: {input}"), StatusLevel::Warn)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};

    use crate::config::{Config, Overrides};
    use crate::domain::contract::RawTransaction;

    const OWNER: Address = address!("00000000000000000000000000000000000000aa");

    fn connected_app(can_sign: bool) -> App {
        let settings = Settings::resolve(&Config::default(), &Overrides::default()).unwrap();
        let mut app = App::new(settings);
        app.request_connect(WalletSource::WatchOnly(OWNER));
        app.apply_runtime_event(RuntimeEvent::Connected {
            endpoint: "https://rpc.sepolia.org".into(),
            account: OWNER,
            chain_id: 11_155_111,
            can_sign,
        });
        app.take_commands();
        app
    }

    fn raw(token: Address, amount: u64, state: u8) -> RawTransaction {
        RawTransaction {
            owner: OWNER,
            to: address!("00000000000000000000000000000000000000bb"),
            token,
            amount: U256::from(amount),
            nonce: U256::from(1u64),
            state,
            timestamp: U256::from(1_700_000_000u64),
        }
    }

    #[test]
    fn test_connect_fetches_owner_state() {
        let settings = Settings::resolve(&Config::default(), &Overrides::default()).unwrap();
        let mut app = App::new(settings);
        assert!(!app.refetch(QueryKey::Nonce));
        app.apply_runtime_event(RuntimeEvent::Connected {
            endpoint: "x".into(),
            account: OWNER,
            chain_id: 1,
            can_sign: true,
        });
        let fetches = app
            .take_commands()
            .into_iter()
            .filter(|cmd| matches!(cmd, RuntimeCommand::Fetch { owner, .. } if *owner == OWNER))
            .count();
        assert_eq!(fetches, 3);
        assert!(app.banner.is_some(), "wrong chain id should warn");
    }

    #[test]
    fn test_pending_ids_request_details() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::PendingReady {
            owner: OWNER,
            ids: vec![1, 2],
        });
        let detail_fetches: Vec<_> = app
            .take_commands()
            .into_iter()
            .filter_map(|cmd| match cmd {
                RuntimeCommand::Fetch {
                    query: QueryKey::Transaction(id),
                    ..
                } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(detail_fetches, vec![1, 2]);
    }

    #[test]
    fn test_results_for_previous_owner_are_ignored() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::NonceReady {
            owner: address!("00000000000000000000000000000000000000cc"),
            nonce: 9,
        });
        assert_eq!(app.queries.current_nonce(), None);
    }

    #[test]
    fn test_approve_refused_while_in_flight() {
        let mut app = connected_app(true);
        app.approve(1);
        assert_eq!(app.action_in_flight, Some(WriteKind::Approve(1)));
        assert_eq!(app.take_commands().len(), 1);

        app.cancel(2);
        assert!(app.take_commands().is_empty());
        assert!(app.status_text().unwrap().0.contains("still in flight"));

        app.apply_runtime_event(RuntimeEvent::WriteConfirmed {
            kind: WriteKind::Approve(1),
            tx_hash: B256::repeat_byte(1),
            block_number: Some(10),
        });
        assert_eq!(app.action_in_flight, None);
    }

    #[test]
    fn test_watch_only_cannot_write() {
        let mut app = connected_app(false);
        app.approve(1);
        assert!(app.take_commands().is_empty());
        assert!(app.banner.is_some());
    }

    #[test]
    fn test_settled_transaction_is_not_approved() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::TransactionReady {
            id: 4,
            tx: raw(NATIVE_TOKEN, 5, 1),
        });
        app.take_commands();
        app.approve(4);
        assert!(app.take_commands().is_empty());
        assert_eq!(app.action_in_flight, None);
    }

    #[test]
    fn test_transaction_decodes_on_read() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::TransactionReady {
            id: 1,
            tx: raw(NATIVE_TOKEN, 1_000_000_000_000_000_000, 7),
        });
        let decoded = app.transaction(1).unwrap().unwrap();
        assert_eq!(decoded.amount, "1 ETH");
        assert_eq!(decoded.state, TxState::Pending);
        assert_eq!(app.transaction(1), app.transaction(1));
    }

    #[test]
    fn test_proposal_flow_through_events() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::NonceReady {
            owner: OWNER,
            nonce: 3,
        });
        app.start_editing();
        for c in "0x000000000000000000000000000000000000dEaD".chars() {
            app.input_char(c);
        }
        app.form_field = Field::Amount;
        for c in "0.5".chars() {
            app.input_char(c);
        }
        app.submit_form();
        assert!(matches!(app.workflow.state(), WorkflowState::Reviewing(_)));

        app.confirm_proposal();
        let commands = app.take_commands();
        let Some(RuntimeCommand::Write(WriteRequest::Propose(call))) = commands.last() else {
            panic!("expected a propose write, got {commands:?}");
        };
        assert_eq!(call.nonce, 3);
        assert_eq!(call.amount, U256::from(500_000_000_000_000_000u128));

        let hash = B256::repeat_byte(7);
        app.apply_runtime_event(RuntimeEvent::WriteSubmitted {
            kind: WriteKind::Propose,
            tx_hash: hash,
        });
        app.apply_runtime_event(RuntimeEvent::WriteConfirmed {
            kind: WriteKind::Propose,
            tx_hash: hash,
            block_number: Some(5),
        });
        assert!(app.workflow.draft().amount.is_empty());
        assert_eq!(
            app.explorer_link().unwrap(),
            format!("https://sepolia.etherscan.io/tx/0x{}", "07".repeat(32))
        );
    }

    #[test]
    fn test_rejected_signature_returns_to_review() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::NonceReady {
            owner: OWNER,
            nonce: 0,
        });
        let draft = app.workflow.draft_mut().unwrap();
        draft.recipient = "0x000000000000000000000000000000000000dEaD".into();
        draft.amount = "1".into();
        app.submit_form();
        app.confirm_proposal();
        app.apply_runtime_event(RuntimeEvent::WriteFailed {
            kind: WriteKind::Propose,
            stage: WriteStage::Submission,
            error: ChainError::Rejected("User rejected the request.".into()),
        });
        assert!(matches!(app.workflow.state(), WorkflowState::Reviewing(_)));
        let banner = app.banner.clone().unwrap();
        assert_eq!(banner.level, StatusLevel::Warn);
        assert!(app.dismiss_banner());
        assert!(app.banner.is_none());
    }

    #[test]
    fn test_custom_token_waits_for_decimals() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::NonceReady {
            owner: OWNER,
            nonce: 0,
        });
        let token = address!("a0b86a33e6417c94be4e4a20ac5b0f8c2c9a8e8b");
        let draft = app.workflow.draft_mut().unwrap();
        draft.recipient = "0x000000000000000000000000000000000000dEaD".into();
        draft.token = TokenSelector::Custom;
        draft.custom_token = "0xA0b86a33E6417c94BE4e4A20Ac5b0F8c2c9A8e8b".into();
        draft.amount = "2.5".into();
        app.submit_form();
        let commands = app.take_commands();
        assert!(commands
            .iter()
            .any(|cmd| matches!(cmd, RuntimeCommand::FetchDecimals { token: t } if *t == token)));

        app.confirm_proposal();
        assert!(app.take_commands().is_empty());

        app.apply_runtime_event(RuntimeEvent::DecimalsReady {
            token,
            decimals: Some(6),
        });
        app.confirm_proposal();
        let commands = app.take_commands();
        let Some(RuntimeCommand::Write(WriteRequest::Propose(call))) = commands.last() else {
            panic!("expected a propose write");
        };
        assert_eq!(call.amount, U256::from(2_500_000u64));
        assert_eq!(call.token, token);
    }

    #[test]
    fn test_restarted_worker_releases_writes() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::NonceReady {
            owner: OWNER,
            nonce: 0,
        });
        let draft = app.workflow.draft_mut().unwrap();
        draft.recipient = "0x000000000000000000000000000000000000dEaD".into();
        draft.amount = "0.5".into();
        app.submit_form();
        app.confirm_proposal();
        app.approve(1);
        app.apply_runtime_event(RuntimeEvent::WriteSubmitted {
            kind: WriteKind::Propose,
            tx_hash: B256::repeat_byte(3),
        });
        app.take_commands();
        assert!(app.workflow.is_in_flight());

        app.abandon_writes();
        assert_eq!(app.workflow.state(), &WorkflowState::Editing);
        assert_eq!(app.workflow.draft().amount, "0.5");
        assert_eq!(app.action_in_flight, None);
        assert!(app.banner.as_ref().unwrap().text.contains("outcome unknown"));

        app.cancel(1);
        assert_eq!(app.take_commands().len(), 1);
        app.submit_form();
        assert!(matches!(app.workflow.state(), WorkflowState::Reviewing(_)));
    }

    #[test]
    fn test_abandon_without_writes_is_quiet() {
        let mut app = connected_app(true);
        app.abandon_writes();
        assert!(app.banner.is_none());
    }

    #[test]
    fn test_unanswered_decimals_are_requested_on_next_confirm() {
        let mut app = connected_app(true);
        app.apply_runtime_event(RuntimeEvent::NonceReady {
            owner: OWNER,
            nonce: 0,
        });
        let token = address!("6b175474e89094c44da98b954eedeac495271d0f");
        let draft = app.workflow.draft_mut().unwrap();
        draft.recipient = "0x000000000000000000000000000000000000dEaD".into();
        draft.token = TokenSelector::Custom;
        draft.custom_token = "0x6B175474E89094C44Da98b954EedeAC495271d0F".into();
        draft.amount = "1".into();
        app.submit_form();
        app.take_commands();

        app.apply_runtime_event(RuntimeEvent::DecimalsUnavailable { token });
        app.confirm_proposal();
        let commands = app.take_commands();
        assert!(matches!(
            commands.as_slice(),
            [RuntimeCommand::FetchDecimals { token: t }] if *t == token
        ));
        assert!(matches!(app.workflow.state(), WorkflowState::Reviewing(_)));
    }

    #[test]
    fn test_query_failure_clears_loading() {
        let mut app = connected_app(true);
        assert!(app.refetch(QueryKey::Nonce));
        assert!(app.queries.nonce.loading);
        app.apply_runtime_event(RuntimeEvent::QueryFailed {
            query: QueryKey::Nonce,
            message: "wallet disconnected".into(),
        });
        assert!(!app.queries.nonce.loading);
        assert_eq!(app.queries.nonce.error.as_deref(), Some("wallet disconnected"));
    }

    #[test]
    fn test_command_bar() {
        let mut app = connected_app(true);
        app.enter_command();
        app.command.input = "pending".into();
        app.apply_command(None);
        assert_eq!(app.panel, Panel::Pending);
        assert_eq!(app.input_mode, InputMode::Normal);

        app.enter_command();
        app.command.input = "tx 9".into();
        app.apply_command(None);
        assert_eq!(app.selected_id(), Some(9));

        app.enter_command();
        app.command.input = "bogus".into();
        app.apply_command(None);
        assert_eq!(app.status_text().unwrap().1, StatusLevel::Warn);
    }

    #[test]
    fn test_connect_without_env_key_prompts() {
        let settings = Settings::resolve(&Config::default(), &Overrides::default()).unwrap();
        let mut app = App::new(settings);
        app.begin_connect(None);
        assert_eq!(app.input_mode, InputMode::Prompt(PromptKind::PrivateKey));
        app.input_mode = InputMode::Prompt(PromptKind::WatchAddress);
        app.prompt_input = "0x00000000000000000000000000000000000000aa".into();
        app.apply_prompt(PromptKind::WatchAddress);
        assert_eq!(app.connection, Connection::Connecting);
        assert!(matches!(
            app.take_commands().as_slice(),
            [RuntimeCommand::Connect {
                wallet: WalletSource::WatchOnly(_)
            }]
        ));
    }
}
