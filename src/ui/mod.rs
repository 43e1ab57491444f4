use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;
pub mod terminal;

use crate::app::{App, Connection, InputMode, Panel, PromptKind, StatusLevel};
use crate::config;
use crate::domain::contract::TxState;
use crate::domain::decoder::{short_addr, NormalizedTransaction};
use crate::domain::proposal::{StagedProposal, TokenSelector, WorkflowState};
use crate::error::{DecodeError, Field};

use layout::centered_rect;

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.size();
    let areas = layout::areas(size, app.banner.is_some());

    draw_header(f, areas.header, app);
    if app.banner.is_some() {
        draw_banner(f, areas.banner, app);
    }

    if app.is_connected() {
        draw_sidebar(f, areas.sidebar, app);
        match app.panel {
            Panel::Propose => {
                draw_proposal_panel(f, areas.main, app);
                draw_proposal_side(f, areas.details, app);
            }
            Panel::Pending | Panel::History => {
                draw_list_panel(f, areas.main, app);
                draw_detail_panel(f, areas.details, app);
            }
        }
    } else {
        let gate = Rect {
            x: areas.sidebar.x,
            y: areas.sidebar.y,
            width: areas.size.width,
            height: areas.sidebar.height,
        };
        draw_connect_gate(f, gate, app);
    }

    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size, app);
    }
    if app.settings_open {
        draw_settings_popup(f, areas.size, app);
    }
}

/// Fallback screen after a panic while drawing
pub fn draw_crash(f: &mut Frame, message: &str) {
    let area = centered_rect(70, 40, f.size());
    f.render_widget(Clear, area);
    let lines = vec![
        Line::from(Span::styled(
            "Something went wrong while rendering",
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(" reload   "),
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw(" quit"),
        ]),
    ];
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title("Error")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::DarkGray))
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let endpoint = app
        .settings
        .endpoints
        .get(app.endpoint_index)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| "--".to_string());
    let (account, mode) = match &app.connection {
        Connection::Disconnected => ("--".to_string(), "disconnected"),
        Connection::Connecting => ("--".to_string(), "connecting"),
        Connection::Connected {
            account, can_sign, ..
        } => (
            short_addr(&format!("{account:#x}")),
            if *can_sign { "signer" } else { "watch-only" },
        ),
    };

    let title = Line::from(vec![
        Span::styled(
            "Sigdash",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        label("RPC"),
        Span::raw(format!(" {endpoint} ")),
        label("Account"),
        Span::raw(format!(" {account} ")),
        label("Mode"),
        Span::raw(format!(" {mode}")),
    ]);
    let left = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let nonce = match (&app.queries.nonce.data, app.queries.nonce.loading) {
        (Some(nonce), _) => nonce.to_string(),
        (None, true) => "…".to_string(),
        (None, false) => "--".to_string(),
    };
    let chain = match &app.connection {
        Connection::Connected { chain_id, .. } => chain_id.to_string(),
        _ => "--".to_string(),
    };
    let right_line = Line::from(vec![
        label("Contract "),
        Span::raw(format!("{}  ", short_addr(&format!("{:#x}", app.settings.contract)))),
        label("Chain "),
        Span::raw(format!("{chain}  ")),
        label("Nonce "),
        Span::raw(nonce),
    ]);
    let right = Paragraph::new(right_line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn level_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => Color::LightCyan,
        StatusLevel::Success => Color::LightGreen,
        StatusLevel::Warn => Color::LightYellow,
        StatusLevel::Error => Color::LightRed,
    }
}

fn draw_banner(f: &mut Frame, area: Rect, app: &App) {
    let Some(banner) = app.banner.as_ref() else {
        return;
    };
    let color = level_color(banner.level);
    let mut spans = vec![Span::styled(
        banner.text.clone(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(hint) = banner.hint {
        spans.push(Span::raw("  "));
        spans.push(label(hint));
    }
    let paragraph = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Esc to dismiss")
                .border_style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_connect_gate(f: &mut Frame, area: Rect, app: &App) {
    let status = match app.connection {
        Connection::Connecting => Line::from(Span::styled(
            "Connecting…",
            Style::default().fg(Color::LightYellow),
        )),
        _ => Line::from(Span::styled(
            "No wallet connected",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let key = |k: &'static str, text: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {k:<3}"), Style::default().fg(Color::Yellow)),
            Span::raw(text),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "Single-signature multisig dashboard",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        status,
        Line::from(""),
        key("c", "Connect with a private key"),
        key("w", "Watch an address (read-only)"),
        key("s", "Settings and RPC endpoints"),
        key("?", "Help"),
        key("q", "Quit"),
        Line::from(""),
    ];
    lines.push(Line::from(vec![
        label("Key variable "),
        Span::raw(app.settings.key_env.clone()),
    ]));
    lines.push(Line::from(vec![
        label("Contract "),
        Span::raw(format!("{:#x}", app.settings.contract)),
    ]));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Connect"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = Panel::ALL
        .iter()
        .map(|panel| {
            let count = match panel {
                Panel::Propose => String::new(),
                Panel::Pending => count_suffix(app.queries.pending.data.as_ref().map(Vec::len)),
                Panel::History => count_suffix(app.queries.history.data.as_ref().map(Vec::len)),
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", panel.shortcut()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(panel.title()),
                Span::styled(count, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let selected = Panel::ALL.iter().position(|p| *p == app.panel);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Panels"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(selected);
    f.render_stateful_widget(list, area, &mut state);
}

fn count_suffix(count: Option<usize>) -> String {
    count.map(|n| format!(" ({n})")).unwrap_or_default()
}

fn draw_proposal_panel(f: &mut Frame, area: Rect, app: &App) {
    let editing = app.input_mode == InputMode::Editing;
    let border_style = if editing {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let state = app.workflow.state();
    let title = format!("Propose · {}", state.name());

    let lines = match state {
        WorkflowState::Editing | WorkflowState::Settled { .. } => form_lines(app, editing),
        WorkflowState::Reviewing(staged) => {
            let mut lines = review_lines(staged);
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Enter", Style::default().fg(Color::Yellow)),
                Span::raw(" confirm and sign   "),
                Span::styled("Esc", Style::default().fg(Color::Yellow)),
                Span::raw(" back to editing"),
            ]));
            if let Some(err) = app.workflow.last_error() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("Last attempt failed: {err}"),
                    Style::default().fg(Color::LightRed),
                )));
            }
            lines
        }
        WorkflowState::Submitting(staged) => {
            let mut lines = review_lines(staged);
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Waiting for the wallet to sign and send…",
                Style::default().fg(Color::LightYellow),
            )));
            lines
        }
        WorkflowState::Confirming { staged, tx_hash } => {
            let mut lines = review_lines(staged);
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                label("Tx hash "),
                Span::raw(format!("{tx_hash:#x}")),
            ]));
            lines.push(Line::from(Span::styled(
                "Waiting for the receipt…",
                Style::default().fg(Color::LightYellow),
            )));
            lines
        }
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn form_lines(app: &App, editing: bool) -> Vec<Line<'static>> {
    let draft = app.workflow.draft();
    let mut lines = Vec::new();

    for field in app.visible_fields() {
        let focused = editing && app.form_field == field;
        let marker = if focused { ">> " } else { "   " };
        let value = match field {
            Field::Recipient => draft.recipient.clone(),
            Field::Token => token_choice(&draft.token),
            Field::CustomToken => draft.custom_token.clone(),
            Field::Amount => draft.amount.clone(),
        };
        let value_style = if focused {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if focused && field != Field::Token { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{:<14}", field.label()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(format!("{value}{cursor}"), value_style),
        ]));
        if let Some(err) = app.workflow.field_error(field) {
            lines.push(Line::from(Span::styled(
                format!("                 {}", err.message),
                Style::default().fg(Color::LightRed),
            )));
        }
    }

    lines.push(Line::from(""));
    if editing {
        lines.push(Line::from(label(
            "Tab next field · ←/→ token · Enter review · Esc stop editing",
        )));
    } else {
        lines.push(Line::from(label("e edit · Enter review")));
    }
    lines
}

fn token_choice(token: &TokenSelector) -> String {
    format!("< {} >", token.label())
}

/// Staged values exactly as typed, plus the nonce captured at staging
fn review_lines(staged: &StagedProposal) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "Review proposal",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            label("Recipient  "),
            Span::raw(staged.draft.recipient.trim().to_string()),
        ]),
        Line::from(vec![label("Token      "), Span::raw(staged.token_label.clone())]),
        Line::from(vec![
            label("Amount     "),
            Span::raw(staged.draft.amount.trim().to_string()),
        ]),
        Line::from(vec![label("Nonce      "), Span::raw(staged.nonce.to_string())]),
    ]
}

fn draw_proposal_side(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(vec![
            label("Nonce "),
            Span::raw(
                app.queries
                    .current_nonce()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "--".to_string()),
            ),
        ]),
        Line::from(vec![
            label("Pending "),
            Span::raw(
                app.queries
                    .pending
                    .data
                    .as_ref()
                    .map(|ids| ids.len().to_string())
                    .unwrap_or_else(|| "--".to_string()),
            ),
        ]),
        Line::from(""),
    ];

    if let Some(write) = app.last_write.as_ref() {
        lines.push(Line::from(Span::styled(
            "Last write",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![label("Action "), Span::raw(write.kind.label())]));
        lines.push(Line::from(vec![
            label("Hash "),
            Span::raw(format!("{:#x}", write.tx_hash)),
        ]));
        let status = if write.confirmed {
            Span::styled("confirmed", Style::default().fg(Color::LightGreen))
        } else {
            Span::styled("waiting for receipt", Style::default().fg(Color::LightYellow))
        };
        lines.push(Line::from(vec![label("Status "), status]));
        if let Some(block) = write.block_number {
            lines.push(Line::from(vec![label("Block "), Span::raw(block.to_string())]));
        }
        if let Some(link) = app.explorer_link() {
            lines.push(Line::from(vec![label("Explorer "), Span::raw(link)]));
            lines.push(Line::from(label("y to copy the link")));
        }
    } else {
        lines.push(Line::from(label("No writes sent in this session")));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Activity"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_list_panel(f: &mut Frame, area: Rect, app: &App) {
    let (ids, selected, query_loading, query_error) = match app.panel {
        Panel::Pending => (
            app.pending_ids(),
            app.selected_pending,
            app.queries.pending.loading,
            app.queries.pending.error.clone(),
        ),
        _ => (
            app.history_ids(),
            app.selected_history,
            app.queries.history.loading,
            app.queries.history.error.clone(),
        ),
    };

    let mut title = format!("{} ({})", app.panel.title(), ids.len());
    if query_loading {
        title.push_str(" · loading…");
    }

    let items: Vec<ListItem> = if let Some(err) = query_error.filter(|_| ids.is_empty()) {
        vec![ListItem::new(Line::from(Span::styled(
            format!("Failed to load: {err}"),
            Style::default().fg(Color::LightRed),
        )))]
    } else if ids.is_empty() && !query_loading {
        vec![ListItem::new(Line::from(label("No transactions")))]
    } else {
        ids.iter().map(|id| tx_item(app, *id)).collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    if !ids.is_empty() {
        state.select(Some(selected.min(ids.len() - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn tx_item(app: &App, id: u64) -> ListItem<'static> {
    let mut spans = vec![Span::styled(
        format!("#{id:<5}"),
        Style::default().fg(Color::DarkGray),
    )];
    match app.transaction(id) {
        Some(Ok(tx)) => {
            spans.push(Span::raw(format!("{:<22}", tx.amount)));
            spans.push(Span::raw(format!(" → {}", short_addr(&format!("{:#x}", tx.to)))));
            spans.push(Span::raw("  "));
            spans.push(state_span(tx.state));
        }
        Some(Err(err)) => spans.push(Span::styled(
            err.to_string(),
            Style::default().fg(Color::LightRed),
        )),
        None => spans.push(label("loading…")),
    }
    if app.is_action_pending(id) {
        spans.push(Span::styled(
            "  ⟳ in flight",
            Style::default().fg(Color::LightYellow),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn state_span(state: TxState) -> Span<'static> {
    let color = match state {
        TxState::Pending => Color::LightYellow,
        TxState::Approved => Color::LightGreen,
        TxState::Cancelled => Color::DarkGray,
    };
    Span::styled(state.label(), Style::default().fg(color))
}

fn draw_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines = match app.selected_id() {
        None => vec![Line::from(label("Select a transaction"))],
        Some(id) => match app.transaction(id) {
            None => {
                let failed = app
                    .queries
                    .details
                    .get(&id)
                    .and_then(|query| query.error.clone());
                match failed {
                    Some(err) => vec![Line::from(Span::styled(
                        format!("Failed to load #{id}: {err}"),
                        Style::default().fg(Color::LightRed),
                    ))],
                    None => vec![Line::from(label("Loading…"))],
                }
            }
            Some(Ok(tx)) => tx_detail_lines(app, &tx),
            Some(Err(err)) => decode_error_lines(id, &err),
        },
    };

    let title = app
        .selected_id()
        .map(|id| format!("Transaction #{id}"))
        .unwrap_or_else(|| "Details".to_string());
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn tx_detail_lines(app: &App, tx: &NormalizedTransaction) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![label("State      "), state_span(tx.state)]),
        Line::from(vec![label("Amount     "), Span::raw(tx.amount.clone())]),
        Line::from(vec![label("Token      "), Span::raw(tx.token_name.clone())]),
        Line::from(vec![label("To         "), Span::raw(format!("{:#x}", tx.to))]),
        Line::from(vec![label("Owner      "), Span::raw(format!("{:#x}", tx.owner))]),
        Line::from(vec![label("Nonce      "), Span::raw(tx.nonce.to_string())]),
        Line::from(vec![label("Proposed   "), Span::raw(format_timestamp(tx.timestamp_ms))]),
    ];
    if !tx.is_native() {
        lines.push(Line::from(vec![
            label("Token addr "),
            Span::raw(format!("{:#x}", tx.token)),
        ]));
    }
    lines.push(Line::from(vec![
        label("Raw amount "),
        Span::raw(tx.raw_amount.to_string()),
    ]));
    lines.push(Line::from(""));

    if app.is_action_pending(tx.id) {
        lines.push(Line::from(Span::styled(
            "Action in flight, waiting for receipt…",
            Style::default().fg(Color::LightYellow),
        )));
    } else if tx.state == TxState::Pending {
        let hint = if app.can_sign() {
            "a approve · x cancel"
        } else {
            "watch-only: approve and cancel need a signer"
        };
        lines.push(Line::from(label(hint)));
    }
    lines
}

fn decode_error_lines(id: u64, err: &DecodeError) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("Transaction #{id} could not be decoded"),
            Style::default().fg(Color::LightRed),
        )),
        Line::from(err.to_string()),
    ]
}

fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "--".to_string())
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        label("Panel "),
        Span::raw(format!("{}  ", app.panel.title())),
        label("Proposal "),
        Span::raw(format!("{}  ", app.workflow.state().name())),
    ];
    if let Some(kind) = app.action_in_flight {
        spans.push(label("In flight "));
        spans.push(Span::raw(format!("{}  ", kind.label())));
    }
    if !app.settings.tokens.is_empty() {
        spans.push(label("Tokens "));
        spans.push(Span::raw(app.settings.tokens.len().to_string()));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("propose", "Open the proposal form"),
        ("pending", "Show pending transactions"),
        ("history", "Show your transaction history"),
        ("tx", "tx <id>: show one transaction"),
        ("approve", "approve <id>: approve and execute"),
        ("cancel", "cancel <id>: cancel a pending transaction"),
        ("refresh", "Refetch nonce, lists and details"),
        ("connect", "Connect with a private key"),
        ("watch", "watch <address>: read-only session"),
        ("disconnect", "Drop the wallet connection"),
        ("endpoint", "endpoint [index]: switch RPC endpoint"),
        ("help", "Show help"),
        ("quit", "Quit"),
    ];

    for (cmd, desc) in commands {
        if cmd.starts_with(&input) {
            return Some(desc);
        }
    }
    None
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint_text = command_hint(&app.command.input).unwrap_or("propose | pending | tx <id> | approve <id>");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.clone()),
                Span::styled(
                    format!("  {hint_text}"),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Prompt(PromptKind::PrivateKey) => Line::from(vec![
            Span::styled("> key ", Style::default().fg(Color::LightCyan)),
            Span::raw("*".repeat(app.prompt_input.chars().count())),
            Span::styled(
                "  (Tab=watch address instead, Enter=ok Esc=cancel)",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        InputMode::Prompt(PromptKind::WatchAddress) => Line::from(vec![
            Span::styled("> watch ", Style::default().fg(Color::LightCyan)),
            Span::raw(app.prompt_input.clone()),
            Span::styled(
                "  (Tab=private key instead, Enter=ok Esc=cancel)",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        InputMode::Normal | InputMode::Editing => {
            if let Some((text, level)) = app.status_text() {
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text.to_string(), Style::default().fg(level_color(level))),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let hints: &[(&str, &str)] = if !app.is_connected() {
        &[("c", "connect"), ("w", "watch"), ("s", "settings"), ("?", "help"), ("q", "quit")]
    } else if app.input_mode == InputMode::Editing {
        &[("Tab", "field"), ("←/→", "token"), ("Enter", "review"), ("Esc", "done")]
    } else {
        match app.panel {
            Panel::Propose => &[
                ("e", "edit"),
                ("Enter", "review/confirm"),
                ("1-3", "panels"),
                (":", "command"),
                ("r", "refresh"),
                ("?", "help"),
            ],
            Panel::Pending | Panel::History => &[
                ("j/k", "select"),
                ("a", "approve"),
                ("x", "cancel"),
                ("1-3", "panels"),
                (":", "command"),
                ("r", "refresh"),
            ],
        }
    };

    let mut spans = Vec::new();
    for (key, text) in hints {
        spans.push(Span::styled(key.to_string(), Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(
            format!(" {text}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect(72, 64, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  1 / 2 / 3  Propose / Pending / History"),
        Line::from("  Tab        Next panel"),
        Line::from("  j / k      Move selection (vim)"),
        Line::from("  Esc        Back / dismiss error"),
        Line::from(""),
        Line::from("Proposal"),
        Line::from("  e          Edit the form"),
        Line::from("  Tab        Next field (editing)"),
        Line::from("  ← / →      Cycle token (editing)"),
        Line::from("  Enter      Review, then confirm"),
        Line::from(""),
        Line::from("Transactions"),
        Line::from("  a          Approve selected"),
        Line::from("  x          Cancel selected"),
        Line::from("  y          Copy explorer link of last write"),
        Line::from("  r          Refresh"),
        Line::from(""),
        Line::from("Wallet"),
        Line::from("  c          Connect (key from environment or prompt)"),
        Line::from("  w          Watch an address"),
        Line::from("  d          Disconnect"),
        Line::from("  s          Settings"),
        Line::from(""),
        Line::from("Commands"),
        Line::from("  :tx 4  :approve 4  :cancel 4  :watch 0x..  :endpoint 1"),
        Line::from(""),
        Line::from(format!("Active panel: {}", app.panel.title())),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn draw_settings_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect(76, 70, area);
    f.render_widget(Clear, popup_area);

    let config_path = app
        .settings
        .config_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());
    let log_path = config::log_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(disabled)".to_string());

    let mut lines = vec![
        Line::from(vec![label("Config   "), Span::raw(config_path)]),
        Line::from(vec![label("Log      "), Span::raw(log_path)]),
        Line::from(vec![
            label("Contract "),
            Span::raw(format!("{:#x}", app.settings.contract)),
        ]),
        Line::from(vec![
            label("Chain id "),
            Span::raw(app.settings.chain_id.to_string()),
        ]),
        Line::from(vec![
            label("Explorer "),
            Span::raw(app.settings.explorer_url.clone()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "RPC endpoints",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    if app.settings.endpoints.is_empty() {
        lines.push(Line::from(label("  (none)")));
    }
    for (index, endpoint) in app.settings.endpoints.iter().enumerate() {
        let active = index == app.endpoint_index;
        let marker = if active { "* " } else { "  " };
        let style = if active {
            Style::default().fg(Color::LightGreen)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{index} {}", endpoint.name), style),
            Span::styled(
                format!("  {}", endpoint.provider.display()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tokens",
        Style::default()
            .fg(Color::LightCyan)
            .add_modifier(Modifier::BOLD),
    )));
    if app.settings.tokens.is_empty() {
        lines.push(Line::from(label("  (none configured)")));
    }
    for token in &app.settings.tokens {
        lines.push(Line::from(vec![
            Span::raw(format!("  {:<8}", token.symbol)),
            Span::styled(
                format!("{}  decimals {}", token_address(token.address), decimals_text(app, token.address)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(label("r reload config · [ / ] switch RPC · Esc close")));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Settings").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

fn token_address(address: Address) -> String {
    short_addr(&format!("{address:#x}"))
}

fn decimals_text(app: &App, token: Address) -> String {
    if app.tokens.is_resolved(token) {
        app.tokens.decimals(token).to_string()
    } else {
        "?".to_string()
    }
}
