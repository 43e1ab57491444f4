use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info, warn};

use sigdash::app::{App, InputMode, Panel, PromptKind, StatusLevel};
use sigdash::config::{self, Overrides, Settings};
use sigdash::domain::proposal::WorkflowState;
use sigdash::domain::validate::parse_address;
use sigdash::infrastructure::ethereum::WalletSource;
use sigdash::infrastructure::runtime::{RuntimeBridge, RuntimeCommand, WorkerConfig};
use sigdash::ui::terminal::{draw_guarded, install_panic_hook};
use sigdash::{logging, ui};

#[derive(Debug, Parser)]
#[command(
    name = "sigdash",
    version,
    about = "Sigdash: a terminal dashboard for a single-signature multisig wallet"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. https://rpc.sepolia.org)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. wss://sepolia.example/ws)
    #[arg(long)]
    ws: Option<String>,

    /// Multisig contract address
    #[arg(long)]
    contract: Option<String>,

    /// Start a watch-only session for this address
    #[arg(long)]
    address: Option<String>,

    /// Environment variable holding the signer's private key
    #[arg(long)]
    key_env: Option<String>,

    /// Config file (defaults to ~/.config/sigdash/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            rpc: self.rpc.clone(),
            ws: self.ws.clone(),
            contract: self.contract.clone(),
            key_env: self.key_env.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = config::log_path();
    if let Err(err) = logging::init(log_path.as_deref()) {
        eprintln!("logging disabled: {err:#}");
    }

    let settings = load_settings(&args)?;
    let watch = match args.address.as_deref() {
        Some(value) => Some(
            parse_address(value)
                .ok_or_else(|| anyhow::anyhow!("Invalid --address: {value}"))?,
        ),
        None => None,
    };
    info!(
        contract = %settings.contract,
        endpoints = settings.endpoints.len(),
        "starting sigdash"
    );

    install_panic_hook();

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runtime = RuntimeBridge::new(worker_config(&settings, 0))?;

    let mut app = App::new(settings);
    if let Some(address) = watch {
        app.request_connect(WalletSource::WatchOnly(address));
    }

    let res = run_app(&mut terminal, app, runtime, &args);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %format!("{err:#}"), "exited with error");
        eprintln!("{err:?}");
    }

    Ok(())
}

fn load_settings(args: &Args) -> Result<Settings> {
    let config = config::load(args.config.as_deref());
    let mut settings = Settings::resolve(&config, &args.overrides())?;
    if let Some(path) = args.config.clone() {
        settings.config_path = Some(path);
    }
    Ok(settings)
}

fn worker_config(settings: &Settings, endpoint_index: usize) -> WorkerConfig {
    WorkerConfig {
        endpoints: settings.provider_configs(),
        endpoint_index,
        contract: settings.contract,
        refresh_delay: settings.refresh_delay,
        receipt_timeout: settings.receipt_timeout,
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut runtime: RuntimeBridge,
    args: &Args,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    let mut crash: Option<String> = None;

    loop {
        pump_background(&mut app, &runtime);

        if let Some(message) = crash.as_deref() {
            terminal.draw(|f| ui::draw_crash(f, message))?;
        } else {
            let mut panicked = None;
            terminal.draw(|f| {
                if let Err(message) = draw_guarded(|| ui::draw(f, &app)) {
                    panicked = Some(message);
                }
            })?;
            if let Some(message) = panicked {
                crash = Some(message);
                continue;
            }
        }

        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if crash.is_some() {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('r') => {
                                (app, runtime) = rebuild(app, runtime, args)?;
                                crash = None;
                            }
                            KeyCode::Char('q') => app.should_quit = true,
                            _ => {}
                        }
                    }
                } else if app.settings_open && key.code == KeyCode::Char('r') {
                    if key.kind == KeyEventKind::Press {
                        runtime = reload_config(&mut app, runtime, args)?;
                    }
                } else {
                    handle_key(&mut app, key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        pump_background(&mut app, &runtime);
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        app.apply_runtime_event(event);
    }
    for cmd in app.take_commands() {
        if let Err(err) = runtime.send(cmd) {
            warn!(error = %err, "dropping worker command");
            app.set_status(err.to_string(), StatusLevel::Error);
        }
    }
}

/// Fresh app and worker after a crash; the previous wallet is reconnected
fn rebuild(app: App, runtime: RuntimeBridge, args: &Args) -> Result<(App, RuntimeBridge)> {
    let wallet = app.wallet.clone();
    drop(runtime);

    let settings = load_settings(args).unwrap_or(app.settings);
    let runtime = RuntimeBridge::new(worker_config(&settings, 0))?;
    let mut app = App::new(settings);
    if let Some(wallet) = wallet {
        app.request_connect(wallet);
    }
    app.set_status("Reloaded after a rendering error", StatusLevel::Warn);
    Ok((app, runtime))
}

/// Re-read the config file. A changed endpoint list needs a new worker.
fn reload_config(app: &mut App, runtime: RuntimeBridge, args: &Args) -> Result<RuntimeBridge> {
    let settings = match load_settings(args) {
        Ok(settings) => settings,
        Err(err) => {
            app.set_status(format!("Config not reloaded: {err:#}"), StatusLevel::Error);
            return Ok(runtime);
        }
    };

    let endpoints_changed = settings.provider_configs() != app.settings.provider_configs()
        || settings.contract != app.settings.contract;
    app.apply_settings(settings);
    if !endpoints_changed {
        return Ok(runtime);
    }

    info!("endpoints changed, restarting worker");
    drop(runtime);
    app.abandon_writes();
    let runtime = RuntimeBridge::new(worker_config(&app.settings, app.endpoint_index))?;
    app.take_commands();
    if let Some(wallet) = app.wallet.clone() {
        app.request_connect(wallet);
    }
    Ok(runtime)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
            app.help_open = false;
        }
        return;
    }

    if app.settings_open {
        match key.code {
            KeyCode::Esc | KeyCode::Char('s') => app.settings_open = false,
            KeyCode::Char('[') => app.cycle_endpoint(false),
            KeyCode::Char(']') => app.cycle_endpoint(true),
            _ => {}
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
        InputMode::Prompt(kind) => handle_prompt_mode(app, key, kind),
    }
}

fn env_key(app: &App) -> Option<String> {
    std::env::var(&app.settings.key_env).ok()
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.should_quit = true;
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.help_open = true,
        KeyCode::Char('s') => app.settings_open = true,
        KeyCode::Char(':') => app.enter_command(),
        KeyCode::Char('c') => {
            let key = env_key(app);
            app.begin_connect(key);
        }
        KeyCode::Char('w') => app.enter_prompt(PromptKind::WatchAddress),
        KeyCode::Char('d') => app.disconnect(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('y') => handle_copy_to_clipboard(app),
        KeyCode::Esc => handle_escape(app),
        _ if !app.is_connected() => {}

        KeyCode::Char('1') => app.set_panel(Panel::Propose),
        KeyCode::Char('2') => app.set_panel(Panel::Pending),
        KeyCode::Char('3') => app.set_panel(Panel::History),
        KeyCode::Tab => app.cycle_panel(true),
        KeyCode::BackTab => app.cycle_panel(false),
        KeyCode::Char('j') | KeyCode::Down => app.move_selection(true),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(false),
        KeyCode::Char('a') => app.approve_selected(),
        KeyCode::Char('x') => app.cancel_selected(),
        KeyCode::Char('e') => app.start_editing(),
        KeyCode::Enter => handle_enter(app),
        _ => {}
    }
}

fn handle_enter(app: &mut App) {
    if app.panel != Panel::Propose {
        return;
    }
    match app.workflow.state() {
        WorkflowState::Reviewing(_) => app.confirm_proposal(),
        WorkflowState::Editing | WorkflowState::Settled { .. } => app.submit_form(),
        WorkflowState::Submitting(_) | WorkflowState::Confirming { .. } => {
            app.set_status("A proposal is already in flight", StatusLevel::Warn)
        }
    }
}

fn handle_escape(app: &mut App) {
    if app.dismiss_banner() {
        return;
    }
    if matches!(app.workflow.state(), WorkflowState::Reviewing(_)) {
        app.cancel_review();
        return;
    }
    app.inspected = None;
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.stop_editing(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => app.focus_field(true),
        KeyCode::BackTab | KeyCode::Up => app.focus_field(false),
        KeyCode::Left => app.cycle_token(false),
        KeyCode::Right => app.cycle_token(true),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.input_char(ch);
        }
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => {
            let key = env_key(app);
            app.apply_command(key);
        }
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn handle_prompt_mode(app: &mut App, key: KeyEvent, kind: PromptKind) {
    match key.code {
        KeyCode::Esc => app.exit_prompt(),
        KeyCode::Enter => app.apply_prompt(kind),
        KeyCode::Tab => {
            let next = match kind {
                PromptKind::PrivateKey => PromptKind::WatchAddress,
                PromptKind::WatchAddress => PromptKind::PrivateKey,
            };
            app.enter_prompt(next);
        }
        KeyCode::Backspace => {
            app.prompt_input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.prompt_input.push(ch);
        }
        _ => {}
    }
}

fn handle_copy_to_clipboard(app: &mut App) {
    use arboard::Clipboard;

    let Some(text) = app.explorer_link() else {
        app.set_status("Nothing to copy", StatusLevel::Warn);
        return;
    };

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(text.clone()).is_ok() {
                app.set_status(format!("Copied: {text}"), StatusLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", StatusLevel::Error);
            }
        }
        Err(_) => {
            app.set_status(format!("Clipboard not available: {text}"), StatusLevel::Error);
        }
    }
}
