//! Core TUI application state and event loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, eyre};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use nuru_core::{ChatClient, IgnoredReason, SendOutcome, TranscriptSurface, WidgetController};
use nuru_discovery::ContextResolver;
use nuru_shared::{ResolverConfig, TransportConfig, expand_home, load_config};
use nuru_storage::{SessionManager, WidgetStore};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::info;
use url::Url;

use crate::Args;
use crate::screens::{Action, ChatScreen, ContextScreen, ScreenId, Screens};
use crate::widgets::status_bar;

type Widget = WidgetController<Arc<TranscriptSurface>>;

/// Application state.
pub(crate) struct App {
    /// Currently active screen tab.
    pub active_tab: usize,
    /// Available screens.
    pub tabs: Vec<ScreenId>,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
    /// Per-screen state.
    pub screens: Screens,
    widget: Arc<Widget>,
    runtime: Handle,
    outcome_tx: UnboundedSender<SendOutcome>,
    outcome_rx: UnboundedReceiver<SendOutcome>,
}

impl App {
    fn new(widget: Arc<Widget>, runtime: Handle) -> Self {
        let screens = Screens {
            chat: ChatScreen::new(Arc::clone(widget.surface())),
            context: ContextScreen::new(
                widget.session_id().as_str(),
                widget.transport().base_url(),
                widget.context(),
            ),
        };
        let (outcome_tx, outcome_rx) = unbounded_channel();

        Self {
            active_tab: 0,
            tabs: vec![ScreenId::Chat, ScreenId::Context],
            should_quit: false,
            status: "Ready, press Esc then ? for help".to_string(),
            show_help: false,
            screens,
            widget,
            runtime,
            outcome_tx,
            outcome_rx,
        }
    }

    fn current(&self) -> ScreenId {
        self.tabs[self.active_tab]
    }

    fn is_editing(&self) -> bool {
        self.screens.is_editing(self.current())
    }

    /// Hand the message to the controller on the runtime. The controller
    /// ignores it if a reply is still pending.
    fn send(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        if self.widget.is_pending() {
            self.status = "Still waiting for the last reply".to_string();
            return;
        }

        let widget = Arc::clone(&self.widget);
        let tx = self.outcome_tx.clone();
        self.status = "Sending...".to_string();
        self.runtime.spawn(async move {
            let outcome = widget.send_message(&text).await;
            // The receiver only goes away when the app is quitting.
            let _ = tx.send(outcome);
        });
    }

    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.status = match outcome {
                SendOutcome::Replied => "Reply received".to_string(),
                SendOutcome::Apologized => "Backend unavailable, see log for details".to_string(),
                SendOutcome::Ignored(IgnoredReason::Pending) => {
                    "Still waiting for the last reply".to_string()
                }
                SendOutcome::Ignored(IgnoredReason::Blank) => continue,
            };
        }
    }
}

/// Entry point: starts the widget, sets up terminal, runs event loop,
/// restores terminal.
pub(crate) fn run(args: Args) -> Result<()> {
    let runtime = Runtime::new()?;
    let widget = runtime.block_on(start_widget(&args))?;

    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, App::new(widget, runtime.handle().clone()));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn start_widget(args: &Args) -> Result<Arc<Widget>> {
    let mut config = load_config()?;
    if let Some(backend) = &args.backend {
        Url::parse(backend).map_err(|e| eyre!("invalid backend URL '{backend}': {e}"))?;
        config.backend.base_url = backend.clone();
    }

    let page_url = args
        .url
        .as_deref()
        .map(|u| Url::parse(u).map_err(|e| eyre!("invalid page URL '{u}': {e}")))
        .transpose()?;

    let store = WidgetStore::open_or_memory(&expand_home(&config.storage.path)).await;
    let sessions = SessionManager::new(store);
    let resolver = ContextResolver::new(&ResolverConfig::from(&config))?;
    let transport = ChatClient::new(&TransportConfig::from(&config))?;

    let widget = WidgetController::start(
        &sessions,
        &resolver,
        page_url.as_ref(),
        transport,
        Arc::new(TranscriptSurface::new()),
    )
    .await;

    info!(session_id = %widget.session_id(), "tui started");
    Ok(Arc::new(widget))
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        app.drain_outcomes();
        app.screens.chat.tick();
        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key.code, key.modifiers);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // Global keybindings (always active)
    match code {
        KeyCode::Char('q') | KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('q') if !app.is_editing() => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('?') if !app.is_editing() => {
            app.show_help = !app.show_help;
            return;
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            return;
        }
        KeyCode::Char(c @ '1'..='2') if !app.is_editing() => {
            let idx = (c as usize) - ('1' as usize);
            if idx < app.tabs.len() {
                app.active_tab = idx;
                app.status = format!("{}", app.tabs[idx]);
            }
            return;
        }
        KeyCode::Tab if !app.is_editing() => {
            app.active_tab = (app.active_tab + 1) % app.tabs.len();
            app.status = format!("{}", app.tabs[app.active_tab]);
            return;
        }
        KeyCode::BackTab if !app.is_editing() => {
            app.active_tab = if app.active_tab == 0 {
                app.tabs.len() - 1
            } else {
                app.active_tab - 1
            };
            app.status = format!("{}", app.tabs[app.active_tab]);
            return;
        }
        _ => {}
    }

    // If help is showing, consume any key to dismiss
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Delegate to current screen
    let current = app.current();
    if let Action::Send(text) = app.screens.handle_key(current, code, modifiers) {
        app.send(text);
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    // Tab bar
    let tab_titles: Vec<Line> = app.tabs.iter().map(|s| Line::from(format!("{s}"))).collect();

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" Nuru "))
        .select(app.active_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider(" │ ");

    f.render_widget(tabs, chunks[0]);

    // Content area, delegated to the screen
    app.screens.draw(app.current(), f, chunks[1]);

    // Status bar
    let bar = status_bar(&app.status, app.widget.is_pending());
    f.render_widget(bar, chunks[2]);

    // Help overlay
    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-2          Switch to screen"),
        Line::from("  Tab/S-Tab    Next/previous screen"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Chat:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  i / Enter    Start typing"),
        Line::from("  Enter        Send (while typing)"),
        Line::from("  Esc          Stop typing"),
        Line::from("  ↑/↓          Scroll the log"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help, press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
