//! Nuru TUI: the chat widget as a full-screen terminal app.
//!
//! Chat with the assistant on one tab and inspect the session and hand-off
//! context on another, built with `ratatui` + `crossterm`.

mod app;
mod screens;
mod widgets;

use clap::Parser;
use color_eyre::eyre::Result;
use nuru_shared::config_dir;
use tracing_appender::non_blocking::WorkerGuard;

/// Command-line options for the TUI.
#[derive(Parser)]
#[command(name = "nuru-tui", version, about = "Terminal chat widget for Nuru.")]
pub(crate) struct Args {
    /// Page URL carrying a hand-off session, e.g. `https://site/#/chat?session=abc`.
    #[arg(long)]
    pub url: Option<String>,

    /// Chat backend base URL (overrides the config file).
    #[arg(long, env = "NURU_BACKEND_URL")]
    pub backend: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let _guard = init_tracing()?;
    app::run(args)
}

/// Log to `~/.nuru/nuru-tui.log`; the terminal belongs to the UI.
fn init_tracing() -> Result<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt};

    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        &dir,
        "nuru-tui.log",
    ));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nuru=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
