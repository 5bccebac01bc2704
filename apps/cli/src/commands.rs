//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use nuru_core::{ChatClient, WidgetController, message_html, synthesize_greeting};
use nuru_discovery::ContextResolver;
use nuru_markdown::{render_markdown, render_plain};
use nuru_shared::{
    AppConfig, ResolverConfig, TransportConfig, expand_home, init_config, load_config,
};
use nuru_storage::{SessionManager, WidgetStore};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::info;
use url::Url;

use crate::surface::CliSurface;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Nuru, the LocalOS intake assistant, in your terminal.
#[derive(Parser)]
#[command(
    name = "nuru",
    version,
    about = "Chat with the Nuru intake assistant and inspect hand-off context.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start an interactive chat session.
    Chat {
        /// Page URL carrying a hand-off session, e.g. `https://site/#/chat?session=abc`.
        #[arg(long)]
        url: Option<String>,

        /// Chat backend base URL (overrides the config file).
        #[arg(long, env = "NURU_BACKEND_URL")]
        backend: Option<String>,

        /// Print message markup instead of plain text.
        #[arg(long)]
        html: bool,
    },

    /// Print the greeting a page URL would produce.
    Greet {
        /// Page URL carrying a hand-off session.
        #[arg(long)]
        url: Option<String>,

        /// Print rendered HTML instead of Markdown.
        #[arg(long)]
        html: bool,
    },

    /// Render Markdown from a file (or stdin) to HTML.
    Render {
        /// Input file. Reads stdin when omitted.
        file: Option<PathBuf>,

        /// Escape only, as for user-typed text.
        #[arg(long)]
        plain: bool,
    },

    /// Show the persisted session identifier.
    Session,

    /// Check the chat backend health endpoint.
    Health {
        /// Chat backend base URL (overrides the config file).
        #[arg(long, env = "NURU_BACKEND_URL")]
        backend: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so they never
/// interleave with chat output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nuru=warn",
        1 => "nuru=info",
        2 => "nuru=debug",
        _ => "nuru=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Chat { url, backend, html } => {
            cmd_chat(url.as_deref(), backend.as_deref(), html).await
        }
        Command::Greet { url, html } => cmd_greet(url.as_deref(), html).await,
        Command::Render { file, plain } => cmd_render(file, plain).await,
        Command::Session => cmd_session().await,
        Command::Health { backend } => cmd_health(backend.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

fn load_with_backend(backend: Option<&str>) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(backend) = backend {
        Url::parse(backend).map_err(|e| eyre!("invalid backend URL '{backend}': {e}"))?;
        config.backend.base_url = backend.to_string();
    }
    Ok(config)
}

fn parse_page_url(url: Option<&str>) -> Result<Option<Url>> {
    url.map(|u| Url::parse(u).map_err(|e| eyre!("invalid page URL '{u}': {e}")))
        .transpose()
}

async fn open_sessions(config: &AppConfig) -> SessionManager<WidgetStore> {
    let path = expand_home(&config.storage.path);
    SessionManager::new(WidgetStore::open_or_memory(&path).await)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_chat(url: Option<&str>, backend: Option<&str>, html: bool) -> Result<()> {
    let config = load_with_backend(backend)?;
    let page_url = parse_page_url(url)?;

    let sessions = open_sessions(&config).await;
    let resolver = ContextResolver::new(&ResolverConfig::from(&config))?;
    let transport = ChatClient::new(&TransportConfig::from(&config))?;

    info!(backend = %config.backend.base_url, "starting chat");

    let widget = WidgetController::start(
        &sessions,
        &resolver,
        page_url.as_ref(),
        transport,
        CliSurface::new(html),
    )
    .await;

    if let Some(resolved) = widget.context() {
        eprintln!(
            "  (context from {}: {})",
            resolved.source,
            resolved.context.kind()
        );
    }
    eprintln!("  Type a message and press Enter. /quit to leave.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.wrap_err("failed to read stdin")? {
        if matches!(line.trim(), "/quit" | "/exit") {
            break;
        }
        widget.send_message(&line).await;
    }

    Ok(())
}

async fn cmd_greet(url: Option<&str>, html: bool) -> Result<()> {
    let config = load_config()?;
    let page_url = parse_page_url(url)?;

    let resolved = match page_url {
        Some(page_url) => {
            let resolver = ContextResolver::new(&ResolverConfig::from(&config))?;
            resolver.resolve(&page_url).await
        }
        None => None,
    };

    if let Some(resolved) = &resolved {
        info!(source = %resolved.source, kind = resolved.context.kind(), "context resolved");
    }

    let greeting = synthesize_greeting(resolved.as_ref().map(|r| &r.context));
    if html {
        println!("{}", message_html(&nuru_shared::ChatMessage::assistant(greeting)));
    } else {
        println!("{greeting}");
    }
    Ok(())
}

async fn cmd_render(file: Option<PathBuf>, plain: bool) -> Result<()> {
    let input = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .wrap_err_with(|| format!("failed to read '{}'", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .wrap_err("failed to read stdin")?;
            buf
        }
    };

    let output = if plain {
        render_plain(&input)
    } else {
        render_markdown(&input)
    };
    println!("{output}");
    Ok(())
}

async fn cmd_session() -> Result<()> {
    let config = load_config()?;
    let sessions = open_sessions(&config).await;
    let id = sessions.session_id().await;

    println!();
    println!("  Session: {id}");
    if sessions.store().is_persistent() {
        println!("  Store:   {}", expand_home(&config.storage.path).display());
    } else {
        println!("  Store:   memory (not persisted)");
    }
    println!();
    Ok(())
}

async fn cmd_health(backend: Option<&str>) -> Result<()> {
    let config = load_with_backend(backend)?;
    let client = ChatClient::new(&TransportConfig::from(&config))?;

    let health = client.health().await?;
    println!("{}: {}", client.base_url(), health.status);

    if !health.is_healthy() {
        return Err(eyre!("backend reports status '{}'", health.status));
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_with_url() {
        let cli = Cli::try_parse_from([
            "nuru",
            "-vv",
            "chat",
            "--url",
            "https://localos.example/#/chat?session=abc",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Chat { url, html, .. } => {
                assert_eq!(url.as_deref(), Some("https://localos.example/#/chat?session=abc"));
                assert!(!html);
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn parses_render_from_stdin() {
        let cli = Cli::try_parse_from(["nuru", "render", "--plain"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Render { file: None, plain: true }
        ));
    }

    #[test]
    fn rejects_bad_page_url() {
        assert!(parse_page_url(Some("not a url")).is_err());
        assert!(parse_page_url(None).unwrap().is_none());
    }
}
