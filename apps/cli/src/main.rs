//! Nuru CLI: chat with the LocalOS intake assistant from a terminal.
//!
//! Resolves hand-off context from a page URL, greets accordingly, and relays
//! messages to the chat backend.

mod commands;
mod surface;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
