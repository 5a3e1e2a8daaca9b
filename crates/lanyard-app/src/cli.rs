use std::path::PathBuf;

use clap::Parser;

/// Lanyard: live presence of a single user in your terminal.
#[derive(Parser, Debug)]
#[command(name = "lanyard", version, about)]
pub struct Args {
    /// User id to watch (17-20 digits).
    pub subject: String,

    /// Skip the WebSocket gateway and poll the REST API only.
    #[arg(long)]
    pub no_socket: bool,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error) or a full filter directive.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the first settled state and exit.
    #[arg(long)]
    pub once: bool,

    /// Emit JSON instead of the terminal card.
    #[arg(long)]
    pub json: bool,

    /// Show connection diagnostics under the card.
    #[arg(long)]
    pub diagnostics: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
