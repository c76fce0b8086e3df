use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "tandem-service")]
#[command(about = "Journal service for two accounts: posts, comments and photo albums")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "DATABASE_URL", default_value = "tandem.db")]
    pub database_url: String,

    /// Address to listen on
    #[arg(long, env = "TANDEM_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Directory holding uploaded photos
    #[arg(long, env = "TANDEM_UPLOADS", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub request_timeout_secs: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Check the database and upload directory, then exit
    Check,
}

impl Cli {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
