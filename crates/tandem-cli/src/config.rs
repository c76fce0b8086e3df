use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{Account, ContentKind};
use crate::pagination::View;

#[derive(Parser, Debug)]
#[command(name = "tandem", about = "Command-line client for the Tandem journal", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, env = "TANDEM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the journal service
    #[arg(long, env = "TANDEM_URL")]
    pub service_url: Option<String>,

    /// Directory for client state such as notification checkpoints
    #[arg(long, env = "TANDEM_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Who is acting. Checked against the configured passwords.
#[derive(Args, Debug, Clone)]
pub struct Login {
    #[arg(long = "as", env = "TANDEM_ACCOUNT")]
    pub account: Account,

    #[arg(long, env = "TANDEM_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show one page of a feed
    Feed {
        #[arg(long, default_value = "home")]
        view: View,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one item with its comments
    Show { kind: ContentKind, id: i64 },
    /// Search the journal
    Search {
        keyword: String,
        /// Limit the search to these types (repeatable)
        #[arg(long = "in")]
        scopes: Vec<ContentKind>,
    },
    /// Show which days have content, or what was posted on a day
    Calendar {
        /// Month as YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<YearMonth>,
        /// A single day as YYYY-MM-DD
        #[arg(long, conflicts_with = "month")]
        day: Option<NaiveDate>,
    },
    /// Publish a thought or an article
    Post {
        #[command(flatten)]
        login: Login,
        kind: ContentKind,
        #[arg(long)]
        title: Option<String>,
        content: String,
    },
    /// Replace the title and content of a post
    Edit {
        #[command(flatten)]
        login: Login,
        kind: ContentKind,
        id: i64,
        #[arg(long)]
        title: Option<String>,
        content: String,
    },
    /// Delete a post or an album together with its comments
    Delete {
        #[command(flatten)]
        login: Login,
        kind: ContentKind,
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Comment on a post or album
    Comment {
        #[command(flatten)]
        login: Login,
        kind: ContentKind,
        id: i64,
        content: String,
    },
    /// Manage photo albums
    #[command(subcommand)]
    Album(AlbumCommand),
    /// Show unread content from the other account
    Notifications {
        #[command(flatten)]
        login: Login,
        /// Open the panel, marking everything as seen
        #[arg(long)]
        open: bool,
        /// Keep polling and print the badge whenever it changes
        #[arg(long, conflicts_with = "open")]
        watch: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AlbumCommand {
    /// Upload photos as a new album
    Create {
        #[command(flatten)]
        login: Login,
        #[arg(long)]
        description: Option<String>,
        #[arg(required = true)]
        photos: Vec<PathBuf>,
    },
    /// Change an album's description
    Edit {
        #[command(flatten)]
        login: Login,
        id: i64,
        description: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid month '{s}', expected YYYY-MM");
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub notifications: NotificationConfig,
    pub credentials: Credentials,
    #[serde(skip)]
    pub state_dir: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub url: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub poll_interval_secs: u64,
}

/// The two shared passwords, one per account.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Credentials {
    pub male: String,
    pub female: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            male: "sr".to_string(),
            female: "nxz".to_string(),
        }
    }
}

impl Credentials {
    pub fn verify(&self, account: Account, password: &str) -> bool {
        let expected = match account {
            Account::Male => &self.male,
            Account::Female => &self.female,
        };
        !expected.is_empty() && expected == password
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let state_dir = Self::state_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| state_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else if cli.config.is_some() {
            anyhow::bail!("config file {} does not exist", config_path.display());
        } else {
            Config::default()
        };

        if let Some(ref url) = cli.service_url {
            config.service.url = url.clone();
        }
        config.state_dir = state_dir;

        Ok(config)
    }

    pub fn state_dir(cli: &Cli) -> PathBuf {
        cli.state_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tandem")
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.notifications.poll_interval_secs.max(1))
    }
}
