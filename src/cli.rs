//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use clap::{Parser, Subcommand};
use url::Url;
use uuid::Uuid;

use crate::api::types::Priority;
use crate::config::{
    ClientConfig, DEFAULT_BACKEND_URL, DEFAULT_FRONTEND_URL, DEFAULT_TIMEOUT_SECS,
    fetch_remote_config,
};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug)]
#[command(name = "wishkeeper", about = "Command-line client for the wishlist service")]
pub struct Args {
    /// Backend base URL
    #[arg(long, env = "WISHKEEPER_BACKEND_URL", default_value = DEFAULT_BACKEND_URL, value_parser = parse_url)]
    pub backend_url: Url,

    /// Frontend base URL, embedded in password-reset emails
    #[arg(long, env = "WISHKEEPER_FRONTEND_URL", default_value = DEFAULT_FRONTEND_URL, value_parser = parse_url)]
    pub frontend_url: Url,

    /// URL of a remote config document overriding the URL pair
    #[arg(long, env = "WISHKEEPER_CONFIG_URL", value_parser = parse_url)]
    pub config_url: Option<Url>,

    /// Path to the token file
    #[arg(short, long, default_value = "wishkeeper-tokens.json")]
    pub token_file: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

fn parse_url(s: &str) -> Result<Url, String> {
    Url::parse(s).map_err(|e| format!("Invalid URL `{}`: {}", s, e))
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the issued tokens
    Login { email: String, password: String },
    /// Discard stored tokens
    Logout,
    /// Register a new account
    Signup { email: String, password: String },
    /// Show the current user profile
    Me,
    /// Request a password-reset email
    RequestReset { email: String },
    /// Complete a password reset with the emailed token
    ConfirmReset { token: String, password: String },
    /// Change the current password
    ChangePassword { old: String, new: String },
    /// Wishlist operations
    #[command(subcommand)]
    Wishlist(WishlistCommand),
    /// Item operations
    #[command(subcommand)]
    Item(ItemCommand),
}

#[derive(Subcommand, Debug)]
pub enum WishlistCommand {
    /// List your wishlists
    List,
    /// Create a wishlist
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show one wishlist with its items
    Show { id: Uuid },
    /// Rename a wishlist
    Rename { id: Uuid, name: String },
    /// Delete a wishlist
    Delete { id: Uuid },
    /// Mint a read-only share link
    Share { id: Uuid },
    /// Fetch a shared wishlist by slug (no login required)
    Shared { slug: String },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Add an item to a wishlist
    Add {
        wishlist: Uuid,
        name: String,
        #[arg(long)]
        link: Option<String>,
        #[arg(long, value_enum, default_value = "medium")]
        priority: Priority,
        /// Password-gate the item so viewers must unlock it
        #[arg(long)]
        password: Option<String>,
    },
    /// Update an item
    Update {
        wishlist: Uuid,
        item: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },
    /// Remove an item
    Remove { wishlist: Uuid, item: Uuid },
    /// Reveal a password-gated item
    Unlock {
        wishlist: Uuid,
        item: Uuid,
        password: String,
    },
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Resolve the client configuration: flags/env first, then the remote
/// config document when one is configured and reachable.
pub async fn resolve_config(args: &Args) -> ClientConfig {
    let mut config = ClientConfig::new(args.backend_url.clone(), args.frontend_url.clone())
        .with_timeout(Duration::from_secs(args.timeout));

    if let Some(config_url) = &args.config_url {
        if let Some(remote) = fetch_remote_config(config_url).await {
            config.apply_remote(&remote);
        }
    }

    config
}
