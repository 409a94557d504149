//! Chatstore CLI - inspect and initialise chat history databases

mod commands;

use chatstore::config::load_config;
use chatstore::{BackendRegistry, ChatStore, Route};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "chatstore")]
#[command(version)]
#[command(about = "Chat message history and per-user session state")]
#[command(long_about = r#"
Chatstore keeps conversation history and the latest session labels per user
behind a swappable storage backend.

Example usage:
  chatstore init --db ./data/chat_history.db
  chatstore append --user alice --role user --content "hello"
  chatstore history --user alice --limit 20
  chatstore session set --user alice --state calm --emotion relieved
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./chatstore.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use this sqlite file directly, bypassing registered providers
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Use a registered provider instead of the default
    #[arg(short, long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the messages and sessions tables
    Init,

    /// Append a message to a user's history
    Append {
        /// User (conversation) id
        #[arg(short, long)]
        user: String,

        /// Message role, usually "user" or "assistant"
        #[arg(short, long, default_value = "user")]
        role: String,

        /// Message text
        #[arg(short, long)]
        content: String,
    },

    /// Show a user's conversation, oldest first
    History {
        /// User (conversation) id
        #[arg(short, long)]
        user: String,

        /// Maximum number of messages
        #[arg(short, long, default_value_t = chatstore::storage::DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Read or replace a user's session labels
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// List registered providers
    Providers {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write a starter config file
    Config {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Show the stored labels
    Show {
        #[arg(short, long)]
        user: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Replace all labels; omitted ones are cleared
    Set {
        #[arg(short, long)]
        user: String,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        incident_type: Option<String>,

        #[arg(long)]
        emotion: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Commands::Config { force } = cli.command {
        return commands::run_write_config(cli.config.as_deref(), force);
    }

    let loaded = load_config(cli.config.as_deref())?;
    let owned;
    let registry: &BackendRegistry = match loaded {
        Some(config) => {
            tracing::debug!("Loaded config with {} extra providers", config.providers.len());
            owned = BackendRegistry::from_config(&config)?;
            &owned
        }
        None => BackendRegistry::global()?,
    };

    let store = ChatStore::new(registry);
    let route = Route {
        path: cli.db,
        name: cli.provider,
    };

    match cli.command {
        Commands::Init => commands::run_init(&store, &route),
        Commands::Append { user, role, content } => commands::run_append(&store, &route, &user, &role, &content),
        Commands::History { user, limit, format } => commands::run_history(&store, &route, &user, limit, format),
        Commands::Session { action } => match action {
            SessionCommand::Show { user, format } => commands::run_session_show(&store, &route, &user, format),
            SessionCommand::Set {
                user,
                state,
                incident_type,
                emotion,
            } => {
                let labels = chatstore::SessionLabels {
                    state,
                    incident_type,
                    emotion,
                };
                commands::run_session_set(&store, &route, &user, &labels)
            }
        },
        Commands::Providers { format } => commands::run_providers(registry, format),
        Commands::Config { .. } => Ok(()),
    }
}
