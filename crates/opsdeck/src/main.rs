// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opsdeck - operator console CLI.
//!
//! This is the binary entry point: account registration and login, the
//! one-shot legacy user import, and the interactive analysis chat.

mod account;
mod chat;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use opsdeck_config::OpsdeckConfig;
use opsdeck_core::OpsdeckError;
use opsdeck_storage::Store;

/// Opsdeck - a multi-tenant operator console.
#[derive(Parser, Debug)]
#[command(name = "opsdeck", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the database and apply pending migrations.
    Init,
    /// Register a new user (prompts for a password).
    Register {
        username: String,
        /// Role stored with the account; defaults to "user".
        #[arg(long)]
        role: Option<String>,
    },
    /// Verify a user's credentials (prompts for a password).
    Login { username: String },
    /// Import users from a legacy `username,password_hash` flat file.
    Import { path: PathBuf },
    /// Launch the interactive analysis chat.
    Chat {
        /// Authenticate as this user before starting the chat.
        #[arg(long = "as")]
        login_as: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match opsdeck_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            opsdeck_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.console.log_level);

    let result = match cli.command {
        Some(Commands::Init) => run_init(&config).await,
        Some(Commands::Register { username, role }) => {
            account::run_register(&config, &username, role.as_deref()).await
        }
        Some(Commands::Login { username }) => account::run_login(&config, &username).await,
        Some(Commands::Import { path }) => run_import(&config, &path).await,
        Some(Commands::Chat { login_as }) => chat::run_chat(&config, login_as.as_deref()).await,
        None => {
            println!("opsdeck: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        // Error displays are already generic; statement text, parameters,
        // and keys never reach this line.
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Opens the configured database, which applies pending migrations.
async fn run_init(config: &OpsdeckConfig) -> Result<(), OpsdeckError> {
    let store = Store::from_config(&config.storage);
    store.connect().await?;
    store.close().await?;
    println!("database ready at {}", config.storage.database_path);
    Ok(())
}

/// Runs the legacy flat-file user import.
async fn run_import(config: &OpsdeckConfig, path: &std::path::Path) -> Result<(), OpsdeckError> {
    let store = Store::from_config(&config.storage);
    store.connect().await?;
    let imported = opsdeck_storage::import_from_flat_file(&store, path).await?;
    store.close().await?;
    println!("imported {imported} users");
    Ok(())
}

/// Initializes the tracing subscriber on stderr.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
