//! Sheetkeep CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sk-cli migrate
//!
//! # Register an account
//! sk-cli account create --brand acme --role editor --password '...'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `account create` - Register a brand/role account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sk-cli")]
#[command(version, about = "Sheetkeep CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Register a new account
    Create {
        /// Brand the account belongs to
        #[arg(short, long)]
        brand: String,

        /// Role within the brand
        #[arg(short, long)]
        role: String,

        /// Login password (min 8 characters)
        #[arg(short, long, env = "SHEETS_ACCOUNT_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Account { action } => match action {
            AccountAction::Create {
                brand,
                role,
                password,
            } => {
                commands::account::create(&brand, &role, &password).await?;
            }
        },
    }
    Ok(())
}
