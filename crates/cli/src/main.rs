//! Folio CLI - Database migrations, admin credentials and session tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! folio-cli migrate
//!
//! # Hash the admin password for ADMIN_PASSWORD_HASH (prompts on stdin)
//! folio-cli hash-password
//!
//! # Check a password against a hash
//! folio-cli verify-hash --hash '$argon2id$v=19$...'
//!
//! # Delete expired sessions / sign every tab out
//! folio-cli sessions purge
//! folio-cli sessions revoke-all
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "folio-cli")]
#[command(author, version, about = "Folio CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Print an argon2 hash for `ADMIN_PASSWORD_HASH`
    HashPassword {
        /// Password to hash (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Check a password against an argon2 hash
    VerifyHash {
        /// PHC hash string
        #[arg(long)]
        hash: String,

        /// Password to check (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Manage admin sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// Delete expired sessions
    Purge,
    /// Delete every session, signing out all tabs
    RevokeAll,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::HashPassword { password } => commands::password::hash(password)?,
        Commands::VerifyHash { hash, password } => commands::password::verify(&hash, password)?,
        Commands::Sessions { action } => match action {
            SessionsAction::Purge => commands::sessions::purge().await?,
            SessionsAction::RevokeAll => commands::sessions::revoke_all().await?,
        },
    }
    Ok(())
}
