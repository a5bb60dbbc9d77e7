//! Pulse & Threads CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pt-cli migrate
//!
//! # Create a user
//! pt-cli user create -e owner@example.com -n "Store Owner" -r store_owner
//!
//! # Change a user's role
//! pt-cli user set-role -e owner@example.com -r admin
//!
//! # Load storefronts and products from YAML
//! pt-cli seed -f seeds/mall.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `MALL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pt-cli")]
#[command(author, version, about = "Pulse & Threads CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage mall users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed storefronts, products, and variations from a YAML file
    Seed {
        /// Path to the catalog YAML file
        #[arg(short, long, default_value = "seeds/mall.yaml")]
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`customer`, `store_owner`, `admin`)
        #[arg(short, long, default_value = "customer")]
        role: String,
    },
    /// Change the role of an existing user
    SetRole {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role (`customer`, `store_owner`, `admin`)
        #[arg(short, long)]
        role: String,
    },
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
        Commands::User { action } => match action {
            UserAction::Create { email, name, role } => {
                commands::user::create(&email, &name, &role).await?;
            }
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, &role).await?;
            }
        },
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
    }
    Ok(())
}
