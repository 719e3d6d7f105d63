//! Field Orders CLI - Reference data import and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Replace the products file with an uploaded spreadsheet
//! fo-cli import products ~/Downloads/products.xlsx
//!
//! # Summarize the loaded reference data
//! fo-cli show
//!
//! # Print one reference table
//! fo-cli show employee-mapping
//!
//! # Check a login (password read from stdin)
//! echo 1234 | fo-cli check-login asha
//! ```
//!
//! # Commands
//!
//! - `import` - Replace a reference file, with the same checks as the admin panel
//! - `show` - Print the reference data the portal would load
//! - `check-login` - Check a username/password pair against the users file
//!
//! File locations come from the same environment variables as the portal
//! (`DISTRIBUTOR_FILE`, `PRODUCT_FILE`, `USERS_FILE`, `EMPLOYEE_MAPPING_FILE`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use field_orders_core::ReferenceSlot;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fo-cli")]
#[command(author, version, about = "Field order portal CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace a reference file with a CSV or XLSX spreadsheet
    Import {
        /// Reference slot (`distributors`, `products`, `users`, `employee-mapping`)
        slot: ReferenceSlot,

        /// Spreadsheet to import (.csv or .xlsx)
        file: PathBuf,
    },
    /// Print reference data
    Show {
        /// Print only this slot's table
        slot: Option<ReferenceSlot>,
    },
    /// Check a username/password pair; the password is read from stdin
    CheckLogin {
        /// Username as it appears in the users file
        username: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output can be piped
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "field_orders=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Import { slot, file } => commands::import::run(slot, &file).await?,
        Commands::Show { slot } => match slot {
            Some(slot) => commands::show::table(slot)?,
            None => commands::show::summary()?,
        },
        Commands::CheckLogin { username } => commands::login::check(&username)?,
    }
    Ok(())
}
