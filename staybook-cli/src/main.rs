//! Books a property and pays with Solana stablecoins.
//!
//! # Usage
//!
//! ```bash
//! # Re-check a quote
//! staybook prebook --hash <BOOK_HASH>
//!
//! # Book for two adults and a child, paying the quoted deposit
//! staybook book --hash <BOOK_HASH> --property <ID> --adults 2 --child 7 \
//!     --guest "Ada Lovelace" --guest "Charles Babbage"
//! ```
//!
//! # Environment Variables
//!
//! - `STAYBOOK_CONFIG` - Path to TOML configuration file (default: `staybook.toml`)
//! - `STAYBOOK_API_URL` - Override the booking API base URL
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - The booking failed and no funds moved
//! - `2` - Invalid configuration or arguments
//! - `3` - Funds may have moved without a confirmed booking

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use staybook::proto::{BookHash, GuestIdentity, GuestSelection, PrebookResponse};
use tracing_subscriber::EnvFilter;

use staybook_cli::config::{CliConfig, DEFAULT_CONFIG_PATH};
use staybook_cli::error::CliError;
use staybook_cli::run::{self, BookArgs, parse_guest};

#[derive(Parser)]
#[command(name = "staybook", version, about = "Book properties and pay with stablecoins")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "STAYBOOK_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-validate a quoted rate without booking
    Prebook {
        /// Book hash from the quote
        #[arg(long)]
        hash: String,
    },
    /// Book a quoted rate and pay for it on-chain
    Book {
        /// Book hash from the quote
        #[arg(long)]
        hash: String,

        /// Property identifier
        #[arg(long)]
        property: String,

        /// Number of adults
        #[arg(long, default_value = "1")]
        adults: u32,

        /// Age of a child (repeatable)
        #[arg(long = "child")]
        children: Vec<u8>,

        /// Guest name as "FIRST LAST" (repeatable)
        #[arg(long = "guest", value_parser = parse_guest)]
        guests: Vec<GuestIdentity>,

        /// Pay this amount instead of the quoted one
        #[arg(long)]
        amount: Option<Decimal>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            e.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> Result<(), CliError> {
    let config = CliConfig::load_from(&cli.config)?;

    match cli.command {
        Commands::Prebook { hash } => {
            let hash = BookHash::new(hash);
            let response = run::prebook(&config, hash.clone()).await?;
            match response.effective_hash(&hash) {
                Some(effective) if effective == hash => {
                    tracing::info!(%hash, "Rate is still available at the quoted price");
                }
                Some(effective) => {
                    tracing::warn!(original = %hash, %effective, "Price changed");
                }
                None => tracing::warn!(%hash, "No payable rate is available"),
            }
            print_json(&response);
        }
        Commands::Book {
            hash,
            property,
            adults,
            children,
            guests,
            amount,
        } => {
            let selection = children
                .into_iter()
                .fold(GuestSelection::new(adults), GuestSelection::with_child);
            let selection = guests
                .into_iter()
                .fold(selection, GuestSelection::with_guest);
            let args = BookArgs {
                hash: BookHash::new(hash),
                property_id: property,
                guests: selection,
                amount,
            };
            let order_id = run::book(&config, args).await?;
            tracing::info!(%order_id, "Booking confirmed");
            print_line(&order_id);
        }
    }
    Ok(())
}

fn print_json(response: &PrebookResponse) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => print_line(&json),
        Err(e) => tracing::warn!("Failed to render response: {e}"),
    }
}

#[allow(clippy::print_stdout)]
fn print_line(value: &dyn std::fmt::Display) {
    println!("{value}");
}
