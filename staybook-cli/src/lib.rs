//! Command-line booking client.
//!
//! Books a quoted rate through the HTTP booking API and pays for it with a
//! Solana stablecoin transfer from a local keypair.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with environment variable expansion
//! - [`error`] - Errors and process exit codes
//! - [`run`] - Wiring of client, wallet and orchestrator

pub mod config;
pub mod error;
pub mod run;

pub use config::CliConfig;
pub use error::CliError;
