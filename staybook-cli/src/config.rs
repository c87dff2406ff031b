//! Command-line client configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! api_url = "https://api.example.com/v1"
//! api_token = "$STAYBOOK_API_TOKEN"
//! timeout_secs = 30
//! required_payment_type = "deposit"
//! price_increase_percent = 5
//!
//! [solana]
//! rpc_url = "https://api.mainnet-beta.solana.com"
//! keypair_path = "${HOME}/.config/solana/id.json"
//! recipient = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
//! network = "mainnet"
//! ```
//!
//! # Environment Variables
//!
//! - `STAYBOOK_CONFIG` - Path to configuration file (default: `staybook.toml`)
//! - `STAYBOOK_API_URL` - Override the booking API base URL
//! - Secrets referenced by `$VAR` in the config file

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;
use staybook::config::{DEFAULT_REQUIRED_PAYMENT_TYPE, OrchestratorConfig};
use staybook_svm::{DEFAULT_CURRENCY, TokenDeployment, TokenProgram};

use crate::error::CliError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "staybook.toml";

/// Environment variable overriding [`CliConfig::api_url`].
pub const API_URL_ENV: &str = "STAYBOOK_API_URL";

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Booking API base URL.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Bearer token for the booking API.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout for booking API calls, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Payment type the booking must offer (default: `deposit`).
    #[serde(default = "default_required_payment_type")]
    pub required_payment_type: String,

    /// Tolerated price increase at pre-book, in percent.
    #[serde(default)]
    pub price_increase_percent: Option<u8>,

    /// On-chain payment settings.
    #[serde(default)]
    pub solana: Option<SolanaConfig>,
}

/// Solana network preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolanaNetwork {
    /// Mainnet-beta, USDC.
    #[default]
    Mainnet,
    /// Devnet, devnet USDC.
    Devnet,
}

/// On-chain payment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    /// JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Path of the payer keypair file (JSON array of 64 bytes).
    pub keypair_path: PathBuf,

    /// Wallet receiving the payment (base58).
    pub recipient: String,

    /// Network preset selecting the default mint.
    #[serde(default)]
    pub network: SolanaNetwork,

    /// Custom mint (base58), overriding the network's USDC mint.
    #[serde(default)]
    pub mint: Option<String>,

    /// Decimals of the custom mint (default: 6).
    #[serde(default)]
    pub decimals: Option<u8>,

    /// Set to `true` if the custom mint is owned by Token-2022.
    #[serde(default)]
    pub token_2022: bool,

    /// Currency one token is worth (default: `USD`). Quotes in other
    /// currencies are refused.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_required_payment_type() -> String {
    DEFAULT_REQUIRED_PAYMENT_TYPE.to_owned()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_owned()
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_owned()
}

impl CliConfig {
    /// Loads configuration from `path`, falling back to defaults if the file
    /// does not exist.
    ///
    /// String values are expanded from the process environment and
    /// `STAYBOOK_API_URL` overrides the file's `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| CliError::Io {
                path: path.to_owned(),
                source,
            })?
        } else {
            #[cfg(feature = "telemetry")]
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            String::new()
        };

        let mut config = Self::parse(&content, |name| std::env::var(name).ok())?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api_url = Some(url);
        }
        Ok(config)
    }

    /// Parses TOML after expanding variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Toml`] if the expanded content is not valid.
    pub fn parse<F>(content: &str, lookup: F) -> Result<Self, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Returns the booking API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Missing`] if neither the file nor the environment
    /// sets it.
    pub fn api_url(&self) -> Result<&str, CliError> {
        self.api_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(CliError::Missing("api_url"))
    }

    /// Returns the request timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the orchestrator policy.
    #[must_use]
    pub fn orchestrator(&self) -> OrchestratorConfig {
        let config =
            OrchestratorConfig::default().with_required_payment_type(&self.required_payment_type);
        match self.price_increase_percent {
            Some(percent) => config.with_price_increase_percent(percent),
            None => config,
        }
    }

    /// Returns the on-chain payment settings.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Missing`] if the `[solana]` table is absent.
    pub fn solana(&self) -> Result<&SolanaConfig, CliError> {
        self.solana.as_ref().ok_or(CliError::Missing("[solana]"))
    }
}

impl SolanaConfig {
    /// Parses the recipient wallet.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Invalid`] if it is not a base58 public key.
    pub fn recipient(&self) -> Result<Pubkey, CliError> {
        parse_pubkey("recipient", &self.recipient)
    }

    /// Resolves the token to pay with.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Invalid`] if the custom mint is not a public key.
    pub fn deployment(&self) -> Result<TokenDeployment, CliError> {
        let preset = match self.network {
            SolanaNetwork::Mainnet => TokenDeployment::usdc_mainnet(),
            SolanaNetwork::Devnet => TokenDeployment::usdc_devnet(),
        };
        let Some(mint) = &self.mint else {
            return Ok(preset);
        };
        let program = if self.token_2022 {
            TokenProgram::Token2022
        } else {
            TokenProgram::Token
        };
        Ok(TokenDeployment::new(
            parse_pubkey("mint", mint)?,
            self.decimals.unwrap_or(preset.decimals),
            program,
        ))
    }
}

fn parse_pubkey(field: &'static str, value: &str) -> Result<Pubkey, CliError> {
    Pubkey::from_str(value.trim()).map_err(|e| CliError::Invalid {
        field,
        reason: format!("{value}: {e}"),
    })
}

/// Expands `$VAR` and `${VAR}` patterns through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();

        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name) {
            Some(value) if !name.is_empty() => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
