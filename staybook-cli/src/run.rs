//! Wiring of the booking client from configuration.

use std::path::Path;

use rust_decimal::Decimal;
use solana_keypair::Keypair;
use solana_signer::Signer;
use staybook::api::BoxFuture;
use staybook::hooks::BookingHooks;
use staybook::proto::{
    BookHash, BookingIntent, GuestIdentity, GuestSelection, OrderId, PaymentProof,
    PrebookRequest, PrebookResponse,
};
use staybook::{BookingError, BookingOrchestrator, PaymentContext};
use staybook_http::{BookingApiClient, StaticAuthProvider};
use staybook_svm::{RpcLedgerClient, SolanaPaymentExecutor};

use crate::config::CliConfig;
use crate::error::CliError;

/// One booking request from the command line.
#[derive(Debug, Clone)]
pub struct BookArgs {
    /// Quoted rate to book.
    pub hash: BookHash,
    /// Property to book.
    pub property_id: String,
    /// Guests and occupancy.
    pub guests: GuestSelection,
    /// Fixed amount to pay instead of the quoted one.
    pub amount: Option<Decimal>,
}

/// Builds the booking API client.
///
/// # Errors
///
/// Returns [`CliError`] if the URL or token is missing or invalid.
pub fn api_client(config: &CliConfig) -> Result<BookingApiClient, CliError> {
    let mut client = BookingApiClient::try_from(config.api_url()?)?;
    if let Some(timeout) = config.timeout() {
        client = client.with_timeout(timeout);
    }
    if let Some(token) = config.api_token.as_deref().filter(|t| !t.is_empty()) {
        client = client.with_auth(StaticAuthProvider::bearer(token)?);
    }
    Ok(client)
}

/// Loads a keypair file holding a JSON array of 64 bytes.
///
/// # Errors
///
/// Returns [`CliError`] if the file cannot be read or is not a keypair.
pub fn load_keypair(path: &Path) -> Result<Keypair, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_owned(),
        source,
    })?;
    let invalid = |reason: String| CliError::Keypair {
        path: path.to_owned(),
        reason,
    };
    let bytes: Vec<u8> = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    Keypair::try_from(bytes.as_slice()).map_err(|e| invalid(e.to_string()))
}

/// Parses `"First Last"` into a guest identity.
///
/// # Errors
///
/// Returns a message if either name is missing.
pub fn parse_guest(value: &str) -> Result<GuestIdentity, String> {
    let (first, last) = value
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("expected \"FIRST LAST\", got {value:?}"))?;
    let last = last.trim();
    if first.is_empty() || last.is_empty() {
        return Err(format!("expected \"FIRST LAST\", got {value:?}"));
    }
    Ok(GuestIdentity::new(first, last))
}

/// Re-validates a quote without booking.
///
/// # Errors
///
/// Returns [`CliError`] if the client cannot be built or the request fails.
pub async fn prebook(config: &CliConfig, hash: BookHash) -> Result<PrebookResponse, CliError> {
    let request = PrebookRequest {
        hash,
        price_increase_percent: config.price_increase_percent,
    };
    Ok(api_client(config)?.prebook(&request).await?)
}

/// Books and pays with the configured Solana wallet.
///
/// # Errors
///
/// Returns [`CliError`] for configuration problems or a failed booking.
pub async fn book(config: &CliConfig, args: BookArgs) -> Result<OrderId, CliError> {
    let solana = config.solana()?;
    let keypair = load_keypair(&solana.keypair_path)?;
    tracing::info!(payer = %keypair.pubkey(), rpc_url = %solana.rpc_url, "Paying from wallet");
    let ledger = RpcLedgerClient::new(solana.rpc_url.clone(), keypair);
    let mut executor =
        SolanaPaymentExecutor::new(ledger, solana.recipient()?, solana.deployment()?)
            .with_currency(&solana.currency);
    if let Some(amount) = args.amount {
        executor = executor.with_amount(amount);
    }

    let orchestrator = BookingOrchestrator::new(api_client(config)?)
        .with_config(config.orchestrator())
        .with_hook(LoggingHook);

    let order_id = orchestrator
        .process_booking(args.hash, args.guests, &args.property_id, &executor)
        .await?;
    Ok(order_id)
}

/// Logs every step of a booking attempt.
#[derive(Debug, Clone, Copy)]
pub struct LoggingHook;

impl BookingHooks for LoggingHook {
    fn on_price_changed<'a>(
        &'a self,
        original: &'a BookHash,
        effective: &'a BookHash,
    ) -> BoxFuture<'a, ()> {
        tracing::warn!(%original, %effective, "Price changed; booking the re-quoted rate");
        Box::pin(async {})
    }

    fn on_intent_created<'a>(&'a self, intent: &'a BookingIntent) -> BoxFuture<'a, ()> {
        tracing::info!(order_id = %intent.order_id, "Order opened");
        Box::pin(async {})
    }

    fn on_payment_executed<'a>(
        &'a self,
        context: &'a PaymentContext,
        proof: &'a PaymentProof,
    ) -> BoxFuture<'a, ()> {
        tracing::info!(
            order_id = %context.order_id,
            signature = proof.signature().unwrap_or("-"),
            "Payment sent"
        );
        Box::pin(async {})
    }

    fn on_failure<'a>(&'a self, error: &'a BookingError) -> BoxFuture<'a, ()> {
        match error {
            BookingError::BookingFinalizationFailed {
                order_id, proof, ..
            } => {
                tracing::error!(
                    order_id = %order_id,
                    signature = proof.signature().unwrap_or("-"),
                    "Payment was made but the booking was not confirmed; contact support with this signature"
                );
            }
            BookingError::PaymentExecutionFailed(err) if err.funds_may_have_moved() => {
                tracing::error!(
                    error = %err,
                    "Payment outcome unknown; check the wallet before trying again"
                );
            }
            _ => {}
        }
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_guest() {
        assert_eq!(
            parse_guest("Ada Lovelace").unwrap(),
            GuestIdentity::new("Ada", "Lovelace")
        );
        assert_eq!(
            parse_guest("  Jean  de la Fontaine ").unwrap(),
            GuestIdentity::new("Jean", "de la Fontaine")
        );
        assert!(parse_guest("Cher").is_err());
    }

    #[test]
    fn test_load_keypair_round_trip() {
        let keypair = Keypair::new();
        let path = std::env::temp_dir().join(format!("staybook-test-{}.json", keypair.pubkey()));
        std::fs::write(
            &path,
            serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap(),
        )
        .unwrap();

        let loaded = load_keypair(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_load_keypair_rejects_garbage() {
        let path = std::env::temp_dir().join("staybook-test-garbage.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = load_keypair(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, CliError::Keypair { .. }));
    }

    #[test]
    fn test_api_client_requires_url() {
        let config = CliConfig::parse("", |_| None).unwrap();
        assert!(matches!(
            api_client(&config),
            Err(CliError::Missing("api_url"))
        ));

        let config = CliConfig::parse(
            "api_url = \"https://api.example.com/v1\"\napi_token = \"t\"\ntimeout_secs = 5",
            |_| None,
        )
        .unwrap();
        let client = api_client(&config).unwrap();
        assert_eq!(
            client.finish_url().as_str(),
            "https://api.example.com/v1/booking/finish"
        );
        assert_eq!(client.timeout(), Some(std::time::Duration::from_secs(5)));
    }
}
