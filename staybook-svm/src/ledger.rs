//! Ledger access for the on-chain executor.
//!
//! [`LedgerClient`] is the boundary between transaction building and the
//! network: it knows the payer, reads chain state, and signs and submits.
//! [`RpcLedgerClient`] implements it with a local [`Signer`] and the
//! non-blocking Solana RPC client; a browser or hardware wallet would
//! implement it by forwarding the transaction for approval.

use std::fmt;

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_request::RpcError;
use solana_commitment_config::CommitmentConfig;
use solana_message::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use staybook::api::BoxFuture;

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Errors reported by a [`LedgerClient`].
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Chain state could not be read; nothing was submitted.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    /// The signer refused or failed to sign; nothing was submitted.
    #[error("signing failed: {0}")]
    Signing(String),
    /// The ledger refused the transaction before accepting it.
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// Submission failed in transit; the transaction may still land.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Signs and submits transactions for a single payer.
pub trait LedgerClient: Send + Sync {
    /// Returns the paying wallet, which is also the transaction fee payer.
    fn payer(&self) -> Pubkey;

    /// Returns the current slot.
    fn get_slot(&self) -> BoxFuture<'_, Result<u64, LedgerError>>;

    /// Returns a recent blockhash for compiling a message.
    fn latest_blockhash(&self) -> BoxFuture<'_, Result<Hash, LedgerError>>;

    /// Signs `transaction` as the payer and submits it.
    ///
    /// The ledger must not evaluate the transaction against state older than
    /// `min_context_slot`.
    fn sign_and_send_transaction(
        &self,
        transaction: VersionedTransaction,
        min_context_slot: u64,
    ) -> BoxFuture<'_, Result<Signature, LedgerError>>;
}

/// [`LedgerClient`] backed by a local signer and a JSON-RPC node.
pub struct RpcLedgerClient<S> {
    rpc: RpcClient,
    signer: S,
    commitment: CommitmentConfig,
}

impl<S> fmt::Debug for RpcLedgerClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcLedgerClient")
            .field("url", &self.rpc.url())
            .field("commitment", &self.commitment)
            .finish_non_exhaustive()
    }
}

impl<S: Signer> RpcLedgerClient<S> {
    /// Connects to the RPC node at `url` with `confirmed` commitment.
    pub fn new(url: impl Into<String>, signer: S) -> Self {
        Self::with_commitment(url, signer, CommitmentConfig::confirmed())
    }

    /// Connects to the RPC node at `url` with the given commitment.
    pub fn with_commitment(url: impl Into<String>, signer: S, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(url.into(), commitment),
            signer,
            commitment,
        }
    }

    /// Returns the commitment used for reads and preflight.
    #[must_use]
    pub const fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }
}

impl<S: Signer + Send + Sync> LedgerClient for RpcLedgerClient<S> {
    fn payer(&self) -> Pubkey {
        self.signer.pubkey()
    }

    fn get_slot(&self) -> BoxFuture<'_, Result<u64, LedgerError>> {
        Box::pin(async move {
            self.rpc
                .get_slot_with_commitment(self.commitment)
                .await
                .map_err(|e| LedgerError::Unavailable(e.to_string()))
        })
    }

    fn latest_blockhash(&self) -> BoxFuture<'_, Result<Hash, LedgerError>> {
        Box::pin(async move {
            self.rpc
                .get_latest_blockhash()
                .await
                .map_err(|e| LedgerError::Unavailable(e.to_string()))
        })
    }

    fn sign_and_send_transaction(
        &self,
        transaction: VersionedTransaction,
        min_context_slot: u64,
    ) -> BoxFuture<'_, Result<Signature, LedgerError>> {
        Box::pin(self.sign_and_send(transaction, min_context_slot))
    }
}

impl<S: Signer + Send + Sync> RpcLedgerClient<S> {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "staybook.ledger.send", skip_all, fields(min_context_slot = min_context_slot), err)
    )]
    async fn sign_and_send(
        &self,
        transaction: VersionedTransaction,
        min_context_slot: u64,
    ) -> Result<Signature, LedgerError> {
        let transaction = sign_transaction(&self.signer, transaction)?;
        let config = RpcSendTransactionConfig {
            preflight_commitment: Some(self.commitment.commitment),
            min_context_slot: Some(min_context_slot),
            ..RpcSendTransactionConfig::default()
        };
        let signature = self
            .rpc
            .send_transaction_with_config(&transaction, config)
            .await
            .map_err(classify_send_error)?;

        #[cfg(feature = "telemetry")]
        tracing::info!(%signature, "Transaction submitted");
        Ok(signature)
    }
}

/// Fills in the signer's signature, leaving other required signatures empty.
///
/// # Errors
///
/// Returns [`LedgerError::Signing`] if the signer is not a required signer of
/// the message or fails to sign.
pub fn sign_transaction<S: Signer + ?Sized>(
    signer: &S,
    mut transaction: VersionedTransaction,
) -> Result<VersionedTransaction, LedgerError> {
    let pubkey = signer.pubkey();
    let required = usize::from(transaction.message.header().num_required_signatures);
    let position = transaction
        .message
        .static_account_keys()
        .iter()
        .take(required)
        .position(|key| *key == pubkey)
        .ok_or_else(|| LedgerError::Signing(format!("{pubkey} is not a required signer")))?;

    let signature = signer
        .try_sign_message(&transaction.message.serialize())
        .map_err(|e| LedgerError::Signing(e.to_string()))?;

    transaction.signatures.resize(required, Signature::default());
    transaction.signatures[position] = signature;
    Ok(transaction)
}

/// A JSON-RPC error response means the node refused the transaction (failed
/// preflight, bad blockhash); anything else leaves the outcome unknown.
fn classify_send_error(err: ClientError) -> LedgerError {
    match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError { .. }) => {
            LedgerError::Rejected(err.to_string())
        }
        _ => LedgerError::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_keypair::Keypair;
    use solana_message::VersionedMessage;
    use solana_message::v0::Message as MessageV0;

    use crate::chain::TokenDeployment;
    use crate::instructions::build_payment_instructions;

    fn unsigned_transfer(payer: &Pubkey) -> VersionedTransaction {
        let recipient = Keypair::new().pubkey();
        let ixs =
            build_payment_instructions(payer, &recipient, &TokenDeployment::usdc_mainnet(), 5)
                .unwrap();
        let message = MessageV0::try_compile(payer, &ixs, &[], Hash::default()).unwrap();
        VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::V0(message),
        }
    }

    #[test]
    fn test_sign_transaction_places_payer_signature() {
        let keypair = Keypair::new();
        let tx = unsigned_transfer(&keypair.pubkey());

        let signed = sign_transaction(&keypair, tx).unwrap();

        assert_eq!(signed.signatures.len(), 1);
        assert_eq!(
            signed.signatures[0],
            keypair.sign_message(&signed.message.serialize())
        );
        assert_eq!(signed.message.static_account_keys()[0], keypair.pubkey());
    }

    #[test]
    fn test_sign_transaction_rejects_foreign_signer() {
        let payer = Keypair::new();
        let stranger = Keypair::new();
        let tx = unsigned_transfer(&payer.pubkey());

        let err = sign_transaction(&stranger, tx).unwrap_err();
        assert!(matches!(err, LedgerError::Signing(_)));
    }

    #[test]
    fn test_rpc_ledger_client_payer_is_signer() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let client = RpcLedgerClient::new("http://127.0.0.1:8899", keypair);
        assert_eq!(client.payer(), pubkey);
        assert_eq!(client.commitment(), CommitmentConfig::confirmed());
    }
}
