//! The on-chain [`PaymentExecutor`].

use rust_decimal::Decimal;
use solana_message::VersionedMessage;
use solana_message::v0::Message as MessageV0;
use solana_pubkey::Pubkey;
use solana_transaction::versioned::VersionedTransaction;
use staybook::amount::{from_base_units, to_base_units};
use staybook::api::BoxFuture;
use staybook::proto::PaymentProof;
use staybook::{PaymentContext, PaymentExecutionError, PaymentExecutor};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::chain::TokenDeployment;
use crate::instructions::build_payment_instructions;
use crate::ledger::{LedgerClient, LedgerError};

/// Currency the supported stablecoins are pegged to.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Pays a booking by transferring stablecoins to the property's wallet.
///
/// The amount is the one quoted on the selected payment type, unless
/// [`with_amount`](Self::with_amount) fixes it. A quoted amount is only paid
/// if its currency matches the token's (see [`with_currency`](Self::with_currency)).
pub struct SolanaPaymentExecutor<L> {
    ledger: L,
    recipient: Pubkey,
    deployment: TokenDeployment,
    amount: Option<Decimal>,
    currency: String,
}

impl<L> std::fmt::Debug for SolanaPaymentExecutor<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaPaymentExecutor")
            .field("recipient", &self.recipient)
            .field("deployment", &self.deployment)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl<L> SolanaPaymentExecutor<L> {
    /// Creates an executor paying `recipient` in `deployment` tokens, which
    /// are taken to be worth one [`DEFAULT_CURRENCY`] unit each.
    pub fn new(ledger: L, recipient: Pubkey, deployment: TokenDeployment) -> Self {
        Self {
            ledger,
            recipient,
            deployment,
            amount: None,
            currency: DEFAULT_CURRENCY.to_owned(),
        }
    }

    /// Sets the ISO currency one token is worth. Quotes in any other currency
    /// are refused.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Pays `amount` (display units) regardless of the quoted amount.
    #[must_use]
    pub const fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Returns the ledger client.
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }
}

impl<L: LedgerClient> SolanaPaymentExecutor<L> {
    fn resolve_amount(&self, context: &PaymentContext) -> Result<Decimal, PaymentExecutionError> {
        if let Some(amount) = self.amount {
            return Ok(amount);
        }
        let payment_type = &context.payment_type;
        let quoted = payment_type.amount.as_ref().ok_or_else(|| {
            PaymentExecutionError::InvalidAmount(format!(
                "payment type `{}` of order {} carries no amount",
                payment_type.kind, context.order_id
            ))
        })?;
        // A quote without a currency code is in the account currency.
        match payment_type.currency_code.as_deref() {
            Some(code) if !code.trim().eq_ignore_ascii_case(&self.currency) => {
                Err(PaymentExecutionError::InvalidAmount(format!(
                    "order {} is quoted as {quoted} {code}, but the token pays in {}",
                    context.order_id, self.currency
                )))
            }
            _ => Ok(quoted.value()),
        }
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "staybook.svm.pay",
            skip_all,
            fields(order_id = %context.order_id, recipient = %self.recipient),
            err
        )
    )]
    async fn pay(&self, context: &PaymentContext) -> Result<PaymentProof, PaymentExecutionError> {
        let amount = self.resolve_amount(context)?;
        let decimals = u32::from(self.deployment.decimals);
        let units = to_base_units(amount, decimals)
            .map_err(|e| PaymentExecutionError::InvalidAmount(e.to_string()))?;
        let paid = from_base_units(units, decimals)
            .map_err(|e| PaymentExecutionError::InvalidAmount(e.to_string()))?;

        let payer = self.ledger.payer();
        let instructions =
            build_payment_instructions(&payer, &self.recipient, &self.deployment, units)
                .map_err(|e| PaymentExecutionError::Preparation(e.to_string()))?;

        let slot = self.ledger.get_slot().await.map_err(map_ledger_error)?;
        let blockhash = self
            .ledger
            .latest_blockhash()
            .await
            .map_err(map_ledger_error)?;
        let message = MessageV0::try_compile(&payer, &instructions, &[], blockhash)
            .map_err(|e| PaymentExecutionError::Preparation(format!("{e:?}")))?;
        let transaction = VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::V0(message),
        };

        #[cfg(feature = "telemetry")]
        tracing::debug!(units, slot, "Submitting stablecoin transfer");

        let signature = self
            .ledger
            .sign_and_send_transaction(transaction, slot)
            .await
            .map_err(map_ledger_error)?;

        Ok(PaymentProof::on_chain(signature.to_string(), paid))
    }
}

impl<L: LedgerClient> PaymentExecutor for SolanaPaymentExecutor<L> {
    fn execute<'a>(
        &'a self,
        context: &'a PaymentContext,
    ) -> BoxFuture<'a, Result<PaymentProof, PaymentExecutionError>> {
        Box::pin(self.pay(context))
    }
}

fn map_ledger_error(err: LedgerError) -> PaymentExecutionError {
    match err {
        LedgerError::Unavailable(msg) => PaymentExecutionError::Preparation(msg),
        LedgerError::Signing(msg) => PaymentExecutionError::Signing(msg),
        LedgerError::Rejected(msg) => PaymentExecutionError::Rejected(msg),
        LedgerError::Transport(msg) => PaymentExecutionError::Submission(msg),
    }
}
