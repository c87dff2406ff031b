//! The booking pipeline.
//!
//! [`BookingOrchestrator::process_booking`] runs four strictly sequential
//! steps: pre-book, initialize, pay, finish. Each step awaits its predecessor,
//! every failure aborts the rest, and nothing is retried. The orchestrator
//! keeps no state between calls; concurrent calls are independent and are not
//! deduplicated.

use std::fmt::{self, Debug};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::api::BookingApi;
use crate::config::OrchestratorConfig;
use crate::error::BookingError;
use crate::executor::{PaymentContext, PaymentExecutor};
use crate::hooks::{BookingHooks, HookChain, HookDecision};
use crate::proto::{
    BookHash, BookingIntent, FinishRequest, GuestSelection, InitializeRequest, OrderId,
    PaymentProof, PaymentType, PrebookRequest,
};

/// Drives a booking from a quoted rate to a confirmed order.
///
/// # Example
///
/// ```ignore
/// use rust_decimal::Decimal;
/// use staybook::{BookingOrchestrator, PaymentContext, PaymentExecutionError};
/// use staybook::proto::{BookHash, GuestSelection, PaymentProof};
///
/// let orchestrator = BookingOrchestrator::new(api_client);
/// let executor = |ctx: &PaymentContext| {
///     let amount = ctx.payment_type.amount.as_ref().map_or(Decimal::ZERO, |a| a.value());
///     async move { Ok::<_, PaymentExecutionError>(PaymentProof::on_chain("sig", amount)) }
/// };
/// let order_id = orchestrator
///     .process_booking(BookHash::new("abc"), GuestSelection::new(2), "prop-1", &executor)
///     .await?;
/// ```
pub struct BookingOrchestrator<A> {
    api: A,
    config: OrchestratorConfig,
    hooks: HookChain,
}

impl<A: Debug> Debug for BookingOrchestrator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingOrchestrator")
            .field("api", &self.api)
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl<A> BookingOrchestrator<A> {
    /// Creates an orchestrator with the default policy and no hooks.
    pub fn new(api: A) -> Self {
        Self {
            api,
            config: OrchestratorConfig::default(),
            hooks: HookChain::default(),
        }
    }

    /// Replaces the policy configuration.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a lifecycle hook. Hooks run in registration order.
    #[must_use]
    pub fn with_hook(mut self, hook: impl BookingHooks + 'static) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Returns the policy configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Returns the booking API.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }
}

impl<A: BookingApi> BookingOrchestrator<A> {
    /// Books `property_id` at the rate identified by `book_hash`, paying with
    /// `executor`, and returns the confirmed order id.
    ///
    /// The caller is responsible for preventing concurrent attempts for the
    /// same selection (for example by disabling the "book" button while a call
    /// is in flight) and for never re-finalizing with a reused proof.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError`] identifying the step that failed. See
    /// [`BookingError::requires_reconciliation`] for the one failure that can
    /// leave funds moved without a booking.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "staybook.process_booking",
            skip_all,
            fields(book_hash = %book_hash, property_id = %property_id),
            err
        )
    )]
    pub async fn process_booking<E>(
        &self,
        book_hash: BookHash,
        guests: GuestSelection,
        property_id: &str,
        executor: &E,
    ) -> Result<OrderId, BookingError>
    where
        E: PaymentExecutor + ?Sized,
    {
        let result = self
            .run_pipeline(book_hash, guests, property_id, executor)
            .await;
        if let Err(err) = &result {
            #[cfg(feature = "telemetry")]
            log_failure(err);
            self.hooks.failure(err).await;
        }
        result
    }

    async fn run_pipeline<E>(
        &self,
        book_hash: BookHash,
        guests: GuestSelection,
        property_id: &str,
        executor: &E,
    ) -> Result<OrderId, BookingError>
    where
        E: PaymentExecutor + ?Sized,
    {
        guests.validate()?;

        let effective_hash = self.revalidate_price(&book_hash).await?;
        let intent = self.initialize(property_id, effective_hash).await?;
        let payment_type = self.select_payment_type(&intent)?.clone();

        let context = PaymentContext {
            order_id: intent.order_id,
            property_id: property_id.to_owned(),
            payment_type,
        };
        let proof = self.execute_payment(&context, executor).await?;

        self.finalize(context, proof, guests).await
    }

    /// Step 1: re-validates the quote and resolves the hash to book with.
    async fn revalidate_price(&self, book_hash: &BookHash) -> Result<BookHash, BookingError> {
        let request = PrebookRequest {
            hash: book_hash.clone(),
            price_increase_percent: self.config.price_increase_percent,
        };
        let response = self
            .api
            .prebook(&request)
            .await
            .map_err(BookingError::PriceRevalidationFailed)?;

        let effective = response
            .effective_hash(book_hash)
            .ok_or(BookingError::RateUnavailable)?;
        if effective != *book_hash {
            #[cfg(feature = "telemetry")]
            tracing::info!(original = %book_hash, effective = %effective, "Price changed, using re-quoted rate");
            self.hooks.price_changed(book_hash, &effective).await;
        }
        Ok(effective)
    }

    /// Step 2: opens the booking order.
    async fn initialize(
        &self,
        property_id: &str,
        hash: BookHash,
    ) -> Result<BookingIntent, BookingError> {
        let request = InitializeRequest {
            property_id: property_id.to_owned(),
            hash,
        };
        let intent = self
            .api
            .initialize(&request)
            .await
            .map_err(BookingError::InitializationFailed)?;

        #[cfg(feature = "telemetry")]
        tracing::info!(
            order_id = %intent.order_id,
            payment_types = intent.payment_types.len(),
            "Booking order initialized"
        );
        self.hooks.intent_created(&intent).await;
        Ok(intent)
    }

    fn select_payment_type<'a>(
        &self,
        intent: &'a BookingIntent,
    ) -> Result<&'a PaymentType, BookingError> {
        intent
            .payment_type(&self.config.required_payment_type)
            .ok_or_else(|| BookingError::NoPaymentTypeAvailable {
                order_id: intent.order_id.clone(),
                required: self.config.required_payment_type.clone(),
            })
    }

    /// Step 3: hands control to the caller's executor.
    async fn execute_payment<E>(
        &self,
        context: &PaymentContext,
        executor: &E,
    ) -> Result<PaymentProof, BookingError>
    where
        E: PaymentExecutor + ?Sized,
    {
        if let HookDecision::Abort { reason } = self.hooks.before_payment(context).await {
            return Err(BookingError::Aborted { reason });
        }

        let proof = executor
            .execute(context)
            .await
            .map_err(BookingError::PaymentExecutionFailed)?;

        #[cfg(feature = "telemetry")]
        tracing::info!(
            order_id = %context.order_id,
            signature = proof.signature().unwrap_or("-"),
            "Payment executed"
        );
        self.hooks.payment_executed(context, &proof).await;
        Ok(proof)
    }

    /// Step 4: confirms the order. Never retried.
    async fn finalize(
        &self,
        context: PaymentContext,
        proof: PaymentProof,
        guests: GuestSelection,
    ) -> Result<OrderId, BookingError> {
        let request = FinishRequest {
            order_id: context.order_id,
            upsell_data: Vec::new(),
            payment: proof,
            payment_type: context.payment_type,
            guests,
        };

        match self.api.finish(&request).await {
            Ok(()) => {
                #[cfg(feature = "telemetry")]
                tracing::info!(order_id = %request.order_id, "Booking finalized");
                self.hooks.finalized(&request.order_id).await;
                Ok(request.order_id)
            }
            Err(source) => {
                let FinishRequest {
                    order_id, payment, ..
                } = request;
                Err(BookingError::BookingFinalizationFailed {
                    order_id,
                    proof: payment,
                    source,
                })
            }
        }
    }
}

#[cfg(feature = "telemetry")]
fn log_failure(err: &BookingError) {
    if err.requires_reconciliation() {
        tracing::error!(stage = %err.stage(), error = %err, "Payment made but booking not confirmed");
    } else if err.funds_may_have_moved() {
        tracing::error!(stage = %err.stage(), error = %err, "Payment outcome unknown");
    } else {
        tracing::warn!(stage = %err.stage(), error = %err, "Booking attempt failed");
    }
}
