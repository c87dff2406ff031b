//! Error types for the booking pipeline.
//!
//! Every failure aborts the remaining steps and is returned to the caller as a
//! [`BookingError`]. Nothing is retried or recovered internally.

use std::fmt;

use crate::api::ApiError;
use crate::proto::{GuestSelectionError, OrderId, PaymentProof};

/// Pipeline stage at which a booking attempt stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStage {
    /// Input checks before any remote call.
    Validation,
    /// Pre-book price re-validation.
    PriceRevalidation,
    /// Booking order initialization.
    Initialization,
    /// Caller-supplied payment execution.
    Payment,
    /// Booking finalization with payment proof.
    Finalization,
}

impl fmt::Display for BookingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation",
            Self::PriceRevalidation => "price_revalidation",
            Self::Initialization => "initialization",
            Self::Payment => "payment",
            Self::Finalization => "finalization",
        })
    }
}

/// Errors returned by [`BookingOrchestrator::process_booking`](crate::BookingOrchestrator::process_booking).
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// The guest selection was rejected before any remote call.
    #[error("invalid guest selection: {0}")]
    InvalidGuestSelection(#[from] GuestSelectionError),

    /// The pre-book call itself failed.
    #[error("price revalidation failed: {0}")]
    PriceRevalidationFailed(#[source] ApiError),

    /// The price changed and no replacement rate can be paid for.
    #[error("room no longer available: price changed and no replacement rate offers a payment type")]
    RateUnavailable,

    /// The initialize call itself failed.
    #[error("booking initialization failed: {0}")]
    InitializationFailed(#[source] ApiError),

    /// The order does not offer the required payment type.
    #[error("no `{required}` payment type available for order {order_id}")]
    NoPaymentTypeAvailable {
        /// Order opened by initialize.
        order_id: OrderId,
        /// Payment type the policy requires.
        required: String,
    },

    /// A before-payment hook vetoed the attempt.
    #[error("booking aborted before payment: {reason}")]
    Aborted {
        /// Reason given by the hook.
        reason: String,
    },

    /// The payment executor failed, was rejected, or was cancelled.
    #[error("payment execution failed: {0}")]
    PaymentExecutionFailed(#[source] PaymentExecutionError),

    /// Finish failed after a payment proof was obtained.
    ///
    /// Funds may have moved without a confirmed booking. This must be shown to
    /// the user as requiring support and must never be retried automatically.
    #[error("booking finalization failed for order {order_id} after payment: {source}")]
    BookingFinalizationFailed {
        /// Order that could not be finalized.
        order_id: OrderId,
        /// Proof of the payment that was made.
        proof: PaymentProof,
        /// Underlying API failure.
        #[source]
        source: ApiError,
    },
}

impl BookingError {
    /// Returns the stage at which the attempt stopped.
    #[must_use]
    pub const fn stage(&self) -> BookingStage {
        match self {
            Self::InvalidGuestSelection(_) => BookingStage::Validation,
            Self::PriceRevalidationFailed(_) | Self::RateUnavailable => {
                BookingStage::PriceRevalidation
            }
            Self::InitializationFailed(_) | Self::NoPaymentTypeAvailable { .. } => {
                BookingStage::Initialization
            }
            Self::Aborted { .. } | Self::PaymentExecutionFailed(_) => BookingStage::Payment,
            Self::BookingFinalizationFailed { .. } => BookingStage::Finalization,
        }
    }

    /// Returns `true` if a payment was made but the booking was not confirmed.
    #[must_use]
    pub const fn requires_reconciliation(&self) -> bool {
        matches!(self, Self::BookingFinalizationFailed { .. })
    }

    /// Returns `true` unless the attempt is known to have stopped before any
    /// funds could move.
    ///
    /// Besides a failed finish, this covers a payment step whose outcome is
    /// unknown (see [`PaymentExecutionError::funds_may_have_moved`]).
    #[must_use]
    pub const fn funds_may_have_moved(&self) -> bool {
        match self {
            Self::BookingFinalizationFailed { .. } => true,
            Self::PaymentExecutionFailed(err) => err.funds_may_have_moved(),
            _ => false,
        }
    }

    /// Returns `true` if the user has to start over from a new search.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RateUnavailable | Self::NoPaymentTypeAvailable { .. }
        )
    }
}

/// Failure of a [`PaymentExecutor`](crate::PaymentExecutor).
#[derive(Debug, thiserror::Error)]
pub enum PaymentExecutionError {
    /// The payer declined (wallet approval dialog, card challenge).
    #[error("payment rejected: {0}")]
    Rejected(String),

    /// The payment was cancelled before a proof was produced.
    #[error("payment cancelled")]
    Cancelled,

    /// The amount to pay is missing or cannot be represented.
    #[error("invalid payment amount: {0}")]
    InvalidAmount(String),

    /// Building the payment failed before anything was signed.
    #[error("payment preparation failed: {0}")]
    Preparation(String),

    /// Signing failed; nothing was submitted.
    #[error("payment signing failed: {0}")]
    Signing(String),

    /// Submission failed or its outcome is unknown.
    #[error("payment submission failed: {0}")]
    Submission(String),

    /// Any other executor failure.
    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PaymentExecutionError {
    /// Returns `true` unless the failure is known to have happened before any
    /// funds could move.
    ///
    /// Retrying the payment step is only safe when this returns `false`.
    #[must_use]
    pub const fn funds_may_have_moved(&self) -> bool {
        matches!(self, Self::Submission(_) | Self::Other(_))
    }
}
