//! Lifecycle hooks for the booking pipeline.
//!
//! Hooks observe a booking attempt at each step boundary:
//!
//! - **Price changed**: pre-book swapped the book hash
//! - **Intent created**: initialize opened an order
//! - **Before payment**: last chance to abort before any funds can move
//! - **Payment executed**: the executor produced a proof
//! - **Finalized**: the order was confirmed
//! - **Failure**: the attempt stopped with an error
//!
//! All methods have default no-op implementations; implement only the hooks
//! you need. Unlike facilitator-style hooks, booking hooks can never recover
//! from a failure or substitute a result. Only [`BookingHooks::before_payment`]
//! can change the outcome, and only by aborting.

use std::fmt::Debug;

use crate::api::BoxFuture;
use crate::error::BookingError;
use crate::executor::PaymentContext;
use crate::proto::{BookHash, BookingIntent, OrderId, PaymentProof};

/// Decision returned by [`BookingHooks::before_payment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    /// Let the payment proceed.
    Continue,
    /// Stop the attempt before the executor runs.
    Abort {
        /// Human-readable reason, surfaced in [`BookingError::Aborted`].
        reason: String,
    },
}

/// Observer of booking attempts.
///
/// Hooks run in registration order and are awaited inline, so a slow hook
/// delays the pipeline.
pub trait BookingHooks: Send + Sync {
    /// Called when pre-book reported a price change and a replacement hash was adopted.
    fn on_price_changed<'a>(
        &'a self,
        _original: &'a BookHash,
        _effective: &'a BookHash,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }

    /// Called after initialize opened an order.
    fn on_intent_created<'a>(&'a self, _intent: &'a BookingIntent) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }

    /// Called right before the payment executor runs.
    ///
    /// The first hook returning [`HookDecision::Abort`] wins; later hooks and
    /// the executor are skipped.
    fn before_payment<'a>(&'a self, _context: &'a PaymentContext) -> BoxFuture<'a, HookDecision> {
        Box::pin(async { HookDecision::Continue })
    }

    /// Called after the executor produced a proof, before finish.
    fn on_payment_executed<'a>(
        &'a self,
        _context: &'a PaymentContext,
        _proof: &'a PaymentProof,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }

    /// Called after finish confirmed the order.
    fn on_finalized<'a>(&'a self, _order_id: &'a OrderId) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }

    /// Called once for any failed attempt, with the error about to be returned.
    ///
    /// This is where a [`BookingError::BookingFinalizationFailed`] should be
    /// recorded for manual reconciliation.
    fn on_failure<'a>(&'a self, _error: &'a BookingError) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}

/// An ordered list of hooks, invoked as one.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn BookingHooks>>,
}

impl Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &format!("[{} hooks]", self.hooks.len()))
            .finish()
    }
}

impl HookChain {
    /// Appends a hook.
    pub fn push(&mut self, hook: impl BookingHooks + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Returns the number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hook is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) async fn price_changed(&self, original: &BookHash, effective: &BookHash) {
        for hook in &self.hooks {
            hook.on_price_changed(original, effective).await;
        }
    }

    pub(crate) async fn intent_created(&self, intent: &BookingIntent) {
        for hook in &self.hooks {
            hook.on_intent_created(intent).await;
        }
    }

    pub(crate) async fn before_payment(&self, context: &PaymentContext) -> HookDecision {
        for hook in &self.hooks {
            if let abort @ HookDecision::Abort { .. } = hook.before_payment(context).await {
                return abort;
            }
        }
        HookDecision::Continue
    }

    pub(crate) async fn payment_executed(&self, context: &PaymentContext, proof: &PaymentProof) {
        for hook in &self.hooks {
            hook.on_payment_executed(context, proof).await;
        }
    }

    pub(crate) async fn finalized(&self, order_id: &OrderId) {
        for hook in &self.hooks {
            hook.on_finalized(order_id).await;
        }
    }

    pub(crate) async fn failure(&self, error: &BookingError) {
        for hook in &self.hooks {
            hook.on_failure(error).await;
        }
    }
}
