//! Payment executor capability.
//!
//! The orchestrator never pays by itself. It hands a [`PaymentContext`] to a
//! caller-supplied [`PaymentExecutor`], which may show a wallet approval
//! dialog, run a card challenge, or submit a ledger transaction, and returns a
//! [`PaymentProof`]. The orchestrator imposes no timeout on this step.

use std::future::Future;

use crate::api::BoxFuture;
use crate::error::PaymentExecutionError;
use crate::proto::{OrderId, PaymentProof, PaymentType};

/// What the executor is asked to pay for.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentContext {
    /// Order opened by initialize.
    pub order_id: OrderId,
    /// Property being booked.
    pub property_id: String,
    /// Payment type selected from the booking intent.
    pub payment_type: PaymentType,
}

/// Produces proof of payment for an open booking order.
///
/// Implemented for any `Fn(&PaymentContext) -> impl Future` closure returning
/// an owned future, so simple executors can be written inline.
pub trait PaymentExecutor: Send + Sync {
    /// Executes the payment.
    ///
    /// Dropping the returned future before it resolves cancels the payment
    /// from the orchestrator's point of view.
    fn execute<'a>(
        &'a self,
        context: &'a PaymentContext,
    ) -> BoxFuture<'a, Result<PaymentProof, PaymentExecutionError>>;
}

impl<F, Fut> PaymentExecutor for F
where
    F: Fn(&PaymentContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PaymentProof, PaymentExecutionError>> + Send + 'static,
{
    fn execute<'a>(
        &'a self,
        context: &'a PaymentContext,
    ) -> BoxFuture<'a, Result<PaymentProof, PaymentExecutionError>> {
        Box::pin(self(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn context() -> PaymentContext {
        PaymentContext {
            order_id: OrderId::new("ord1"),
            property_id: "prop-1".to_owned(),
            payment_type: PaymentType::new("deposit"),
        }
    }

    #[tokio::test]
    async fn test_closure_executor() {
        let executor = |ctx: &PaymentContext| {
            let order = ctx.order_id.clone();
            async move {
                Ok::<_, PaymentExecutionError>(PaymentProof::on_chain(
                    format!("sig-{order}"),
                    Decimal::TEN,
                ))
            }
        };
        let proof = executor.execute(&context()).await.unwrap();
        assert_eq!(proof.signature(), Some("sig-ord1"));
    }

    #[tokio::test]
    async fn test_boxed_executor_propagates_error() {
        let executor: Box<dyn PaymentExecutor> = Box::new(|_: &PaymentContext| async {
            Err::<PaymentProof, _>(PaymentExecutionError::Cancelled)
        });
        let err = executor.execute(&context()).await.unwrap_err();
        assert!(matches!(err, PaymentExecutionError::Cancelled));
    }
}
