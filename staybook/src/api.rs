//! The booking API seam.
//!
//! [`BookingApi`] is the contract the orchestrator needs from the pricing and
//! booking service. `staybook-http` implements it over HTTP; tests implement
//! it in memory.

use std::future::Future;
use std::pin::Pin;

use crate::proto::{
    BookingIntent, FinishRequest, InitializeRequest, PrebookRequest, PrebookResponse,
};

/// A boxed, `Send` future borrowing for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased error returned by [`BookingApi`] implementations.
pub type ApiError = Box<dyn std::error::Error + Send + Sync>;

/// Pricing and booking service used by the orchestrator.
///
/// Each method is a single request/response exchange. Implementations must
/// not retry `finish` on their own: a retried finish can confirm the same
/// payment twice.
pub trait BookingApi: Send + Sync {
    /// Re-validates a quoted rate.
    fn prebook<'a>(
        &'a self,
        request: &'a PrebookRequest,
    ) -> BoxFuture<'a, Result<PrebookResponse, ApiError>>;

    /// Opens a booking order for a property and book hash.
    fn initialize<'a>(
        &'a self,
        request: &'a InitializeRequest,
    ) -> BoxFuture<'a, Result<BookingIntent, ApiError>>;

    /// Confirms an order with proof of payment.
    fn finish<'a>(&'a self, request: &'a FinishRequest) -> BoxFuture<'a, Result<(), ApiError>>;
}

impl<T: BookingApi + ?Sized> BookingApi for &T {
    fn prebook<'a>(
        &'a self,
        request: &'a PrebookRequest,
    ) -> BoxFuture<'a, Result<PrebookResponse, ApiError>> {
        (**self).prebook(request)
    }

    fn initialize<'a>(
        &'a self,
        request: &'a InitializeRequest,
    ) -> BoxFuture<'a, Result<BookingIntent, ApiError>> {
        (**self).initialize(request)
    }

    fn finish<'a>(&'a self, request: &'a FinishRequest) -> BoxFuture<'a, Result<(), ApiError>> {
        (**self).finish(request)
    }
}

impl<T: BookingApi + ?Sized> BookingApi for std::sync::Arc<T> {
    fn prebook<'a>(
        &'a self,
        request: &'a PrebookRequest,
    ) -> BoxFuture<'a, Result<PrebookResponse, ApiError>> {
        (**self).prebook(request)
    }

    fn initialize<'a>(
        &'a self,
        request: &'a InitializeRequest,
    ) -> BoxFuture<'a, Result<BookingIntent, ApiError>> {
        (**self).initialize(request)
    }

    fn finish<'a>(&'a self, request: &'a FinishRequest) -> BoxFuture<'a, Result<(), ApiError>> {
        (**self).finish(request)
    }
}
