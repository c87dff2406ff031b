//! HTTP transport for the staybook booking API.
//!
//! [`BookingApiClient`] talks to the pricing and booking service over JSON
//! HTTP and implements [`staybook::BookingApi`], so it plugs directly into
//! [`staybook::BookingOrchestrator`].
//!
//! ```no_run
//! use staybook::BookingOrchestrator;
//! use staybook_http::{BookingApiClient, StaticAuthProvider};
//!
//! # fn main() -> Result<(), staybook_http::BookingClientError> {
//! let client = BookingApiClient::try_from("https://api.example.com/v1")?
//!     .with_auth(StaticAuthProvider::bearer("token")?);
//! let orchestrator = BookingOrchestrator::new(client);
//! # let _ = orchestrator;
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` spans around every request

pub mod auth;
pub mod client;
pub mod constants;
pub mod error;

pub use auth::{AuthHeaders, AuthProvider, CallbackAuthProvider, StaticAuthProvider};
pub use client::BookingApiClient;
pub use error::BookingClientError;
