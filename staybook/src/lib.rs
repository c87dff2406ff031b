#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the staybook booking-payment flow.
//!
//! This crate drives a property booking from a previously quoted rate to a
//! confirmed order. It is transport-agnostic: the booking API and the payment
//! method are plugged in through traits, with HTTP and Solana implementations
//! provided by separate crates.
//!
//! # Overview
//!
//! A booking runs as a strictly ordered pipeline:
//!
//! 1. **Pre-book** re-validates the quoted price and may swap in a new book hash
//! 2. **Initialize** opens an order and lists the acceptable payment types
//! 3. **Pay** hands control to a caller-supplied [`PaymentExecutor`](executor::PaymentExecutor)
//! 4. **Finish** confirms the order with the resulting payment proof
//!
//! Any failure aborts the remaining steps. A failure in step 4 is reported as
//! [`BookingError::BookingFinalizationFailed`](error::BookingError::BookingFinalizationFailed)
//! because funds may already have moved.
//!
//! # Modules
//!
//! - [`amount`] - Conversion between display amounts and token base units
//! - [`api`] - The booking API seam ([`BookingApi`](api::BookingApi))
//! - [`config`] - Orchestrator policy configuration
//! - [`error`] - Error taxonomy for the booking pipeline
//! - [`executor`] - Payment executor capability
//! - [`hooks`] - Lifecycle hooks around the pipeline
//! - [`orchestrator`] - The booking pipeline itself
//! - [`proto`] - Wire format types
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation of the pipeline

pub mod amount;
pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod orchestrator;
pub mod proto;

pub use api::{ApiError, BookingApi, BoxFuture};
pub use error::{BookingError, BookingStage, PaymentExecutionError};
pub use executor::{PaymentContext, PaymentExecutor};
pub use orchestrator::BookingOrchestrator;
