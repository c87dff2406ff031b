//! Solana stablecoin payments for staybook.
//!
//! [`SolanaPaymentExecutor`] implements [`staybook::PaymentExecutor`] by
//! transferring SPL tokens (Token or Token-2022) from the payer to the
//! property's recipient wallet:
//!
//! 1. create the payer's and the recipient's associated token accounts if
//!    missing (idempotent)
//! 2. `transfer_checked` the quoted amount, converted to base units
//! 3. compile a v0 message and hand it to a [`LedgerClient`] for signing and
//!    submission, pinned to a minimum context slot
//!
//! The resulting transaction signature becomes the
//! [`PaymentProof::OnChain`](staybook::proto::PaymentProof::OnChain) proof.
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` spans and events

pub mod chain;
pub mod executor;
pub mod instructions;
pub mod ledger;

pub use chain::{TokenDeployment, TokenProgram};
pub use executor::{DEFAULT_CURRENCY, SolanaPaymentExecutor};
pub use instructions::InstructionError;
pub use ledger::{LedgerClient, LedgerError, RpcLedgerClient};
