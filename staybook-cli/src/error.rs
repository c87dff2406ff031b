//! Command-line client errors.

use std::path::PathBuf;
use std::process::ExitCode;

use staybook::BookingError;
use staybook_http::BookingClientError;

/// Errors that stop the command-line client.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for [`CliConfig`](crate::config::CliConfig).
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    /// A required setting is absent.
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    /// A setting has an invalid value.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Setting name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// The payer keypair could not be loaded.
    #[error("invalid keypair file {}: {reason}", path.display())]
    Keypair {
        /// Keypair file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
    /// The booking API client could not be built.
    #[error(transparent)]
    Client(#[from] BookingClientError),
    /// The booking attempt failed.
    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl CliError {
    /// Process exit status: `3` when funds may have moved without a
    /// confirmed booking, `2` for configuration problems, `1` otherwise.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Booking(err) if err.funds_may_have_moved() => 3,
            Self::Booking(_) | Self::Client(_) => 1,
            Self::Io { .. }
            | Self::Toml(_)
            | Self::Missing(_)
            | Self::Invalid { .. }
            | Self::Keypair { .. } => 2,
        }
    }

    /// Process exit code for [`exit_status`](Self::exit_status).
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}
