//! Orchestrator policy configuration.

use serde::{Deserialize, Serialize};

/// Payment type required when none is configured.
pub const DEFAULT_REQUIRED_PAYMENT_TYPE: &str = "deposit";

/// Policy applied by [`BookingOrchestrator`](crate::BookingOrchestrator).
///
/// # Example
///
/// ```rust
/// use staybook::config::OrchestratorConfig;
///
/// let config: OrchestratorConfig = serde_json::from_value(serde_json::json!({
///     "requiredPaymentType": "now",
///     "priceIncreasePercent": 5,
/// }))
/// .unwrap();
/// assert_eq!(config.required_payment_type, "now");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
    /// Payment type that must be offered by the booking intent
    /// (default: `"deposit"`).
    #[serde(default = "default_required_payment_type")]
    pub required_payment_type: String,

    /// Price increase, in percent, tolerated by pre-book before it reports a
    /// change. `None` lets the server apply its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_increase_percent: Option<u8>,
}

fn default_required_payment_type() -> String {
    DEFAULT_REQUIRED_PAYMENT_TYPE.to_owned()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            required_payment_type: default_required_payment_type(),
            price_increase_percent: None,
        }
    }
}

impl OrchestratorConfig {
    /// Sets the required payment type.
    #[must_use]
    pub fn with_required_payment_type(mut self, kind: impl Into<String>) -> Self {
        self.required_payment_type = kind.into();
        self
    }

    /// Sets the tolerated price increase.
    #[must_use]
    pub const fn with_price_increase_percent(mut self, percent: u8) -> Self {
        self.price_increase_percent = Some(percent);
        self
    }
}
