//! Wire format types for the booking API.
//!
//! All request and response bodies use `camelCase` field names. Types that
//! the API returns with fields this crate does not interpret (payment types in
//! particular) keep those fields so they can be sent back unchanged.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Opaque, server-issued reference to a priced, time-limited room offer.
///
/// The server may supersede a hash with a new one when the price changes
/// during pre-book; the hash itself is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookHash(String);

impl BookHash {
    /// Creates a book hash from its server representation.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookHash {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BookHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Server-assigned booking order identifier.
///
/// The booking API is inconsistent about whether order ids are strings or
/// integers. Both are accepted, and the original representation is kept so the
/// id is echoed back exactly as it was received.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId {
    value: String,
    numeric: bool,
}

impl OrderId {
    /// Creates a string order id.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            numeric: false,
        }
    }

    /// Returns the order id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns `true` if the server issued this id as an integer.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.numeric
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self {
            value: value.to_string(),
            numeric: true,
        }
    }
}

impl Serialize for OrderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.numeric
            && let Ok(n) = self.value.parse::<u64>()
        {
            return serializer.serialize_u64(n);
        }
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderIdVisitor;

        impl Visitor<'_> for OrderIdVisitor {
            type Value = OrderId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or non-negative integer order id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<OrderId, E> {
                if v.is_empty() {
                    return Err(E::custom("order id must not be empty"));
                }
                Ok(OrderId::new(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<OrderId, E> {
                Ok(OrderId::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<OrderId, E> {
                u64::try_from(v)
                    .map(OrderId::from)
                    .map_err(|_| E::custom("order id must be a non-negative integer"))
            }
        }

        deserializer.deserialize_any(OrderIdVisitor)
    }
}

/// An amount quoted by the booking API.
///
/// The API may send amounts as JSON numbers or as decimal strings. The parsed
/// value is exposed through [`QuotedAmount::value`] while the received form is
/// kept and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedAmount {
    value: Decimal,
    raw: Value,
}

impl QuotedAmount {
    /// Returns the amount in display units.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the amount as it appears on the wire.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

impl From<Decimal> for QuotedAmount {
    fn from(value: Decimal) -> Self {
        Self {
            value,
            raw: Value::String(value.to_string()),
        }
    }
}

impl fmt::Display for QuotedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

impl Serialize for QuotedAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QuotedAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let text = match &raw {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_owned(),
            other => {
                return Err(de::Error::custom(format!(
                    "expected a decimal number or string, got {other}"
                )));
            }
        };
        let value = Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|e| de::Error::custom(format!("invalid amount {text:?}: {e}")))?;
        Ok(Self { value, raw })
    }
}

/// A payment type offered for a rate or an order (e.g. `"deposit"`, `"now"`).
///
/// Only `type`, `amount` and `currencyCode` are interpreted; every other field
/// is preserved in [`PaymentType::extra`] and sent back on finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentType {
    /// Payment type discriminator.
    #[serde(rename = "type")]
    pub kind: String,

    /// Amount due for this payment type, in display units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<QuotedAmount>,

    /// ISO currency code of [`Self::amount`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,

    /// Fields not interpreted by this crate.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentType {
    /// Creates a payment type with only its discriminator set.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            amount: None,
            currency_code: None,
            extra: Map::new(),
        }
    }

    /// Sets the amount and currency.
    #[must_use]
    pub fn with_amount(mut self, amount: Decimal, currency_code: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self.currency_code = Some(currency_code.into());
        self
    }
}

/// Payment options attached to a rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOptions {
    /// Payment types the rate can be paid with.
    #[serde(default)]
    pub payment_types: Vec<PaymentType>,
}

/// Body of a pre-book request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebookRequest {
    /// The book hash to re-validate.
    pub hash: BookHash,

    /// Maximum price increase, in percent, the caller accepts without the
    /// rate being reported as changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_increase_percent: Option<u8>,
}

/// Summary of what changed between the quote and the pre-book check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChanges {
    /// `true` if the quoted price is no longer valid.
    #[serde(default)]
    pub price_changed: bool,
}

/// A candidate rate returned by pre-book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebookRate {
    /// Book hash identifying this candidate.
    pub book_hash: BookHash,

    /// How the candidate can be paid.
    #[serde(default)]
    pub payment_options: PaymentOptions,
}

impl PrebookRate {
    /// Returns `true` if the rate exposes at least one payment type.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        !self.payment_options.payment_types.is_empty()
    }
}

/// Result of a pre-book price re-validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebookResponse {
    /// What changed since the quote.
    #[serde(default)]
    pub changes: PriceChanges,

    /// Candidate rates, possibly re-quoted.
    #[serde(default)]
    pub rates: Vec<PrebookRate>,
}

impl PrebookResponse {
    /// Resolves the book hash that the rest of the booking must use.
    ///
    /// Returns `original` when the price did not change, otherwise the hash of
    /// the first candidate exposing a payment type. `None` means the room can
    /// no longer be booked.
    #[must_use]
    pub fn effective_hash(&self, original: &BookHash) -> Option<BookHash> {
        if !self.changes.price_changed {
            return Some(original.clone());
        }
        self.rates
            .iter()
            .find(|rate| rate.is_payable())
            .map(|rate| rate.book_hash.clone())
    }
}

/// Body of a booking initialization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    /// Property being booked.
    pub property_id: String,
    /// Effective book hash after pre-book.
    pub hash: BookHash,
}

/// An open booking order, created once per booking attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingIntent {
    /// Server-assigned order id.
    pub order_id: OrderId,

    /// Payment types the order accepts.
    #[serde(default)]
    pub payment_types: Vec<PaymentType>,
}

impl BookingIntent {
    /// Returns the payment type whose discriminator equals `kind`.
    #[must_use]
    pub fn payment_type(&self, kind: &str) -> Option<&PaymentType> {
        self.payment_types.iter().find(|p| p.kind == kind)
    }
}

/// Proof that a payment was made, consumed once by the finish step.
///
/// Serialized with an explicit `method` tag so the server never has to guess
/// which shape it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentProof {
    /// A token transfer submitted to a ledger.
    OnChain {
        /// Transaction signature returned by the ledger.
        signature: String,
        /// Amount transferred, in display units, as a decimal string.
        amount: Decimal,
    },
    /// A card payment confirmed by a payment provider.
    Fiat {
        /// Provider-specific confirmation object.
        confirmation: Value,
    },
}

impl PaymentProof {
    /// Creates an on-chain payment proof.
    pub fn on_chain(signature: impl Into<String>, amount: Decimal) -> Self {
        Self::OnChain {
            signature: signature.into(),
            amount,
        }
    }

    /// Creates a fiat payment proof.
    #[must_use]
    pub const fn fiat(confirmation: Value) -> Self {
        Self::Fiat { confirmation }
    }

    /// Returns the ledger signature for on-chain proofs.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        match self {
            Self::OnChain { signature, .. } => Some(signature),
            Self::Fiat { .. } => None,
        }
    }
}

/// Named guest staying in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestIdentity {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl GuestIdentity {
    /// Creates a guest identity.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Oldest age still booked as a child.
pub const MAX_CHILD_AGE: u8 = 17;

/// Guests and room occupancy for a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSelection {
    /// Number of adults, at least one.
    pub adults: u32,

    /// Ages of the children.
    #[serde(default)]
    pub children: Vec<u8>,

    /// Optional named guests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guests: Vec<GuestIdentity>,
}

/// Reasons a [`GuestSelection`] is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuestSelectionError {
    /// No adult in the selection.
    #[error("at least one adult is required")]
    NoAdults,
    /// A child age is above [`MAX_CHILD_AGE`].
    #[error("child age {0} exceeds {MAX_CHILD_AGE}")]
    ChildAgeOutOfRange(u8),
    /// More named guests than occupants.
    #[error("{named} named guests for {occupants} occupants")]
    TooManyNamedGuests {
        /// Number of named guests.
        named: usize,
        /// Adults plus children.
        occupants: usize,
    },
}

impl GuestSelection {
    /// Creates a selection of `adults` adults and no children.
    #[must_use]
    pub const fn new(adults: u32) -> Self {
        Self {
            adults,
            children: Vec::new(),
            guests: Vec::new(),
        }
    }

    /// Adds a child of the given age.
    #[must_use]
    pub fn with_child(mut self, age: u8) -> Self {
        self.children.push(age);
        self
    }

    /// Adds a named guest.
    #[must_use]
    pub fn with_guest(mut self, guest: GuestIdentity) -> Self {
        self.guests.push(guest);
        self
    }

    /// Checks the selection without modifying it.
    ///
    /// # Errors
    ///
    /// Returns [`GuestSelectionError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), GuestSelectionError> {
        if self.adults == 0 {
            return Err(GuestSelectionError::NoAdults);
        }
        if let Some(age) = self.children.iter().find(|age| **age > MAX_CHILD_AGE) {
            return Err(GuestSelectionError::ChildAgeOutOfRange(*age));
        }
        let occupants = self.adults as usize + self.children.len();
        if self.guests.len() > occupants {
            return Err(GuestSelectionError::TooManyNamedGuests {
                named: self.guests.len(),
                occupants,
            });
        }
        Ok(())
    }
}

/// Body of a finish request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRequest {
    /// Order opened by initialize.
    pub order_id: OrderId,
    /// Upsell selections; always empty.
    pub upsell_data: Vec<Value>,
    /// Proof produced by the payment executor.
    pub payment: PaymentProof,
    /// Payment type selected from the booking intent.
    pub payment_type: PaymentType,
    /// Guests, exactly as supplied by the caller.
    pub guests: GuestSelection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prebook_response_deserialize() {
        let response: PrebookResponse = serde_json::from_value(json!({
            "changes": { "priceChanged": true },
            "rates": [
                { "bookHash": "h-1", "paymentOptions": { "paymentTypes": [] } },
                {
                    "bookHash": "h-2",
                    "paymentOptions": {
                        "paymentTypes": [{ "type": "deposit", "amount": "120.50", "currencyCode": "USD" }]
                    }
                }
            ]
        }))
        .unwrap();

        assert!(response.changes.price_changed);
        assert_eq!(response.rates.len(), 2);
        assert!(!response.rates[0].is_payable());
        assert!(response.rates[1].is_payable());
        assert_eq!(
            response.rates[1].payment_options.payment_types[0]
                .amount
                .as_ref()
                .map(QuotedAmount::value),
            Some(Decimal::from_str("120.50").unwrap())
        );
    }

    #[test]
    fn test_prebook_response_missing_fields_default() {
        let response: PrebookResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!response.changes.price_changed);
        assert!(response.rates.is_empty());
    }

    #[test]
    fn test_effective_hash_unchanged_keeps_original() {
        let response = PrebookResponse {
            changes: PriceChanges {
                price_changed: false,
            },
            rates: vec![PrebookRate {
                book_hash: BookHash::new("other"),
                payment_options: PaymentOptions {
                    payment_types: vec![PaymentType::new("deposit")],
                },
            }],
        };
        let original = BookHash::new("abc");
        assert_eq!(response.effective_hash(&original), Some(original));
    }

    #[test]
    fn test_effective_hash_changed_picks_first_payable() {
        let response = PrebookResponse {
            changes: PriceChanges {
                price_changed: true,
            },
            rates: vec![
                PrebookRate {
                    book_hash: BookHash::new("unpayable"),
                    payment_options: PaymentOptions::default(),
                },
                PrebookRate {
                    book_hash: BookHash::new("fresh"),
                    payment_options: PaymentOptions {
                        payment_types: vec![PaymentType::new("now")],
                    },
                },
            ],
        };
        assert_eq!(
            response.effective_hash(&BookHash::new("stale")),
            Some(BookHash::new("fresh"))
        );
    }

    #[test]
    fn test_effective_hash_changed_without_payable_rate() {
        let response = PrebookResponse {
            changes: PriceChanges {
                price_changed: true,
            },
            rates: vec![PrebookRate {
                book_hash: BookHash::new("unpayable"),
                payment_options: PaymentOptions::default(),
            }],
        };
        assert_eq!(response.effective_hash(&BookHash::new("stale")), None);
    }

    #[test]
    fn test_order_id_keeps_numeric_representation() {
        let id: OrderId = serde_json::from_value(json!(42_u64)).unwrap();
        assert!(id.is_numeric());
        assert_eq!(id.as_str(), "42");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!(42));

        let id: OrderId = serde_json::from_value(json!("ord1")).unwrap();
        assert!(!id.is_numeric());
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("ord1"));
    }

    #[test]
    fn test_order_id_rejects_invalid() {
        assert!(serde_json::from_value::<OrderId>(json!("")).is_err());
        assert!(serde_json::from_value::<OrderId>(json!(-3)).is_err());
        assert!(serde_json::from_value::<OrderId>(json!(null)).is_err());
    }

    #[test]
    fn test_payment_type_preserves_unknown_fields() {
        let value = json!({
            "type": "deposit",
            "amount": "100",
            "currencyCode": "USD",
            "isNeedCreditCardData": false,
            "recommendedPrice": null
        });
        let payment_type: PaymentType = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(payment_type.kind, "deposit");
        assert_eq!(payment_type.extra.len(), 2);
        assert_eq!(serde_json::to_value(&payment_type).unwrap(), value);
    }

    #[test]
    fn test_payment_type_echoes_numeric_amount() {
        let value = json!({ "type": "deposit", "amount": 120.5, "currencyCode": "USD" });
        let payment_type: PaymentType = serde_json::from_value(value.clone()).unwrap();

        assert_eq!(
            payment_type.amount.as_ref().map(QuotedAmount::value),
            Some(Decimal::new(1205, 1))
        );
        assert_eq!(serde_json::to_value(&payment_type).unwrap(), value);

        let integral: PaymentType =
            serde_json::from_value(json!({ "type": "now", "amount": 300 })).unwrap();
        assert_eq!(serde_json::to_value(&integral).unwrap()["amount"], json!(300));
    }

    #[test]
    fn test_quoted_amount_rejects_non_decimal() {
        assert!(serde_json::from_value::<QuotedAmount>(json!("ten")).is_err());
        assert!(serde_json::from_value::<QuotedAmount>(json!(true)).is_err());
        assert_eq!(
            serde_json::from_value::<QuotedAmount>(json!(" 12.30 "))
                .unwrap()
                .value(),
            Decimal::new(1230, 2)
        );
    }

    #[test]
    fn test_payment_proof_is_tagged() {
        let proof = PaymentProof::on_chain("sig1", Decimal::from(100));
        assert_eq!(
            serde_json::to_value(&proof).unwrap(),
            json!({ "method": "on_chain", "signature": "sig1", "amount": "100" })
        );
        assert_eq!(proof.signature(), Some("sig1"));

        let fiat = PaymentProof::fiat(json!({ "id": "pi_123", "status": "succeeded" }));
        assert_eq!(
            serde_json::to_value(&fiat).unwrap(),
            json!({ "method": "fiat", "confirmation": { "id": "pi_123", "status": "succeeded" } })
        );
        assert_eq!(fiat.signature(), None);
    }

    #[test]
    fn test_payment_proof_requires_tag() {
        let untagged = json!({ "signature": "sig1", "amount": "1" });
        assert!(serde_json::from_value::<PaymentProof>(untagged).is_err());
    }

    #[test]
    fn test_guest_selection_validate() {
        assert!(GuestSelection::new(2).with_child(4).validate().is_ok());
        assert_eq!(
            GuestSelection::new(0).validate(),
            Err(GuestSelectionError::NoAdults)
        );
        assert_eq!(
            GuestSelection::new(1).with_child(18).validate(),
            Err(GuestSelectionError::ChildAgeOutOfRange(18))
        );
        let crowded = GuestSelection::new(1)
            .with_guest(GuestIdentity::new("Ada", "Lovelace"))
            .with_guest(GuestIdentity::new("Alan", "Turing"));
        assert_eq!(
            crowded.validate(),
            Err(GuestSelectionError::TooManyNamedGuests {
                named: 2,
                occupants: 1
            })
        );
    }

    #[test]
    fn test_finish_request_wire_shape() {
        let request = FinishRequest {
            order_id: OrderId::from(7_u64),
            upsell_data: vec![],
            payment: PaymentProof::on_chain("sig", Decimal::from(5)),
            payment_type: PaymentType::new("deposit"),
            guests: GuestSelection::new(2).with_child(3),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["orderId"], json!(7));
        assert_eq!(value["upsellData"], json!([]));
        assert_eq!(value["paymentType"]["type"], json!("deposit"));
        assert_eq!(value["guests"], json!({ "adults": 2, "children": [3] }));
    }
}
