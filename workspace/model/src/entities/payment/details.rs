use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Typed view of a payment's `payment_details` bag.
///
/// The reconciliation procedure records what it did here at creation time
/// (`original_amount`, `credit_applied`, `remaining_amount`,
/// `new_credit_balance`) and at status-change time (`verified_amount`,
/// `total_verified`). Any other keys supplied by the caller are kept in
/// `extra` and written back untouched.
///
/// The bag is an audit trail, not a source of truth. The only value read back
/// by reconciliation is `credit_applied`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_applied: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_credit_balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_verified: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentDetails {
    /// Parse a stored or caller-supplied bag. `null` yields an empty bag;
    /// anything that is not a JSON object is an error.
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => serde_json::from_value(value.clone()),
            other => Err(serde::de::Error::custom(format!(
                "payment_details must be an object, got {}",
                other
            ))),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Credit drawn from the receipt when the payment was created.
    pub fn credit_applied(&self) -> Decimal {
        self.credit_applied.unwrap_or(Decimal::ZERO)
    }
}
