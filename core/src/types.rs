//! Voucher data model and redemption inputs.
//!
//! # Design
//! Every voucher field is an `Option` that is skipped when unset, so the
//! wire payload contains exactly the fields the caller chose, never `null`.
//! The discount is a tagged enum: only one variant can exist at a time.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Timestamp layout used for voucher dates: numeric offset, never `Z`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// A voucher description as sent to (and echoed by) the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redemption: Option<RedemptionLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// The discount a voucher grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Discount {
    /// Fixed amount off, in minor currency units (cents).
    Amount { amount_off: i64 },
    Percent { percent_off: f64 },
    /// A quantity of some unit (e.g. "time", "pcs") off.
    Unit { unit_off: f64, unit_type: String },
}

impl Discount {
    /// An amount discount from a major-unit value: `5.0` becomes `500`.
    pub fn amount(major_units: f64) -> Self {
        let amount_off = (major_units * 100.0).round() as i64;
        Discount::Amount { amount_off }
    }
}

/// Caps how many times a voucher can be redeemed in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionLimit {
    pub quantity: u64,
}

/// A voucher date: either already formatted by the caller, or a structured
/// timestamp rendered with [`DATE_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue(String);

impl DateValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DateValue {
    fn from(value: &str) -> Self {
        DateValue(value.to_string())
    }
}

impl From<String> for DateValue {
    fn from(value: String) -> Self {
        DateValue(value)
    }
}

impl<Tz> From<DateTime<Tz>> for DateValue
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    fn from(value: DateTime<Tz>) -> Self {
        DateValue(value.format(DATE_FORMAT).to_string())
    }
}

/// Midnight UTC of the given day.
impl From<NaiveDate> for DateValue {
    fn from(value: NaiveDate) -> Self {
        DateValue::from(value.and_time(NaiveTime::default()).and_utc())
    }
}

/// A voucher code plus arbitrary extra fields (customer, order, metadata)
/// that accompany a redemption.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedemptionContext {
    pub voucher: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RedemptionContext {
    pub fn new(voucher: impl Into<String>) -> Self {
        Self {
            voucher: voucher.into(),
            fields: Map::new(),
        }
    }

    /// Add an extra field. A string `voucher` field replaces the code to
    /// redeem instead of being stored.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        match (key.into(), value.into()) {
            (key, Value::String(code)) if key == "voucher" => self.voucher = code,
            (key, value) => {
                self.fields.insert(key, value);
            }
        }
        self
    }
}

impl TryFrom<Value> for RedemptionContext {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = value else {
            return Err(ApiError::InvalidRedeemContext(
                "expected a JSON object".to_string(),
            ));
        };
        match fields.remove("voucher") {
            Some(Value::String(voucher)) => Ok(Self { voucher, fields }),
            Some(other) => Err(ApiError::InvalidRedeemContext(format!(
                "`voucher` must be a string, got {other}"
            ))),
            None => Err(ApiError::InvalidRedeemContext(
                "missing `voucher` key".to_string(),
            )),
        }
    }
}

/// What to redeem: a bare code, or a code with extra context fields.
#[derive(Debug, Clone, PartialEq)]
pub enum RedeemTarget {
    Code(String),
    Context(RedemptionContext),
}

impl RedeemTarget {
    pub fn code(&self) -> &str {
        match self {
            RedeemTarget::Code(code) => code,
            RedeemTarget::Context(ctx) => &ctx.voucher,
        }
    }

    /// The request body: context fields without the `voucher` key, or
    /// nothing when there are no fields to send.
    pub fn body(&self) -> Option<Value> {
        let RedeemTarget::Context(ctx) = self else {
            return None;
        };
        let mut fields = ctx.fields.clone();
        fields.remove("voucher");
        (!fields.is_empty()).then_some(Value::Object(fields))
    }
}

impl From<&str> for RedeemTarget {
    fn from(code: &str) -> Self {
        RedeemTarget::Code(code.to_string())
    }
}

impl From<String> for RedeemTarget {
    fn from(code: String) -> Self {
        RedeemTarget::Code(code)
    }
}

impl From<RedemptionContext> for RedeemTarget {
    fn from(ctx: RedemptionContext) -> Self {
        RedeemTarget::Context(ctx)
    }
}
