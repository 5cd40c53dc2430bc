//! Query filters for the list endpoints.
//!
//! A `Filter` keeps `(key, Option<value>)` pairs in insertion order. Keys
//! whose value is `None` are dropped when the query string is rendered, so
//! an unset constraint is never sent as an empty parameter.

use std::fmt;

use serde_json::{Map, Value};

use crate::types::DateValue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    params: Vec<(String, Option<String>)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), Some(value.to_string())));
        self
    }

    pub fn optional_param<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.params.push((key.into(), value.map(|v| v.to_string())));
        self
    }

    /// Pairs that will actually be sent.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (key.as_str(), v)))
    }

    /// True when no pair survives the null-dropping.
    pub fn is_empty(&self) -> bool {
        self.pairs().next().is_none()
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            params: map
                .into_iter()
                .map(|(key, value)| (key, scalar_text(value)))
                .collect(),
        }
    }
}

/// Objects become one parameter per key; any other value yields an empty
/// filter.
impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Filter::from(map),
            _ => Filter::new(),
        }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, Option<V>)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Filter::new(), |filter, (key, value)| filter.optional_param(key, value))
    }
}

/// Constraints accepted by `GET /vouchers/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoucherFilter {
    pub code_query: Option<String>,
    /// Page size; the service defaults to 10.
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub campaign: Option<String>,
    pub category: Option<String>,
    pub customer: Option<String>,
}

impl From<VoucherFilter> for Filter {
    fn from(f: VoucherFilter) -> Self {
        Filter::new()
            .optional_param("code_query", f.code_query)
            .optional_param("limit", f.limit)
            .optional_param("skip", f.skip)
            .optional_param("campaign", f.campaign)
            .optional_param("category", f.category)
            .optional_param("customer", f.customer)
    }
}

/// Outcome recorded on a redemption entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionResult {
    Success,
    FailureNotExist,
    FailureInactive,
}

impl RedemptionResult {
    pub fn as_str(self) -> &'static str {
        match self {
            RedemptionResult::Success => "Success",
            RedemptionResult::FailureNotExist => "Failure-NotExist",
            RedemptionResult::FailureInactive => "Failure-Inactive",
        }
    }
}

impl fmt::Display for RedemptionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints accepted by `GET /redemptions/`.
///
/// Without `start_date`/`end_date` the service reports the current month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedemptionFilter {
    /// Page size; the service defaults to 100.
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub start_date: Option<DateValue>,
    pub end_date: Option<DateValue>,
    pub result: Option<RedemptionResult>,
    pub customer: Option<String>,
}

impl From<RedemptionFilter> for Filter {
    fn from(f: RedemptionFilter) -> Self {
        Filter::new()
            .optional_param("limit", f.limit)
            .optional_param("page", f.page)
            .optional_param("start_date", f.start_date)
            .optional_param("end_date", f.end_date)
            .optional_param("result", f.result)
            .optional_param("customer", f.customer)
    }
}
