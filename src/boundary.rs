//! Boundary normalization
//!
//! Stored opportunities and shared payloads come in several loose shapes:
//! the price may sit at the top level or under `details.price`, financing may
//! be `financingOption` or `details.financeSettings`, numbers may be strings,
//! operator types may be misspelled. This module accepts all of them and
//! produces the canonical [`crate::model`] types exactly once, so the engine
//! never has to guess.
//!
//! | Raw input                         | Canonical value |
//! |-----------------------------------|-----------------|
//! | `price ?? details.price ?? 0`     | `DealOption::price` (negative → 0) |
//! | `"$1,250"` / `"1250 USD"` / `1250` | `1250` |
//! | `financingOption ?? details.financeSettings` | `DealOption::financing_option` |
//! | unparseable `apr` / `termLength`  | terms with `term_length = 0` (no estimate) |
//! | operator `type` other than and/or | `OperatorKind::And` |
//! | missing `lastUpdated`             | Unix epoch |
//! | any field of the wrong JSON type  | that field's default |
//!
//! Only a record that is not an object, or has no usable id, is rejected.
//! A mistyped field never costs the rest of the record.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::engine::format::parse_leading_number;
use crate::model::{
    sanitize_price, DealOption, FinancingTerms, OptionDetails, Opportunity, Operator, Promotion,
    DRAFTS_COLUMN,
};
use crate::types::OperatorKind;

// ============================================================================
// Lenient field decoding
// ============================================================================

/// A nested record, or `None` when the stored value has another shape.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!(error = %e, "ignoring mistyped nested record");
            Ok(None)
        }
    }
}

/// A list of records; items that cannot be read are dropped, a non-list is empty.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!(error = %e, "dropping unreadable list item");
                    None
                }
            })
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => {
            warn!(kind = json_kind(&other), "expected a list");
            Ok(Vec::new())
        }
    }
}

// ============================================================================
// Raw shapes
// ============================================================================

/// An option as it may appear in stored or shared JSON
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOption {
    pub id: Value,
    pub content: Value,
    pub is_complete: Value,
    pub is_approved: Value,
    pub price: Value,
    pub show_as_low_as_price: Value,
    #[serde(deserialize_with = "lenient")]
    pub promotion: Option<RawPromotion>,
    #[serde(deserialize_with = "lenient")]
    pub financing_option: Option<RawFinancing>,
    #[serde(deserialize_with = "lenient")]
    pub details: Option<RawDetails>,
    pub title: Value,
    pub description: Value,
    pub after_image: Value,
    pub materials: Value,
    pub sections: Value,
    pub has_calculations: Value,
}

/// Estimate details saved alongside an option
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDetails {
    pub price: Value,
    pub title: Value,
    pub description: Value,
    pub after_image: Value,
    pub materials: Value,
    pub sections: Value,
    pub has_calculations: Value,
    #[serde(deserialize_with = "lenient")]
    pub finance_settings: Option<RawFinancing>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPromotion {
    #[serde(rename = "type")]
    pub kind: Value,
    pub discount: Value,
    pub valid_until: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFinancing {
    pub apr: Value,
    pub term_length: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOperator {
    pub id: Value,
    #[serde(rename = "type")]
    pub kind: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOpportunity {
    pub id: Value,
    pub title: Value,
    #[serde(deserialize_with = "lenient_list")]
    pub options: Vec<RawOption>,
    #[serde(deserialize_with = "lenient_list")]
    pub operators: Vec<RawOperator>,
    pub last_updated: Value,
    pub column: Value,
    #[serde(deserialize_with = "lenient")]
    pub promotion: Option<RawPromotion>,
    #[serde(deserialize_with = "lenient")]
    pub financing_option: Option<RawFinancing>,
}

// ============================================================================
// Lenient scalars
// ============================================================================

/// Read a number from a JSON number or from text such as `"$1,250.50"` or
/// `"1250 USD"` (the leading number counts).
pub fn lenient_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_u64().map(Decimal::from))
            .or_else(|| n.as_f64().and_then(decimal_from_f64)),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !(matches!(c, '$' | ',') || c.is_whitespace()))
                .collect();
            parse_leading_number(&cleaned)
        }
        _ => None,
    }
}

/// Shortest decimal form of a JSON float (`6.99`, not `6.9900000000000002`)
fn decimal_from_f64(value: f64) -> Option<Decimal> {
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

/// Read an id that may be stored as a number or a numeric string.
fn lenient_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text from a string or a number
pub(crate) fn lenient_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A flag from a bool, `"true"`/`"yes"`/`"1"` style text, or 0/1.
fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_values(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        _ => None,
    }
}

/// Parse `YYYY-MM-DD` or a full RFC 3339 timestamp into a calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// RFC 3339 text or Unix milliseconds
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

// ============================================================================
// Normalization
// ============================================================================

impl RawFinancing {
    /// Unparseable or out-of-range fields yield terms with no usable term.
    pub fn normalize(&self) -> FinancingTerms {
        let apr = lenient_number(&self.apr).filter(|a| !a.is_sign_negative());
        let term = lenient_number(&self.term_length)
            .filter(|t| *t >= Decimal::ONE)
            .and_then(|t| t.round().to_u32());

        match (apr, term) {
            (Some(apr), Some(term_length)) => FinancingTerms::new(apr, term_length),
            _ => {
                warn!(apr = %self.apr, term_length = %self.term_length, "unusable financing terms");
                FinancingTerms::new(Decimal::ZERO, 0)
            }
        }
    }
}

impl RawPromotion {
    pub fn normalize(&self) -> Promotion {
        let discount = lenient_text(&self.discount).unwrap_or_default();
        let valid_until = match &self.valid_until {
            Value::Null => None,
            raw => {
                let parsed = raw.as_str().and_then(parse_date);
                if parsed.is_none() {
                    warn!(valid_until = %raw, "ignoring unparseable promotion end date");
                }
                parsed
            }
        };
        Promotion {
            kind: lenient_text(&self.kind).unwrap_or_default(),
            discount,
            valid_until,
        }
    }
}

impl RawOption {
    /// Normalize into the canonical option. `fallback_id` is used when the
    /// stored id is missing or not an integer.
    pub fn normalize(&self, fallback_id: u64) -> DealOption {
        let id = lenient_id(&self.id).unwrap_or(fallback_id);
        let details = self.details.as_ref();

        // price ?? details.price ?? 0, where ?? only skips missing values
        let price_value = if self.price.is_null() {
            details.map_or(&Value::Null, |d| &d.price)
        } else {
            &self.price
        };
        let price = lenient_number(price_value).map_or(Decimal::ZERO, sanitize_price);

        let financing_option = self
            .financing_option
            .as_ref()
            .or_else(|| details.and_then(|d| d.finance_settings.as_ref()))
            .map(RawFinancing::normalize);

        DealOption {
            id,
            content: lenient_text(&self.content)
                .or_else(|| lenient_text(&self.title))
                .unwrap_or_default(),
            is_complete: lenient_bool(&self.is_complete).unwrap_or(false),
            is_approved: lenient_bool(&self.is_approved),
            price,
            show_as_low_as_price: lenient_bool(&self.show_as_low_as_price).unwrap_or(true),
            promotion: self.promotion.as_ref().map(RawPromotion::normalize),
            financing_option,
            details: self.normalize_details(),
        }
    }

    fn normalize_details(&self) -> Option<OptionDetails> {
        let d = self.details.clone().unwrap_or_default();
        let text = |inner: &Value, outer: &Value| {
            lenient_text(inner)
                .or_else(|| lenient_text(outer))
                .unwrap_or_default()
        };
        let list = |inner: &Value, outer: &Value| {
            lenient_values(inner)
                .or_else(|| lenient_values(outer))
                .unwrap_or_default()
        };
        let details = OptionDetails {
            title: text(&d.title, &self.title),
            description: text(&d.description, &self.description),
            after_image: text(&d.after_image, &self.after_image),
            materials: list(&d.materials, &self.materials),
            sections: list(&d.sections, &self.sections),
            has_calculations: lenient_bool(&d.has_calculations)
                .or_else(|| lenient_bool(&self.has_calculations)),
        };
        (details != OptionDetails::default()).then_some(details)
    }
}

impl RawOperator {
    pub fn normalize(&self, fallback_id: u64) -> Operator {
        let kind = match &self.kind {
            Value::Null => OperatorKind::And,
            raw => match raw.as_str().map(str::parse::<OperatorKind>) {
                Some(Ok(kind)) => kind,
                _ => {
                    warn!(kind = %raw, "unknown operator type, treating as 'and'");
                    OperatorKind::And
                }
            },
        };
        Operator::new(lenient_id(&self.id).unwrap_or(fallback_id), kind)
    }
}

impl RawOpportunity {
    /// Normalize into the canonical opportunity. Returns `None` when the
    /// record has no usable id.
    pub fn normalize(&self) -> Option<Opportunity> {
        let id = lenient_text(&self.id).filter(|id| !id.trim().is_empty())?;
        let last_updated = parse_timestamp(&self.last_updated).unwrap_or_default();

        let options = normalize_options(&self.options);
        let operators = normalize_operators(&self.operators);
        debug!(
            opportunity = %id,
            options = options.len(),
            operators = operators.len(),
            "normalized opportunity"
        );

        Some(Opportunity {
            id,
            title: lenient_text(&self.title).unwrap_or_default(),
            options,
            operators,
            last_updated,
            column: lenient_text(&self.column)
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DRAFTS_COLUMN.to_string()),
            promotion: self.promotion.as_ref().map(RawPromotion::normalize),
            financing_option: self.financing_option.as_ref().map(RawFinancing::normalize),
        })
    }
}

/// Normalize an option list; missing ids fall back to their 1-based position.
pub fn normalize_options(raw: &[RawOption]) -> Vec<DealOption> {
    raw.iter()
        .enumerate()
        .map(|(i, o)| o.normalize(i as u64 + 1))
        .collect()
}

/// Normalize an operator list; missing ids fall back to their 1-based position.
pub fn normalize_operators(raw: &[RawOperator]) -> Vec<Operator> {
    raw.iter()
        .enumerate()
        .map(|(i, o)| o.normalize(i as u64 + 1))
        .collect()
}

/// Id of a stored record, readable or not
pub fn record_id(value: &Value) -> Option<String> {
    value
        .get("id")
        .and_then(lenient_text)
        .filter(|id| !id.trim().is_empty())
}

/// Parse one stored opportunity from arbitrary JSON.
pub fn opportunity_from_value(value: &Value) -> Option<Opportunity> {
    match RawOpportunity::deserialize(value) {
        Ok(raw) => raw.normalize(),
        Err(e) => {
            warn!(error = %e, "skipping malformed opportunity record");
            None
        }
    }
}

/// Parse a stored opportunity list, skipping records that cannot be read.
pub fn opportunities_from_value(value: &Value) -> Vec<Opportunity> {
    match value {
        Value::Array(items) => items.iter().filter_map(opportunity_from_value).collect(),
        Value::Null => Vec::new(),
        other => {
            warn!(kind = json_kind(other), "opportunity list is not an array");
            Vec::new()
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
