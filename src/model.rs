//! Canonical data model
//!
//! Every option, operator and opportunity the engine sees has exactly one
//! shape. Stored or shared JSON in older, looser shapes goes through
//! [`crate::boundary`] first; these types serialize back to the same
//! camelCase JSON the board and the public pages read.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DiscountKind, OperatorKind};

/// APR used when neither the option nor the opportunity carries financing
pub const DEFAULT_APR: Decimal = Decimal::from_parts(699, 0, 0, false, 2);

/// Term used when neither the option nor the opportunity carries financing
pub const DEFAULT_TERM_MONTHS: u32 = 60;

/// Column every new opportunity starts in
pub const DRAFTS_COLUMN: &str = "drafts";

fn default_true() -> bool {
    true
}

// ============================================================================
// Option
// ============================================================================

/// A single selectable line item (e.g. a roofing package) within an opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealOption {
    pub id: u64,
    pub content: String,
    /// Bound to a real estimate/job
    #[serde(default)]
    pub is_complete: bool,
    /// Only `Some(true)` counts as approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_approved: Option<bool>,
    /// Resolved, non-negative base price
    #[serde(default)]
    pub price: Decimal,
    #[serde(default = "default_true")]
    pub show_as_low_as_price: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Promotion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing_option: Option<FinancingTerms>,
    /// Descriptive fields carried through untouched for the public pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<OptionDetails>,
}

impl DealOption {
    /// Create an incomplete, unpriced option
    pub fn new(id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            is_complete: false,
            is_approved: None,
            price: Decimal::ZERO,
            show_as_low_as_price: true,
            promotion: None,
            financing_option: None,
            details: None,
        }
    }

    /// Builder-style price setter; negative prices become 0
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = sanitize_price(price);
        self
    }

    pub fn with_promotion(mut self, promotion: Promotion) -> Self {
        self.promotion = Some(promotion);
        self
    }

    pub fn with_financing(mut self, terms: FinancingTerms) -> Self {
        self.financing_option = Some(terms);
        self
    }

    pub fn approved(mut self, approved: bool) -> Self {
        self.is_approved = Some(approved);
        self
    }

    pub fn complete(mut self) -> Self {
        self.is_complete = true;
        self
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        self.is_approved == Some(true)
    }
}

/// Clamp a price to the non-negative range
pub fn sanitize_price(price: Decimal) -> Decimal {
    price.max(Decimal::ZERO)
}

/// Display-only fields from the estimate editor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub after_image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_calculations: Option<bool>,
}

// ============================================================================
// Promotion & financing
// ============================================================================

/// A percentage or fixed-amount discount on one option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    /// Free-form promotion label ("Spring sale")
    #[serde(rename = "type", default)]
    pub kind: String,
    /// `"10%"` or `"$500"`
    pub discount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
}

impl Promotion {
    pub fn new(kind: impl Into<String>, discount: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            discount: discount.into(),
            valid_until: None,
        }
    }

    pub fn valid_until(mut self, date: NaiveDate) -> Self {
        self.valid_until = Some(date);
        self
    }

    pub fn discount_kind(&self) -> DiscountKind {
        DiscountKind::of(&self.discount)
    }

    /// True once `today` is past the last valid day
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.valid_until.is_some_and(|last| today > last)
    }
}

/// Loan terms for the "as low as" monthly estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingTerms {
    /// Annual percentage rate, in percent (6.99 means 6.99%)
    pub apr: Decimal,
    /// Months; 0 means no usable term and suppresses the estimate
    pub term_length: u32,
}

impl FinancingTerms {
    pub const fn new(apr: Decimal, term_length: u32) -> Self {
        Self { apr, term_length }
    }

    /// Whether an estimate can be computed from these terms
    pub fn is_usable(&self) -> bool {
        self.term_length > 0 && !self.apr.is_sign_negative()
    }
}

impl Default for FinancingTerms {
    fn default() -> Self {
        Self::new(DEFAULT_APR, DEFAULT_TERM_MONTHS)
    }
}

// ============================================================================
// Operator
// ============================================================================

/// The AND/OR relationship between `options[i]` and `options[i + 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: OperatorKind,
}

impl Operator {
    pub const fn new(id: u64, kind: OperatorKind) -> Self {
        Self { id, kind }
    }

    pub const fn and(id: u64) -> Self {
        Self::new(id, OperatorKind::And)
    }

    pub const fn or(id: u64) -> Self {
        Self::new(id, OperatorKind::Or)
    }
}

// ============================================================================
// Opportunity & columns
// ============================================================================

/// One card on the board: an ordered option list with its operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub options: Vec<DealOption>,
    #[serde(default)]
    pub operators: Vec<Operator>,
    pub last_updated: DateTime<Utc>,
    /// Workflow stage (column id)
    pub column: String,
    /// Applies to options that carry no promotion of their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Promotion>,
    /// Applies to options that carry no financing of their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing_option: Option<FinancingTerms>,
}

impl Opportunity {
    /// Create an empty opportunity in the drafts column
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            options: Vec::new(),
            operators: Vec::new(),
            last_updated: Utc::now(),
            column: DRAFTS_COLUMN.to_string(),
            promotion: None,
            financing_option: None,
        }
    }

    pub fn option(&self, option_id: u64) -> Option<&DealOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Whether the operator list has exactly `options.len() - 1` entries
    pub fn operators_aligned(&self) -> bool {
        self.operators.len() == self.options.len().saturating_sub(1)
    }
}

/// A workflow stage on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
}

impl Column {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// The four stages a new board starts with
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new(DRAFTS_COLUMN, "Drafts"),
        Column::new("presented", "Presented to customer"),
        Column::new("waiting", "Waiting for decision"),
        Column::new("approved", "Approved"),
    ]
}
