//! Pricing Aggregator
//!
//! Reduces each group to a total, an "as low as" monthly estimate and
//! approval flags.
//!
//! # Per-option price
//!
//! | Step      | Rule |
//! |-----------|------|
//! | Base      | `DealOption::price` (resolved at the boundary, never negative) |
//! | Promotion | option promotion, else the opportunity default |
//! | Discount  | `"10%"` → `price * 10 / 100`, `"$150"` → `150`, unparseable → `0` |
//! | Effective | `price - discount`, clamped at 0 unless clamping is disabled |
//!
//! # Monthly estimate
//!
//! `amount * r / (1 - (1 + r)^-n)` with `r = apr / 100 / 12` and `n` the term
//! in months. A zero APR degrades to `amount / n`, a non-positive amount gives
//! 0, unusable terms give no estimate. Only options with
//! `show_as_low_as_price` count toward the financed amount.
//!
//! Money is [`Decimal`] throughout; sums saturate instead of overflowing.
//! Nothing here fails: every malformed input degrades to a default.

use rust_decimal::prelude::MathematicalOps;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::engine::format::parse_leading_number;
use crate::engine::grouper::{group, Group};
use crate::model::{DealOption, FinancingTerms, Operator, Promotion};
use crate::types::DiscountKind;

/// Inputs that apply to every group of one opportunity
#[derive(Debug, Clone, PartialEq)]
pub struct PricingContext {
    /// Terms for groups whose options carry none
    pub financing: FinancingTerms,
    /// Promotion for options that carry none
    pub promotion: Option<Promotion>,
    /// Floor effective prices at 0
    pub clamp_negative_prices: bool,
}

impl PricingContext {
    pub fn new(financing: FinancingTerms) -> Self {
        Self {
            financing,
            promotion: None,
            clamp_negative_prices: true,
        }
    }

    pub fn with_promotion(mut self, promotion: Option<Promotion>) -> Self {
        self.promotion = promotion;
        self
    }

    pub fn with_clamping(mut self, clamp: bool) -> Self {
        self.clamp_negative_prices = clamp;
        self
    }
}

impl Default for PricingContext {
    fn default() -> Self {
        Self::new(FinancingTerms::default())
    }
}

/// Price breakdown for one option inside a group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub option_id: u64,
    pub content: String,
    pub base_price: Decimal,
    pub discount: Decimal,
    pub effective_price: Decimal,
    pub approved: bool,
}

/// Derived totals for one group, ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotal {
    /// Zero-based package index within the opportunity
    pub index: usize,
    pub lines: Vec<LineItem>,
    /// Sum of effective prices
    pub total: Decimal,
    /// Part of `total` from options that show an "as low as" price
    pub financed_amount: Decimal,
    /// `None` when no option shows an estimate or the terms are unusable
    pub monthly_payment: Option<Decimal>,
    pub financing: FinancingTerms,
    pub all_approved: bool,
    /// Sum of effective prices of approved options only
    pub approved_subtotal: Decimal,
}

impl GroupTotal {
    pub fn option_ids(&self) -> Vec<u64> {
        self.lines.iter().map(|l| l.option_id).collect()
    }
}

// ============================================================================
// Discounts
// ============================================================================

/// Numeric magnitude of a discount string.
///
/// Every character other than digits and `.` is stripped, then the longest
/// leading number counts: `"Save 10.5%."` is 10.5, `"$1,500.00 off."` is 1500.
/// Text without a leading number counts as no discount.
pub fn discount_magnitude(discount: &str) -> Decimal {
    let digits: String = discount
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    parse_leading_number(&digits).unwrap_or(Decimal::ZERO)
}

/// Currency amount a promotion takes off `price`
pub fn discount_amount(price: Decimal, promotion: &Promotion) -> Decimal {
    let magnitude = discount_magnitude(&promotion.discount);
    match promotion.discount_kind() {
        DiscountKind::Percentage => price.saturating_mul(magnitude) / Decimal::ONE_HUNDRED,
        DiscountKind::Fixed => magnitude,
    }
}

/// Price a single option against the context's promotion default
pub fn price_option(option: &DealOption, ctx: &PricingContext) -> LineItem {
    let base_price = option.price;
    let discount = option
        .promotion
        .as_ref()
        .or(ctx.promotion.as_ref())
        .map_or(Decimal::ZERO, |promo| discount_amount(base_price, promo));

    let mut effective_price = base_price.saturating_sub(discount);
    if ctx.clamp_negative_prices && effective_price.is_sign_negative() {
        effective_price = Decimal::ZERO;
    }

    LineItem {
        option_id: option.id,
        content: option.content.clone(),
        base_price,
        discount,
        effective_price,
        approved: option.is_approved(),
    }
}

// ============================================================================
// Financing
// ============================================================================

/// Amortized monthly payment for `amount` under `terms`.
///
/// Returns `None` when the terms cannot produce an estimate or the
/// arithmetic leaves the `Decimal` range.
pub fn monthly_payment(amount: Decimal, terms: FinancingTerms) -> Option<Decimal> {
    if !terms.is_usable() {
        return None;
    }
    if amount <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    let n = Decimal::from(terms.term_length);
    if terms.apr.is_zero() {
        return amount.checked_div(n);
    }

    // amount * r / (1 - (1 + r)^-n) == amount * r * g / (g - 1) with g = (1 + r)^n
    let r = terms.apr / Decimal::ONE_HUNDRED / Decimal::from(12);
    let growth = (Decimal::ONE + r).checked_powi(i64::from(terms.term_length))?;
    amount
        .checked_mul(r)?
        .checked_mul(growth)?
        .checked_div(growth - Decimal::ONE)
}

/// Terms for a group: the first option that carries its own, else `fallback`
fn group_terms(group: &Group<'_>, fallback: FinancingTerms) -> FinancingTerms {
    group
        .options
        .iter()
        .find_map(|o| o.financing_option)
        .unwrap_or(fallback)
}

// ============================================================================
// Aggregation
// ============================================================================

/// Aggregate one group with the given financing defaults, no promotion
/// default and clamping enabled.
pub fn aggregate(group: &Group<'_>, financing_defaults: FinancingTerms) -> GroupTotal {
    aggregate_with(group, 0, &PricingContext::new(financing_defaults))
}

/// Aggregate one group under a full pricing context.
pub fn aggregate_with(group: &Group<'_>, index: usize, ctx: &PricingContext) -> GroupTotal {
    let lines: Vec<LineItem> = group.options.iter().map(|o| price_option(o, ctx)).collect();

    let total = sum(lines.iter().map(|l| l.effective_price));
    let financed_amount = sum(
        group
            .options
            .iter()
            .zip(&lines)
            .filter(|(option, _)| option.show_as_low_as_price)
            .map(|(_, line)| line.effective_price),
    );
    let shows_estimate = group.options.iter().any(|o| o.show_as_low_as_price);

    let financing = group_terms(group, ctx.financing);
    let monthly = if shows_estimate {
        monthly_payment(financed_amount, financing)
    } else {
        None
    };

    let all_approved = !lines.is_empty() && lines.iter().all(|l| l.approved);
    let approved_subtotal = sum(lines.iter().filter(|l| l.approved).map(|l| l.effective_price));

    GroupTotal {
        index,
        lines,
        total,
        financed_amount,
        monthly_payment: monthly,
        financing,
        all_approved,
        approved_subtotal,
    }
}

/// Saturating sum of money amounts
pub(crate) fn sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount))
}

/// Group `options` and aggregate every group in order.
pub fn price_groups(
    options: &[DealOption],
    operators: &[Operator],
    ctx: &PricingContext,
) -> Vec<GroupTotal> {
    group(options, operators)
        .iter()
        .enumerate()
        .map(|(index, g)| aggregate_with(g, index, ctx))
        .collect()
}
