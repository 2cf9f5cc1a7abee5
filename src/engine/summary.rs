//! Cross-group summaries
//!
//! Turns group totals into the labels the board shows:
//!
//! - **Range**: undecided groups feed a running min/max (`"$5,000 - $8,000"`,
//!   or `"$300"` when min equals max). The customer could land anywhere in it.
//! - **Approved**: fully approved groups are kept out of the range and summed
//!   into `"$10,000 approved"`.
//! - **Comparison**: option contents joined with `" + "` inside a group and
//!   `" vs "` between groups (`"Shingle A + Gutter B vs Shingle C"`). The
//!   single-group case uses the same format with no prefix.
//!
//! Card, column and board rollups all go through [`PriceRollup`].

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::engine::format::{format_amount, DEFAULT_CURRENCY_SYMBOL};
use crate::engine::grouper::group;
use crate::engine::pricing::{price_groups, GroupTotal, PricingContext};
use crate::model::{DealOption, Operator, Opportunity};

/// Separator between options of one group
pub const AND_SEPARATOR: &str = " + ";

/// Separator between groups
pub const OR_SEPARATOR: &str = " vs ";

// ============================================================================
// Rollup
// ============================================================================

/// Running approved amount and undecided range over any number of groups
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRollup {
    pub approved_amount: Decimal,
    pub approved_groups: usize,
    pub undecided_groups: usize,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceRollup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one group into the rollup
    pub fn add(&mut self, total: &GroupTotal) {
        if total.all_approved {
            self.approved_amount = self.approved_amount.saturating_add(total.total);
            self.approved_groups += 1;
        } else {
            self.undecided_groups += 1;
            self.min = Some(self.min.map_or(total.total, |m| m.min(total.total)));
            self.max = Some(self.max.map_or(total.total, |m| m.max(total.total)));
        }
    }

    pub fn from_totals<'a>(totals: impl IntoIterator<Item = &'a GroupTotal>) -> Self {
        let mut rollup = Self::new();
        for total in totals {
            rollup.add(total);
        }
        rollup
    }

    /// Combine two rollups (e.g. several cards into a column)
    pub fn merge(&mut self, other: &PriceRollup) {
        self.approved_amount = self.approved_amount.saturating_add(other.approved_amount);
        self.approved_groups += other.approved_groups;
        self.undecided_groups += other.undecided_groups;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    pub fn is_empty(&self) -> bool {
        self.approved_groups == 0 && self.undecided_groups == 0
    }

    pub fn range(&self) -> Option<(Decimal, Decimal)> {
        self.min.zip(self.max)
    }

    /// `"$min - $max"`, or `"$min"` when both ends match
    pub fn range_label(&self, symbol: &str) -> Option<String> {
        let (min, max) = self.range()?;
        let low = format_amount(min, symbol);
        let high = format_amount(max, symbol);
        if low == high {
            Some(low)
        } else {
            Some(format!("{} - {}", low, high))
        }
    }

    /// `"$X approved"` when at least one group is fully approved
    pub fn approved_label(&self, symbol: &str) -> Option<String> {
        (self.approved_groups > 0)
            .then(|| format!("{} approved", format_amount(self.approved_amount, symbol)))
    }

    /// Display lines: range first, then the approved amount
    pub fn lines(&self, symbol: &str) -> Vec<String> {
        self.range_label(symbol)
            .into_iter()
            .chain(self.approved_label(symbol))
            .collect()
    }

    /// [`PriceRollup::lines`] with the default `$` symbol
    pub fn default_lines(&self) -> Vec<String> {
        self.lines(DEFAULT_CURRENCY_SYMBOL)
    }
}

// ============================================================================
// Comparison label
// ============================================================================

/// Human-readable package comparison, `None` when there are no options.
pub fn comparison_label(options: &[DealOption], operators: &[Operator]) -> Option<String> {
    let groups = group(options, operators);
    if groups.is_empty() {
        return None;
    }
    let label = groups
        .iter()
        .map(|g| g.contents().collect::<Vec<_>>().join(AND_SEPARATOR))
        .collect::<Vec<_>>()
        .join(OR_SEPARATOR);
    Some(label)
}

// ============================================================================
// Opportunity-level view model
// ============================================================================

/// Pricing context for one opportunity: its own financing and promotion
/// defaults override the base context.
pub fn context_for(opportunity: &Opportunity, base: &PricingContext) -> PricingContext {
    PricingContext {
        financing: opportunity.financing_option.unwrap_or(base.financing),
        promotion: opportunity.promotion.clone().or_else(|| base.promotion.clone()),
        clamp_negative_prices: base.clamp_negative_prices,
    }
}

/// Everything a card or the public compare page renders for one opportunity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitySummary {
    pub id: String,
    pub title: String,
    pub column: String,
    pub groups: Vec<GroupTotal>,
    pub rollup: PriceRollup,
    pub comparison: Option<String>,
}

impl OpportunitySummary {
    pub fn build(opportunity: &Opportunity, base: &PricingContext) -> Self {
        let ctx = context_for(opportunity, base);
        let groups = price_groups(&opportunity.options, &opportunity.operators, &ctx);
        let rollup = PriceRollup::from_totals(&groups);
        debug!(
            opportunity = %opportunity.id,
            groups = groups.len(),
            approved = rollup.approved_groups,
            "summarized opportunity"
        );
        Self {
            id: opportunity.id.clone(),
            title: opportunity.title.clone(),
            column: opportunity.column.clone(),
            comparison: comparison_label(&opportunity.options, &opportunity.operators),
            groups,
            rollup,
        }
    }
}

/// Group totals for one opportunity
pub fn opportunity_totals(opportunity: &Opportunity, base: &PricingContext) -> Vec<GroupTotal> {
    let ctx = context_for(opportunity, base);
    price_groups(&opportunity.options, &opportunity.operators, &ctx)
}

/// Rollup across every group of every opportunity in scope
pub fn summarize<'a>(
    opportunities: impl IntoIterator<Item = &'a Opportunity>,
    base: &PricingContext,
) -> PriceRollup {
    let mut rollup = PriceRollup::new();
    for opportunity in opportunities {
        for total in opportunity_totals(opportunity, base) {
            rollup.add(&total);
        }
    }
    rollup
}
