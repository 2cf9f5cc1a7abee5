//! Property-based tests for oppboard
//!
//! These tests verify:
//! - Grouping partitions the options exactly, in order
//! - Group count follows the `or` operators that are consulted
//! - Grouping and pricing are pure (same input, same output)
//! - Nothing panics on loose discount strings or misaligned operators
//! - Totals are exact to the cent

use proptest::prelude::*;
use rust_decimal::Decimal;

use oppboard::engine::grouper::{align_operators, applied_or_count, group};
use oppboard::engine::pricing::{discount_magnitude, price_groups, PricingContext};
use oppboard::engine::summary::comparison_label;
use oppboard::{DealOption, Operator, OperatorKind, Promotion};

// =============================================================================
// Strategies
// =============================================================================

/// Prices in whole cents
fn price_strategy(max_cents: i64) -> impl Strategy<Value = Decimal> {
    (0i64..max_cents).prop_map(|cents| Decimal::new(cents, 2))
}

fn option_strategy() -> impl Strategy<Value = (String, Decimal)> {
    ("[A-Za-z]{1,8}", price_strategy(10_000_000))
}

fn options_strategy(max: usize) -> impl Strategy<Value = Vec<DealOption>> {
    prop::collection::vec(option_strategy(), 0..max).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (content, price))| DealOption::new(i as u64 + 1, content).with_price(price))
            .collect()
    })
}

fn operator_kind_strategy() -> impl Strategy<Value = OperatorKind> {
    prop_oneof![Just(OperatorKind::And), Just(OperatorKind::Or)]
}

/// Operator lists of any length, aligned or not
fn operators_strategy(max: usize) -> impl Strategy<Value = Vec<Operator>> {
    prop::collection::vec(operator_kind_strategy(), 0..max).prop_map(|kinds| {
        kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Operator::new(i as u64 + 1, kind))
            .collect()
    })
}

// =============================================================================
// Grouper
// =============================================================================

proptest! {
    /// Concatenating the groups gives back the input, in order
    #[test]
    fn groups_partition_options(options in options_strategy(12), operators in operators_strategy(16)) {
        let groups = group(&options, &operators);
        let flattened: Vec<u64> = groups.iter().flat_map(|g| g.option_ids()).collect();
        let original: Vec<u64> = options.iter().map(|o| o.id).collect();
        prop_assert_eq!(flattened, original);
        prop_assert!(groups.iter().all(|g| !g.is_empty()));
    }

    /// Group count is 1 + the or-operators between adjacent options
    #[test]
    fn group_count_follows_or_operators(options in options_strategy(12), operators in operators_strategy(16)) {
        let groups = group(&options, &operators);
        if options.is_empty() {
            prop_assert!(groups.is_empty());
        } else {
            prop_assert_eq!(groups.len(), 1 + applied_or_count(options.len(), &operators));
        }
    }

    /// All-and operators collapse to a single group
    #[test]
    fn all_and_is_one_group(options in options_strategy(12).prop_filter("non-empty", |o| !o.is_empty())) {
        let operators: Vec<Operator> = (1..options.len() as u64).map(Operator::and).collect();
        prop_assert_eq!(group(&options, &operators).len(), 1);
    }

    /// All-or operators split into singletons
    #[test]
    fn all_or_is_singletons(options in options_strategy(12)) {
        let operators: Vec<Operator> = (1..options.len().max(1) as u64).map(Operator::or).collect();
        let groups = group(&options, &operators);
        prop_assert_eq!(groups.len(), options.len());
        prop_assert!(groups.iter().all(|g| g.len() == 1));
    }

    /// Grouping an aligned list gives the same groups as the raw list
    #[test]
    fn alignment_preserves_grouping(options in options_strategy(12), operators in operators_strategy(16)) {
        let aligned = align_operators(options.len(), &operators);
        prop_assert_eq!(aligned.len(), options.len().saturating_sub(1));
        let raw: Vec<Vec<u64>> = group(&options, &operators).iter().map(|g| g.option_ids()).collect();
        let fixed: Vec<Vec<u64>> = group(&options, &aligned).iter().map(|g| g.option_ids()).collect();
        prop_assert_eq!(raw, fixed);
    }
}

// =============================================================================
// Pricing
// =============================================================================

proptest! {
    /// Pricing twice gives identical results
    #[test]
    fn pricing_is_idempotent(options in options_strategy(10), operators in operators_strategy(12)) {
        let ctx = PricingContext::default();
        prop_assert_eq!(
            price_groups(&options, &operators, &ctx),
            price_groups(&options, &operators, &ctx)
        );
        prop_assert_eq!(
            comparison_label(&options, &operators),
            comparison_label(&options, &operators)
        );
    }

    /// Group totals add up to the sum of effective prices
    #[test]
    fn group_totals_cover_all_options(options in options_strategy(10), operators in operators_strategy(12)) {
        let totals = price_groups(&options, &operators, &PricingContext::default());
        let sum: Decimal = totals.iter().map(|t| t.total).sum();
        let expected: Decimal = options.iter().map(|o| o.price).sum();
        prop_assert_eq!(sum, expected);
    }

    /// Any discount string yields a non-negative magnitude
    #[test]
    fn discount_magnitude_never_panics(discount in ".{0,48}") {
        prop_assert!(discount_magnitude(&discount) >= Decimal::ZERO);
    }

    /// A discount reads as its leading number whatever text follows it
    #[test]
    fn discount_magnitude_ignores_trailing_text(
        cents in 0i64..100_000_000,
        tail in "[ %.a-z]{0,12}",
    ) {
        let amount = Decimal::new(cents, 2);
        let text = format!("${}{}", amount, tail);
        prop_assert_eq!(discount_magnitude(&text), amount);
    }

    /// With clamping on, no promotion drives a price below zero
    #[test]
    fn clamped_prices_stay_non_negative(
        price in price_strategy(1_000_000),
        discount in "[$%0-9.,a-z]{0,10}",
    ) {
        let options = vec![
            DealOption::new(1, "A")
                .with_price(price)
                .with_promotion(Promotion::new("Promo", discount)),
        ];
        let totals = price_groups(&options, &[], &PricingContext::default());
        prop_assert_eq!(totals.len(), 1);
        prop_assert!(totals[0].total >= Decimal::ZERO);
        prop_assert!(totals[0].lines[0].effective_price <= price);
    }
}
