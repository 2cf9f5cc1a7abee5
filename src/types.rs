//! Type-safe enums shared by the model and the engine
//!
//! Operators and discount kinds arrive as loose strings from stored JSON.
//! These enums give them exhaustive matching and a single string form.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Relationship between two adjacent options.
///
/// `And` bundles the options into the same package, `Or` makes them
/// alternatives and starts a new package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OperatorKind {
    #[default]
    And,
    Or,
}

impl OperatorKind {
    /// True for the operator that starts a new group
    #[inline]
    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::Or)
    }
}

/// How a promotion's discount string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum DiscountKind {
    /// `"10%"`: a share of the option price
    Percentage,
    /// `"$500"`: a flat currency amount
    Fixed,
}

impl DiscountKind {
    /// Classify a discount string by the presence of `%`
    pub fn of(discount: &str) -> Self {
        if discount.contains('%') {
            Self::Percentage
        } else {
            Self::Fixed
        }
    }
}
