//! Option Grouper
//!
//! Partitions an ordered option list into contiguous groups ("packages")
//! using the binary operators that sit between consecutive options.
//!
//! ```text
//! options:    A     B     C     D
//! operators:    and   or    and
//! groups:    [A  +  B] | [C  +  D]
//! ```
//!
//! # Alignment
//!
//! `operators[i]` joins `options[i]` and `options[i + 1]`, so a well-formed
//! list has `options.len() - 1` entries. Shorter lists are padded with `and`,
//! extra trailing entries are ignored. Misalignment is never an error.

use crate::model::{DealOption, Operator};
use crate::types::OperatorKind;

/// A maximal run of options joined only by `and`.
///
/// Groups borrow a contiguous slice of the caller's options; they are
/// recomputed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Group<'a> {
    /// Position of the first option in the original list
    pub start: usize,
    pub options: &'a [DealOption],
}

impl<'a> Group<'a> {
    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn option_ids(&self) -> Vec<u64> {
        self.options.iter().map(|o| o.id).collect()
    }

    pub fn contents(&self) -> impl Iterator<Item = &'a str> {
        self.options.iter().map(|o| o.content.as_str())
    }
}

/// Operator kind in front of `options[index]`, `and` when missing.
#[inline]
pub fn operator_before(operators: &[Operator], index: usize) -> OperatorKind {
    index
        .checked_sub(1)
        .and_then(|i| operators.get(i))
        .map_or(OperatorKind::And, |op| op.kind)
}

/// Partition `options` into groups bounded by `or` operators.
///
/// Every option lands in exactly one group, in its original order. Zero
/// options yield no groups.
pub fn group<'a>(options: &'a [DealOption], operators: &[Operator]) -> Vec<Group<'a>> {
    let mut groups = Vec::new();
    let mut start = 0;

    for index in 1..options.len() {
        if operator_before(operators, index).is_boundary() {
            groups.push(Group {
                start,
                options: &options[start..index],
            });
            start = index;
        }
    }

    if start < options.len() {
        groups.push(Group {
            start,
            options: &options[start..],
        });
    }

    groups
}

/// Number of `or` operators the grouper actually consults for `option_count`
/// options (ignores entries past the last option).
pub fn applied_or_count(option_count: usize, operators: &[Operator]) -> usize {
    (1..option_count)
        .filter(|&i| operator_before(operators, i).is_boundary())
        .count()
}

/// Pad with `and` or truncate so exactly `option_count - 1` operators remain.
///
/// Padding ids continue after the largest existing id.
pub fn align_operators(option_count: usize, operators: &[Operator]) -> Vec<Operator> {
    let wanted = option_count.saturating_sub(1);
    let mut aligned: Vec<Operator> = operators.iter().take(wanted).copied().collect();
    let mut next_id = operators.iter().map(|op| op.id).max().unwrap_or(0) + 1;
    while aligned.len() < wanted {
        aligned.push(Operator::and(next_id));
        next_id += 1;
    }
    aligned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<DealOption> {
        (1..=n as u64).map(|id| DealOption::new(id, format!("Option {}", id))).collect()
    }

    fn ids(groups: &[Group<'_>]) -> Vec<Vec<u64>> {
        groups.iter().map(Group::option_ids).collect()
    }

    #[test]
    fn test_empty_options_yield_no_groups() {
        assert!(group(&[], &[Operator::or(1)]).is_empty());
    }

    #[test]
    fn test_single_option_single_group() {
        let opts = options(1);
        let groups = group(&opts, &[]);
        assert_eq!(ids(&groups), vec![vec![1]]);
        assert_eq!(groups[0].start, 0);
    }

    #[test]
    fn test_and_or_mix() {
        let opts = options(4);
        let ops = [Operator::and(1), Operator::or(2), Operator::and(3)];
        let groups = group(&opts, &ops);
        assert_eq!(ids(&groups), vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(groups[1].start, 2);
    }

    #[test]
    fn test_all_or_splits() {
        let opts = options(3);
        let groups = group(&opts, &[Operator::or(1), Operator::or(2)]);
        assert_eq!(ids(&groups), vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_short_operator_list_pads_with_and() {
        let opts = options(4);
        let groups = group(&opts, &[Operator::or(1)]);
        assert_eq!(ids(&groups), vec![vec![1], vec![2, 3, 4]]);
    }

    #[test]
    fn test_extra_operators_ignored() {
        let opts = options(2);
        let ops = [Operator::and(1), Operator::or(2), Operator::or(3)];
        assert_eq!(ids(&group(&opts, &ops)), vec![vec![1, 2]]);
        assert_eq!(applied_or_count(2, &ops), 0);
    }

    #[test]
    fn test_operator_before_first_option_is_and() {
        assert_eq!(operator_before(&[Operator::or(1)], 0), OperatorKind::And);
        assert_eq!(operator_before(&[Operator::or(1)], 1), OperatorKind::Or);
        assert_eq!(operator_before(&[Operator::or(1)], 2), OperatorKind::And);
    }

    #[test]
    fn test_align_operators_pads_and_truncates() {
        let padded = align_operators(4, &[Operator::or(5)]);
        assert_eq!(padded, vec![Operator::or(5), Operator::and(6), Operator::and(7)]);

        let truncated = align_operators(2, &[Operator::or(1), Operator::or(2)]);
        assert_eq!(truncated, vec![Operator::or(1)]);

        assert!(align_operators(0, &[Operator::and(1)]).is_empty());
    }

    #[test]
    fn test_group_contents() {
        let opts = options(2);
        let groups = group(&opts, &[Operator::and(1)]);
        let contents: Vec<_> = groups[0].contents().collect();
        assert_eq!(contents, vec!["Option 1", "Option 2"]);
    }
}
