//! Currency formatting and parsing for labels
//!
//! Amounts render en-US style: thousands separators, cents only when
//! non-zero (`$10,000`, `$2,969.47`). Amount text is read by its leading
//! number, so `"1250 USD"` is 1250 and `"10.5%."` is 10.5.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Symbol used when the caller does not configure one
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Format `amount` with the default `$` symbol
pub fn format_currency(amount: Decimal) -> String {
    format_amount(amount, DEFAULT_CURRENCY_SYMBOL)
}

/// Format `amount` rounded half away from zero to cents with `symbol` in
/// front.
pub fn format_amount(amount: Decimal, symbol: &str) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let whole = rounded.trunc();
    let cents = ((rounded - whole) * Decimal::ONE_HUNDRED).to_u32().unwrap_or(0);
    let digits = group_thousands(&whole.to_u128().unwrap_or(0).to_string());
    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    if cents == 0 {
        format!("{}{}{}", sign, symbol, digits)
    } else {
        format!("{}{}{}.{:02}", sign, symbol, digits, cents)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Read the longest leading `[+-]digits[.digits]` number of `text`.
///
/// Anything after the number is ignored; a lone `.` or sign is no number.
/// Returns `None` when there is no leading number or it does not fit a
/// [`Decimal`].
pub fn parse_leading_number(text: &str) -> Option<Decimal> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let int_digits = end - int_start;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        let mut frac_end = end + 1;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        frac_digits = frac_end - end - 1;
        if frac_digits > 0 {
            end = frac_end;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    let number = &text[..end];
    let sign = if number.starts_with('-') { "-" } else { "" };
    let unsigned = number.trim_start_matches(['+', '-']);
    let normalized = if unsigned.starts_with('.') {
        format!("{}0{}", sign, unsigned)
    } else {
        format!("{}{}", sign, unsigned)
    };
    Decimal::from_str(&normalized).ok()
}
