//! Display formatting for money, thousands and break-even volumes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use scenario_core::BreakEven;

/// Text shown for a break-even volume that can never be reached.
pub const UNBOUNDED: &str = "unbounded";

/// Digits of `n` grouped in threes: `1234567` -> `1,234,567`.
pub fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn positive_zero(mut d: Decimal) -> Decimal {
    if d.is_zero() {
        d.set_sign_positive(true);
    }
    d
}

/// Value in thousands with one decimal and a `k` suffix; positive values
/// carry a `+`. Halves round away from zero.
pub fn format_k(value: Decimal) -> String {
    let thousands = value / Decimal::ONE_THOUSAND;
    let k = positive_zero(
        thousands.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
    );
    let sign = if k > Decimal::ZERO { "+" } else { "" };
    format!("{sign}{k:.1}k")
}

/// Money with two decimals and grouped thousands, e.g. `-1,100,000.00`.
pub fn format_money(value: Decimal) -> String {
    let r = positive_zero(value.round_dp(2));
    let sign = if r.is_sign_negative() { "-" } else { "" };
    let abs = r.abs();
    let whole = abs.trunc();
    let cents = ((abs - whole) * Decimal::ONE_HUNDRED).to_u64().unwrap_or(0);
    let whole = whole.to_u128().unwrap_or(u128::MAX);
    format!("{sign}{}.{cents:02}", group_thousands(whole))
}

/// Break-even volume, or [`UNBOUNDED`] for the sentinel.
pub fn format_break_even(b: BreakEven) -> String {
    match b {
        BreakEven::Orders(n) => group_thousands(u128::from(n)),
        BreakEven::Unreachable => UNBOUNDED.to_string(),
    }
}

/// Percentage with one decimal, e.g. `46.2%`.
pub fn format_pct(p: Decimal) -> String {
    format!("{:.1}%", positive_zero(p.round_dp(1)))
}
