#![deny(warnings)]

//! Unit-economics model for quick-commerce delivery.
//!
//! This crate provides validated utilities for:
//! - Per-order revenue, variable cost and contribution margin
//! - Monthly net profit and break-even order volume
//! - Rule-based strategic verdicts and recommendations
//! - Volume derivations (monthly revenue, annualized GMV) used by views

use rust_decimal::Decimal;
use scenario_core::{
    validate_input, BreakEven, ScenarioInput, ScenarioResult, ValidationError, Verdict,
};
use thiserror::Error;
use tracing::debug;

/// Days in a modeled month.
pub const DAYS_PER_MONTH: u32 = 30;
/// Days in a modeled year.
pub const DAYS_PER_YEAR: u32 = 365;

/// Errors produced by the economics helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// The scenario input violates a domain invariant.
    #[error("invalid scenario input: {0}")]
    InvalidInput(#[from] ValidationError),
    /// Intermediate value does not fit a decimal.
    #[error("decimal overflow while computing {0}")]
    Overflow(&'static str),
}

/// Numeric part of a scenario result, before classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metrics {
    pub revenue_per_order: Decimal,
    pub variable_cost_per_order: Decimal,
    pub contribution_margin: Decimal,
    pub net_profit_monthly: Decimal,
    pub break_even_orders: BreakEven,
}

fn money(d: Decimal) -> Decimal {
    d.round_dp(2)
}

/// Compute per-order and monthly metrics.
///
/// Revenue is the platform commission on AOV; variable cost is delivery plus
/// the discount given away. Break-even is expressed in monthly orders and is
/// `Unreachable` when the margin is not positive. Money is rounded to two
/// places and break-even to whole orders, half-to-even.
///
/// Example:
/// let m = calculate_metrics(&default_draft()).unwrap();
/// assert_eq!(m.contribution_margin, Decimal::new(-10, 0));
pub fn calculate_metrics(input: &ScenarioInput) -> Result<Metrics, EconError> {
    validate_input(input)?;
    let revenue = input
        .aov
        .checked_mul(input.commission_rate)
        .ok_or(EconError::Overflow("revenue"))?;
    let discount = input
        .aov
        .checked_mul(input.discount_rate / Decimal::ONE_HUNDRED)
        .ok_or(EconError::Overflow("discount"))?;
    let variable_cost = input
        .delivery_cost
        .checked_add(discount)
        .ok_or(EconError::Overflow("variable cost"))?;
    let margin = revenue
        .checked_sub(variable_cost)
        .ok_or(EconError::Overflow("contribution margin"))?;

    let monthly_volume = monthly_orders(input.orders_per_day);
    let gross_contribution = margin
        .checked_mul(monthly_volume)
        .ok_or(EconError::Overflow("gross contribution"))?;
    let net_profit = gross_contribution
        .checked_sub(input.fixed_cost_monthly)
        .ok_or(EconError::Overflow("net profit"))?;

    let break_even = if margin > Decimal::ZERO {
        let orders = input
            .fixed_cost_monthly
            .checked_div(margin)
            .ok_or(EconError::Overflow("break-even"))?;
        BreakEven::from_decimal(orders.round_dp(0))
    } else {
        BreakEven::Unreachable
    };

    Ok(Metrics {
        revenue_per_order: money(revenue),
        variable_cost_per_order: money(variable_cost),
        contribution_margin: money(margin),
        net_profit_monthly: money(net_profit),
        break_even_orders: break_even,
    })
}

/// Classify metrics and draft the matching recommendation.
///
/// Only a strictly positive margin with a loss is "cash burn"; a margin of
/// exactly zero falls through to the profitable bucket.
pub fn strategic_insight(metrics: &Metrics, company: &str, city: &str) -> (Verdict, String) {
    let cm = metrics.contribution_margin;
    let profit = metrics.net_profit_monthly;
    if cm < Decimal::ZERO {
        (
            Verdict::NegativeUnitEconomics,
            format!(
                "Strategy: Retrenchment. {company} is losing money on every order in {city}. \
                 Immediate Action: Reduce discounts below 5% and increase minimum order value \
                 to improve AOV. Do not expand dark stores."
            ),
        )
    } else if cm > Decimal::ZERO && profit < Decimal::ZERO {
        (
            Verdict::CashBurn,
            format!(
                "Strategy: Market Penetration. {company} has healthy unit economics \
                 but lacks volume. Action: Increase marketing spend to boost order density. \
                 You are covering variable costs, just need to cover fixed costs."
            ),
        )
    } else {
        (
            Verdict::Profitable,
            format!(
                "Strategy: Product Development. {company} is generating free cash flow in {city}. \
                 Action: Reinvest profits into private label brands (higher margin) \
                 or expand to adjacent tier-2 cities."
            ),
        )
    }
}

/// Full calculation: metrics plus verdict.
pub fn simulate(input: &ScenarioInput) -> Result<ScenarioResult, EconError> {
    let m = calculate_metrics(input)?;
    let (verdict, recommendation) =
        strategic_insight(&m, input.company_name.as_str(), &input.city_tier);
    debug!(entity = %input.company_name, %verdict, "scenario simulated");
    Ok(ScenarioResult {
        revenue_per_order: m.revenue_per_order,
        variable_cost_per_order: m.variable_cost_per_order,
        contribution_margin: m.contribution_margin,
        net_profit_monthly: m.net_profit_monthly,
        break_even_orders: m.break_even_orders,
        strategic_verdict: verdict,
        recommendation,
    })
}

/// Orders in a modeled month.
pub fn monthly_orders(orders_per_day: u32) -> Decimal {
    Decimal::from(orders_per_day) * Decimal::from(DAYS_PER_MONTH)
}

/// Gross order value over a modeled month: AOV x daily orders x 30.
pub fn monthly_revenue(input: &ScenarioInput) -> Result<Decimal, EconError> {
    input
        .daily_gmv()
        .and_then(|d| d.checked_mul(Decimal::from(DAYS_PER_MONTH)))
        .ok_or(EconError::Overflow("monthly revenue"))
}

/// Annualized gross merchandise value: AOV x daily orders x 365.
pub fn annual_gmv(input: &ScenarioInput) -> Result<Decimal, EconError> {
    input
        .daily_gmv()
        .and_then(|d| d.checked_mul(Decimal::from(DAYS_PER_YEAR)))
        .ok_or(EconError::Overflow("annual GMV"))
}

/// Share of each value in the total as a percentage rounded to one place.
/// A zero total yields zero shares.
pub fn shares_pct(values: &[Decimal]) -> Result<Vec<Decimal>, EconError> {
    let total = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or(EconError::Overflow("share total"))?;
    if total <= Decimal::ZERO {
        return Ok(vec![Decimal::ZERO; values.len()]);
    }
    Ok(values
        .iter()
        .map(|v| (*v / total * Decimal::ONE_HUNDRED).round_dp(1))
        .collect())
}
