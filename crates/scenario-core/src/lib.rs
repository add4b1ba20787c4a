#![deny(warnings)]

//! Core domain models and invariants for ProfitEngine.
//!
//! This crate defines the serializable scenario types shared by every other
//! crate, the built-in entity roster, and validation helpers guarding the
//! input invariants.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

mod roster;

pub use roster::{default_draft, find_profile, roster, EntityProfile, LeverDefaults};

/// Milliseconds since the Unix epoch.
pub type TimestampMs = i64;

/// Wire value used for a break-even volume that can never be reached.
pub const BREAK_EVEN_SENTINEL: i64 = -1;

/// Name of a modeled company, e.g. "Blinkit". Unique key of the scenario store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityName(pub String);

impl EntityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for EntityName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Levers of one unit-economics scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Entity the scenario models.
    pub company_name: EntityName,
    /// Free-form city tier label, e.g. "Tier 1 (Delhi)".
    pub city_tier: String,
    /// Average order value (> 0).
    pub aov: Decimal,
    /// Orders per day.
    pub orders_per_day: u32,
    /// Last-mile cost per order (>= 0).
    pub delivery_cost: Decimal,
    /// Share of AOV kept by the platform, in [0, 1].
    pub commission_rate: Decimal,
    /// Customer discount as a percentage of AOV, in [0, 100].
    pub discount_rate: Decimal,
    /// Dark store rent and salaries per month (>= 0).
    pub fixed_cost_monthly: Decimal,
}

/// Monthly break-even order volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakEven {
    Orders(u64),
    /// Contribution margin is not positive; no volume breaks even.
    Unreachable,
}

impl BreakEven {
    /// Integer wire form, with [`BREAK_EVEN_SENTINEL`] for `Unreachable`.
    pub fn to_wire(self) -> i64 {
        match self {
            BreakEven::Orders(n) => i64::try_from(n).unwrap_or(i64::MAX),
            BreakEven::Unreachable => BREAK_EVEN_SENTINEL,
        }
    }

    pub fn from_wire(v: i64) -> Self {
        match u64::try_from(v) {
            Ok(n) => BreakEven::Orders(n),
            Err(_) => BreakEven::Unreachable,
        }
    }

    /// Converts a rounded decimal order count; negative values map to `Unreachable`.
    pub fn from_decimal(d: Decimal) -> Self {
        if d.is_sign_negative() && !d.is_zero() {
            return BreakEven::Unreachable;
        }
        d.to_u64()
            .map(BreakEven::Orders)
            .unwrap_or(BreakEven::Orders(u64::MAX))
    }
}

impl Serialize for BreakEven {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(self.to_wire())
    }
}

impl<'de> Deserialize<'de> for BreakEven {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        // Services may send the count as a float (e.g. 20000.0).
        let v = f64::deserialize(d)?;
        if !v.is_finite() || v < 0.0 {
            return Ok(BreakEven::Unreachable);
        }
        Ok(Decimal::from_f64(v.round())
            .map(BreakEven::from_decimal)
            .unwrap_or(BreakEven::Orders(u64::MAX)))
    }
}

/// Qualitative classification of a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "CRITICAL: Negative Unit Economics")]
    NegativeUnitEconomics,
    #[serde(rename = "Growth Phase: Cash Burn")]
    CashBurn,
    #[serde(rename = "Sustainable: Profitable")]
    Profitable,
    /// Any label this build does not know.
    #[serde(rename = "Unclassified", other)]
    Unclassified,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::NegativeUnitEconomics => "CRITICAL: Negative Unit Economics",
            Verdict::CashBurn => "Growth Phase: Cash Burn",
            Verdict::Profitable => "Sustainable: Profitable",
            Verdict::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Profitability metrics computed for a [`ScenarioInput`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub revenue_per_order: Decimal,
    pub variable_cost_per_order: Decimal,
    /// Revenue minus variable cost per order; may be negative.
    pub contribution_margin: Decimal,
    /// May be negative.
    pub net_profit_monthly: Decimal,
    pub break_even_orders: BreakEven,
    pub strategic_verdict: Verdict,
    #[serde(rename = "ai_recommendation")]
    pub recommendation: String,
}

/// One saved scenario: the inputs, their result and when it was saved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub inputs: ScenarioInput,
    pub result: ScenarioResult,
    #[serde(rename = "updatedAt")]
    pub updated_at: TimestampMs,
}

/// An adjustable lever of the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lever {
    Aov,
    OrdersPerDay,
    DeliveryCost,
    FixedCostMonthly,
}

impl Lever {
    /// Inclusive slider range for the lever.
    pub fn bounds(self) -> (Decimal, Decimal) {
        match self {
            Lever::Aov => (Decimal::new(100, 0), Decimal::new(1000, 0)),
            Lever::OrdersPerDay => (Decimal::new(100, 0), Decimal::new(5000, 0)),
            Lever::DeliveryCost => (Decimal::new(20, 0), Decimal::new(150, 0)),
            Lever::FixedCostMonthly => (Decimal::new(50_000, 0), Decimal::new(300_000, 0)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Lever::Aov => "aov",
            Lever::OrdersPerDay => "orders_per_day",
            Lever::DeliveryCost => "delivery_cost",
            Lever::FixedCostMonthly => "fixed_cost_monthly",
        }
    }
}

/// A single edit applied to a draft input.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEdit {
    CompanyName(String),
    CityTier(String),
    Aov(Decimal),
    OrdersPerDay(u32),
    DeliveryCost(Decimal),
    CommissionRate(Decimal),
    DiscountRate(Decimal),
    FixedCostMonthly(Decimal),
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Entity names must contain a non-whitespace character.
    #[error("entity name must not be empty")]
    EmptyName,
    /// AOV must be strictly positive.
    #[error("average order value must be > 0")]
    NonPositiveAov,
    /// Costs must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Commission is a fraction in [0,1].
    #[error("commission rate {0} outside [0, 1]")]
    CommissionOutOfRange(Decimal),
    /// Discount is a percentage in [0,100].
    #[error("discount rate {0} outside [0, 100]")]
    DiscountOutOfRange(Decimal),
    /// Lever edit outside its slider range.
    #[error("{lever} = {value} outside [{min}, {max}]")]
    LeverOutOfRange {
        lever: &'static str,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },
}

/// Validate a scenario input.
pub fn validate_input(input: &ScenarioInput) -> Result<(), ValidationError> {
    if input.company_name.0.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if input.aov <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAov);
    }
    if input.delivery_cost < Decimal::ZERO || input.fixed_cost_monthly < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    if input.commission_rate < Decimal::ZERO || input.commission_rate > Decimal::ONE {
        return Err(ValidationError::CommissionOutOfRange(input.commission_rate));
    }
    if input.discount_rate < Decimal::ZERO || input.discount_rate > Decimal::ONE_HUNDRED {
        return Err(ValidationError::DiscountOutOfRange(input.discount_rate));
    }
    Ok(())
}

fn check_lever(lever: Lever, value: Decimal) -> Result<(), ValidationError> {
    let (min, max) = lever.bounds();
    if value < min || value > max {
        return Err(ValidationError::LeverOutOfRange {
            lever: lever.name(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl ScenarioInput {
    /// Apply one edit. Slider levers are range-checked; the draft is left
    /// untouched when the edit is rejected.
    pub fn apply(&mut self, edit: InputEdit) -> Result<(), ValidationError> {
        let mut next = self.clone();
        match edit {
            InputEdit::CompanyName(name) => next.company_name = EntityName(name),
            InputEdit::CityTier(tier) => next.city_tier = tier,
            InputEdit::Aov(v) => {
                check_lever(Lever::Aov, v)?;
                next.aov = v;
            }
            InputEdit::OrdersPerDay(v) => {
                check_lever(Lever::OrdersPerDay, Decimal::from(v))?;
                next.orders_per_day = v;
            }
            InputEdit::DeliveryCost(v) => {
                check_lever(Lever::DeliveryCost, v)?;
                next.delivery_cost = v;
            }
            InputEdit::FixedCostMonthly(v) => {
                check_lever(Lever::FixedCostMonthly, v)?;
                next.fixed_cost_monthly = v;
            }
            InputEdit::CommissionRate(v) => next.commission_rate = v,
            InputEdit::DiscountRate(v) => next.discount_rate = v,
        }
        validate_input(&next)?;
        *self = next;
        Ok(())
    }

    /// Switch to a roster entity: name and its four lever defaults are
    /// replaced, city tier and rates are kept.
    pub fn with_profile(&self, profile: &EntityProfile) -> ScenarioInput {
        ScenarioInput {
            company_name: EntityName::new(profile.name),
            aov: profile.defaults.aov,
            orders_per_day: profile.defaults.orders_per_day,
            delivery_cost: profile.defaults.delivery_cost,
            fixed_cost_monthly: profile.defaults.fixed_cost_monthly,
            ..self.clone()
        }
    }

    /// Gross order value per day (AOV x daily orders), `None` on overflow.
    pub fn daily_gmv(&self) -> Option<Decimal> {
        self.aov.checked_mul(Decimal::from(self.orders_per_day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn blinkit_result() -> ScenarioResult {
        ScenarioResult {
            revenue_per_order: Decimal::new(675, 1),
            variable_cost_per_order: Decimal::new(775, 1),
            contribution_margin: Decimal::new(-10, 0),
            net_profit_monthly: Decimal::new(-1_100_000, 0),
            break_even_orders: BreakEven::Unreachable,
            strategic_verdict: Verdict::NegativeUnitEconomics,
            recommendation: "Strategy: Retrenchment.".to_string(),
        }
    }

    #[test]
    fn record_wire_names_match_stored_cache() {
        let rec = ScenarioRecord {
            inputs: default_draft(),
            result: blinkit_result(),
            updated_at: 1_700_000_000_000,
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["updatedAt"], 1_700_000_000_000i64);
        assert_eq!(v["inputs"]["company_name"], "Blinkit");
        assert_eq!(v["result"]["break_even_orders"], -1);
        assert_eq!(
            v["result"]["strategic_verdict"],
            "CRITICAL: Negative Unit Economics"
        );
        assert!(v["result"]["ai_recommendation"].is_string());
        let back: ScenarioRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn break_even_accepts_float_counts() {
        let b: BreakEven = serde_json::from_str("20000.0").unwrap();
        assert_eq!(b, BreakEven::Orders(20000));
        let b: BreakEven = serde_json::from_str("-1").unwrap();
        assert_eq!(b, BreakEven::Unreachable);
        let b: BreakEven = serde_json::from_str("-1.0").unwrap();
        assert_eq!(b, BreakEven::Unreachable);
    }

    #[test]
    fn unknown_verdict_label_is_unclassified() {
        let v: Verdict = serde_json::from_str("\"Turnaround\"").unwrap();
        assert_eq!(v, Verdict::Unclassified);
    }

    #[test]
    fn result_parses_numeric_service_payload() {
        let body = r#"{
            "revenue_per_order": 67.5,
            "variable_cost_per_order": 77.5,
            "contribution_margin": -10.0,
            "net_profit_monthly": -1100000.0,
            "break_even_orders": -1,
            "strategic_verdict": "CRITICAL: Negative Unit Economics",
            "ai_recommendation": "Strategy: Retrenchment."
        }"#;
        let r: ScenarioResult = serde_json::from_str(body).unwrap();
        assert_eq!(r.contribution_margin, Decimal::new(-10, 0));
        assert_eq!(r.break_even_orders, BreakEven::Unreachable);
    }

    #[test]
    fn validation_rejects_bad_rates() {
        let mut i = default_draft();
        i.commission_rate = Decimal::new(15, 1);
        assert!(matches!(
            validate_input(&i),
            Err(ValidationError::CommissionOutOfRange(_))
        ));
        let mut i = default_draft();
        i.company_name = EntityName::new("  ");
        assert_eq!(validate_input(&i), Err(ValidationError::EmptyName));
        let mut i = default_draft();
        i.aov = Decimal::ZERO;
        assert_eq!(validate_input(&i), Err(ValidationError::NonPositiveAov));
    }

    #[test]
    fn rejected_edit_leaves_draft_untouched() {
        let mut i = default_draft();
        let before = i.clone();
        let err = i.apply(InputEdit::Aov(Decimal::new(5000, 0))).unwrap_err();
        assert!(matches!(err, ValidationError::LeverOutOfRange { lever: "aov", .. }));
        assert_eq!(i, before);
    }

    #[test]
    fn profile_switch_keeps_rates_and_city() {
        let mut draft = default_draft();
        draft.city_tier = "Tier 2 (Pune)".to_string();
        draft.discount_rate = Decimal::new(8, 0);
        let zepto = find_profile("Zepto").unwrap();
        let next = draft.with_profile(zepto);
        assert_eq!(next.company_name.as_str(), "Zepto");
        assert_eq!(next.aov, Decimal::new(350, 0));
        assert_eq!(next.orders_per_day, 2200);
        assert_eq!(next.city_tier, "Tier 2 (Pune)");
        assert_eq!(next.discount_rate, Decimal::new(8, 0));
    }

    proptest! {
        #[test]
        fn in_range_lever_edits_accepted(aov in 100i64..=1000,
                                         orders in 100u32..=5000,
                                         delivery in 20i64..=150) {
            let mut i = default_draft();
            prop_assert!(i.apply(InputEdit::Aov(Decimal::new(aov, 0))).is_ok());
            prop_assert!(i.apply(InputEdit::OrdersPerDay(orders)).is_ok());
            prop_assert!(i.apply(InputEdit::DeliveryCost(Decimal::new(delivery, 0))).is_ok());
            prop_assert_eq!(i.orders_per_day, orders);
        }

        #[test]
        fn break_even_wire_roundtrip(n in 0i64..10_000_000) {
            prop_assert_eq!(BreakEven::from_wire(n).to_wire(), n);
        }
    }
}
