//! Built-in roster of modeled quick-commerce entities.

use crate::{EntityName, ScenarioInput};
use rust_decimal::Decimal;

/// Default lever positions for a roster entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeverDefaults {
    pub aov: Decimal,
    pub orders_per_day: u32,
    pub delivery_cost: Decimal,
    pub fixed_cost_monthly: Decimal,
}

/// A known competitor with its positioning and default levers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityProfile {
    pub name: &'static str,
    /// Short strategic focus, e.g. "Scale-First".
    pub focus: &'static str,
    pub description: &'static str,
    pub defaults: LeverDefaults,
}

fn profile(
    name: &'static str,
    focus: &'static str,
    description: &'static str,
    aov: i64,
    orders_per_day: u32,
    delivery_cost: i64,
    fixed_cost_monthly: i64,
) -> EntityProfile {
    EntityProfile {
        name,
        focus,
        description,
        defaults: LeverDefaults {
            aov: Decimal::new(aov, 0),
            orders_per_day,
            delivery_cost: Decimal::new(delivery_cost, 0),
            fixed_cost_monthly: Decimal::new(fixed_cost_monthly, 0),
        },
    }
}

/// The fixed roster, in display order.
pub fn roster() -> Vec<EntityProfile> {
    vec![
        profile(
            "Blinkit",
            "Scale-First",
            "High volume, optimized logistics.",
            450,
            3000,
            55,
            200_000,
        ),
        profile(
            "Zepto",
            "Speed-First",
            "Lower AOV, higher delivery cost.",
            350,
            2200,
            75,
            180_000,
        ),
        profile(
            "Instamart",
            "Ecosystem",
            "High AOV, leveraged fleet.",
            650,
            2500,
            60,
            150_000,
        ),
    ]
}

/// Look up a roster entity by exact name.
pub fn find_profile(name: &str) -> Option<&'static EntityProfile> {
    use std::sync::OnceLock;
    static ROSTER: OnceLock<Vec<EntityProfile>> = OnceLock::new();
    ROSTER.get_or_init(roster).iter().find(|p| p.name == name)
}

/// Draft used when nothing has been persisted yet.
pub fn default_draft() -> ScenarioInput {
    ScenarioInput {
        company_name: EntityName::new("Blinkit"),
        city_tier: "Tier 1 (Delhi)".to_string(),
        aov: Decimal::new(450, 0),
        orders_per_day: 3000,
        delivery_cost: Decimal::new(55, 0),
        commission_rate: Decimal::new(15, 2),
        discount_rate: Decimal::new(50, 1),
        fixed_cost_monthly: Decimal::new(200_000, 0),
    }
}
