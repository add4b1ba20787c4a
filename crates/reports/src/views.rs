//! Derived-view readers over the scenario store.

use crate::format::{format_break_even, format_k};
use persistence::{ScenarioMap, ScenarioStore};
use rust_decimal::Decimal;
use scenario_core::{
    roster, BreakEven, EntityName, ScenarioRecord, ScenarioResult, TimestampMs, Verdict,
};
use unit_econ::EconError;

/// Resolves a fixed entity list against the store.
///
/// Every view goes through this reader, so an entity is shown from its
/// saved record, else from its built-in default, else not at all, no
/// matter which view asks.
pub struct ViewReader<'a> {
    store: &'a ScenarioStore,
    entities: Vec<EntityName>,
}

impl<'a> ViewReader<'a> {
    /// Reader over the built-in roster, in roster order.
    pub fn roster(store: &'a ScenarioStore) -> Self {
        let entities = roster().iter().map(|p| EntityName::new(p.name)).collect();
        Self { store, entities }
    }

    pub fn with_entities(store: &'a ScenarioStore, entities: Vec<EntityName>) -> Self {
        Self { store, entities }
    }

    /// Resolved records, omitting entities with neither a save nor a default.
    pub fn records(&self) -> Vec<(EntityName, ScenarioRecord)> {
        self.store.resolve_many(self.entities.iter())
    }

    pub fn comparison(&self) -> Result<MarketComparison, EconError> {
        MarketComparison::from_records(&self.records())
    }
}

/// One entity in the market comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComparisonRow {
    pub entity: EntityName,
    pub monthly_revenue: Decimal,
    /// Share of the compared entities' combined monthly revenue, in percent.
    pub revenue_share_pct: Decimal,
    pub annual_gmv: Decimal,
    pub contribution_margin: Decimal,
    pub net_profit_monthly: Decimal,
    pub break_even_orders: BreakEven,
    pub verdict: Verdict,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarketComparison {
    pub rows: Vec<ComparisonRow>,
}

impl MarketComparison {
    /// Fails with [`EconError::Overflow`] when a record's volumes do not fit
    /// a decimal; no partial comparison is produced.
    pub fn from_records(records: &[(EntityName, ScenarioRecord)]) -> Result<Self, EconError> {
        let revenues = records
            .iter()
            .map(|(_, r)| unit_econ::monthly_revenue(&r.inputs))
            .collect::<Result<Vec<_>, _>>()?;
        let shares = unit_econ::shares_pct(&revenues)?;
        let rows = records
            .iter()
            .zip(revenues.into_iter().zip(shares))
            .map(|((entity, r), (monthly_revenue, revenue_share_pct))| {
                Ok(ComparisonRow {
                    entity: entity.clone(),
                    monthly_revenue,
                    revenue_share_pct,
                    annual_gmv: unit_econ::annual_gmv(&r.inputs)?,
                    contribution_margin: r.result.contribution_margin,
                    net_profit_monthly: r.result.net_profit_monthly,
                    break_even_orders: r.result.break_even_orders,
                    verdict: r.result.strategic_verdict,
                })
            })
            .collect::<Result<Vec<_>, EconError>>()?;
        Ok(Self { rows })
    }

    /// Row with the highest monthly net profit.
    pub fn leader(&self) -> Option<&ComparisonRow> {
        self.rows.iter().max_by(|a, b| {
            a.net_profit_monthly
                .cmp(&b.net_profit_monthly)
                .then_with(|| b.entity.cmp(&a.entity))
        })
    }
}

/// Saved records, most recently saved first; ties by entity name.
pub fn sort_recent(map: ScenarioMap) -> Vec<(EntityName, ScenarioRecord)> {
    let mut v: Vec<_> = map.into_iter().collect();
    v.sort_by(|(ea, a), (eb, b)| b.updated_at.cmp(&a.updated_at).then_with(|| ea.cmp(eb)));
    v
}

/// A line of the "active scenarios" list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    pub entity: EntityName,
    pub updated_at: TimestampMs,
    pub net_profit_k: String,
    pub profitable: bool,
    pub break_even: String,
}

/// Saved scenarios, newest first.
pub fn history(store: &ScenarioStore) -> Vec<HistoryRow> {
    sort_recent(store.all())
        .into_iter()
        .map(|(entity, r)| HistoryRow {
            entity,
            updated_at: r.updated_at,
            net_profit_k: format_k(r.result.net_profit_monthly),
            profitable: r.result.net_profit_monthly > Decimal::ZERO,
            break_even: format_break_even(r.result.break_even_orders),
        })
        .collect()
}

/// Per-order revenue, variable cost and contribution, for the breakdown chart.
pub fn unit_breakdown(result: &ScenarioResult) -> Vec<(&'static str, Decimal)> {
    vec![
        ("Revenue", result.revenue_per_order),
        ("Var Cost", result.variable_cost_per_order),
        ("Contribution", result.contribution_margin),
    ]
}
