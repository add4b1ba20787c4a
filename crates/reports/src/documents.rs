//! Report documents assembled from resolved scenario records.

use crate::format::{format_break_even, format_k, format_money, format_pct};
use crate::views::{unit_breakdown, MarketComparison};
use crate::ReportError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scenario_core::{EntityName, ScenarioRecord};
use tracing::debug;

/// Blocks laid out on one page.
pub const BLOCKS_PER_PAGE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportKind {
    OperationalBrief,
    CostStructureAudit,
    InvestmentMemo,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::OperationalBrief,
        ReportKind::CostStructureAudit,
        ReportKind::InvestmentMemo,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ReportKind::OperationalBrief => "Quick Commerce Operational Brief",
            ReportKind::CostStructureAudit => "Unit Cost Structure Audit",
            ReportKind::InvestmentMemo => "Investment Memorandum: Market Position",
        }
    }

    pub fn domain(self) -> &'static str {
        match self {
            ReportKind::OperationalBrief => "Operations",
            ReportKind::CostStructureAudit => "Financials",
            ReportKind::InvestmentMemo => "Strategy",
        }
    }

    /// File name without extension.
    pub fn file_stem(self) -> &'static str {
        match self {
            ReportKind::OperationalBrief => "operational_brief",
            ReportKind::CostStructureAudit => "cost_structure_audit",
            ReportKind::InvestmentMemo => "investment_memo",
        }
    }

    /// Parse the short command-line name.
    pub fn from_short(name: &str) -> Option<Self> {
        match name {
            "brief" => Some(ReportKind::OperationalBrief),
            "audit" => Some(ReportKind::CostStructureAudit),
            "memo" => Some(ReportKind::InvestmentMemo),
            _ => None,
        }
    }
}

/// The available report variants, in listing order.
pub fn catalog() -> &'static [ReportKind] {
    &ReportKind::ALL
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    pub caption: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarChart {
    pub caption: String,
    pub bars: Vec<(String, Decimal)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    Table(Table),
    BarChart(BarChart),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub kind: ReportKind,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.pages.iter().flat_map(|p| &p.blocks).filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn charts(&self) -> impl Iterator<Item = &BarChart> {
        self.pages.iter().flat_map(|p| &p.blocks).filter_map(|b| match b {
            Block::BarChart(c) => Some(c),
            _ => None,
        })
    }
}

fn strings<const N: usize>(cols: [&str; N]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn paginate(blocks: Vec<Block>) -> Vec<Page> {
    blocks
        .chunks(BLOCKS_PER_PAGE)
        .enumerate()
        .map(|(i, chunk)| Page {
            number: i + 1,
            blocks: chunk.to_vec(),
        })
        .collect()
}

/// Build one report variant over `records`, which must not be empty.
pub fn build_report(
    kind: ReportKind,
    records: &[(EntityName, ScenarioRecord)],
    generated_at: DateTime<Utc>,
) -> Result<Document, ReportError> {
    if records.is_empty() {
        return Err(ReportError::NoData);
    }
    let comparison = MarketComparison::from_records(records)?;
    let mut blocks = vec![Block::Heading(kind.title().to_string())];
    match kind {
        ReportKind::OperationalBrief => operational_brief(records, &comparison, &mut blocks),
        ReportKind::CostStructureAudit => cost_audit(records, &mut blocks),
        ReportKind::InvestmentMemo => investment_memo(&comparison, &mut blocks),
    }
    let pages = paginate(blocks);
    debug!(report = kind.file_stem(), pages = pages.len(), "report built");
    Ok(Document {
        kind,
        title: kind.title().to_string(),
        generated_at,
        pages,
    })
}

fn operational_brief(
    records: &[(EntityName, ScenarioRecord)],
    comparison: &MarketComparison,
    blocks: &mut Vec<Block>,
) {
    let profitable = comparison
        .rows
        .iter()
        .filter(|r| r.net_profit_monthly > Decimal::ZERO)
        .count();
    blocks.push(Block::Paragraph(format!(
        "{} of {} modeled operators clear their fixed costs at current order volume.",
        profitable,
        comparison.rows.len()
    )));
    blocks.push(Block::Table(Table {
        caption: "Operating levers".to_string(),
        header: strings([
            "Entity",
            "Orders/Day",
            "AOV",
            "Delivery Cost",
            "Contribution/Order",
            "Break-even (orders/month)",
            "Verdict",
        ]),
        rows: records
            .iter()
            .map(|(entity, r)| {
                vec![
                    entity.to_string(),
                    r.inputs.orders_per_day.to_string(),
                    format_money(r.inputs.aov),
                    format_money(r.inputs.delivery_cost),
                    format_money(r.result.contribution_margin),
                    format_break_even(r.result.break_even_orders),
                    r.result.strategic_verdict.label().to_string(),
                ]
            })
            .collect(),
    }));
    blocks.push(Block::BarChart(BarChart {
        caption: "Monthly net profit".to_string(),
        bars: comparison
            .rows
            .iter()
            .map(|r| (r.entity.to_string(), r.net_profit_monthly))
            .collect(),
    }));
    for (entity, r) in records {
        blocks.push(Block::Paragraph(format!("{entity}: {}", r.result.recommendation)));
    }
}

fn cost_audit(records: &[(EntityName, ScenarioRecord)], blocks: &mut Vec<Block>) {
    blocks.push(Block::Table(Table {
        caption: "Per-order economics".to_string(),
        header: strings([
            "Entity",
            "Revenue/Order",
            "Var Cost/Order",
            "Contribution",
            "Fixed Cost/Month",
        ]),
        rows: records
            .iter()
            .map(|(entity, r)| {
                vec![
                    entity.to_string(),
                    format_money(r.result.revenue_per_order),
                    format_money(r.result.variable_cost_per_order),
                    format_money(r.result.contribution_margin),
                    format_money(r.inputs.fixed_cost_monthly),
                ]
            })
            .collect(),
    }));
    for (entity, r) in records {
        blocks.push(Block::BarChart(BarChart {
            caption: format!("{entity} unit breakdown"),
            bars: unit_breakdown(&r.result)
                .into_iter()
                .map(|(label, v)| (label.to_string(), v))
                .collect(),
        }));
        let finding = if r.result.variable_cost_per_order > r.result.revenue_per_order {
            format!(
                "{entity}: variable cost exceeds take rate by {} per order.",
                format_money(r.result.variable_cost_per_order - r.result.revenue_per_order)
            )
        } else {
            format!(
                "{entity}: each order contributes {} toward fixed costs.",
                format_money(r.result.contribution_margin)
            )
        };
        blocks.push(Block::Paragraph(finding));
    }
}

fn investment_memo(comparison: &MarketComparison, blocks: &mut Vec<Block>) {
    if let Some(leader) = comparison.leader() {
        blocks.push(Block::Paragraph(format!(
            "{} leads on monthly net profit at {} with a {} share of modeled revenue.",
            leader.entity,
            format_k(leader.net_profit_monthly),
            format_pct(leader.revenue_share_pct)
        )));
    }
    blocks.push(Block::Table(Table {
        caption: "Market position".to_string(),
        header: strings([
            "Entity",
            "Monthly Revenue",
            "Revenue Share",
            "Annual GMV",
            "Net Profit/Month",
            "Verdict",
        ]),
        rows: comparison
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.entity.to_string(),
                    format_money(r.monthly_revenue),
                    format_pct(r.revenue_share_pct),
                    format_money(r.annual_gmv),
                    format_money(r.net_profit_monthly),
                    r.verdict.label().to_string(),
                ]
            })
            .collect(),
    }));
    blocks.push(Block::BarChart(BarChart {
        caption: "Revenue share (%)".to_string(),
        bars: comparison
            .rows
            .iter()
            .map(|r| (r.entity.to_string(), r.revenue_share_pct))
            .collect(),
    }));
    blocks.push(Block::BarChart(BarChart {
        caption: "Annual GMV".to_string(),
        bars: comparison
            .rows
            .iter()
            .map(|r| (r.entity.to_string(), r.annual_gmv))
            .collect(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use persistence::{FallbackTable, MemoryStorage, ScenarioStore};
    use std::sync::Arc;

    fn roster_records() -> Vec<(EntityName, ScenarioRecord)> {
        let store = ScenarioStore::new(Arc::new(MemoryStorage::new()), FallbackTable::standard());
        crate::views::ViewReader::roster(&store).records()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn catalog_lists_three_variants() {
        let stems: Vec<_> = catalog().iter().map(|k| k.file_stem()).collect();
        assert_eq!(
            stems,
            vec!["operational_brief", "cost_structure_audit", "investment_memo"]
        );
        assert_eq!(ReportKind::from_short("memo"), Some(ReportKind::InvestmentMemo));
        assert_eq!(ReportKind::from_short("pdf"), None);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            build_report(ReportKind::OperationalBrief, &[], at()),
            Err(ReportError::NoData)
        ));
    }

    #[test]
    fn pages_are_numbered_and_bounded() {
        for kind in ReportKind::ALL {
            let doc = build_report(kind, &roster_records(), at()).unwrap();
            assert!(!doc.pages.is_empty());
            for (i, page) in doc.pages.iter().enumerate() {
                assert_eq!(page.number, i + 1);
                assert!(page.blocks.len() <= BLOCKS_PER_PAGE);
                assert!(!page.blocks.is_empty());
            }
            assert_eq!(doc.pages[0].blocks[0], Block::Heading(kind.title().to_string()));
        }
    }

    #[test]
    fn memo_carries_annual_gmv() {
        let doc = build_report(ReportKind::InvestmentMemo, &roster_records(), at()).unwrap();
        let table = doc.tables().next().unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][0], "Blinkit");
        assert_eq!(table.rows[0][3], "492,750,000.00");
        assert_eq!(doc.charts().count(), 2);
    }

    #[test]
    fn brief_shows_unreachable_break_even() {
        let doc = build_report(ReportKind::OperationalBrief, &roster_records(), at()).unwrap();
        let table = doc.tables().next().unwrap();
        // Blinkit defaults lose money on every order
        assert_eq!(table.rows[0][5], crate::format::UNBOUNDED);
    }

    #[test]
    fn audit_charts_one_breakdown_per_entity() {
        let records = roster_records();
        let doc = build_report(ReportKind::CostStructureAudit, &records, at()).unwrap();
        assert_eq!(doc.charts().count(), records.len());
        assert!(doc.charts().all(|c| c.bars.len() == 3));
    }

    #[test]
    fn oversized_volumes_fail_the_report() {
        let mut records = roster_records();
        records[0].1.inputs.aov = Decimal::from_i128_with_scale(10i128.pow(24), 0);
        records[0].1.inputs.orders_per_day = 5000;
        assert!(matches!(
            build_report(ReportKind::InvestmentMemo, &records, at()),
            Err(ReportError::Econ(unit_econ::EconError::Overflow("monthly revenue")))
        ));
    }
}
