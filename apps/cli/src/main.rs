#![deny(warnings)]

//! Command-line front end: run a scenario, list saved scenarios, compare the
//! roster and export reports.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use persistence::{FallbackTable, FileStorage, KeyValueStorage, ScenarioStore};
use reports::{
    build_report, catalog, export, format_break_even, format_k, format_money, format_pct, history,
    ReportKind, ViewReader,
};
use rust_decimal::Decimal;
use scenario_core::{find_profile, InputEdit};
use scenario_runtime::{AppConfig, SessionOptions, SimulatorSession, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: profitengine [--config <path>] <command>

commands:
  simulate [--entity <name>] [--company <name>] [--city <tier>] [--aov <n>]
           [--orders <n>] [--delivery <n>] [--fixed <n>] [--commission <rate>]
           [--discount <pct>] [--save]
  history
  compare
  report <brief|audit|memo> [--out <dir>]
  catalog
  --version";

#[derive(Debug, Default, PartialEq)]
struct SimulateArgs {
    entity: Option<String>,
    edits: Vec<InputEdit>,
    save: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Simulate(SimulateArgs),
    History,
    Compare,
    Report { kind: ReportKind, out: Option<PathBuf> },
    Catalog,
    Version,
}

#[derive(Debug, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    command: Command,
}

fn value(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    it.next().ok_or_else(|| anyhow!("{flag} needs a value"))
}

fn decimal(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<Decimal> {
    let raw = value(it, flag)?;
    raw.parse()
        .with_context(|| format!("{flag}: not a number: {raw}"))
}

fn parse_simulate(it: &mut impl Iterator<Item = String>) -> Result<SimulateArgs> {
    let mut out = SimulateArgs::default();
    while let Some(arg) = it.next() {
        let edit = match arg.as_str() {
            "--entity" => {
                out.entity = Some(value(it, &arg)?);
                continue;
            }
            "--save" => {
                out.save = true;
                continue;
            }
            "--company" => InputEdit::CompanyName(value(it, &arg)?),
            "--city" => InputEdit::CityTier(value(it, &arg)?),
            "--aov" => InputEdit::Aov(decimal(it, &arg)?),
            "--orders" => {
                let raw = value(it, &arg)?;
                InputEdit::OrdersPerDay(
                    raw.parse()
                        .with_context(|| format!("--orders: not a whole number: {raw}"))?,
                )
            }
            "--delivery" => InputEdit::DeliveryCost(decimal(it, &arg)?),
            "--fixed" => InputEdit::FixedCostMonthly(decimal(it, &arg)?),
            "--commission" => InputEdit::CommissionRate(decimal(it, &arg)?),
            "--discount" => InputEdit::DiscountRate(decimal(it, &arg)?),
            other => bail!("unknown simulate option: {other}"),
        };
        out.edits.push(edit);
    }
    Ok(out)
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut it = args.into_iter();
    let mut config = None;
    let command = loop {
        let Some(arg) = it.next() else {
            bail!("{USAGE}");
        };
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(value(&mut it, "--config")?)),
            "--version" => break Command::Version,
            "simulate" => break Command::Simulate(parse_simulate(&mut it)?),
            "history" => break Command::History,
            "compare" => break Command::Compare,
            "catalog" => break Command::Catalog,
            "report" => {
                let short = value(&mut it, "report")?;
                let kind = ReportKind::from_short(&short)
                    .ok_or_else(|| anyhow!("unknown report: {short} (brief, audit, memo)"))?;
                let mut out = None;
                while let Some(flag) = it.next() {
                    match flag.as_str() {
                        "--out" => out = Some(PathBuf::from(value(&mut it, "--out")?)),
                        other => bail!("unknown report option: {other}"),
                    }
                }
                break Command::Report { kind, out };
            }
            other => bail!("unknown command: {other}\n{USAGE}"),
        }
    };
    Ok(Args { config, command })
}

fn open_storage(cfg: &AppConfig) -> Result<Arc<dyn KeyValueStorage>> {
    let storage = FileStorage::open(&cfg.storage_path)
        .with_context(|| format!("opening storage {}", cfg.storage_path.display()))?;
    Ok(Arc::new(storage))
}

fn timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

async fn simulate(cfg: &AppConfig, args: SimulateArgs) -> Result<()> {
    let service = Arc::new(cfg.service.build()?);
    let mut session = SimulatorSession::open(
        open_storage(cfg)?,
        FallbackTable::standard(),
        service,
        Arc::new(SystemClock),
        SessionOptions {
            debounce: cfg.debounce(),
            status_ttl_ms: cfg.status_ttl_ms,
        },
    );
    if let Some(entity) = &args.entity {
        session.select_entity(entity)?;
    }
    for edit in args.edits {
        session.edit(edit)?;
    }
    session.settle().await;
    let Some(done) = session.result() else {
        bail!("calculation failed; see log for details");
    };
    let (input, r) = (&done.input, &done.result);
    println!("Entity            {} ({})", input.company_name, input.city_tier);
    if let Some(profile) = find_profile(input.company_name.as_str()) {
        println!("Profile           {}: {}", profile.focus, profile.description);
    }
    println!(
        "Levers            AOV {} | {} orders/day | delivery {} | fixed {}/month",
        format_money(input.aov),
        input.orders_per_day,
        format_money(input.delivery_cost),
        format_money(input.fixed_cost_monthly)
    );
    println!("Revenue/order     {}", format_money(r.revenue_per_order));
    println!("Var cost/order    {}", format_money(r.variable_cost_per_order));
    println!("Contribution      {}", format_money(r.contribution_margin));
    println!(
        "Net profit/month  {} ({})",
        format_money(r.net_profit_monthly),
        format_k(r.net_profit_monthly)
    );
    println!(
        "Break-even        {} orders/month",
        format_break_even(r.break_even_orders)
    );
    println!("Verdict           {}", r.strategic_verdict);
    println!("Recommendation    {}", r.recommendation);

    if args.save {
        let outcome = session.save();
        if let Some(status) = session.status() {
            println!("{}", status.text);
        }
        outcome?;
    }
    Ok(())
}

fn print_history(cfg: &AppConfig) -> Result<()> {
    let store = ScenarioStore::new(open_storage(cfg)?, FallbackTable::standard());
    let rows = history(&store);
    if rows.is_empty() {
        println!("no saved scenarios");
    }
    for row in rows {
        println!(
            "{:<20} {:>12}  break-even {:>10}  saved {}",
            row.entity,
            row.net_profit_k,
            row.break_even,
            timestamp(row.updated_at)
        );
    }
    Ok(())
}

fn print_comparison(cfg: &AppConfig) -> Result<()> {
    let store = ScenarioStore::new(open_storage(cfg)?, FallbackTable::standard());
    let cmp = ViewReader::roster(&store).comparison()?;
    println!(
        "{:<12} {:>18} {:>7} {:>18} {:>10}  verdict",
        "entity", "monthly revenue", "share", "annual GMV", "net/month"
    );
    for row in &cmp.rows {
        println!(
            "{:<12} {:>18} {:>7} {:>18} {:>10}  {}",
            row.entity,
            format_money(row.monthly_revenue),
            format_pct(row.revenue_share_pct),
            format_money(row.annual_gmv),
            format_k(row.net_profit_monthly),
            row.verdict
        );
    }
    if let Some(leader) = cmp.leader() {
        println!("leader: {}", leader.entity);
    }
    Ok(())
}

fn write_report(cfg: &AppConfig, kind: ReportKind, out: Option<PathBuf>) -> Result<()> {
    let store = ScenarioStore::new(open_storage(cfg)?, FallbackTable::standard());
    let records = ViewReader::roster(&store).records();
    let doc = build_report(kind, &records, Utc::now())?;
    let dir = out.unwrap_or_else(|| cfg.report_dir.clone());
    for path in export(&doc, &dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.command == Command::Version {
        println!(
            "profitengine {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    let cfg = AppConfig::load(args.config.as_deref())?;
    info!(storage = %cfg.storage_path.display(), "starting CLI");

    match args.command {
        Command::Simulate(sim) => simulate(&cfg, sim).await,
        Command::History => print_history(&cfg),
        Command::Compare => print_comparison(&cfg),
        Command::Report { kind, out } => write_report(&cfg, kind, out),
        Command::Catalog => {
            for kind in catalog() {
                println!("{:<22} {:<11} {}", kind.file_stem(), kind.domain(), kind.title());
            }
            Ok(())
        }
        Command::Version => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Result<Args> {
        parse_args(s.split_whitespace().map(String::from))
    }

    #[test]
    fn simulate_collects_edits_in_order() {
        let a = args("--config c.yaml simulate --entity Zepto --aov 400 --orders 2500 --save")
            .unwrap();
        assert_eq!(a.config, Some(PathBuf::from("c.yaml")));
        assert_eq!(
            a.command,
            Command::Simulate(SimulateArgs {
                entity: Some("Zepto".to_string()),
                edits: vec![
                    InputEdit::Aov(Decimal::new(400, 0)),
                    InputEdit::OrdersPerDay(2500)
                ],
                save: true,
            })
        );
    }

    #[test]
    fn report_kinds_and_errors() {
        assert_eq!(
            args("report memo --out out").unwrap().command,
            Command::Report {
                kind: ReportKind::InvestmentMemo,
                out: Some(PathBuf::from("out"))
            }
        );
        assert!(args("report pdf").is_err());
        assert!(args("simulate --orders many").is_err());
        assert!(args("").is_err());
    }
}
