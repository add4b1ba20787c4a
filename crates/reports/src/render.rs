//! Text and CSV renderings of a [`Document`], and export to disk.

use crate::documents::{BarChart, Block, Document, Table};
use crate::ReportError;
use rust_decimal::prelude::ToPrimitive;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

const BAR_WIDTH: usize = 30;

/// Paginated plain-text layout.
pub fn render_text(doc: &Document) -> String {
    let mut out = String::new();
    let rule = "=".repeat(72);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{}", doc.title.to_uppercase());
    let _ = writeln!(out, "Domain: {}", doc.kind.domain());
    let _ = writeln!(out, "Generated: {}", doc.generated_at.format("%b %d, %Y %H:%M UTC"));
    let _ = writeln!(out, "{rule}");
    let total = doc.pages.len();
    for page in &doc.pages {
        for block in &page.blocks {
            out.push('\n');
            match block {
                Block::Heading(h) => {
                    let _ = writeln!(out, "{h}\n{}", "-".repeat(h.chars().count()));
                }
                Block::Paragraph(p) => {
                    let _ = writeln!(out, "{p}");
                }
                Block::Table(t) => render_table(&mut out, t),
                Block::BarChart(c) => render_chart(&mut out, c),
            }
        }
        let _ = writeln!(out, "\n--- page {} of {total} ---", page.number);
    }
    out
}

fn render_table(out: &mut String, t: &Table) {
    let mut widths: Vec<usize> = t.header.iter().map(|h| h.chars().count()).collect();
    for row in &t.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<width$}", width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    let _ = writeln!(out, "[{}]", t.caption);
    let _ = writeln!(out, "{}", line(&t.header));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    for row in &t.rows {
        let _ = writeln!(out, "{}", line(row));
    }
}

fn render_chart(out: &mut String, c: &BarChart) {
    let _ = writeln!(out, "[{}]", c.caption);
    let max = c
        .bars
        .iter()
        .filter_map(|(_, v)| v.abs().to_f64())
        .fold(0.0_f64, f64::max);
    let label_w = c.bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    for (label, value) in &c.bars {
        let len = if max > 0.0 {
            let v = value.abs().to_f64().unwrap_or(0.0);
            ((v / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let glyph = if value.is_sign_negative() { "-" } else { "#" };
        let _ = writeln!(out, "{label:<label_w$} {} {value}", glyph.repeat(len));
    }
}

/// The document's tables as CSV: each table is a caption row, a header row
/// and its data rows.
pub fn write_csv<W: io::Write>(doc: &Document, w: W) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(w);
    for table in doc.tables() {
        writer.write_record([table.caption.as_str()])?;
        writer.write_record(&table.header)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write `<stem>.txt` and `<stem>.csv` into `dir`, creating it if needed.
pub fn export(doc: &Document, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    fs::create_dir_all(dir)?;
    let stem = doc.kind.file_stem();
    let text_path = dir.join(format!("{stem}.txt"));
    fs::write(&text_path, render_text(doc))?;
    let csv_path = dir.join(format!("{stem}.csv"));
    write_csv(doc, fs::File::create(&csv_path)?)?;
    info!(report = stem, dir = %dir.display(), "report exported");
    Ok(vec![text_path, csv_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{build_report, ReportKind};
    use crate::views::ViewReader;
    use chrono::{TimeZone, Utc};
    use persistence::{FallbackTable, MemoryStorage, ScenarioStore};
    use std::sync::Arc;

    fn doc(kind: ReportKind) -> Document {
        let store = ScenarioStore::new(Arc::new(MemoryStorage::new()), FallbackTable::standard());
        let records = ViewReader::roster(&store).records();
        let at = Utc.with_ymd_and_hms(2025, 12, 15, 9, 0, 0).unwrap();
        build_report(kind, &records, at).unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reports-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn text_has_title_and_page_footers() {
        let d = doc(ReportKind::InvestmentMemo);
        let text = render_text(&d);
        assert!(text.contains("INVESTMENT MEMORANDUM: MARKET POSITION"));
        assert!(text.contains("Generated: Dec 15, 2025 09:00 UTC"));
        assert!(text.contains(&format!("--- page {n} of {n} ---", n = d.pages.len())));
        assert!(text.contains("492,750,000.00"));
    }

    #[test]
    fn csv_rows_follow_tables() {
        let mut buf = Vec::new();
        write_csv(&doc(ReportKind::CostStructureAudit), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Per-order economics");
        assert_eq!(
            lines[1],
            "Entity,Revenue/Order,Var Cost/Order,Contribution,Fixed Cost/Month"
        );
        assert_eq!(lines[2], "Blinkit,67.50,77.50,-10.00,\"200,000.00\"");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn export_writes_both_files() {
        let dir = temp_dir("export");
        let paths = export(&doc(ReportKind::OperationalBrief), &dir).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("operational_brief.txt"));
        assert!(paths[1].ends_with("operational_brief.csv"));
        for p in &paths {
            assert!(fs::metadata(p).unwrap().len() > 0);
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
