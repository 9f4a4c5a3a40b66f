// Output renderers: consolidated rows as CSV/XLSX/JSON, the augmented
// document, and the terminal summary. Renderers only read engine output.

use std::fmt::Write as _;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;

use idrecon::model::{ConsolidatedRow, MatchOutcome, ReviewItem, RunOutput, RunReport, TextUnit};
use idrecon::ReconError;

use crate::text::PAGE_BREAK;

pub const ROW_HEADERS: [&str; 6] = [
    "identifier",
    "name",
    "cost_center",
    "occurrences",
    "first_seen",
    "matched_by",
];

const REVIEW_HEADERS: [&str; 7] = [
    "status",
    "candidate",
    "kind",
    "position",
    "best_score",
    "suggested_identifier",
    "suggested_name",
];

fn methods_label(row: &ConsolidatedRow) -> String {
    row.methods
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("+")
}

fn row_fields(row: &ConsolidatedRow) -> [String; 6] {
    [
        row.identifier.clone(),
        row.display_name.clone(),
        row.cost_center.clone(),
        row.occurrence_count.to_string(),
        row.first_seen.to_string(),
        methods_label(row),
    ]
}

fn write_err(path: &Path, e: impl std::fmt::Display) -> ReconError {
    ReconError::Io(format!("{}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub fn write_rows_csv(rows: &[ConsolidatedRow], path: &Path) -> Result<(), ReconError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| write_err(path, e))?;
    writer.write_record(ROW_HEADERS).map_err(|e| write_err(path, e))?;
    for row in rows {
        writer.write_record(row_fields(row)).map_err(|e| write_err(path, e))?;
    }
    writer.flush().map_err(|e| write_err(path, e))?;
    log::debug!("wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// XLSX
// ---------------------------------------------------------------------------

/// Two sheets: the consolidated rows and the manual-review list (one line
/// per suggestion).
pub fn write_rows_xlsx(rows: &[ConsolidatedRow], report: &RunReport, path: &Path) -> Result<(), ReconError> {
    let xlsx = |e: XlsxError| write_err(path, e);
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet().set_name("Consolidated").map_err(xlsx)?;
    for (col, header) in ROW_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold).map_err(xlsx)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &row.identifier).map_err(xlsx)?;
        sheet.write_string(r, 1, &row.display_name).map_err(xlsx)?;
        sheet.write_string(r, 2, &row.cost_center).map_err(xlsx)?;
        sheet.write_number(r, 3, row.occurrence_count as f64).map_err(xlsx)?;
        sheet.write_string(r, 4, row.first_seen.to_string()).map_err(xlsx)?;
        sheet.write_string(r, 5, methods_label(row)).map_err(xlsx)?;
    }

    let review = workbook.add_worksheet().set_name("Review").map_err(xlsx)?;
    for (col, header) in REVIEW_HEADERS.iter().enumerate() {
        review.write_string_with_format(0, col as u16, *header, &bold).map_err(xlsx)?;
    }
    let mut r = 1u32;
    for item in &report.review {
        if item.alternatives.is_empty() {
            write_review_item(review, r, item).map_err(xlsx)?;
            r += 1;
            continue;
        }
        for suggestion in &item.alternatives {
            write_review_item(review, r, item).map_err(xlsx)?;
            review.write_string(r, 5, &suggestion.entry.identifier).map_err(xlsx)?;
            review.write_string(r, 6, &suggestion.entry.display_name).map_err(xlsx)?;
            r += 1;
        }
    }

    workbook.save(path).map_err(xlsx)?;
    log::debug!("wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}

fn write_review_item(sheet: &mut Worksheet, r: u32, item: &ReviewItem) -> Result<(), XlsxError> {
    sheet.write_string(r, 0, item.status.to_string())?;
    sheet.write_string(r, 1, &item.candidate.raw_text)?;
    sheet.write_string(r, 2, item.candidate.kind.to_string())?;
    sheet.write_string(r, 3, item.candidate.position.to_string())?;
    sheet.write_number(r, 4, item.best_score)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

/// Machine-readable run result.
#[derive(Debug, Serialize)]
pub struct JsonEnvelope<'a> {
    pub meta: RunMeta,
    pub report: &'a RunReport,
    pub rows: &'a [ConsolidatedRow],
    pub outcomes: &'a [MatchOutcome],
}

impl<'a> JsonEnvelope<'a> {
    pub fn new(config_name: &str, output: &'a RunOutput) -> Self {
        Self {
            meta: RunMeta {
                config_name: config_name.to_string(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            report: &output.report,
            rows: &output.rows,
            outcomes: &output.outcomes,
        }
    }

    pub fn to_json(&self) -> Result<String, ReconError> {
        serde_json::to_string_pretty(self).map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Left-aligned plain-text table.
fn text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn totals_line(report: &RunReport) -> String {
    format!(
        "{} candidate(s): {} matched ({} by identifier, {} by name), {} ambiguous, {} unmatched, match rate {:.1}%",
        report.total_candidates,
        report.matched,
        report.matched_by_identifier,
        report.matched_by_name,
        report.ambiguous,
        report.unmatched,
        report.match_rate * 100.0
    )
}

/// The source pages followed by an allocation page: one line per
/// consolidated row, then the items left for manual review.
pub fn render_document(units: &[TextUnit], rows: &[ConsolidatedRow], report: &RunReport) -> String {
    let mut out = String::new();
    for unit in units {
        out.push_str(&unit.text);
        if !unit.text.ends_with('\n') {
            out.push('\n');
        }
        out.push(PAGE_BREAK);
    }

    out.push_str("COST CENTER ALLOCATION\n\n");
    if rows.is_empty() {
        out.push_str("No employees were resolved against the reference table.\n");
    } else {
        let table: Vec<Vec<String>> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                vec![
                    (i + 1).to_string(),
                    row.identifier.clone(),
                    row.display_name.clone(),
                    row.cost_center.clone(),
                    row.occurrence_count.to_string(),
                ]
            })
            .collect();
        out.push_str(&text_table(&["#", "Identifier", "Name", "Cost center", "Occurrences"], &table));
    }
    let _ = writeln!(out, "\n{}", totals_line(report));

    if !report.review.is_empty() {
        out.push_str("\nMANUAL REVIEW\n\n");
        for item in &report.review {
            let _ = writeln!(
                out,
                "[{}] \"{}\" at {} (best score {:.2})",
                item.status, item.candidate.raw_text, item.candidate.position, item.best_score
            );
            for s in &item.alternatives {
                let _ = writeln!(
                    out,
                    "    {:.2}  {}  {}  {}",
                    s.score, s.entry.identifier, s.entry.display_name, s.entry.cost_center
                );
            }
        }
    }
    out
}

/// Human-readable summary for the terminal.
pub fn render_summary(config_name: &str, report: &RunReport, rows: &[ConsolidatedRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{config_name}: {}", totals_line(report));

    if !rows.is_empty() {
        let table: Vec<Vec<String>> = rows.iter().map(|r| row_fields(r).to_vec()).collect();
        out.push('\n');
        out.push_str(&text_table(&ROW_HEADERS, &table));
    }

    let dq = &report.data_quality;
    if dq.empty_reference_table {
        out.push_str("\nwarning: reference table has no usable rows\n");
    }
    for dup in &dq.duplicate_identifiers {
        let rows: Vec<String> = dup.rows.iter().map(|r| (r + 1).to_string()).collect();
        let _ = writeln!(
            out,
            "warning: identifier {} repeats on data rows {} (first kept)",
            dup.identifier,
            rows.join(", ")
        );
    }
    if dq.malformed_rows > 0 {
        let _ = writeln!(out, "warning: {} malformed reference row(s) skipped", dq.malformed_rows);
    }
    if report.needs_review() {
        let _ = writeln!(out, "{} candidate(s) need manual review", report.review.len());
    }
    out
}
