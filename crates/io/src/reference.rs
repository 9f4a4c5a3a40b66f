// Reference table import (CSV/TSV and Excel) with header detection
//
// The first non-empty row is the header. Each of the three reference fields
// is taken from an explicit column mapping when configured, otherwise from
// header name patterns, otherwise by position (identifier, name, cost center).

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use regex::Regex;

use idrecon::config::ColumnMapping;
use idrecon::model::ReferenceRow;
use idrecon::normalize::{NormalizeOptions, Normalizer};
use idrecon::{ReconError, ReferenceSource};

use crate::text::read_file_as_utf8;

/// Column indexes of the three reference fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub identifier: usize,
    pub name: usize,
    pub cost_center: usize,
}

// ---------------------------------------------------------------------------
// Header detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Identifier,
    Name,
    CostCenter,
}

impl Field {
    const ALL: [Field; 3] = [Field::Identifier, Field::Name, Field::CostCenter];

    fn label(self) -> &'static str {
        match self {
            Field::Identifier => "identifier",
            Field::Name => "name",
            Field::CostCenter => "cost_center",
        }
    }
}

struct HeaderPatterns {
    identifier: Regex,
    name: Regex,
    code_like: Regex,
    cost_center: Regex,
}

impl HeaderPatterns {
    // Headers are folded before matching: "Cédula" -> "cedula",
    // "C.C." -> "c c", "Centro de Costo" -> "centro de costo".
    fn new() -> Self {
        let re = |p: &str| Regex::new(p).expect("static regex");
        Self {
            identifier: re(r"cedula|identificacion|documento|\bdni\b|\bnit\b|\bid\b|^c ?c$"),
            name: re(r"nombre|\bname\b|apellido|surname"),
            code_like: re(r"codigo|\bcode\b|\bid\b|num"),
            cost_center: re(
                r"centro.*costo|centrocostos|cost.*center|\bcentro\b|\bcosto\b|\barea\b|departamento|division|unidad",
            ),
        }
    }

    fn matches(&self, field: Field, header: &str) -> bool {
        match field {
            Field::Identifier => self.identifier.is_match(header),
            Field::Name => self.name.is_match(header) && !self.code_like.is_match(header),
            Field::CostCenter => self.cost_center.is_match(header),
        }
    }
}

fn fold_header(header: &str) -> String {
    Normalizer::new(NormalizeOptions {
        name_token_reorder: false,
        strip_leading_zeros: false,
    })
    .name(header)
}

/// Resolve the three field columns from `headers`.
pub fn detect_columns(headers: &[String], mapping: &ColumnMapping) -> Result<ColumnLayout, ReconError> {
    let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();
    let patterns = HeaderPatterns::new();
    let mut found: [Option<usize>; 3] = [None; 3];

    // Explicit mapping first; a configured column that is absent is fatal.
    for (slot, field) in Field::ALL.iter().enumerate() {
        let configured = match field {
            Field::Identifier => mapping.identifier.as_deref(),
            Field::Name => mapping.name.as_deref(),
            Field::CostCenter => mapping.cost_center.as_deref(),
        };
        if let Some(wanted) = configured {
            let wanted = wanted.trim().to_lowercase();
            let index = headers
                .iter()
                .position(|h| h.trim().to_lowercase() == wanted)
                .ok_or_else(|| missing(field.label(), headers))?;
            found[slot] = Some(index);
        }
    }

    for (index, header) in folded.iter().enumerate() {
        if found.contains(&Some(index)) || header.is_empty() {
            continue;
        }
        for (slot, field) in Field::ALL.iter().enumerate() {
            let taken = found[slot].is_some();
            // A header naming "nombre" outranks an earlier "apellido" match.
            let preferred_name = *field == Field::Name
                && header.contains("nombre")
                && found[slot].map_or(false, |i| !folded[i].contains("nombre") && !is_explicit(mapping, *field));
            if (!taken || preferred_name) && patterns.matches(*field, header) {
                found[slot] = Some(index);
                break;
            }
        }
    }

    if let [Some(identifier), Some(name), Some(cost_center)] = found {
        return Ok(ColumnLayout {
            identifier,
            name,
            cost_center,
        });
    }

    if headers.len() >= 3 {
        // Only undetected fields fall back, onto the leftmost unused columns.
        let used = found;
        let mut free = (0..headers.len()).filter(|i| !used.contains(&Some(*i)));
        for (slot, field) in Field::ALL.iter().enumerate() {
            if found[slot].is_none() {
                found[slot] = free.next();
                log::warn!(
                    "no header matches reference field '{}' in {:?}; using column {:?}",
                    field.label(),
                    headers,
                    found[slot].and_then(|i| headers.get(i))
                );
            }
        }
        if let [Some(identifier), Some(name), Some(cost_center)] = found {
            return Ok(ColumnLayout {
                identifier,
                name,
                cost_center,
            });
        }
    }

    let first_missing = Field::ALL
        .iter()
        .zip(found.iter())
        .find(|(_, f)| f.is_none())
        .map(|(field, _)| field.label())
        .unwrap_or("identifier");
    Err(missing(first_missing, headers))
}

fn is_explicit(mapping: &ColumnMapping, field: Field) -> bool {
    match field {
        Field::Identifier => mapping.identifier.is_some(),
        Field::Name => mapping.name.is_some(),
        Field::CostCenter => mapping.cost_center.is_some(),
    }
}

fn missing(field: &str, headers: &[String]) -> ReconError {
    ReconError::MissingColumn {
        field: field.to_string(),
        available: headers.to_vec(),
    }
}

/// Header row plus data rows -> reference rows. Blank lines are dropped;
/// short rows yield empty fields, which the engine reports as malformed.
pub fn rows_from_records(
    records: Vec<Vec<String>>,
    mapping: &ColumnMapping,
) -> Result<Vec<ReferenceRow>, ReconError> {
    let mut records = records
        .into_iter()
        .filter(|r| r.iter().any(|cell| !cell.trim().is_empty()));

    let Some(headers) = records.next() else {
        return Ok(Vec::new());
    };
    let layout = detect_columns(&headers, mapping)?;
    log::debug!(
        "reference columns: identifier={:?} name={:?} cost_center={:?}",
        headers.get(layout.identifier),
        headers.get(layout.name),
        headers.get(layout.cost_center)
    );

    let cell = |record: &[String], index: usize| record.get(index).cloned().unwrap_or_default();
    Ok(records
        .map(|record| ReferenceRow {
            identifier: cell(&record, layout.identifier),
            name: cell(&record, layout.name),
            cost_center: cell(&record, layout.cost_center),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CsvReferenceSource {
    path: PathBuf,
    columns: ColumnMapping,
}

impl CsvReferenceSource {
    pub fn new(path: impl Into<PathBuf>, columns: ColumnMapping) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }
}

impl ReferenceSource for CsvReferenceSource {
    fn reference_rows(&self) -> Result<Vec<ReferenceRow>, ReconError> {
        let content = read_file_as_utf8(&self.path)
            .map_err(|e| ReconError::Source(format!("{}: {e}", self.path.display())))?;
        let delimiter = sniff_delimiter(&content);
        let records = parse_records(&content, delimiter)
            .map_err(|e| ReconError::Source(format!("{}: {e}", self.path.display())))?;
        rows_from_records(records, &self.columns)
    }
}

fn parse_records(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect()
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Excel (xlsx, xls, xlsb, ods)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct XlsxReferenceSource {
    path: PathBuf,
    sheet: Option<String>,
    columns: ColumnMapping,
}

impl XlsxReferenceSource {
    pub fn new(path: impl Into<PathBuf>, sheet: Option<String>, columns: ColumnMapping) -> Self {
        Self {
            path: path.into(),
            sheet,
            columns,
        }
    }
}

impl ReferenceSource for XlsxReferenceSource {
    fn reference_rows(&self) -> Result<Vec<ReferenceRow>, ReconError> {
        let source_err = |msg: String| ReconError::Source(format!("{}: {msg}", self.path.display()));

        let mut workbook: Sheets<_> = open_workbook_auto(&self.path)
            .map_err(|e| source_err(format!("failed to open workbook: {e}")))?;
        let sheet_names = workbook.sheet_names().to_vec();

        let sheet_name = match &self.sheet {
            Some(wanted) => sheet_names
                .iter()
                .find(|n| n.as_str() == wanted)
                .cloned()
                .ok_or_else(|| source_err(format!("no sheet named '{wanted}' (have: {})", sheet_names.join(", "))))?,
            None => sheet_names
                .first()
                .cloned()
                .ok_or_else(|| source_err("workbook contains no sheets".to_string()))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| source_err(format!("failed to read sheet '{sheet_name}': {e}")))?;
        log::debug!("{}: reading sheet '{sheet_name}'", self.path.display());

        let records: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        rows_from_records(records, &self.columns)
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // Identifiers are often stored as numbers: 12345678.0 -> "12345678"
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Pick a loader from the file extension.
pub fn open_reference(
    path: &Path,
    sheet: Option<String>,
    columns: ColumnMapping,
) -> Result<Box<dyn ReferenceSource>, ReconError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "tsv" | "txt" => Ok(Box::new(CsvReferenceSource::new(path, columns))),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Box::new(XlsxReferenceSource::new(path, sheet, columns))),
        other => Err(ReconError::Source(format!(
            "{}: unsupported reference format '{other}' (expected csv, tsv, xlsx, xls, xlsb or ods)",
            path.display()
        ))),
    }
}
