use std::collections::HashMap;

use indexmap::IndexMap;

use crate::model::{
    DuplicateIdentifier, MalformedRow, ReferenceEntry, ReferenceRow, TableDiagnostics,
};
use crate::normalize::{display_name, Normalizer};

/// Read-only lookup structures built once per run from the loaded rows.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
    by_identifier: HashMap<String, usize>,
    diagnostics: TableDiagnostics,
}

impl ReferenceTable {
    /// Normalize `rows` into entries.
    ///
    /// Rows without a usable identifier or name are skipped and counted.
    /// When an identifier repeats, the first row wins and the rest are
    /// reported as a duplicate finding.
    pub fn build(rows: &[ReferenceRow], normalizer: &Normalizer) -> Self {
        let mut entries: Vec<ReferenceEntry> = Vec::with_capacity(rows.len());
        let mut by_identifier: HashMap<String, usize> = HashMap::with_capacity(rows.len());
        let mut seen_rows: IndexMap<String, Vec<usize>> = IndexMap::new();
        let mut malformed_rows = Vec::new();

        for (row, raw) in rows.iter().enumerate() {
            let identifier = normalizer.identifier(&raw.identifier);
            let normalized_name = normalizer.name(&raw.name);

            if identifier.is_empty() {
                malformed_rows.push(MalformedRow {
                    row,
                    reason: format!("missing identifier ({:?})", raw.identifier.trim()),
                });
                continue;
            }
            if normalized_name.is_empty() {
                malformed_rows.push(MalformedRow {
                    row,
                    reason: format!("missing name for identifier {identifier}"),
                });
                continue;
            }

            let occurrences = seen_rows.entry(identifier.clone()).or_default();
            occurrences.push(row);
            if occurrences.len() > 1 {
                continue;
            }

            by_identifier.insert(identifier.clone(), entries.len());
            entries.push(ReferenceEntry {
                row,
                identifier,
                display_name: display_name(&raw.name),
                cost_center: raw.cost_center.trim().to_string(),
                normalized_name,
                identifier_raw: raw.identifier.clone(),
                name_raw: raw.name.clone(),
                cost_center_raw: raw.cost_center.clone(),
            });
        }

        let duplicate_identifiers: Vec<DuplicateIdentifier> = seen_rows
            .into_iter()
            .filter(|(_, rows)| rows.len() > 1)
            .map(|(identifier, rows)| DuplicateIdentifier { identifier, rows })
            .collect();

        if !duplicate_identifiers.is_empty() {
            let listed: Vec<&str> = duplicate_identifiers
                .iter()
                .map(|d| d.identifier.as_str())
                .collect();
            log::warn!(
                "reference table has {} duplicated identifier(s), keeping first occurrence: {}",
                duplicate_identifiers.len(),
                listed.join(", ")
            );
        }
        if !malformed_rows.is_empty() {
            log::warn!("skipped {} malformed reference row(s)", malformed_rows.len());
        }
        log::debug!("reference table: {} rows read, {} entries", rows.len(), entries.len());

        let diagnostics = TableDiagnostics {
            rows_read: rows.len(),
            entries: entries.len(),
            duplicate_identifiers,
            malformed_rows,
        };

        Self {
            entries,
            by_identifier,
            diagnostics,
        }
    }

    /// O(1) exact lookup by canonical identifier.
    pub fn get(&self, identifier: &str) -> Option<&ReferenceEntry> {
        self.by_identifier.get(identifier).map(|&i| &self.entries[i])
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn diagnostics(&self) -> &TableDiagnostics {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<ReferenceRow> {
        vec![
            ReferenceRow::new("12.345.678", "JUAN CARLOS PEREZ MARTINEZ", " VENTAS "),
            ReferenceRow::new("87654321", "Maria Garcia Lopez", "FINANZAS"),
            ReferenceRow::new("", "Sin Cedula", "OPS"),
            ReferenceRow::new("11223344", "   ", "OPS"),
            ReferenceRow::new("12345678", "Juan Duplicado", "LOGISTICA"),
        ]
    }

    #[test]
    fn builds_index_from_valid_rows() {
        let table = ReferenceTable::build(&rows(), &Normalizer::default());
        assert_eq!(table.len(), 2);

        let juan = table.get("12345678").unwrap();
        assert_eq!(juan.row, 0);
        assert_eq!(juan.display_name, "Juan Carlos Perez Martinez");
        assert_eq!(juan.cost_center, "VENTAS");
        assert_eq!(juan.identifier_raw, "12.345.678");
        assert_eq!(juan.normalized_name, "carlos juan martinez perez");
        assert!(table.get("99999999").is_none());
    }

    #[test]
    fn duplicate_identifier_keeps_first_row() {
        let table = ReferenceTable::build(&rows(), &Normalizer::default());
        assert_eq!(table.get("12345678").unwrap().cost_center, "VENTAS");
        assert!(table.entries().iter().all(|e| e.name_raw != "Juan Duplicado"));

        let diag = table.diagnostics();
        assert_eq!(diag.duplicate_identifiers.len(), 1);
        assert_eq!(diag.duplicate_identifiers[0].identifier, "12345678");
        assert_eq!(diag.duplicate_identifiers[0].rows, vec![0, 4]);
    }

    #[test]
    fn malformed_rows_are_counted() {
        let table = ReferenceTable::build(&rows(), &Normalizer::default());
        let diag = table.diagnostics();
        assert_eq!(diag.rows_read, 5);
        assert_eq!(diag.entries, 2);
        let skipped: Vec<usize> = diag.malformed_rows.iter().map(|m| m.row).collect();
        assert_eq!(skipped, vec![2, 3]);
    }

    #[test]
    fn empty_table_is_legal() {
        let table = ReferenceTable::build(&[], &Normalizer::default());
        assert!(table.is_empty());
        assert!(table.diagnostics().is_empty_table());
    }
}
