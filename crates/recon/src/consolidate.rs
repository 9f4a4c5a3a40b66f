use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::model::{ConsolidatedRow, MatchOutcome};

/// Collapse matched outcomes into one row per reference identifier.
///
/// Rows come out in document order of each identifier's first sighting,
/// regardless of the order of `outcomes`. Unresolved outcomes are ignored.
pub fn consolidate(outcomes: &[MatchOutcome]) -> Vec<ConsolidatedRow> {
    let mut matched: Vec<&MatchOutcome> = outcomes.iter().filter(|o| o.is_matched()).collect();
    // Kind breaks a tie when an identifier and a name share a start offset.
    matched.sort_by(|a, b| {
        a.candidate
            .position
            .cmp(&b.candidate.position)
            .then(a.candidate.kind.cmp(&b.candidate.kind))
    });

    let mut rows: IndexMap<String, ConsolidatedRow> = IndexMap::new();
    for outcome in matched {
        let (Some(entry), Some(method)) = (&outcome.matched_entry, outcome.method) else {
            continue;
        };
        match rows.entry(entry.identifier.clone()) {
            Entry::Occupied(mut slot) => {
                let row = slot.get_mut();
                row.occurrence_count += outcome.candidate.occurrences;
                if !row.methods.contains(&method) {
                    row.methods.push(method);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(ConsolidatedRow {
                    identifier: entry.identifier.clone(),
                    display_name: entry.display_name.clone(),
                    cost_center: entry.cost_center.clone(),
                    occurrence_count: outcome.candidate.occurrences,
                    first_seen: outcome.candidate.position.clone(),
                    methods: vec![method],
                });
            }
        }
    }

    log::debug!("consolidated {} outcome(s) into {} row(s)", outcomes.len(), rows.len());
    rows.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Candidate, CandidateKind, MatchMethod, MatchStatus, ReferenceEntry, SourcePosition,
    };

    fn entry(row: usize, id: &str, cc: &str) -> ReferenceEntry {
        ReferenceEntry {
            row,
            identifier: id.into(),
            display_name: format!("Person {id}"),
            cost_center: cc.into(),
            normalized_name: format!("person {id}"),
            identifier_raw: id.into(),
            name_raw: format!("PERSON {id}"),
            cost_center_raw: cc.into(),
        }
    }

    fn cand(kind: CandidateKind, raw: &str, unit: usize, offset: usize, occurrences: usize) -> Candidate {
        Candidate {
            raw_text: raw.into(),
            kind,
            normalized_text: raw.to_lowercase(),
            position: SourcePosition {
                unit_index: unit,
                unit_id: format!("page-{}", unit + 1),
                offset,
                line: 1,
                column: offset + 1,
            },
            occurrences,
        }
    }

    fn by_id(c: Candidate, e: &ReferenceEntry) -> MatchOutcome {
        MatchOutcome::matched(&c, MatchMethod::Identifier, e, 1.0)
    }

    fn by_name(c: Candidate, e: &ReferenceEntry, score: f64) -> MatchOutcome {
        MatchOutcome::matched(&c, MatchMethod::Name, e, score)
    }

    #[test]
    fn one_row_per_identifier_with_counts() {
        let juan = entry(0, "12345678", "VENTAS");
        let ana = entry(1, "23456789", "OPS");
        let outcomes = vec![
            by_id(cand(CandidateKind::Identifier, "12345678", 0, 0, 2), &juan),
            by_name(cand(CandidateKind::Name, "Juan Perez", 0, 20, 1), &juan, 0.9),
            by_id(cand(CandidateKind::Identifier, "23456789", 1, 0, 1), &ana),
        ];
        let rows = consolidate(&outcomes);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].identifier, "12345678");
        assert_eq!(rows[0].occurrence_count, 3);
        assert_eq!(rows[0].methods, vec![MatchMethod::Identifier, MatchMethod::Name]);
        assert_eq!(rows[0].cost_center, "VENTAS");
        assert_eq!(rows[1].identifier, "23456789");
        assert_eq!(rows[1].first_seen.unit_id, "page-2");
    }

    #[test]
    fn order_follows_document_not_input() {
        let juan = entry(0, "12345678", "VENTAS");
        let ana = entry(1, "23456789", "OPS");
        let outcomes = vec![
            by_id(cand(CandidateKind::Identifier, "23456789", 1, 5, 1), &ana),
            by_name(cand(CandidateKind::Name, "Juan Perez", 0, 40, 1), &juan, 0.9),
            by_id(cand(CandidateKind::Identifier, "12345678", 0, 80, 1), &juan),
        ];
        let rows = consolidate(&outcomes);
        let ids: Vec<&str> = rows.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["12345678", "23456789"]);
        assert_eq!(rows[0].first_seen.offset, 40);
        assert_eq!(rows[0].methods, vec![MatchMethod::Name, MatchMethod::Identifier]);

        let mut reversed = outcomes.clone();
        reversed.reverse();
        assert_eq!(consolidate(&reversed), rows);
    }

    #[test]
    fn unresolved_outcomes_produce_no_rows() {
        let c = cand(CandidateKind::Name, "Maria Garcia", 0, 0, 1);
        let outcomes = vec![
            MatchOutcome::unresolved(&c, MatchStatus::Ambiguous, 0.93, Vec::new()),
            MatchOutcome::unresolved(&c, MatchStatus::Unmatched, 0.1, Vec::new()),
        ];
        assert!(consolidate(&outcomes).is_empty());
        assert!(consolidate(&[]).is_empty());
    }

    #[test]
    fn is_idempotent() {
        let juan = entry(0, "12345678", "VENTAS");
        let outcomes = vec![by_id(cand(CandidateKind::Identifier, "12345678", 0, 0, 1), &juan)];
        assert_eq!(consolidate(&outcomes), consolidate(&outcomes));
    }
}
