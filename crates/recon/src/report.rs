use crate::model::{
    DataQuality, MatchMethod, MatchOutcome, MatchStatus, ReviewItem, RunReport, TableDiagnostics,
};

/// Aggregate outcomes and table diagnostics into a [`RunReport`].
///
/// Pure: the review list carries non-matched outcomes in document order with
/// their alternatives untouched.
pub fn build_report(outcomes: &[MatchOutcome], diagnostics: &TableDiagnostics) -> RunReport {
    let mut matched = 0;
    let mut ambiguous = 0;
    let mut unmatched = 0;
    let mut matched_by_identifier = 0;
    let mut matched_by_name = 0;

    for outcome in outcomes {
        match outcome.status {
            MatchStatus::Matched => {
                matched += 1;
                match outcome.method {
                    Some(MatchMethod::Identifier) => matched_by_identifier += 1,
                    Some(MatchMethod::Name) => matched_by_name += 1,
                    None => {}
                }
            }
            MatchStatus::Ambiguous => ambiguous += 1,
            MatchStatus::Unmatched => unmatched += 1,
        }
    }

    let mut review: Vec<ReviewItem> = outcomes
        .iter()
        .filter(|o| !o.is_matched())
        .map(|o| ReviewItem {
            candidate: o.candidate.clone(),
            status: o.status,
            best_score: o.score,
            alternatives: o.alternatives.clone(),
        })
        .collect();
    review.sort_by(|a, b| {
        a.candidate
            .position
            .cmp(&b.candidate.position)
            .then(a.candidate.kind.cmp(&b.candidate.kind))
    });

    let total_candidates = outcomes.len();
    let match_rate = if total_candidates == 0 {
        0.0
    } else {
        matched as f64 / total_candidates as f64
    };

    RunReport {
        total_candidates,
        matched,
        ambiguous,
        unmatched,
        matched_by_identifier,
        matched_by_name,
        match_rate,
        data_quality: DataQuality {
            empty_reference_table: diagnostics.is_empty_table(),
            duplicate_identifiers: diagnostics.duplicate_identifiers.clone(),
            malformed_rows: diagnostics.malformed_rows.len(),
            malformed_row_details: diagnostics.malformed_rows.clone(),
        },
        review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Candidate, CandidateKind, DuplicateIdentifier, MalformedRow, ReferenceEntry,
        SourcePosition, Suggestion,
    };

    fn cand(raw: &str, offset: usize) -> Candidate {
        Candidate {
            raw_text: raw.into(),
            kind: CandidateKind::Name,
            normalized_text: raw.to_lowercase(),
            position: SourcePosition {
                unit_index: 0,
                unit_id: "page-1".into(),
                offset,
                line: 1,
                column: offset + 1,
            },
            occurrences: 1,
        }
    }

    fn entry(row: usize) -> ReferenceEntry {
        ReferenceEntry {
            row,
            identifier: format!("{}", 10_000_000 + row),
            display_name: "Someone".into(),
            cost_center: "CC".into(),
            normalized_name: "someone".into(),
            identifier_raw: String::new(),
            name_raw: String::new(),
            cost_center_raw: String::new(),
        }
    }

    #[test]
    fn counts_statuses_and_methods() {
        let e = entry(0);
        let alts = vec![Suggestion { entry: entry(1), score: 0.91 }, Suggestion { entry: entry(2), score: 0.9 }];
        let outcomes = vec![
            MatchOutcome::unresolved(&cand("Zeta", 90), MatchStatus::Unmatched, 0.2, Vec::new()),
            MatchOutcome::matched(&cand("A", 0), MatchMethod::Identifier, &e, 1.0),
            MatchOutcome::matched(&cand("B", 10), MatchMethod::Name, &e, 0.9),
            MatchOutcome::unresolved(&cand("Maria Garcia", 50), MatchStatus::Ambiguous, 0.91, alts.clone()),
        ];
        let report = build_report(&outcomes, &TableDiagnostics { entries: 3, rows_read: 3, ..Default::default() });

        assert_eq!(report.total_candidates, 4);
        assert_eq!((report.matched, report.ambiguous, report.unmatched), (2, 1, 1));
        assert_eq!(report.matched_by_identifier, 1);
        assert_eq!(report.matched_by_name, 1);
        assert_eq!(report.match_rate, 0.5);
        assert!(report.needs_review());

        let reviewed: Vec<&str> = report.review.iter().map(|r| r.candidate.raw_text.as_str()).collect();
        assert_eq!(reviewed, vec!["Maria Garcia", "Zeta"]);
        assert_eq!(report.review[0].alternatives, alts);
        assert_eq!(report.review[0].best_score, 0.91);
    }

    #[test]
    fn empty_run_has_zero_rate() {
        let report = build_report(&[], &TableDiagnostics::default());
        assert_eq!(report.total_candidates, 0);
        assert_eq!(report.match_rate, 0.0);
        assert!(report.data_quality.empty_reference_table);
        assert!(!report.needs_review());
    }

    #[test]
    fn carries_data_quality_findings() {
        let diagnostics = TableDiagnostics {
            rows_read: 5,
            entries: 2,
            duplicate_identifiers: vec![DuplicateIdentifier { identifier: "12345678".into(), rows: vec![0, 4] }],
            malformed_rows: vec![
                MalformedRow { row: 2, reason: "missing identifier".into() },
                MalformedRow { row: 3, reason: "missing name".into() },
            ],
        };
        let report = build_report(&[], &diagnostics);
        assert!(!report.data_quality.empty_reference_table);
        assert_eq!(report.data_quality.malformed_rows, 2);
        assert_eq!(report.data_quality.duplicate_identifiers[0].rows, vec![0, 4]);
        assert_eq!(report.data_quality.malformed_row_details[1].row, 3);
    }
}
