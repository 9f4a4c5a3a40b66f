use std::path::PathBuf;

use idrecon::config::{ReconConfig, SimilarityMeasure};
use idrecon::engine::run;
use idrecon::model::{CandidateKind, MatchMethod, MatchStatus, ReferenceRow, RunOutput, TextUnit};
use idrecon::ReconError;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_rows(file: &str) -> Vec<ReferenceRow> {
    let path = fixtures_dir().join(file);
    let mut reader = csv::Reader::from_path(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            ReferenceRow::new(&r[0], &r[1], &r[2])
        })
        .collect()
}

fn load_pages(file: &str) -> Vec<TextUnit> {
    let path = fixtures_dir().join(file);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    text.split('\x0c')
        .enumerate()
        .map(|(i, page)| TextUnit::new(format!("page-{}", i + 1), page))
        .collect()
}

fn load_and_run(config_toml: &str) -> RunOutput {
    let config = ReconConfig::from_toml(config_toml).unwrap();
    let source = config.source.as_ref().unwrap();
    let reference = config.reference.as_ref().unwrap();
    let units = load_pages(&source.file);
    let rows = load_rows(&reference.file);
    run(&config, &units, &rows).unwrap()
}

fn run_inline(text: &str, rows: &[(&str, &str, &str)]) -> RunOutput {
    let units = vec![TextUnit::new("page-1", text)];
    let rows: Vec<ReferenceRow> = rows
        .iter()
        .map(|(id, name, cc)| ReferenceRow::new(id, name, cc))
        .collect();
    run(&ReconConfig::default_named("inline"), &units, &rows).unwrap()
}

const JUAN: (&str, &str, &str) = ("12345678", "Juan Carlos Perez Martinez", "VENTAS");

// -------------------------------------------------------------------------
// Fixture run
// -------------------------------------------------------------------------

#[test]
fn invoice_fixture_end_to_end() {
    let toml = std::fs::read_to_string(fixtures_dir().join("invoice.recon.toml")).unwrap();
    let out = load_and_run(&toml);

    let raw: Vec<&str> = out.candidates.iter().map(|c| c.raw_text.as_str()).collect();
    assert_eq!(raw, vec!["12.345.678", "Luis Torres", "Maria Garcia", "987654321"]);

    let report = &out.report;
    assert_eq!(report.total_candidates, 4);
    assert_eq!(report.matched, 2);
    assert_eq!(report.matched_by_identifier, 1);
    assert_eq!(report.matched_by_name, 1);
    assert_eq!(report.ambiguous, 1);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.match_rate, 0.5);
    assert!(!report.data_quality.empty_reference_table);

    assert_eq!(out.rows.len(), 2);
    assert_eq!(out.rows[0].identifier, "12345678");
    assert_eq!(out.rows[0].occurrence_count, 2);
    assert_eq!(out.rows[0].cost_center, "VENTAS");
    assert_eq!(out.rows[0].first_seen.line, 4);
    assert_eq!(out.rows[1].identifier, "56789012");
    assert_eq!(out.rows[1].display_name, "Luis Fernando Torres Vega");
    assert_eq!(out.rows[1].cost_center, "SISTEMAS");
    assert_eq!(out.rows[1].methods, vec![MatchMethod::Name]);

    let review: Vec<(&str, MatchStatus)> = report
        .review
        .iter()
        .map(|r| (r.candidate.raw_text.as_str(), r.status))
        .collect();
    assert_eq!(
        review,
        vec![("Maria Garcia", MatchStatus::Ambiguous), ("987654321", MatchStatus::Unmatched)]
    );
}

// -------------------------------------------------------------------------
// Reference scenarios
// -------------------------------------------------------------------------

#[test]
fn scenario_exact_identifier() {
    let out = run_inline("Documento 12345678", &[JUAN]);
    assert_eq!(out.outcomes.len(), 1);
    assert_eq!(out.outcomes[0].status, MatchStatus::Matched);
    assert_eq!(out.outcomes[0].score, 1.0);
    assert_eq!(out.rows.len(), 1);
    assert_eq!(out.rows[0].cost_center, "VENTAS");
}

#[test]
fn scenario_fuzzy_name() {
    let out = run_inline(
        "Beneficiario: Juan Perez",
        &[JUAN, ("87654321", "Sandra Patricia Jimenez Rojas", "FINANZAS")],
    );
    let outcome = &out.outcomes[0];
    assert_eq!(outcome.status, MatchStatus::Matched);
    assert_eq!(outcome.method, Some(MatchMethod::Name));
    assert!(outcome.score >= 0.8);
    assert_eq!(out.rows[0].identifier, "12345678");
}

#[test]
fn scenario_ambiguous_siblings() {
    let out = run_inline(
        "Autorizo: Maria Garcia",
        &[
            ("23456789", "Maria Garcia Lopez", "FINANZAS"),
            ("34567890", "Maria Garcia Ruiz", "LOGISTICA"),
        ],
    );
    let outcome = out.outcomes.iter().find(|o| o.candidate.raw_text == "Maria Garcia").unwrap();
    assert_eq!(outcome.status, MatchStatus::Ambiguous);
    let ids: Vec<&str> = outcome
        .alternatives
        .iter()
        .map(|s| s.entry.identifier.as_str())
        .collect();
    assert_eq!(ids, vec!["23456789", "34567890"]);
    assert!(out.rows.is_empty());
}

#[test]
fn scenario_unknown_identifier() {
    let out = run_inline("referencia 987654321", &[JUAN, ("23456789", "Maria Garcia Lopez", "FINANZAS")]);
    let outcome = &out.outcomes[0];
    assert_eq!(outcome.status, MatchStatus::Unmatched);
    assert_eq!(outcome.alternatives.len(), 2);
    assert!(outcome.alternatives.iter().all(|s| s.score < 0.8));
    assert_eq!(out.report.review.len(), 1);
    assert!(out.rows.is_empty());
}

#[test]
fn scenario_identifier_twice() {
    let out = run_inline("12345678 transporte\n12.345.678 hospedaje", &[JUAN]);
    assert_eq!(out.candidates.len(), 1);
    assert_eq!(out.candidates[0].occurrences, 2);
    assert_eq!(out.rows.len(), 1);
    assert_eq!(out.rows[0].occurrence_count, 2);
}

#[test]
fn invoice_numbers_never_allocate_a_cost_center() {
    let out = run_inline("Factura FAC12345678 emitida, ref 12345678abc", &[JUAN]);
    assert!(out.candidates.iter().all(|c| c.kind != CandidateKind::Identifier));
    assert!(out.rows.is_empty());
}

#[test]
fn occurrences_span_pages() {
    let units = vec![
        TextUnit::new("page-1", "cedula 12345678"),
        TextUnit::new("page-2", "cedula 12345678"),
    ];
    let out = run(&ReconConfig::default_named("pages"), &units, &vec![ReferenceRow::new(JUAN.0, JUAN.1, JUAN.2)]).unwrap();
    assert_eq!(out.rows[0].occurrence_count, 2);
    assert_eq!(out.rows[0].first_seen.unit_id, "page-1");
}

// -------------------------------------------------------------------------
// Data quality
// -------------------------------------------------------------------------

#[test]
fn duplicate_reference_rows_first_wins() {
    let units = vec![TextUnit::new("page-1", "cedula 12345678")];
    let rows = load_rows("employees-dupes.csv");
    let out = run(&ReconConfig::default_named("dupes"), &units, &rows).unwrap();

    assert_eq!(out.rows[0].cost_center, "VENTAS");
    let dq = &out.report.data_quality;
    assert_eq!(dq.duplicate_identifiers.len(), 1);
    assert_eq!(dq.duplicate_identifiers[0].rows, vec![0, 2]);
    assert_eq!(dq.malformed_rows, 1);
    assert_eq!(dq.malformed_row_details[0].row, 1);
}

#[test]
fn empty_reference_table_is_flagged() {
    let out = run_inline("cedula 12345678 Juan Perez", &[]);
    assert!(out.report.data_quality.empty_reference_table);
    assert_eq!(out.report.matched, 0);
    assert_eq!(out.report.unmatched, out.report.total_candidates);
    assert!(out.rows.is_empty());
}

#[test]
fn empty_source_yields_empty_report() {
    let out = run_inline("", &[JUAN]);
    assert_eq!(out.report.total_candidates, 0);
    assert_eq!(out.report.match_rate, 0.0);
    assert!(out.rows.is_empty());
}

// -------------------------------------------------------------------------
// Precedence + configuration
// -------------------------------------------------------------------------

#[test]
fn identifier_wins_over_name_in_same_document() {
    // The name points at Ana, the identifier at Juan: both resolve on
    // their own tier and neither overrides the other.
    let out = run_inline(
        "Ana Maria Gomez cedula 12345678",
        &[JUAN, ("11111111", "Ana Maria Gomez", "OPS")],
    );
    let by_id = out.outcomes.iter().find(|o| o.method == Some(MatchMethod::Identifier)).unwrap();
    assert_eq!(by_id.matched_entry.as_ref().unwrap().identifier, "12345678");
    let ids: Vec<&str> = out.rows.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["11111111", "12345678"]);
}

#[test]
fn raising_threshold_turns_fuzzy_match_unmatched() {
    let toml = r#"
name = "strict"

[matching]
similarity_threshold = 0.95
"#;
    let config = ReconConfig::from_toml(toml).unwrap();
    let units = vec![TextUnit::new("page-1", "Beneficiario: Juan Perez")];
    let rows = vec![ReferenceRow::new(JUAN.0, JUAN.1, JUAN.2)];
    let out = run(&config, &units, &rows).unwrap();
    assert_eq!(out.outcomes[0].status, MatchStatus::Unmatched);
    assert_eq!(out.outcomes[0].alternatives[0].entry.identifier, "12345678");
}

#[test]
fn every_measure_keeps_exact_names_matched() {
    for measure in [SimilarityMeasure::TokenSet, SimilarityMeasure::Levenshtein, SimilarityMeasure::JaroWinkler] {
        let mut config = ReconConfig::default_named("measures");
        config.matching.measure = measure;
        let units = vec![TextUnit::new("page-1", "Pago a JUAN CARLOS PÉREZ MARTÍNEZ")];
        let rows = vec![ReferenceRow::new(JUAN.0, JUAN.1, JUAN.2)];
        let out = run(&config, &units, &rows).unwrap();
        assert_eq!(out.rows.len(), 1, "measure {measure}");
        assert_eq!(out.outcomes[0].score, 1.0);
    }
}

#[test]
fn invalid_config_names_parameter() {
    let err = ReconConfig::from_toml("name = \"x\"\n[matching]\nminimum_separation_margin = 1.0\n").unwrap_err();
    assert!(matches!(err, ReconError::InvalidParameter { ref parameter, .. } if parameter == "matching.minimum_separation_margin"));

    let err = ReconConfig::from_toml("name = \"x\"\n[matching]\nmeasure = \"soundex\"\n").unwrap_err();
    assert!(matches!(err, ReconError::ConfigParse(_)));
}

#[test]
fn runs_are_deterministic_and_parallel_agnostic() {
    let toml = std::fs::read_to_string(fixtures_dir().join("invoice.recon.toml")).unwrap();
    let first = load_and_run(&toml);
    let second = load_and_run(&toml);
    assert_eq!(first, second);

    let parallel = load_and_run(&toml.replace("max_suggestions = 5", "max_suggestions = 5\nparallel = true"));
    assert_eq!(parallel.outcomes, first.outcomes);
    assert_eq!(parallel.rows, first.rows);
}

#[test]
fn output_serializes_without_internal_fields() {
    let out = run_inline("cedula 12345678", &[JUAN]);
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["rows"][0]["cost_center"], "VENTAS");
    assert_eq!(json["outcomes"][0]["status"], "matched");
    assert_eq!(json["outcomes"][0]["method"], "identifier");
    assert!(json["outcomes"][0]["matched_entry"].get("normalized_name").is_none());
}
