use crate::config::ReconConfig;
use crate::consolidate::consolidate;
use crate::error::ReconError;
use crate::extract::Extractor;
use crate::model::RunOutput;
use crate::normalize::Normalizer;
use crate::reference::ReferenceTable;
use crate::report::build_report;
use crate::resolve::Resolver;
use crate::source::{ReferenceSource, TextSource};

/// Run one reconciliation: extract, resolve, consolidate, report.
///
/// Configuration is validated before any input is read. Source errors abort
/// the run unchanged; data-quality problems end up in the report instead.
pub fn run(
    config: &ReconConfig,
    text: &dyn TextSource,
    reference: &dyn ReferenceSource,
) -> Result<RunOutput, ReconError> {
    config.validate()?;

    let normalizer = Normalizer::from_config(config);

    let rows = reference.reference_rows()?;
    let table = ReferenceTable::build(&rows, &normalizer);

    let units = text.text_units()?;
    let extractor = Extractor::from_config(config, normalizer);
    let candidates = extractor.extract(&units);

    let resolver = Resolver::from_config(&config.matching, normalizer);
    let outcomes = resolver.resolve_all(&candidates, &table);

    let consolidated = consolidate(&outcomes);
    let report = build_report(&outcomes, table.diagnostics());

    log::info!(
        "{}: {} candidate(s), {} matched ({} by identifier, {} by name), {} ambiguous, {} unmatched, {} row(s)",
        config.name,
        report.total_candidates,
        report.matched,
        report.matched_by_identifier,
        report.matched_by_name,
        report.ambiguous,
        report.unmatched,
        consolidated.len()
    );

    Ok(RunOutput {
        candidates,
        outcomes,
        rows: consolidated,
        report,
    })
}
