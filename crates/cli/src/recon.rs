//! `idrecon run | validate | inspect`: config-driven identity reconciliation.

use std::path::{Path, PathBuf};

use idrecon::config::{ColumnMapping, ReconConfig};
use idrecon::extract::Extractor;
use idrecon::normalize::Normalizer;
use idrecon::TextSource;
use idrecon_io::render::{self, JsonEnvelope};
use idrecon_io::{open_reference, FileTextSource};

use crate::exit_codes::EXIT_REVIEW_REQUIRED;
use crate::{CliError, MatchingOverrides};

pub struct RunArgs {
    pub config: PathBuf,
    pub source: Option<PathBuf>,
    pub reference: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub strict: bool,
    pub overrides: MatchingOverrides,
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::input(format!("cannot read config {}: {e}", path.display())))?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

/// Command-line values win over the file; the result is validated again.
fn apply_overrides(config: &mut ReconConfig, overrides: &MatchingOverrides) -> Result<(), CliError> {
    let m = &mut config.matching;
    if let Some(threshold) = overrides.threshold {
        m.similarity_threshold = threshold;
    }
    if let Some(margin) = overrides.margin {
        m.minimum_separation_margin = margin;
    }
    if let Some(k) = overrides.max_suggestions {
        m.max_suggestions = k;
    }
    if overrides.no_reorder {
        m.name_token_reorder = false;
    }
    if let Some(measure) = overrides.measure {
        m.measure = measure;
    }
    if overrides.parallel {
        m.parallel = true;
    }
    config.validate()?;
    log::debug!("matching parameters: {:?}", config.matching);
    Ok(())
}

fn config_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

fn write_file(path: &Path, content: &str) -> Result<(), CliError> {
    std::fs::write(path, content)
        .map_err(|e| CliError::output(format!("cannot write {}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(&args.config)?;
    apply_overrides(&mut config, &args.overrides)?;

    // Paths in the config are relative to the config file's directory
    let base_dir = config_dir(&args.config);

    let source_path = args
        .source
        .or_else(|| config.source.as_ref().map(|s| base_dir.join(&s.file)))
        .ok_or_else(|| {
            CliError::usage("no source document").with_hint("pass --source or set [source].file in the config")
        })?;
    let reference_path = args
        .reference
        .or_else(|| config.reference.as_ref().map(|r| base_dir.join(&r.file)))
        .ok_or_else(|| {
            CliError::usage("no reference table").with_hint("pass --reference or set [reference].file in the config")
        })?;
    log::debug!("source {}, reference {}", source_path.display(), reference_path.display());
    let (sheet, columns) = match &config.reference {
        Some(r) => (r.sheet.clone(), r.columns.clone()),
        None => (None, ColumnMapping::default()),
    };

    let units = FileTextSource::new(&source_path).text_units()?;
    let reference = open_reference(&reference_path, sheet, columns)?;
    let output = idrecon::run(&config, &units, reference.as_ref())?;

    // Configured outputs
    let out = &config.output;
    if let Some(file) = &out.csv {
        let path = base_dir.join(file);
        render::write_rows_csv(&output.rows, &path)?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(file) = &out.xlsx {
        let path = base_dir.join(file);
        render::write_rows_xlsx(&output.rows, &output.report, &path)?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(file) = &out.document {
        let document = render::render_document(&units, &output.rows, &output.report);
        write_file(&base_dir.join(file), &document)?;
    }

    let needs_json = args.json || args.output.is_some() || out.json.is_some();
    if needs_json {
        let json_str = JsonEnvelope::new(&config.name, &output).to_json()?;
        if let Some(file) = &out.json {
            write_file(&base_dir.join(file), &json_str)?;
        }
        if let Some(path) = &args.output {
            write_file(path, &json_str)?;
        }
        if args.json {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    eprint!("{}", render::render_summary(&config.name, &output.report, &output.rows));

    if args.strict && output.report.needs_review() {
        return Err(CliError {
            code: EXIT_REVIEW_REQUIRED,
            message: format!("{} candidate(s) need manual review (--strict)", output.report.review.len()),
            hint: Some("review the alternatives in the report, or adjust --threshold / --margin".to_string()),
        });
    }

    Ok(())
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let m = &config.matching;
    println!(
        "ok: \"{}\" (threshold {}, margin {}, measure {}, max suggestions {})",
        config.name, m.similarity_threshold, m.minimum_separation_margin, m.measure, m.max_suggestions
    );

    let base_dir = config_dir(&config_path);
    if let Some(source) = &config.source {
        println!("source:    {}", base_dir.join(&source.file).display());
    }
    if let Some(reference) = &config.reference {
        println!("reference: {}", base_dir.join(&reference.file).display());
    }
    Ok(())
}

// ============================================================================
// inspect
// ============================================================================

pub fn cmd_inspect(file: PathBuf, config_path: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => ReconConfig::default_named("inspect"),
    };

    let units = FileTextSource::new(&file).text_units()?;
    let extractor = Extractor::from_config(&config, Normalizer::from_config(&config));
    let candidates = extractor.extract(&units);

    if json {
        let json_str = serde_json::to_string_pretty(&candidates)
            .map_err(|e| CliError::output(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for c in &candidates {
            println!(
                "{:<10}  {:<14}  x{:<3}  {}  ->  {}",
                c.kind.to_string(),
                c.position.to_string(),
                c.occurrences,
                c.raw_text,
                c.normalized_text
            );
        }
    }

    eprintln!("{} candidate(s) in {} page(s)", candidates.len(), units.len());
    Ok(())
}
