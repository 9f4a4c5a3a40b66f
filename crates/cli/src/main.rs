use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use env_logger::Env;

use idrecon::config::SimilarityMeasure;
use idrecon::ReconError;

mod exit_codes;
mod recon;

use exit_codes::*;

#[derive(Parser)]
#[command(name = "idrecon")]
#[command(about = "Resolve employees named in a document against a reference table and consolidate cost centers")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Matching parameters that override the config file.
#[derive(clap::Args, Debug, Default)]
pub struct MatchingOverrides {
    /// Minimum name similarity for a match, in (0, 1]
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Gap the best name score must keep over the runner-up, in [0, 1)
    #[arg(long)]
    pub margin: Option<f64>,

    /// Alternatives listed per unresolved candidate
    #[arg(long)]
    pub max_suggestions: Option<usize>,

    /// Compare names in written token order
    #[arg(long)]
    pub no_reorder: bool,

    /// Similarity measure: token_set, levenshtein or jaro_winkler
    #[arg(long)]
    pub measure: Option<SimilarityMeasure>,

    /// Resolve candidates in parallel
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  idrecon run march.recon.toml
  idrecon run march.recon.toml --json
  idrecon run march.recon.toml --output result.json --strict
  idrecon run march.recon.toml --source invoice.txt --reference employees.xlsx --threshold 0.85")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Source document text (overrides [source].file)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Reference table, CSV or Excel (overrides [reference].file)
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit 6 when any candidate is ambiguous or unmatched
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        overrides: MatchingOverrides,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  idrecon validate march.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// List the identity candidates found in a text file
    #[command(after_help = "\
Examples:
  idrecon inspect invoice.txt
  idrecon inspect invoice.txt --config march.recon.toml --json")]
    Inspect {
        /// Source document text
        file: PathBuf,

        /// Config whose [identifier] and [extraction] settings apply
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            source,
            reference,
            json,
            output,
            strict,
            overrides,
        } => recon::cmd_run(recon::RunArgs {
            config,
            source,
            reference,
            json,
            output,
            strict,
            overrides,
        }),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Inspect { file, config, json } => recon::cmd_inspect(file, config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let (code, hint) = match &err {
            ReconError::ConfigParse(_) | ReconError::InvalidParameter { .. } => (EXIT_INVALID_CONFIG, None),
            ReconError::MissingColumn { .. } => (
                EXIT_INPUT,
                Some("name the columns under [reference.columns] (identifier, name, cost_center)".to_string()),
            ),
            ReconError::Source(_) => (EXIT_INPUT, None),
            ReconError::Io(_) => (EXIT_OUTPUT, None),
        };
        Self { code, message: err.to_string(), hint }
    }
}
