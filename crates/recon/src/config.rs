use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub identifier: IdentifierConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub reference: Option<ReferenceConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Name-tier tuning. Document quality varies between runs, so none of these
/// are constants.
///
/// Defaults: threshold 0.8, separation margin 0.05, five suggestions,
/// token reordering on, `token_set` similarity, suggestion floor 0.0,
/// sequential resolution.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Minimum name similarity for a reference entry to count as a match.
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    /// Gap the best score must keep over the runner-up to be picked alone.
    #[serde(default = "default_margin")]
    pub minimum_separation_margin: f64,
    /// K for alternatives lists.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// Sort name tokens before comparison ("Perez Juan" == "Juan Perez").
    #[serde(default = "default_true")]
    pub name_token_reorder: bool,
    #[serde(default)]
    pub measure: SimilarityMeasure,
    /// Entries scoring below this never appear as suggestions.
    #[serde(default)]
    pub suggestion_floor: f64,
    /// Resolve candidates on the rayon pool. Outcomes are identical either way.
    #[serde(default)]
    pub parallel: bool,
}

fn default_threshold() -> f64 {
    0.8
}

fn default_margin() -> f64 {
    0.05
}

fn default_max_suggestions() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_threshold(),
            minimum_separation_margin: default_margin(),
            max_suggestions: default_max_suggestions(),
            name_token_reorder: true,
            measure: SimilarityMeasure::default(),
            suggestion_floor: 0.0,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    #[default]
    TokenSet,
    Levenshtein,
    JaroWinkler,
}

impl std::fmt::Display for SimilarityMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenSet => write!(f, "token_set"),
            Self::Levenshtein => write!(f, "levenshtein"),
            Self::JaroWinkler => write!(f, "jaro_winkler"),
        }
    }
}

impl std::str::FromStr for SimilarityMeasure {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token_set" => Ok(Self::TokenSet),
            "levenshtein" => Ok(Self::Levenshtein),
            "jaro_winkler" => Ok(Self::JaroWinkler),
            other => Err(ReconError::invalid(
                "matching.measure",
                format!("unknown measure \"{other}\" (expected token_set, levenshtein or jaro_winkler)"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifier + extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IdentifierConfig {
    #[serde(default = "default_min_digits")]
    pub min_digits: usize,
    #[serde(default = "default_max_digits")]
    pub max_digits: usize,
    /// Leading zeros are significant unless this is set.
    #[serde(default)]
    pub strip_leading_zeros: bool,
}

fn default_min_digits() -> usize {
    6
}

fn default_max_digits() -> usize {
    12
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            min_digits: default_min_digits(),
            max_digits: default_max_digits(),
            strip_leading_zeros: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_name_min_tokens")]
    pub name_min_tokens: usize,
    #[serde(default = "default_name_max_tokens")]
    pub name_max_tokens: usize,
    /// Extra words that break a capitalized run, on top of the built-in list.
    #[serde(default)]
    pub stopwords: Vec<String>,
}

fn default_name_min_tokens() -> usize {
    2
}

fn default_name_max_tokens() -> usize {
    5
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            name_min_tokens: default_name_min_tokens(),
            name_max_tokens: default_name_max_tokens(),
            stopwords: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    pub file: String,
    /// Worksheet name for spreadsheet files. First sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

/// Header names for the three reference fields. Unset fields are detected
/// from the header row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cost_center: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub xlsx: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
    /// Augmented copy of the source document.
    #[serde(default)]
    pub document: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    /// Config with every option at its default.
    pub fn default_named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matching: MatchingConfig::default(),
            identifier: IdentifierConfig::default(),
            extraction: ExtractionConfig::default(),
            source: None,
            reference: None,
            output: OutputConfig::default(),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let m = &self.matching;

        // (0, 1]; written this way so NaN fails too
        if !(m.similarity_threshold > 0.0 && m.similarity_threshold <= 1.0) {
            return Err(ReconError::invalid(
                "matching.similarity_threshold",
                format!("must be in (0, 1], got {}", m.similarity_threshold),
            ));
        }

        if !(m.minimum_separation_margin >= 0.0 && m.minimum_separation_margin < 1.0) {
            return Err(ReconError::invalid(
                "matching.minimum_separation_margin",
                format!("must be in [0, 1), got {}", m.minimum_separation_margin),
            ));
        }

        if m.max_suggestions == 0 {
            return Err(ReconError::invalid(
                "matching.max_suggestions",
                "must be at least 1",
            ));
        }

        if !(m.suggestion_floor >= 0.0 && m.suggestion_floor <= 1.0) {
            return Err(ReconError::invalid(
                "matching.suggestion_floor",
                format!("must be in [0, 1], got {}", m.suggestion_floor),
            ));
        }

        let id = &self.identifier;
        if id.min_digits == 0 {
            return Err(ReconError::invalid("identifier.min_digits", "must be at least 1"));
        }
        if id.max_digits < id.min_digits {
            return Err(ReconError::invalid(
                "identifier.max_digits",
                format!("must be >= identifier.min_digits ({}), got {}", id.min_digits, id.max_digits),
            ));
        }

        let ex = &self.extraction;
        if ex.name_min_tokens == 0 {
            return Err(ReconError::invalid("extraction.name_min_tokens", "must be at least 1"));
        }
        if ex.name_max_tokens < ex.name_min_tokens {
            return Err(ReconError::invalid(
                "extraction.name_max_tokens",
                format!(
                    "must be >= extraction.name_min_tokens ({}), got {}",
                    ex.name_min_tokens, ex.name_max_tokens
                ),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
