use std::cmp::Ordering;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One logical unit of source text (typically a page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub id: String,
    pub text: String,
}

impl TextUnit {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One raw reference-table row, exactly as the loader read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceRow {
    pub identifier: String,
    pub name: String,
    pub cost_center: String,
}

impl ReferenceRow {
    pub fn new(identifier: &str, name: &str, cost_center: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            cost_center: cost_center.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference table
// ---------------------------------------------------------------------------

/// A normalized reference-table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceEntry {
    /// 0-based position in the loaded table. Breaks score ties.
    pub row: usize,
    pub identifier: String,
    pub display_name: String,
    pub cost_center: String,
    #[serde(skip)]
    pub normalized_name: String,
    pub identifier_raw: String,
    pub name_raw: String,
    pub cost_center_raw: String,
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Identifier,
    Name,
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Name => write!(f, "name"),
        }
    }
}

/// Where a token was found. Ordered by document position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePosition {
    pub unit_index: usize,
    pub unit_id: String,
    /// Byte offset inside the unit's text.
    pub offset: usize,
    /// 1-based.
    pub line: usize,
    /// 1-based, in characters.
    pub column: usize,
}

impl Ord for SourcePosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.unit_index
            .cmp(&other.unit_index)
            .then(self.offset.cmp(&other.offset))
    }
}

impl PartialOrd for SourcePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.unit_id, self.line, self.column)
    }
}

/// A deduplicated identity token from the source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub raw_text: String,
    pub kind: CandidateKind,
    pub normalized_text: String,
    /// First occurrence.
    pub position: SourcePosition,
    /// Source occurrences collapsed into this candidate (>= 1).
    pub occurrences: usize,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Ambiguous,
    Unmatched,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// Which tier confirmed a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Identifier,
    Name,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Name => write!(f, "name"),
        }
    }
}

/// A reference entry offered for manual review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub entry: ReferenceEntry,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub candidate: Candidate,
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MatchMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_entry: Option<ReferenceEntry>,
    /// 1.0 for identifier matches, otherwise the best name score.
    pub score: f64,
    pub alternatives: Vec<Suggestion>,
}

impl MatchOutcome {
    pub fn matched(
        candidate: &Candidate,
        method: MatchMethod,
        entry: &ReferenceEntry,
        score: f64,
    ) -> Self {
        Self {
            candidate: candidate.clone(),
            status: MatchStatus::Matched,
            method: Some(method),
            matched_entry: Some(entry.clone()),
            score,
            alternatives: Vec::new(),
        }
    }

    pub fn unresolved(
        candidate: &Candidate,
        status: MatchStatus,
        score: f64,
        alternatives: Vec<Suggestion>,
    ) -> Self {
        debug_assert!(status != MatchStatus::Matched);
        Self {
            candidate: candidate.clone(),
            status,
            method: None,
            matched_entry: None,
            score,
            alternatives,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.status == MatchStatus::Matched
    }
}

// ---------------------------------------------------------------------------
// Consolidation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedRow {
    pub identifier: String,
    pub display_name: String,
    pub cost_center: String,
    pub occurrence_count: usize,
    pub first_seen: SourcePosition,
    pub methods: Vec<MatchMethod>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateIdentifier {
    pub identifier: String,
    /// Every 0-based row carrying the identifier; the first one is kept.
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedRow {
    pub row: usize,
    pub reason: String,
}

/// Data-quality findings about the reference table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableDiagnostics {
    pub rows_read: usize,
    pub entries: usize,
    pub duplicate_identifiers: Vec<DuplicateIdentifier>,
    pub malformed_rows: Vec<MalformedRow>,
}

impl TableDiagnostics {
    pub fn is_empty_table(&self) -> bool {
        self.entries == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    pub empty_reference_table: bool,
    pub duplicate_identifiers: Vec<DuplicateIdentifier>,
    pub malformed_rows: usize,
    pub malformed_row_details: Vec<MalformedRow>,
}

/// A non-matched candidate awaiting a human decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    pub candidate: Candidate,
    pub status: MatchStatus,
    pub best_score: f64,
    pub alternatives: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub total_candidates: usize,
    pub matched: usize,
    pub ambiguous: usize,
    pub unmatched: usize,
    pub matched_by_identifier: usize,
    pub matched_by_name: usize,
    pub match_rate: f64,
    pub data_quality: DataQuality,
    pub review: Vec<ReviewItem>,
}

impl RunReport {
    /// True when any candidate needs manual resolution.
    pub fn needs_review(&self) -> bool {
        !self.review.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Run output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput {
    pub candidates: Vec<Candidate>,
    pub outcomes: Vec<MatchOutcome>,
    pub rows: Vec<ConsolidatedRow>,
    pub report: RunReport,
}
