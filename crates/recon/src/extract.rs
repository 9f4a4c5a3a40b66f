//! Candidate extraction from raw document text.
//!
//! Identifiers are found by a structural rule (digit runs, optionally in
//! dotted thousands groups, within a configured digit-count range). Names
//! are runs of capitalized words on one line. The name heuristic produces
//! false positives by nature; they surface later as unmatched candidates.

use std::collections::HashSet;

use indexmap::map::Entry;
use indexmap::IndexMap;
use regex::Regex;

use crate::config::{ExtractionConfig, IdentifierConfig, ReconConfig};
use crate::model::{Candidate, CandidateKind, SourcePosition, TextUnit};
use crate::normalize::{NormalizeOptions, Normalizer};

/// Invoice vocabulary that is capitalized like a name but never part of one.
const BUILTIN_STOPWORDS: &[&str] = &[
    "afiliado", "base", "cantidad", "cc", "cedula", "centro", "ciudad", "cliente", "codigo",
    "concepto", "costo", "cuenta", "date", "del", "descripcion", "descuento", "direccion",
    "documento", "empresa", "factura", "fecha", "identificacion", "impuesto", "invoice", "iva",
    "name", "nit", "nombre", "numero", "page", "pagina", "periodo", "precio", "producto",
    "servicio", "subtotal", "tarifa", "telefono", "total", "valor",
];

/// Punctuation peeled off a whitespace-delimited token before classifying it.
const LEADING_PUNCT: &[char] = &['(', '[', '"', '\'', '¿', '¡'];
const TRAILING_PUNCT: &[char] = &[')', ']', ',', '.', ';', ':', '"', '\'', '!', '?'];

/// One token occurrence, before deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub kind: CandidateKind,
    pub raw_text: String,
    pub position: SourcePosition,
}

#[derive(Debug, Clone)]
pub struct Extractor {
    normalizer: Normalizer,
    min_digits: usize,
    max_digits: usize,
    name_min_tokens: usize,
    name_max_tokens: usize,
    stopwords: HashSet<String>,
    number: Regex,
    word: Regex,
}

impl Extractor {
    pub fn new(
        extraction: &ExtractionConfig,
        identifier: &IdentifierConfig,
        normalizer: Normalizer,
    ) -> Self {
        // Stopwords are compared one word at a time, so order never matters.
        let folder = Normalizer::new(NormalizeOptions {
            name_token_reorder: false,
            ..normalizer.options()
        });
        let stopwords = BUILTIN_STOPWORDS
            .iter()
            .map(|w| w.to_string())
            .chain(extraction.stopwords.iter().map(|w| folder.name(w)))
            .filter(|w| !w.is_empty())
            .collect();

        Self {
            normalizer,
            min_digits: identifier.min_digits,
            max_digits: identifier.max_digits,
            name_min_tokens: extraction.name_min_tokens,
            name_max_tokens: extraction.name_max_tokens,
            stopwords,
            number: Regex::new(r"\d+(?:\.\d+)*").expect("static regex"),
            word: Regex::new(r"\S+").expect("static regex"),
        }
    }

    pub fn from_config(config: &ReconConfig, normalizer: Normalizer) -> Self {
        Self::new(&config.extraction, &config.identifier, normalizer)
    }

    /// Every token occurrence in document order. Scans one unit at a time;
    /// call again to restart.
    pub fn tokens<'a>(&'a self, units: &'a [TextUnit]) -> impl Iterator<Item = RawToken> + 'a {
        units
            .iter()
            .enumerate()
            .flat_map(move |(index, unit)| self.scan_unit(index, unit))
    }

    /// Deduplicated candidates in first-seen order. Each keeps its first
    /// position and the number of occurrences it stands for.
    pub fn extract(&self, units: &[TextUnit]) -> Vec<Candidate> {
        let mut groups: IndexMap<(CandidateKind, String), Candidate> = IndexMap::new();

        for token in self.tokens(units) {
            let normalized = self.normalizer.normalize(&token.raw_text, token.kind);
            if normalized.is_empty() {
                continue;
            }
            match groups.entry((token.kind, normalized)) {
                Entry::Occupied(mut existing) => existing.get_mut().occurrences += 1,
                Entry::Vacant(slot) => {
                    let normalized_text = slot.key().1.clone();
                    slot.insert(Candidate {
                        raw_text: token.raw_text,
                        kind: token.kind,
                        normalized_text,
                        position: token.position,
                        occurrences: 1,
                    });
                }
            }
        }

        let candidates: Vec<Candidate> = groups.into_values().collect();
        log::debug!(
            "extracted {} candidate(s) from {} unit(s)",
            candidates.len(),
            units.len()
        );
        candidates
    }

    fn scan_unit(&self, unit_index: usize, unit: &TextUnit) -> Vec<RawToken> {
        let mut tokens = Vec::new();
        let mut line_start = 0usize;

        for (line_no, line) in unit.text.split('\n').enumerate() {
            let at = |offset_in_line: usize| SourcePosition {
                unit_index,
                unit_id: unit.id.clone(),
                offset: line_start + offset_in_line,
                line: line_no + 1,
                column: line[..offset_in_line].chars().count() + 1,
            };

            let mut line_tokens: Vec<(usize, CandidateKind, &str)> = Vec::new();
            self.scan_identifiers(line, &mut line_tokens);
            self.scan_names(line, &mut line_tokens);
            line_tokens.sort_by_key(|(offset, kind, _)| (*offset, *kind));

            tokens.extend(line_tokens.into_iter().map(|(offset, kind, raw)| RawToken {
                kind,
                raw_text: raw.to_string(),
                position: at(offset),
            }));

            line_start += line.len() + 1;
        }

        tokens
    }

    fn scan_identifiers<'l>(&self, line: &'l str, out: &mut Vec<(usize, CandidateKind, &'l str)>) {
        for m in self.number.find_iter(line) {
            let text = m.as_str();
            if glued_to_word(line, m.start(), m.end()) || !is_identifier_shaped(text) {
                continue;
            }
            let digits = text.bytes().filter(u8::is_ascii_digit).count();
            if digits >= self.min_digits && digits <= self.max_digits {
                out.push((m.start(), CandidateKind::Identifier, text));
            }
        }
    }

    fn scan_names<'l>(&self, line: &'l str, out: &mut Vec<(usize, CandidateKind, &'l str)>) {
        // (start, end) byte ranges of the name words in the current run
        let mut run: Vec<(usize, usize)> = Vec::new();
        let mut run_closed = false;

        for m in self.word.find_iter(line) {
            let token = m.as_str();
            let core_start = token.len() - token.trim_start_matches(LEADING_PUNCT).len();
            let core = token[core_start..].trim_end_matches(TRAILING_PUNCT);
            let start = m.start() + core_start;
            let end = start + core.len();

            if !self.is_name_word(core) {
                self.flush_run(line, &mut run, out);
                run_closed = false;
                continue;
            }

            if run_closed || core_start > 0 {
                self.flush_run(line, &mut run, out);
            }
            run.push((start, end));
            // Trailing punctuation ends the run after this word.
            run_closed = end < m.end();
        }

        self.flush_run(line, &mut run, out);
    }

    fn flush_run<'l>(
        &self,
        line: &'l str,
        run: &mut Vec<(usize, usize)>,
        out: &mut Vec<(usize, CandidateKind, &'l str)>,
    ) {
        if run.len() >= self.name_min_tokens && run.len() <= self.name_max_tokens {
            let start = run[0].0;
            let end = run[run.len() - 1].1;
            out.push((start, CandidateKind::Name, &line[start..end]));
        }
        run.clear();
    }

    fn is_name_word(&self, word: &str) -> bool {
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_uppercase() || word.chars().count() < 2 {
            return false;
        }
        if !word.chars().all(|c| c.is_alphabetic() || matches!(c, '\'' | '’' | '-')) {
            return false;
        }
        if word.ends_with('-') {
            return false;
        }
        let folded = self.normalizer.name(word);
        !folded.split(' ').any(|w| self.stopwords.contains(w))
    }
}

/// True when the digit run at `start..end` touches a letter, digit or `_`,
/// as in invoice numbers like `FAC12345678`.
fn glued_to_word(line: &str, start: usize, end: usize) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    line[..start].chars().next_back().map_or(false, is_word)
        || line[end..].chars().next().map_or(false, is_word)
}

/// Plain digit runs always qualify; dotted runs only as thousands groups
/// (`12.345.678`), which keeps decimal amounts like `1234.56` out.
fn is_identifier_shaped(text: &str) -> bool {
    let mut groups = text.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let rest: Vec<&str> = groups.collect();
    if rest.is_empty() {
        return true;
    }
    (1..=3).contains(&head.len()) && rest.iter().all(|g| g.len() == 3)
}
