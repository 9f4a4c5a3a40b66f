//! Canonical forms for identifiers and names.
//!
//! Reference names and extracted candidates go through the same
//! [`Normalizer`] so that comparison is insensitive to case, accents,
//! punctuation, spacing and (optionally) token order.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::ReconConfig;
use crate::model::CandidateKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub name_token_reorder: bool,
    pub strip_leading_zeros: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            name_token_reorder: true,
            strip_leading_zeros: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &ReconConfig) -> Self {
        Self::new(NormalizeOptions {
            name_token_reorder: config.matching.name_token_reorder,
            strip_leading_zeros: config.identifier.strip_leading_zeros,
        })
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    pub fn normalize(&self, text: &str, kind: CandidateKind) -> String {
        match kind {
            CandidateKind::Identifier => self.identifier(text),
            CandidateKind::Name => self.name(text),
        }
    }

    /// Digits only. `"12.345.678"` -> `"12345678"`.
    pub fn identifier(&self, text: &str) -> String {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if !self.options.strip_leading_zeros {
            return digits;
        }
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() && !digits.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Lowercase, accent-free, alphanumeric tokens joined by single spaces.
    pub fn name(&self, text: &str) -> String {
        let folded: String = text
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();

        let mut tokens: Vec<&str> = folded.split_whitespace().collect();
        if self.options.name_token_reorder {
            tokens.sort_unstable();
        }
        tokens.join(" ")
    }
}

/// Title-case a raw name for output: `"PÉREZ  juan"` -> `"Pérez Juan"`.
pub fn display_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
