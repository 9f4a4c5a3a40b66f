//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success                                                      |
//! | 2    | CLI usage error (bad args, no source or reference given)     |
//! | 3    | Invalid configuration (TOML syntax, out-of-range parameter)  |
//! | 4    | Input access (unreadable file, missing column, bad sheet)    |
//! | 5    | Output write failed                                          |
//! | 6    | Review required: `--strict` and a candidate is not matched   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
/// clap uses the same code for its own parse errors.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A source document or reference table could not be read.
pub const EXIT_INPUT: u8 = 4;

/// A configured output file could not be written.
pub const EXIT_OUTPUT: u8 = 5;

/// `--strict` run left ambiguous or unmatched candidates.
/// Outputs are still written before exiting.
pub const EXIT_REVIEW_REQUIRED: u8 = 6;
