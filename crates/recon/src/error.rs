use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// A configuration value is out of range. `parameter` is the dotted
    /// config path (e.g. `matching.similarity_threshold`).
    InvalidParameter { parameter: String, reason: String },
    /// Reference table has no column for a required field.
    MissingColumn { field: String, available: Vec<String> },
    /// A collaborator failed to supply text units or reference rows.
    Source(String),
    /// IO error (file read, write, etc.).
    Io(String),
}

impl ReconError {
    pub fn invalid(parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors raised before any resolution begins.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigParse(_) | Self::InvalidParameter { .. })
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::InvalidParameter { parameter, reason } => {
                write!(f, "invalid config parameter '{parameter}': {reason}")
            }
            Self::MissingColumn { field, available } => {
                write!(
                    f,
                    "reference table: no column for '{field}' (columns: {})",
                    available.join(", ")
                )
            }
            Self::Source(msg) => write!(f, "input error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
