//! Collaborator contracts for the two engine inputs.
//!
//! File formats live in `idrecon-io`; the engine only sees these traits.

use crate::error::ReconError;
use crate::model::{ReferenceRow, TextUnit};

pub trait TextSource {
    fn text_units(&self) -> Result<Vec<TextUnit>, ReconError>;
}

pub trait ReferenceSource {
    fn reference_rows(&self) -> Result<Vec<ReferenceRow>, ReconError>;
}

impl TextSource for Vec<TextUnit> {
    fn text_units(&self) -> Result<Vec<TextUnit>, ReconError> {
        Ok(self.clone())
    }
}

impl TextSource for [TextUnit] {
    fn text_units(&self) -> Result<Vec<TextUnit>, ReconError> {
        Ok(self.to_vec())
    }
}

impl ReferenceSource for Vec<ReferenceRow> {
    fn reference_rows(&self) -> Result<Vec<ReferenceRow>, ReconError> {
        Ok(self.clone())
    }
}

impl ReferenceSource for [ReferenceRow] {
    fn reference_rows(&self) -> Result<Vec<ReferenceRow>, ReconError> {
        Ok(self.to_vec())
    }
}
