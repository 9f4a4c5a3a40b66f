// File I/O for the reconciliation engine

pub mod reference;
pub mod render;
pub mod text;

pub use reference::{open_reference, CsvReferenceSource, XlsxReferenceSource};
pub use text::FileTextSource;
