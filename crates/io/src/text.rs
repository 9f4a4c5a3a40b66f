// Plain-text source documents (text already extracted from the PDF or scan)

use std::io::Read;
use std::path::{Path, PathBuf};

use idrecon::model::TextUnit;
use idrecon::{ReconError, TextSource};

/// Page separator written by common PDF-to-text tools.
pub const PAGE_BREAK: char = '\x0c';

/// A text file whose form feeds mark page boundaries.
#[derive(Debug, Clone)]
pub struct FileTextSource {
    path: PathBuf,
}

impl FileTextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSource for FileTextSource {
    fn text_units(&self) -> Result<Vec<TextUnit>, ReconError> {
        let content = read_file_as_utf8(&self.path)
            .map_err(|e| ReconError::Source(format!("{}: {e}", self.path.display())))?;
        let units = split_pages(&content);
        log::debug!("{}: {} page(s)", self.path.display(), units.len());
        Ok(units)
    }
}

/// One unit per page, ids `page-1`, `page-2`, ... A trailing form feed does
/// not open an extra page.
pub fn split_pages(content: &str) -> Vec<TextUnit> {
    let content = content.strip_suffix(PAGE_BREAK).unwrap_or(content);
    content
        .split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| TextUnit::new(format!("page-{}", i + 1), page))
        .collect()
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn splits_on_form_feed() {
        let units = split_pages("first page\x0csecond page\x0c");
        assert_eq!(units.len(), 2);
        assert_eq!(units[0], TextUnit::new("page-1", "first page"));
        assert_eq!(units[1].id, "page-2");
        assert_eq!(units[1].text, "second page");
    }

    #[test]
    fn empty_file_is_one_empty_page() {
        let units = split_pages("");
        assert_eq!(units, vec![TextUnit::new("page-1", "")]);
    }

    #[test]
    fn reads_windows_1252() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // "Pérez" in Windows-1252
        file.write_all(b"P\xe9rez 12345678").unwrap();
        let units = FileTextSource::new(file.path()).text_units().unwrap();
        assert_eq!(units[0].text, "Pérez 12345678");
    }

    #[test]
    fn strips_utf8_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("\u{feff}Juan Perez".as_bytes()).unwrap();
        let units = FileTextSource::new(file.path()).text_units().unwrap();
        assert_eq!(units[0].text, "Juan Perez");
    }

    #[test]
    fn missing_file_is_source_error() {
        let err = FileTextSource::new("/nonexistent/invoice.txt").text_units().unwrap_err();
        assert!(matches!(err, ReconError::Source(ref m) if m.contains("/nonexistent/invoice.txt")));
    }
}
