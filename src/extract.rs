//! Text extraction for source documents.
//!
//! The pipeline only sees the [`TextExtractor`] trait. [`PdfExtractor`] is
//! the production implementation, backed by `pdf-extract`. Extraction is
//! allowed to return an empty string for scanned or unreadable PDFs; the
//! pipeline treats that as a soft failure.

use std::path::Path;

use crate::error::ExtractError;

/// Turns a source file into plain UTF-8 text.
pub trait TextExtractor {
    /// # Errors
    ///
    /// [`ExtractError::NotFound`] if `path` does not exist; other variants if
    /// the file cannot be read or parsed. No panics.
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// PDF text extraction via `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        extract_pdf(&bytes)
    }
}

/// Extract text from in-memory PDF bytes.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = PdfExtractor
            .extract(&tmp.path().join("absent.pdf"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn invalid_pdf_file_returns_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        assert!(matches!(
            PdfExtractor.extract(&path),
            Err(ExtractError::Pdf(_))
        ));
    }
}
