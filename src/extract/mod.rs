//! Document text extraction
//!
//! Turns an uploaded file into plain text pages ready for chunking. PDF
//! support is feature-gated (`pdf`, on by default); anything else is read as
//! UTF-8 text. Extraction failures are ingestion errors: they abort the
//! ingest call without touching the store.

use crate::error::{Error, Result};
use std::path::Path;

/// Supported document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
}

/// One extracted page of text
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// 1-based page number; None for unpaged documents
    pub page: Option<i64>,
    pub text: String,
}

/// Extracted document content
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub source: String,
    pub kind: DocumentKind,
    pub pages: Vec<ExtractedPage>,
}

impl ExtractedDocument {
    /// Total extracted text length in bytes
    pub fn text_len(&self) -> usize {
        self.pages.iter().map(|p| p.text.len()).sum()
    }
}

/// Detect the document kind from the file extension and MIME guess
pub fn detect_kind(path: &Path) -> DocumentKind {
    let guess = mime_guess::from_path(path).first_or_octet_stream();
    if guess.essence_str() == "application/pdf" {
        return DocumentKind::Pdf;
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => DocumentKind::Pdf,
        _ => DocumentKind::PlainText,
    }
}

/// Extract text from a document on disk
pub fn extract_file(path: &Path) -> Result<ExtractedDocument> {
    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    match detect_kind(path) {
        DocumentKind::Pdf => extract_pdf(path, source),
        DocumentKind::PlainText => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                Error::Ingestion(format!("failed to read '{}': {}", path.display(), e))
            })?;
            Ok(ExtractedDocument {
                source,
                kind: DocumentKind::PlainText,
                pages: vec![ExtractedPage { page: None, text }],
            })
        }
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path, source: String) -> Result<ExtractedDocument> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| {
        Error::Ingestion(format!(
            "failed to extract text from '{}': {}",
            path.display(),
            e
        ))
    })?;

    let pages = pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| ExtractedPage {
            page: Some(i as i64 + 1),
            text,
        })
        .collect();

    Ok(ExtractedDocument {
        source,
        kind: DocumentKind::Pdf,
        pages,
    })
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path, _source: String) -> Result<ExtractedDocument> {
    Err(Error::Ingestion(format!(
        "'{}' is a PDF but canopy was built without the 'pdf' feature",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind(Path::new("report.pdf")), DocumentKind::Pdf);
        assert_eq!(detect_kind(Path::new("notes.txt")), DocumentKind::PlainText);
        assert_eq!(detect_kind(Path::new("notes.md")), DocumentKind::PlainText);
    }

    #[test]
    fn test_extract_plain_text() {
        let mut file = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "Mangroves store carbon.").unwrap();

        let doc = extract_file(file.path()).unwrap();
        assert_eq!(doc.kind, DocumentKind::PlainText);
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].page, None);
        assert!(doc.pages[0].text.contains("Mangroves"));
    }

    #[test]
    fn test_missing_file_is_ingestion_error() {
        let err = extract_file(Path::new("/nonexistent/file.txt")).unwrap_err();
        assert!(matches!(err, Error::Ingestion(_)));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_corrupt_pdf_is_ingestion_error() {
        let mut file = tempfile::NamedTempFile::with_suffix(".pdf").unwrap();
        writeln!(file, "this is not a pdf").unwrap();

        let err = extract_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Ingestion(_)));
    }
}
