//! Reading page text from PDF documents using the `pdf-extract` crate.
//!
//! `pdf-extract` returns all pages as a single string with form feeds
//! (`\x0C`) between pages, so pages are recovered by splitting on them.
//! Empty pages are kept so page numbers stay aligned with the document.

use std::path::Path;

use crate::error::{DocumentError, DocumentResult};
use crate::index::PageText;

/// Read a PDF file into page-indexed text.
pub fn read_pdf_pages(path: &Path) -> DocumentResult<PageText> {
    let data = std::fs::read(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let pages = pages_from_pdf(&data)?;
    tracing::info!(path = %path.display(), pages = pages.len(), "read PDF");
    Ok(pages)
}

/// All page text of a PDF joined into one string, for chunking.
pub fn pdf_text(path: &Path) -> DocumentResult<String> {
    Ok(read_pdf_pages(path)?.full_text())
}

/// Extract page-indexed text from PDF bytes.
pub fn pages_from_pdf(data: &[u8]) -> DocumentResult<PageText> {
    let text = pdf_extract::extract_text_from_mem(data).map_err(|e| DocumentError::Pdf {
        message: e.to_string(),
    })?;

    if text.trim().is_empty() {
        return Err(DocumentError::Empty {
            origin: "(pdf)".into(),
        });
    }

    Ok(pages_from_text(&text))
}

/// Split extracted text into pages on form feeds.
///
/// A trailing form feed does not start another page.
pub fn pages_from_text(text: &str) -> PageText {
    let text = text.strip_suffix('\x0C').unwrap_or(text);
    PageText::from_sequence(text.split('\x0C'))
}

/// Read a text file with one entry per line, skipping blank lines.
pub fn read_lines(path: &Path) -> DocumentResult<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
