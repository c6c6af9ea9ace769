//! Turning uploaded file bytes into document text.
//!
//! Extraction sits outside the retrieval core: the host checks the upload
//! size with [`check_upload_size`], picks a [`TextExtractor`] (for example
//! with [`extractor_for_path`]), and hands the text to the retriever.

use std::path::Path;

use tracing::debug;

use crate::error::{RagError, Result};

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Extracts plain text from the raw bytes of an uploaded file.
pub trait TextExtractor: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Return the text content of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Ingestion`] for unsupported or corrupt input, and
    /// for input with no extractable text.
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Reject uploads larger than `limit` bytes.
///
/// # Errors
///
/// Returns [`RagError::Ingestion`] if `len > limit`.
pub fn check_upload_size(len: usize, limit: usize) -> Result<()> {
    if len > limit {
        return Err(RagError::ingestion(format!(
            "file is {len} bytes, which exceeds the {limit} byte limit"
        )));
    }
    Ok(())
}

fn non_empty(extractor: &str, text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(RagError::ingestion(format!("{extractor}: no extractable text")));
    }
    debug!(extractor, char_count = text.chars().count(), "text extracted");
    Ok(text)
}

/// Reads UTF-8 text files (`.txt`, `.md`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RagError::ingestion(format!("file is not valid UTF-8 text: {e}")))?;
        if text.contains('\0') {
            return Err(RagError::ingestion("file looks binary, not text"));
        }
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        non_empty(self.name(), text.to_string())
    }
}

/// Extracts the text layer of PDF files.
///
/// Scanned PDFs without a text layer yield an ingestion error; OCR is not
/// attempted.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfTextExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        if !bytes.starts_with(b"%PDF") {
            return Err(RagError::ingestion("file is not a PDF document"));
        }
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| RagError::ingestion(format!("failed to read PDF: {e}")))?;
        non_empty(self.name(), text)
    }
}

/// Pick an extractor from the file extension.
///
/// # Errors
///
/// Returns [`RagError::Ingestion`] for unsupported extensions.
pub fn extractor_for_path(path: &Path) -> Result<Box<dyn TextExtractor>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" | "markdown" | "text" => Ok(Box::new(PlainTextExtractor)),
        #[cfg(feature = "pdf")]
        "pdf" => Ok(Box::new(PdfTextExtractor)),
        other => Err(RagError::ingestion(format!(
            "unsupported file type '{other}' for {}",
            path.display()
        ))),
    }
}
