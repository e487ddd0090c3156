//! Text extraction for uploaded artifacts (PDF, plain text, stubs).
//!
//! Extraction is internally fallible: every path returns
//! `Result<String, ExtractError>` so callers can tell real content from
//! failure. At the persisted-content boundary [`stored_text`] renders
//! errors to descriptive sentinel strings, because the stored contract
//! carries text either way — a bad document degrades into an error
//! description instead of aborting ingestion. The sentinel string is the
//! only failure signal a reader of the stored record gets; the typed
//! error exists only up to this boundary.

use std::path::Path;

/// Extraction failure, tagged by input kind.
///
/// `Unsupported` covers the formats the pipeline accepts but cannot
/// extract yet (Word documents, images pending OCR); its payload is the
/// exact marker text to store.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    Text(String),
    Fetch(String),
    Web(String),
    Unsupported(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "Error processing PDF: {}", e),
            ExtractError::Text(e) => write!(f, "Error reading text file: {}", e),
            ExtractError::Fetch(e) => write!(f, "Error fetching URL: {}", e),
            ExtractError::Web(e) => write!(f, "Error processing URL content: {}", e),
            ExtractError::Unsupported(reason) => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Marker stored when a PDF parses but yields no text on either pass.
pub const NO_PDF_TEXT: &str = "No text content found in PDF.";

/// Render an extraction outcome to the text that gets persisted.
///
/// The `Display` impl of [`ExtractError`] is the sentinel wording, so
/// this is the single point where failure collapses into content.
pub fn stored_text(result: Result<String, ExtractError>) -> String {
    result.unwrap_or_else(|e| e.to_string())
}

/// Extract text from an artifact on disk, dispatching by extension.
pub fn extract_file(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path).map_err(|e| ExtractError::Pdf(e.to_string()))?;
            extract_pdf(&bytes)
        }
        "txt" => {
            let bytes = std::fs::read(path).map_err(|e| ExtractError::Text(e.to_string()))?;
            extract_text(&bytes)
        }
        "doc" | "docx" => Err(ExtractError::Unsupported(format!(
            "Document processing not fully implemented for: {}",
            path.display()
        ))),
        "jpg" | "jpeg" | "png" | "gif" => {
            let size = std::fs::metadata(path)
                .map(|m| m.len())
                .map_err(|e| ExtractError::Unsupported(e.to_string()))?;
            Err(ExtractError::Unsupported(format!(
                "Image file processed. Size: {} bytes. OCR not implemented yet.",
                size
            )))
        }
        other => Err(ExtractError::Unsupported(format!(
            "File type .{} not supported for content extraction.",
            other
        ))),
    }
}

/// Extract text from PDF bytes, page order preserved.
///
/// Primary pass is `pdf-extract`; if that yields only whitespace, a
/// second pass walks the pages with `lopdf` before giving up with the
/// [`NO_PDF_TEXT`] marker.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let primary = pdf_extract::extract_text_from_mem(bytes);

    match primary {
        Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Ok(_) => match extract_pdf_lopdf(bytes) {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) => Ok(NO_PDF_TEXT.to_string()),
            Err(e) => Err(ExtractError::Pdf(e)),
        },
        Err(e) => Err(ExtractError::Pdf(e.to_string())),
    }
}

/// Second extraction method over the same source.
fn extract_pdf_lopdf(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).map_err(|e| e.to_string())
}

/// Decode plain-text bytes: UTF-8 first, Latin-1 on failure.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        // Latin-1 maps every byte to a char, so this retry cannot fail.
        Err(_) => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_byte_pdf_yields_sentinel_not_panic() {
        let text = stored_text(extract_pdf(b""));
        assert!(!text.is_empty());
        assert!(text.starts_with("Error processing PDF:"), "{}", text);
    }

    #[test]
    fn test_garbage_pdf_yields_sentinel() {
        let text = stored_text(extract_pdf(b"not a pdf at all"));
        assert!(text.starts_with("Error processing PDF:"));
    }

    #[test]
    fn test_utf8_text_passes_through() {
        assert_eq!(extract_text(b"hello").unwrap(), "hello");
    }

    #[test]
    fn test_non_utf8_text_decodes_as_latin1() {
        // 0xE9 is 'é' in Latin-1 but invalid as a standalone UTF-8 byte.
        let text = extract_text(&[0x63, 0x61, 0x66, 0xE9]).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_docx_is_unsupported_marker() {
        let text = stored_text(extract_file(Path::new("resume.docx")));
        assert_eq!(
            text,
            "Document processing not fully implemented for: resume.docx"
        );
    }

    #[test]
    fn test_unknown_extension_marker() {
        let text = stored_text(extract_file(Path::new("data.bin")));
        assert_eq!(text, "File type .bin not supported for content extraction.");
    }

    #[test]
    fn test_image_reports_byte_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, [0u8; 42]).unwrap();
        let text = stored_text(extract_file(&path));
        assert_eq!(
            text,
            "Image file processed. Size: 42 bytes. OCR not implemented yet."
        );
    }

    #[test]
    fn test_txt_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello").unwrap();
        assert_eq!(stored_text(extract_file(&path)), "hello");
    }
}
