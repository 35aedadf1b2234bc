//! Structured PDF text extraction.
//!
//! Pulls the embedded text layer out of a PDF page by page. Scanned
//! documents typically yield little or no text here; the pipeline decides
//! whether the output is substantial enough or whether to fall back to OCR.

use std::path::Path;

use docstash_core::Error;
use lopdf::Document;

/// Structured extraction output.
#[derive(Debug, Clone)]
pub struct PdfOutput {
    pub text: String,
    pub page_count: u32,
}

/// Embedded-text-layer extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfText;

impl PdfText {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text layer from a PDF file, pages concatenated in order.
    ///
    /// Pages whose extraction fails or that carry no text are skipped; an
    /// entirely text-free document yields an empty string, not an error.
    pub fn extract_file(&self, path: &Path) -> Result<PdfOutput, Error> {
        let doc = Document::load(path).map_err(|e| Error::PdfParse(e.to_string()))?;
        Ok(self.extract_doc(&doc))
    }

    /// Extract the text layer from in-memory PDF bytes.
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<PdfOutput, Error> {
        let doc = Document::load_mem(bytes).map_err(|e| Error::PdfParse(e.to_string()))?;
        Ok(self.extract_doc(&doc))
    }

    fn extract_doc(&self, doc: &Document) -> PdfOutput {
        let pages = doc.get_pages();
        let page_count = pages.len() as u32;

        let mut page_numbers: Vec<u32> = pages.keys().copied().collect();
        page_numbers.sort_unstable();

        let mut text = String::new();
        for number in page_numbers {
            let Ok(page_text) = doc.extract_text(&[number]) else { continue };
            let trimmed = page_text.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(trimmed);
        }

        PdfOutput { text, page_count }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_two_page_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        test_pdf::write_pdf(&path, &["First page body text here", "Second page body text here"]);

        let output = PdfText::new().extract_file(&path).unwrap();
        assert_eq!(output.page_count, 2);
        assert!(output.text.contains("First page body text here"));
        assert!(output.text.contains("Second page body text here"));
    }

    #[test]
    fn test_extract_invalid_bytes_errors() {
        let result = PdfText::new().extract_bytes(b"not a pdf at all");
        assert!(matches!(result, Err(Error::PdfParse(_))));
    }

    #[test]
    fn test_extract_missing_file_errors() {
        let result = PdfText::new().extract_file(Path::new("/nonexistent/doc.pdf"));
        assert!(result.is_err());
    }
}
