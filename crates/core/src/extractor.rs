use crate::error::IngestError;
use lopdf::Document;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Turns a PDF file into an ordered sequence of page texts. A page with no
/// extractable text (scanned or image-only) is reported with an empty
/// string so the caller can log and skip it.
pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            // Extraction failure on one page is not fatal for the document.
            let text = document.extract_text(&[page_no]).unwrap_or_default();
            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        Ok(pages)
    }
}
