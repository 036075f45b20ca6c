pub mod pdftotext;
pub mod plaintext;

use crate::error::CarpetaError;

/// Trait for text acquisition backends: turn a document into the flat
/// text the extraction engine scans.
pub trait TextExtractor: Send + Sync {
    /// Extract the document's text. Page breaks become line breaks.
    fn extract_text(&self, document: &[u8]) -> Result<String, CarpetaError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
