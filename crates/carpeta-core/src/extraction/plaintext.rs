use crate::error::CarpetaError;
use crate::extraction::TextExtractor;

/// Backend for documents that were already converted to text elsewhere.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, since dumps
/// from external converters are not always clean.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        PlainTextExtractor
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, document: &[u8]) -> Result<String, CarpetaError> {
        Ok(String::from_utf8_lossy(document).replace('\x0c', "\n"))
    }

    fn backend_name(&self) -> &str {
        "plaintext"
    }
}
