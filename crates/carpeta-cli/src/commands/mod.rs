pub mod codes;
pub mod extract;
pub mod text;

use carpeta_core::extraction::pdftotext::PdftotextExtractor;
use carpeta_core::extraction::plaintext::PlainTextExtractor;
use carpeta_core::extraction::TextExtractor;
use std::path::Path;

/// PDFs go through pdftotext; anything else is taken as already-converted text.
pub fn extractor_for(path: &Path) -> Box<dyn TextExtractor> {
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        Box::new(PdftotextExtractor::new())
    } else {
        Box::new(PlainTextExtractor::new())
    }
}
