use crate::error::CarpetaError;
use crate::extraction::TextExtractor;
use std::io::Write;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` so the two-column Formulario 29 table keeps
/// code, gloss and value on the same line.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract_text(&self, document: &[u8]) -> Result<String, CarpetaError> {
        if document.is_empty() {
            return Err(CarpetaError::Extraction("empty document".into()));
        }

        // pdftotext wants a path, not stdin
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| CarpetaError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(document)
            .map_err(|e| CarpetaError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CarpetaError::PdftotextNotFound
                } else {
                    CarpetaError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(CarpetaError::PdftotextFailed { code, stderr });
        }

        let text = join_pages(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(bytes = text.len(), "pdftotext extracted text");
        Ok(text)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// pdftotext separates pages with form feeds; the engine only needs lines.
fn join_pages(raw: &str) -> String {
    raw.split('\x0c')
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
