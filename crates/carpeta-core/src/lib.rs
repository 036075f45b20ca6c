pub mod aggregate;
pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;

use aggregate::{merge_duplicates, summarize};
use config::{validate_options, ExtractOptions};
use error::CarpetaError;
use extraction::TextExtractor;
use model::ResultSet;
use serde::{Deserialize, Serialize};

/// Main API entry point: extract monthly Formulario 29 declarations from
/// the text of a Carpeta Tributaria, with default options.
///
/// Never fails. Text without any period marker yields an empty result
/// whose Total and Average rows are all zero.
pub fn extract(text: &str) -> ResultSet {
    extract_with(text, &ExtractOptions::default())
}

/// Like [`extract`], with explicit options.
///
/// Callers are expected to pass validated options (see
/// [`config::validate_options`]); a display factor below one here is
/// replaced by the default rather than dividing by it.
pub fn extract_with(text: &str, options: &ExtractOptions) -> ResultSet {
    let fallback;
    let options = if validate_options(options).is_ok() {
        options
    } else {
        tracing::warn!(factor = %options.display_factor, "invalid display factor, using default");
        fallback = ExtractOptions {
            duplicate_periods: options.duplicate_periods,
            ..ExtractOptions::default()
        };
        &fallback
    };

    let (records, mut warnings) = parsing::parse_periods(text, options);
    let records = merge_duplicates(records, options.duplicate_periods, &mut warnings);
    let (total, average) = summarize(&records, &mut warnings);

    tracing::debug!(
        periods = records.len(),
        warnings = warnings.len(),
        "extraction finished"
    );

    ResultSet {
        records,
        total,
        average,
        warnings,
    }
}

/// Acquire the document's text with `extractor`, then extract from it.
///
/// Acquisition failures are returned as errors; a document that converts
/// fine but holds no declarations is an `Ok` with an empty result.
pub fn extract_document(
    document: &[u8],
    extractor: &dyn TextExtractor,
    options: &ExtractOptions,
) -> Result<ResultSet, CarpetaError> {
    validate_options(options)?;
    let text = extractor.extract_text(document)?;
    tracing::debug!(backend = extractor.backend_name(), "text acquired");
    Ok(extract_with(&text, options))
}

/// Tagged success/failure wrapper for callers that prefer a value over an
/// error: `{"ok": true, "result": ...}` or `{"ok": false, "errorMessage": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSet>,
    #[serde(
        rename = "errorMessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
}

impl Envelope {
    pub fn success(result: ResultSet) -> Envelope {
        Envelope {
            ok: true,
            result: Some(result),
            error_message: None,
        }
    }

    /// The message carries the whole source chain of the error.
    pub fn failure(error: &CarpetaError) -> Envelope {
        Envelope {
            ok: false,
            result: None,
            error_message: Some(error_chain(error)),
        }
    }
}

impl From<Result<ResultSet, CarpetaError>> for Envelope {
    fn from(result: Result<ResultSet, CarpetaError>) -> Self {
        match result {
            Ok(rs) => Envelope::success(rs),
            Err(e) => Envelope::failure(&e),
        }
    }
}

fn error_chain(error: &CarpetaError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
