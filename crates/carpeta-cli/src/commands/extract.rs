use carpeta_core::config::{load_options, validate_options, ExtractOptions};
use carpeta_core::error::CarpetaError;
use carpeta_core::{extract_document, Envelope};
use rust_decimal::Decimal;
use std::path::PathBuf;

use super::extractor_for;
use crate::output;
use crate::OutputFormat;

pub fn run(
    input_file: PathBuf,
    output_format: OutputFormat,
    output_file: Option<PathBuf>,
    config: Option<PathBuf>,
    factor: Option<Decimal>,
    sort: bool,
) -> Result<(), CarpetaError> {
    let mut options = match &config {
        Some(path) => load_options(path)?,
        None => ExtractOptions::default(),
    };
    if let Some(factor) = factor {
        options.display_factor = factor;
    }
    validate_options(&options)?;
    tracing::debug!(?options, input = %input_file.display(), "extracting");

    let result = std::fs::read(&input_file)
        .map_err(CarpetaError::from)
        .and_then(|bytes| extract_document(&bytes, extractor_for(&input_file).as_ref(), &options));

    // The envelope carries failures as data instead of an exit code.
    if let OutputFormat::Envelope = output_format {
        return output::json::print(&Envelope::from(result));
    }

    let result = result?;

    if let Some(path) = output_file {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&path, json)?;
        eprintln!(
            "Extracted {} period(s), written to {}",
            result.records.len(),
            path.display()
        );
    }

    for w in &result.warnings {
        let period = w.period.map(|p| p.to_string()).unwrap_or_default();
        match (&w.code, &w.token) {
            (Some(code), Some(token)) => {
                eprintln!("  warning: {period} code {code} value '{token}': {}", w.reason)
            }
            _ => eprintln!("  warning: {period}: {}", w.reason),
        }
    }

    match output_format {
        OutputFormat::Json => output::json::print(&result)?,
        OutputFormat::Series => {
            let mut series = result.chart_series();
            if sort {
                series.sort_by_key(|p| p.period);
            }
            output::json::print(&series)?
        }
        _ => println!("{}", output::table::format_result(&result, sort)),
    }

    Ok(())
}
