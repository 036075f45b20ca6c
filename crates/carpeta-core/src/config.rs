use crate::error::CarpetaError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when the same period is declared more than once in a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later block's values replace the earlier ones; the row keeps the
    /// position where the period was first seen.
    #[default]
    LastWins,
    /// The earlier block is kept and later ones are dropped.
    FirstWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Divisor applied to credit and debit amounts for chart axes. At least 1,
    /// so scaling can only shrink an amount.
    pub display_factor: Decimal,
    pub duplicate_periods: DuplicatePolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            display_factor: Decimal::ONE_THOUSAND,
            duplicate_periods: DuplicatePolicy::default(),
        }
    }
}

/// Load extraction options from a JSON file. Missing keys take their defaults.
pub fn load_options(path: &Path) -> Result<ExtractOptions, CarpetaError> {
    let content = std::fs::read_to_string(path).map_err(|e| CarpetaError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let options: ExtractOptions =
        serde_json::from_str(&content).map_err(|e| CarpetaError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_options(&options)?;
    Ok(options)
}

/// Parse options from a JSON string (no file path context).
pub fn parse_options_str(json: &str) -> Result<ExtractOptions, CarpetaError> {
    let options: ExtractOptions = serde_json::from_str(json)?;
    validate_options(&options)?;
    Ok(options)
}

pub fn validate_options(options: &ExtractOptions) -> Result<(), CarpetaError> {
    if options.display_factor < Decimal::ONE {
        return Err(CarpetaError::ConfigInvalid(format!(
            "display_factor must be at least 1, got {}",
            options.display_factor
        )));
    }
    Ok(())
}
