pub mod blocks;
pub mod fields;
pub mod values;

use crate::aggregate::build_record;
use crate::config::ExtractOptions;
use crate::model::{ExtractionWarning, PeriodRecord};
use blocks::locate_periods;
use fields::extract_fields;

/// Turn raw text into one monthly row per declaration block, in document order.
///
/// Segmentation runs first over the whole text; each segment is then
/// scanned for field codes on its own. Duplicate periods are not resolved
/// here, so the output can hold the same period more than once.
pub fn parse_periods(
    text: &str,
    options: &ExtractOptions,
) -> (Vec<PeriodRecord>, Vec<ExtractionWarning>) {
    let segments = locate_periods(text);
    let mut records = Vec::with_capacity(segments.len());
    let mut warnings = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        let scan = extract_fields(segment.text);
        if scan.fields.is_empty() {
            tracing::debug!(period = %segment.period, "no recognized field codes in block");
        }

        for bad in scan.malformed {
            warnings.push(ExtractionWarning {
                period: Some(segment.period),
                code: Some(bad.code.code().to_string()),
                token: Some(bad.token),
                reason: bad.reason,
            });
        }

        records.push(build_record(
            segment.period,
            i + 1,
            &scan.fields,
            options,
            &mut warnings,
        ));
    }

    (records, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_periods_document_order() {
        let text = "\
PERIODO [15] 202508
503  CANTIDAD FACTURAS EMITIDAS     2
PERIODO [15] 202509
503  CANTIDAD FACTURAS EMITIDAS     4
";
        let (records, warnings) = parse_periods(text, &ExtractOptions::default());
        assert!(warnings.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label(), "202508");
        assert_eq!(records[0].invoice_count, dec!(2));
        assert_eq!(records[0].sequence, 1);
        assert_eq!(records[1].label(), "202509");
        assert_eq!(records[1].sequence, 2);
    }

    #[test]
    fn test_missing_field_only_affects_its_period() {
        let text = "\
PERIODO [15] 202508
511  CRÉD. IVA POR DCTOS. ELECTRÓNICOS     1.759.087
PERIODO [15] 202509
503  CANTIDAD FACTURAS EMITIDAS     4
";
        let (records, _) = parse_periods(text, &ExtractOptions::default());
        assert_eq!(records[0].credit_amount, dec!(1759087));
        assert_eq!(records[1].credit_amount, Decimal::ZERO);
    }

    #[test]
    fn test_malformed_value_becomes_warning() {
        let text = "\
PERIODO [15] 202509
502  DÉBITOS FACTURAS EMITIDAS     4,19,8
503  CANTIDAD FACTURAS EMITIDAS     4
";
        let (records, warnings) = parse_periods(text, &ExtractOptions::default());
        assert_eq!(records[0].debit_amount, Decimal::ZERO);
        assert_eq!(records[0].invoice_count, dec!(4));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code.as_deref(), Some("502"));
        assert_eq!(warnings[0].token.as_deref(), Some("4,19,8"));
    }

    #[test]
    fn test_fields_before_first_marker_are_ignored() {
        let text = "503  CANTIDAD FACTURAS EMITIDAS     9\n";
        let (records, _) = parse_periods(text, &ExtractOptions::default());
        assert!(records.is_empty());
    }
}
