use crate::config::{DuplicatePolicy, ExtractOptions};
use crate::model::{DeclaredTotals, ExtractionWarning, Period, PeriodRecord, RowKind};
use crate::parsing::fields::{FieldCode, RawFieldMap};
use rust_decimal::Decimal;

/// Build the monthly row for one declaration block.
///
/// `cash_flow` is credit minus debit. No reference declaration confirms a
/// richer formula (remanente, PPM), so consumers should treat it as
/// indicative. A difference past the Decimal range is clamped and reported.
///
/// `options` must be validated: the display factor is at least one.
pub fn build_record(
    period: Period,
    sequence: usize,
    fields: &RawFieldMap,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractionWarning>,
) -> PeriodRecord {
    let credit_amount = fields.get(FieldCode::CreditAmount);
    let debit_amount = fields.get(FieldCode::DebitAmount);

    let cash_flow = match credit_amount.checked_sub(debit_amount) {
        Some(flow) => flow,
        None => {
            tracing::warn!(%period, "cash flow out of range, clamped");
            warnings.push(ExtractionWarning {
                period: Some(period),
                code: None,
                token: None,
                reason: "cash flow exceeds the representable range; clamped".to_string(),
            });
            credit_amount.saturating_sub(debit_amount)
        }
    };

    PeriodRecord {
        kind: RowKind::Monthly,
        sequence,
        period: Some(period),
        invoice_count: fields.get(FieldCode::InvoiceCount),
        credit_amount,
        debit_amount,
        cash_flow,
        scaled_credit: credit_amount / options.display_factor,
        scaled_debit: debit_amount / options.display_factor,
        declared: DeclaredTotals {
            total_debits: fields.get(FieldCode::TotalDebits),
            total_credits: fields.get(FieldCode::TotalCredits),
            remaining_credit: fields.get(FieldCode::RemainingCredit),
            vat_determined: fields.get(FieldCode::VatDetermined),
            net_ppm: fields.get(FieldCode::NetPpm),
            taxable_base: fields.get(FieldCode::TaxableBase),
            total_determined: fields.get(FieldCode::TotalDetermined),
        },
    }
}

/// Collapse rows that share a period according to the duplicate policy.
///
/// Input is in document order; the output keeps the position of each
/// period's first appearance and renumbers `sequence` from 1.
pub fn merge_duplicates(
    rows: Vec<PeriodRecord>,
    policy: DuplicatePolicy,
    warnings: &mut Vec<ExtractionWarning>,
) -> Vec<PeriodRecord> {
    let mut merged: Vec<PeriodRecord> = Vec::with_capacity(rows.len());

    for row in rows {
        let existing = merged.iter().position(|r| r.period == row.period);
        match existing {
            None => merged.push(row),
            Some(idx) => {
                let reason = match policy {
                    DuplicatePolicy::LastWins => {
                        merged[idx] = row.clone();
                        "period declared again; later block replaces the earlier one"
                    }
                    DuplicatePolicy::FirstWins => {
                        "period declared again; later block ignored"
                    }
                };
                tracing::warn!(period = %row.label(), ?policy, "duplicate period");
                warnings.push(ExtractionWarning {
                    period: row.period,
                    code: None,
                    token: None,
                    reason: reason.to_string(),
                });
            }
        }
    }

    for (i, row) in merged.iter_mut().enumerate() {
        row.sequence = i + 1;
    }

    merged
}

/// Fold the monthly rows into the Total and Average rows.
///
/// Summary rows never feed into other summary rows. With no monthly rows
/// both summaries are all zero. A Total past the Decimal range is clamped
/// (and the Average derived from the clamped value) with a warning.
pub fn summarize(
    monthly: &[PeriodRecord],
    warnings: &mut Vec<ExtractionWarning>,
) -> (PeriodRecord, PeriodRecord) {
    let rows: Vec<&PeriodRecord> = monthly
        .iter()
        .filter(|r| r.kind == RowKind::Monthly)
        .collect();
    let n = rows.len();

    let mut overflowed = false;
    let total = rows
        .into_iter()
        .fold(PeriodRecord::zero(RowKind::Total, n + 1), |acc, r| {
            let (sum, clamped) = acc.plus(r);
            overflowed |= clamped;
            sum
        });

    if overflowed {
        tracing::warn!(periods = n, "total out of range, clamped");
        warnings.push(ExtractionWarning {
            period: None,
            code: None,
            token: None,
            reason: "total exceeds the representable range; Total and Average are clamped"
                .to_string(),
        });
    }

    let average = if n == 0 {
        PeriodRecord::zero(RowKind::Average, n + 2)
    } else {
        let mut avg = total.divided_by(Decimal::from(n));
        avg.kind = RowKind::Average;
        avg.sequence = n + 2;
        avg
    };

    (total, average)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn monthly(period: &str, invoices: Decimal, credit: Decimal, debit: Decimal) -> PeriodRecord {
        let mut r = PeriodRecord::zero(RowKind::Monthly, 0);
        r.period = Some(period.parse().unwrap());
        r.invoice_count = invoices;
        r.credit_amount = credit;
        r.debit_amount = debit;
        r.cash_flow = credit - debit;
        r
    }

    #[test]
    fn test_build_record_derives_cash_flow_and_scale() {
        let scan = crate::parsing::fields::extract_fields(
            "503  CANTIDAD FACTURAS EMITIDAS   4   502  DÉBITOS FACTURAS EMITIDAS   4.198.036\n\
             511  CRÉD. IVA POR DCTOS. ELECTRÓNICOS   8.185.460\n",
        );
        let period = Period::new(2025, 9).unwrap();
        let mut warnings = Vec::new();
        let r = build_record(period, 1, &scan.fields, &ExtractOptions::default(), &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(r.kind, RowKind::Monthly);
        assert_eq!(r.invoice_count, dec!(4));
        assert_eq!(r.cash_flow, dec!(3987424));
        assert_eq!(r.scaled_credit, dec!(8185.460));
        assert_eq!(r.scaled_debit, dec!(4198.036));
        assert_eq!(r.declared, DeclaredTotals::default());
    }

    #[test]
    fn test_summarize_sums_and_averages() {
        let rows = vec![
            monthly("202509", dec!(4), dec!(8185460), dec!(4198036)),
            monthly("202508", dec!(3), dec!(1759087), dec!(1939076)),
        ];
        let mut warnings = Vec::new();
        let (total, average) = summarize(&rows, &mut warnings);
        assert!(warnings.is_empty());

        assert_eq!(total.kind, RowKind::Total);
        assert_eq!(total.invoice_count, dec!(7));
        assert_eq!(total.credit_amount, dec!(9944547));
        assert_eq!(total.debit_amount, dec!(6137112));
        assert_eq!(total.cash_flow, dec!(3807435));
        assert_eq!(total.period, None);
        assert_eq!(total.sequence, 3);

        assert_eq!(average.kind, RowKind::Average);
        assert_eq!(average.invoice_count, dec!(3.5));
        assert_eq!(average.credit_amount, dec!(4972273.5));
        assert_eq!(average.cash_flow, dec!(1903717.5));
        assert_eq!(average.sequence, 4);
    }

    #[test]
    fn test_summarize_empty() {
        let (total, average) = summarize(&[], &mut Vec::new());
        assert_eq!(total, PeriodRecord::zero(RowKind::Total, 1));
        assert_eq!(average, PeriodRecord::zero(RowKind::Average, 2));
    }

    #[test]
    fn test_average_is_not_truncated() {
        let rows = vec![
            monthly("202501", dec!(1), dec!(0), dec!(0)),
            monthly("202502", dec!(1), dec!(0), dec!(0)),
            monthly("202503", dec!(2), dec!(0), dec!(0)),
        ];
        let (_, average) = summarize(&rows, &mut Vec::new());
        assert_eq!(average.invoice_count.round_dp(4), dec!(1.3333));
    }

    #[test]
    fn test_summarize_clamps_total_past_decimal_range() {
        let rows = vec![
            monthly("202508", dec!(1), Decimal::MAX, dec!(0)),
            monthly("202509", dec!(1), Decimal::MAX, dec!(0)),
        ];
        let mut warnings = Vec::new();
        let (total, average) = summarize(&rows, &mut warnings);

        assert_eq!(total.credit_amount, Decimal::MAX);
        assert_eq!(total.invoice_count, dec!(2));
        assert_eq!(average.credit_amount, Decimal::MAX / dec!(2));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].period, None);
    }

    #[test]
    fn test_build_record_clamps_cash_flow() {
        let text = "511  CRÉD. IVA POR DCTOS. ELECTRÓNICOS   79.228.162.514.264.337.593.543.950.335
\
                    502  DÉBITOS FACTURAS EMITIDAS   -79.228.162.514.264.337.593.543.950.335
";
        let scan = crate::parsing::fields::extract_fields(text);
        let period = Period::new(2025, 9).unwrap();
        let mut warnings = Vec::new();
        let r = build_record(period, 1, &scan.fields, &ExtractOptions::default(), &mut warnings);

        assert_eq!(r.cash_flow, Decimal::MAX);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].period, Some(period));
    }

    #[test]
    fn test_merge_duplicates_last_wins() {
        let rows = vec![
            monthly("202509", dec!(1), dec!(10), dec!(0)),
            monthly("202508", dec!(2), dec!(20), dec!(0)),
            monthly("202509", dec!(3), dec!(30), dec!(0)),
        ];
        let mut warnings = Vec::new();
        let merged = merge_duplicates(rows, DuplicatePolicy::LastWins, &mut warnings);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].label(), "202509");
        assert_eq!(merged[0].invoice_count, dec!(3));
        assert_eq!(merged[0].sequence, 1);
        assert_eq!(merged[1].label(), "202508");
        assert_eq!(merged[1].sequence, 2);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_merge_duplicates_first_wins() {
        let rows = vec![
            monthly("202509", dec!(1), dec!(10), dec!(0)),
            monthly("202509", dec!(3), dec!(30), dec!(0)),
        ];
        let mut warnings = Vec::new();
        let merged = merge_duplicates(rows, DuplicatePolicy::FirstWins, &mut warnings);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].invoice_count, dec!(1));
        assert_eq!(warnings[0].period, Some(Period::new(2025, 9).unwrap()));
    }
}
