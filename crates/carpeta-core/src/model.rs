use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A declaration period, printed on the form as a six-digit `YYYYMM` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    pub year: u16,
    pub month: u8,
}

impl Period {
    pub fn new(year: u16, month: u8) -> Option<Period> {
        if (1..=12).contains(&month) {
            Some(Period { year, month })
        } else {
            None
        }
    }

    /// Short `YY.MM` label used on chart axes.
    pub fn short_label(&self) -> String {
        format!("{:02}.{:02}", self.year % 100, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("period '{s}' is not a six-digit YYYYMM token"));
        }
        let year: u16 = s[..4].parse().map_err(|_| format!("bad year in '{s}'"))?;
        let month: u8 = s[4..].parse().map_err(|_| format!("bad month in '{s}'"))?;
        Period::new(year, month).ok_or_else(|| format!("month out of range in '{s}'"))
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> String {
        p.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Monthly,
    Total,
    Average,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKind::Monthly => write!(f, "Monthly"),
            RowKind::Total => write!(f, "Total"),
            RowKind::Average => write!(f, "Average"),
        }
    }
}

/// Supplementary Formulario 29 figures read alongside the primary fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredTotals {
    pub total_debits: Decimal,
    pub total_credits: Decimal,
    pub remaining_credit: Decimal,
    pub vat_determined: Decimal,
    pub net_ppm: Decimal,
    pub taxable_base: Decimal,
    pub total_determined: Decimal,
}

impl DeclaredTotals {
    fn combine(&self, other: &DeclaredTotals, overflowed: &mut bool) -> DeclaredTotals {
        DeclaredTotals {
            total_debits: add_or_clamp(self.total_debits, other.total_debits, overflowed),
            total_credits: add_or_clamp(self.total_credits, other.total_credits, overflowed),
            remaining_credit: add_or_clamp(self.remaining_credit, other.remaining_credit, overflowed),
            vat_determined: add_or_clamp(self.vat_determined, other.vat_determined, overflowed),
            net_ppm: add_or_clamp(self.net_ppm, other.net_ppm, overflowed),
            taxable_base: add_or_clamp(self.taxable_base, other.taxable_base, overflowed),
            total_determined: add_or_clamp(self.total_determined, other.total_determined, overflowed),
        }
    }

    fn divided_by(&self, n: Decimal) -> DeclaredTotals {
        DeclaredTotals {
            total_debits: self.total_debits / n,
            total_credits: self.total_credits / n,
            remaining_credit: self.remaining_credit / n,
            vat_determined: self.vat_determined / n,
            net_ppm: self.net_ppm / n,
            taxable_base: self.taxable_base / n,
            total_determined: self.total_determined / n,
        }
    }
}

fn add_or_clamp(a: Decimal, b: Decimal, overflowed: &mut bool) -> Decimal {
    match a.checked_add(b) {
        Some(sum) => sum,
        None => {
            *overflowed = true;
            a.saturating_add(b)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub kind: RowKind,
    pub sequence: usize,
    /// `None` on the Total and Average rows.
    pub period: Option<Period>,
    pub invoice_count: Decimal,
    pub credit_amount: Decimal,
    pub debit_amount: Decimal,
    pub cash_flow: Decimal,
    pub scaled_credit: Decimal,
    pub scaled_debit: Decimal,
    pub declared: DeclaredTotals,
}

impl PeriodRecord {
    /// An all-zero record of the given kind.
    pub fn zero(kind: RowKind, sequence: usize) -> PeriodRecord {
        PeriodRecord {
            kind,
            sequence,
            period: None,
            invoice_count: Decimal::ZERO,
            credit_amount: Decimal::ZERO,
            debit_amount: Decimal::ZERO,
            cash_flow: Decimal::ZERO,
            scaled_credit: Decimal::ZERO,
            scaled_debit: Decimal::ZERO,
            declared: DeclaredTotals::default(),
        }
    }

    /// Field-wise sum of the numeric columns. Kind, sequence and period are
    /// taken from `self`.
    /// Field-wise sum. A sum past the Decimal range is clamped to
    /// `Decimal::MAX`/`Decimal::MIN` and the returned flag is set.
    pub(crate) fn plus(&self, other: &PeriodRecord) -> (PeriodRecord, bool) {
        let mut overflowed = false;
        let sum = PeriodRecord {
            kind: self.kind,
            sequence: self.sequence,
            period: self.period,
            invoice_count: add_or_clamp(self.invoice_count, other.invoice_count, &mut overflowed),
            credit_amount: add_or_clamp(self.credit_amount, other.credit_amount, &mut overflowed),
            debit_amount: add_or_clamp(self.debit_amount, other.debit_amount, &mut overflowed),
            cash_flow: add_or_clamp(self.cash_flow, other.cash_flow, &mut overflowed),
            scaled_credit: add_or_clamp(self.scaled_credit, other.scaled_credit, &mut overflowed),
            scaled_debit: add_or_clamp(self.scaled_debit, other.scaled_debit, &mut overflowed),
            declared: self.declared.combine(&other.declared, &mut overflowed),
        };
        (sum, overflowed)
    }

    /// Divide every amount by `n`, which must be at least one.
    pub(crate) fn divided_by(&self, n: Decimal) -> PeriodRecord {
        PeriodRecord {
            kind: self.kind,
            sequence: self.sequence,
            period: self.period,
            invoice_count: self.invoice_count / n,
            credit_amount: self.credit_amount / n,
            debit_amount: self.debit_amount / n,
            cash_flow: self.cash_flow / n,
            scaled_credit: self.scaled_credit / n,
            scaled_debit: self.scaled_debit / n,
            declared: self.declared.divided_by(n),
        }
    }

    /// Display key: the `YYYYMM` token for monthly rows, the kind otherwise.
    pub fn label(&self) -> String {
        match self.period {
            Some(p) => p.to_string(),
            None => self.kind.to_string(),
        }
    }
}

/// One point of the two-channel chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub period: Period,
    pub scaled_credit: Decimal,
    pub scaled_debit: Decimal,
}

/// A recoverable problem found while extracting. The affected value is
/// treated as zero (or the duplicate dropped) and extraction continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Monthly rows in document order.
    pub records: Vec<PeriodRecord>,
    pub total: PeriodRecord,
    pub average: PeriodRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ExtractionWarning>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of the monthly rows in chronological order.
    pub fn sorted_by_period(&self) -> Vec<PeriodRecord> {
        let mut rows = self.records.clone();
        rows.sort_by_key(|r| (r.period, r.sequence));
        rows
    }

    /// Scaled credit/debit series keyed by period, in document order.
    pub fn chart_series(&self) -> Vec<ChartPoint> {
        self.records
            .iter()
            .filter_map(|r| {
                let period = r.period?;
                Some(ChartPoint {
                    label: period.short_label(),
                    period,
                    scaled_credit: r.scaled_credit,
                    scaled_debit: r.scaled_debit,
                })
            })
            .collect()
    }

    /// Monthly rows, then Total, then Average: the order a table renders them.
    pub fn rows(&self) -> impl Iterator<Item = &PeriodRecord> {
        self.records
            .iter()
            .chain(std::iter::once(&self.total))
            .chain(std::iter::once(&self.average))
    }
}
