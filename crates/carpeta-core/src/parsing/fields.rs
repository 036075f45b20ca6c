use super::values::{looks_numeric, parse_amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Formulario 29 field codes recognized by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCode {
    InvoiceCount,
    DebitAmount,
    CreditAmount,
    TotalDebits,
    TotalCredits,
    RemainingCredit,
    VatDetermined,
    NetPpm,
    TaxableBase,
    TotalDetermined,
}

impl FieldCode {
    pub const ALL: [FieldCode; 10] = [
        FieldCode::InvoiceCount,
        FieldCode::DebitAmount,
        FieldCode::CreditAmount,
        FieldCode::TotalDebits,
        FieldCode::TotalCredits,
        FieldCode::RemainingCredit,
        FieldCode::VatDetermined,
        FieldCode::NetPpm,
        FieldCode::TaxableBase,
        FieldCode::TotalDetermined,
    ];

    /// The three-digit code printed on the form.
    pub fn code(&self) -> &'static str {
        match self {
            FieldCode::InvoiceCount => "503",
            FieldCode::DebitAmount => "502",
            FieldCode::CreditAmount => "511",
            FieldCode::TotalDebits => "538",
            FieldCode::TotalCredits => "537",
            FieldCode::RemainingCredit => "077",
            FieldCode::VatDetermined => "089",
            FieldCode::NetPpm => "062",
            FieldCode::TaxableBase => "563",
            FieldCode::TotalDetermined => "547",
        }
    }

    /// The gloss printed next to the code.
    pub fn gloss(&self) -> &'static str {
        match self {
            FieldCode::InvoiceCount => "CANTIDAD FACTURAS EMITIDAS",
            FieldCode::DebitAmount => "DÉBITOS FACTURAS EMITIDAS",
            FieldCode::CreditAmount => "CRÉD. IVA POR DCTOS. ELECTRÓNICOS",
            FieldCode::TotalDebits => "TOTAL DÉBITOS",
            FieldCode::TotalCredits => "TOTAL CRÉDITOS",
            FieldCode::RemainingCredit => "REMANENTE DE CRÉDITO FISC.",
            FieldCode::VatDetermined => "IMP. DETERM. IVA",
            FieldCode::NetPpm => "PPM NETO DETERMINADO",
            FieldCode::TaxableBase => "BASE IMPONIBLE",
            FieldCode::TotalDetermined => "TOTAL DETERMINADO",
        }
    }

    pub fn from_code(code: &str) -> Option<FieldCode> {
        FieldCode::ALL.iter().copied().find(|f| f.code() == code)
    }
}

impl fmt::Display for FieldCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Values found in one declaration block, keyed by field code.
/// A code that was never seen reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFieldMap(BTreeMap<FieldCode, Decimal>);

impl RawFieldMap {
    pub fn get(&self, code: FieldCode) -> Decimal {
        self.0.get(&code).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn contains(&self, code: FieldCode) -> bool {
        self.0.contains_key(&code)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record a value unless the code already has one.
    fn insert_first(&mut self, code: FieldCode, value: Decimal) -> bool {
        if self.0.contains_key(&code) {
            return false;
        }
        self.0.insert(code, value);
        true
    }
}

/// A recognized field whose value token could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedValue {
    pub code: FieldCode,
    pub token: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldScan {
    pub fields: RawFieldMap,
    pub malformed: Vec<MalformedValue>,
}

/// Scan one declaration block for recognized field codes.
///
/// A code only counts when the words after it read as that code's gloss,
/// so a stray number in the block header ("Nº 511 Depto 42") is skipped.
/// The first occurrence of a code wins. A malformed value counts as that
/// occurrence: the field reads as zero and later restatements are ignored.
pub fn extract_fields(segment: &str) -> FieldScan {
    let mut scan = FieldScan::default();

    for line in segment.lines() {
        let tokens = tokenize(line);
        for triple in code_values(&tokens) {
            let Some(code) = FieldCode::from_code(triple.code) else {
                continue;
            };
            if !gloss_matches(code, &triple.label) {
                tracing::debug!(%code, label = %triple.label.join(" "), "code without its gloss, skipped");
                continue;
            }
            if scan.fields.contains(code) {
                continue;
            }
            let value_token = triple.value;
            match parse_amount(value_token) {
                Ok(value) => {
                    scan.fields.insert_first(code, value);
                }
                Err(e) => {
                    tracing::warn!(%code, token = value_token, "malformed value, reading as zero");
                    scan.fields.insert_first(code, Decimal::ZERO);
                    scan.malformed.push(MalformedValue {
                        code,
                        token: value_token.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    scan
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token<'a> {
    text: &'a str,
    /// Whitespace characters between this token and the previous one.
    gap: usize,
}

/// True if `label` reads as the start of the code's gloss (or the whole
/// gloss). Case, accents, punctuation and spacing are ignored, so
/// "CRED.IVA POR DCTOS." still matches "CRÉD. IVA POR DCTOS. ELECTRÓNICOS".
fn gloss_matches(code: FieldCode, label: &[&str]) -> bool {
    let gloss = fold_label(code.gloss());
    let label = fold_label(&label.concat());
    label.len() >= gloss.len().min(4) && (gloss.starts_with(&label) || label.starts_with(&gloss))
}

/// Uppercase ASCII letters and digits only, with Spanish accents folded.
fn fold_label(s: &str) -> String {
    s.chars()
        .filter_map(|c| {
            let c = match c {
                'á' | 'à' | 'Á' | 'À' => 'A',
                'é' | 'è' | 'É' | 'È' => 'E',
                'í' | 'Í' => 'I',
                'ó' | 'ò' | 'Ó' | 'Ò' => 'O',
                'ú' | 'ü' | 'Ú' | 'Ü' => 'U',
                'ñ' | 'Ñ' => 'N',
                other => other.to_ascii_uppercase(),
            };
            c.is_ascii_alphanumeric().then_some(c)
        })
        .collect()
}

/// A code token, the words between it and its value, and the value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CodeValue<'a> {
    code: &'a str,
    label: Vec<&'a str>,
    value: &'a str,
}

/// Gap wide enough to separate two printed columns.
const COLUMN_GAP: usize = 2;

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut gap = 0;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    text: &line[s..i],
                    gap,
                });
                gap = 0;
            }
            gap += 1;
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        tokens.push(Token {
            text: &line[s..],
            gap,
        });
    }

    tokens
}

/// A three-digit token followed by a label word starts a code/label/value
/// triple.
fn is_code_start(tokens: &[Token<'_>], i: usize) -> bool {
    let Some(tok) = tokens.get(i) else {
        return false;
    };
    tok.text.len() == 3
        && tok.text.bytes().all(|b| b.is_ascii_digit())
        && tokens.get(i + 1).is_some_and(|next| !looks_numeric(next.text))
}

/// Walk a tokenized line and pair every code with its value.
///
/// After the label, the value is the first numeric token that is set off
/// by a column gap, ends the line, or is directly followed by the next
/// code. Numbers embedded in a label ("LEY 21.133 SOBRE") fail all three.
fn code_values<'a>(tokens: &[Token<'a>]) -> Vec<CodeValue<'a>> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if !is_code_start(tokens, i) {
            i += 1;
            continue;
        }

        let mut j = i + 2;
        let mut value = None;
        while j < tokens.len() {
            if is_code_start(tokens, j) && tokens[j].gap >= COLUMN_GAP {
                break;
            }
            let tok = tokens[j];
            if looks_numeric(tok.text)
                && (tok.gap >= COLUMN_GAP || j + 1 == tokens.len() || is_code_start(tokens, j + 1))
            {
                value = Some(tok.text);
                break;
            }
            j += 1;
        }

        match value {
            Some(v) => {
                out.push(CodeValue {
                    code: tokens[i].text,
                    label: tokens[i + 1..j].iter().map(|t| t.text).collect(),
                    value: v,
                });
                i = j + 1;
            }
            None => i = j,
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tokenize_records_gaps() {
        let tokens = tokenize("  503  CANTIDAD FACTURAS     4");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].text, "503");
        assert_eq!(tokens[0].gap, 2);
        assert_eq!(tokens[2].gap, 1);
        assert_eq!(tokens[3].text, "4");
        assert_eq!(tokens[3].gap, 5);
    }

    #[test]
    fn test_two_columns_on_one_line() {
        let scan = extract_fields(
            "   503  CANTIDAD FACTURAS EMITIDAS                                 4   502  DÉBITOS FACTURAS EMITIDAS                            4.198.036",
        );
        assert_eq!(scan.fields.get(FieldCode::InvoiceCount), dec!(4));
        assert_eq!(scan.fields.get(FieldCode::DebitAmount), dec!(4198036));
    }

    #[test]
    fn test_value_glued_to_next_code() {
        let scan = extract_fields(
            "   511  CRÉD. IVA POR DCTOS. ELECTRÓNICOS                    8.185.460 538  TOTAL DÉBITOS                                        4.198.036",
        );
        assert_eq!(scan.fields.get(FieldCode::CreditAmount), dec!(8185460));
        assert_eq!(scan.fields.get(FieldCode::TotalDebits), dec!(4198036));
    }

    #[test]
    fn test_number_inside_label_is_skipped() {
        let scan = extract_fields(
            "151 RETENCION TASA LEY 21.133 SOBRE RENTAS 5.800 779 Monto de IVA postergado 6 o 12 cuotas 0 563 BASE IMPONIBLE 22.094.926",
        );
        assert_eq!(scan.fields.get(FieldCode::TaxableBase), dec!(22094926));
        assert!(scan.malformed.is_empty());
    }

    #[test]
    fn test_collapsed_spacing() {
        let scan = extract_fields("503 CANTIDAD FACTURAS EMITIDAS 4 502 DÉBITOS FACTURAS EMITIDAS 1.939.076");
        assert_eq!(scan.fields.get(FieldCode::InvoiceCount), dec!(4));
        assert_eq!(scan.fields.get(FieldCode::DebitAmount), dec!(1939076));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "538  TOTAL DÉBITOS      100\n538  TOTAL DÉBITOS      200\n";
        let scan = extract_fields(text);
        assert_eq!(scan.fields.get(FieldCode::TotalDebits), dec!(100));
    }

    #[test]
    fn test_missing_code_reads_as_zero() {
        let scan = extract_fields("503  CANTIDAD FACTURAS EMITIDAS     4");
        assert!(!scan.fields.contains(FieldCode::CreditAmount));
        assert_eq!(scan.fields.get(FieldCode::CreditAmount), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_codes_ignored() {
        let scan = extract_fields(
            "584  CANT.INT.EX.NO GRAV.SIN DER. CRED.FISCAL    1   562  MONTO SIN DER. A CRED. FISCAL    101",
        );
        assert!(scan.fields.is_empty());
    }

    #[test]
    fn test_malformed_value_is_zero_and_reported() {
        let text = "511  CRÉD. IVA POR DCTOS. ELECTRÓNICOS     1.23.4\n503  CANTIDAD FACTURAS EMITIDAS   7\n";
        let scan = extract_fields(text);
        assert_eq!(scan.fields.get(FieldCode::CreditAmount), Decimal::ZERO);
        assert!(scan.fields.contains(FieldCode::CreditAmount));
        assert_eq!(scan.fields.get(FieldCode::InvoiceCount), dec!(7));
        assert_eq!(scan.malformed.len(), 1);
        assert_eq!(scan.malformed[0].code, FieldCode::CreditAmount);
        assert_eq!(scan.malformed[0].token, "1.23.4");
    }

    #[test]
    fn test_value_equal_to_a_code() {
        let scan = extract_fields(
            "503  CANTIDAD FACTURAS EMITIDAS     502   502  DÉBITOS FACTURAS EMITIDAS   9.000",
        );
        assert_eq!(scan.fields.get(FieldCode::InvoiceCount), dec!(502));
        assert_eq!(scan.fields.get(FieldCode::DebitAmount), dec!(9000));
    }

    #[test]
    fn test_leading_zero_codes() {
        let scan = extract_fields(
            "077  REMANENTE DE CRÉDITO FISC.      3.987.424 544  RECUP. IMP. ESP. DIESEL (Art. 2)      0\n                      062  PPM NETO DETERMINADO     88.380",
        );
        assert_eq!(scan.fields.get(FieldCode::RemainingCredit), dec!(3987424));
        assert_eq!(scan.fields.get(FieldCode::NetPpm), dec!(88380));
    }

    #[test]
    fn test_address_number_does_not_shadow_real_row() {
        let text = "\
[15]       202509
Pasaje Los Aromos Nº 511 Depto 42
   511  CRÉD. IVA POR DCTOS. ELECTRÓNICOS                    8.185.460
";
        let scan = extract_fields(text);
        assert_eq!(scan.fields.get(FieldCode::CreditAmount), dec!(8185460));
        assert!(scan.malformed.is_empty());
    }

    #[test]
    fn test_code_with_foreign_label_is_ignored() {
        let scan = extract_fields("503  Departamento                 12");
        assert!(scan.fields.is_empty());
    }

    #[test]
    fn test_gloss_tolerates_case_accents_and_spacing() {
        let scan = extract_fields(
            "511 cred.iva por dctos.electronicos   1.000   538  TOTAL DEB.   2.000",
        );
        assert_eq!(scan.fields.get(FieldCode::CreditAmount), dec!(1000));
        assert_eq!(scan.fields.get(FieldCode::TotalDebits), dec!(2000));
    }

    #[test]
    fn test_gloss_matches() {
        assert!(gloss_matches(FieldCode::InvoiceCount, &["CANTIDAD", "FACTURAS", "EMITIDAS"]));
        assert!(gloss_matches(FieldCode::RemainingCredit, &["REMANENTE", "DE", "CRÉDITO", "FISC."]));
        assert!(!gloss_matches(FieldCode::CreditAmount, &["Depto"]));
        assert!(!gloss_matches(FieldCode::InvoiceCount, &["C"]));
        assert_eq!(fold_label("CRÉD. IVA"), "CREDIVA");
    }

    #[test]
    fn test_from_code_roundtrip() {
        for f in FieldCode::ALL {
            assert_eq!(FieldCode::from_code(f.code()), Some(f));
        }
        assert_eq!(FieldCode::from_code("115"), None);
    }
}
