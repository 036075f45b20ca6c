use carpeta_core::model::{PeriodRecord, ResultSet, RowKind};
use rust_decimal::{Decimal, RoundingStrategy};

const HEADERS: [&str; 7] = [
    "Periodo",
    "Facturas",
    "Crédito",
    "Débito",
    "Flujo",
    "Compra $M",
    "Venta $M",
];

/// Render the result set as an aligned text table: one line per period,
/// then TOTAL and PROMEDIO.
pub fn format_result(result: &ResultSet, sort: bool) -> String {
    if result.is_empty() {
        return "No tax records found in the processed text.".to_string();
    }

    let rows: Vec<[String; 7]> = if sort {
        result
            .sorted_by_period()
            .iter()
            .chain([&result.total, &result.average])
            .map(format_row)
            .collect()
    } else {
        result.rows().map(format_row).collect()
    };

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format!("Registros encontrados: {}\n\n", result.records.len()));
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    out.push_str(&format!(
        "  {}\n",
        "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1))
    ));
    for (i, row) in rows.iter().enumerate() {
        if i == result.records.len() {
            out.push('\n');
        }
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    out.push_str("  ");
    for (i, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        let pad = width.saturating_sub(cell.chars().count());
        if i == 0 {
            out.push_str(cell);
            out.push_str(&" ".repeat(pad));
        } else {
            out.push_str(&" ".repeat(pad));
            out.push_str(cell);
        }
    }
    out.push('\n');
}

fn format_row(r: &PeriodRecord) -> [String; 7] {
    let label = match (r.kind, r.period) {
        (RowKind::Monthly, Some(p)) => p.short_label(),
        (RowKind::Total, _) => "TOTAL".to_string(),
        (RowKind::Average, _) => "PROMEDIO".to_string(),
        (RowKind::Monthly, None) => "-".to_string(),
    };
    let invoice_dp = if r.kind == RowKind::Average { 1 } else { 0 };

    [
        label,
        format_amount(r.invoice_count, invoice_dp),
        format_amount(r.credit_amount, 0),
        format_amount(r.debit_amount, 0),
        format_amount(r.cash_flow, 0),
        format_amount(r.scaled_credit, 0),
        format_amount(r.scaled_debit, 0),
    ]
}

/// Format with Chilean separators: "8.185.460", "3,5".
pub fn format_amount(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.*}", dp as usize, rounded.abs());

    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}
