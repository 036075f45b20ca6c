use crate::error::CarpetaError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse an amount printed in Chilean notation into a Decimal.
///
/// Handles formats like:
/// - "91" -> 91
/// - "8.185.460" -> 8185460 (dot as thousands separator)
/// - "1.234,56" -> 1234.56 (comma as decimal separator)
/// - "-66.494" -> -66494
///
/// Dot-grouping must be regular (first group 1-3 digits, then groups of
/// exactly three), so a token like "0.4" is rejected instead of being read
/// as four.
pub fn parse_amount(s: &str) -> Result<Decimal, CarpetaError> {
    let token = s.trim();
    let invalid = |reason: &str| CarpetaError::InvalidNumber {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    if unsigned.is_empty() {
        return Err(invalid("empty"));
    }

    let (int_part, frac_part) = match unsigned.split_once(',') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut digits = String::with_capacity(unsigned.len() + 2);
    if negative {
        digits.push('-');
    }

    let groups: Vec<&str> = int_part.split('.').collect();
    for (i, group) in groups.iter().enumerate() {
        if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected digits between separators"));
        }
        if groups.len() > 1 {
            let ok = if i == 0 {
                group.len() <= 3
            } else {
                group.len() == 3
            };
            if !ok {
                return Err(invalid("irregular thousands grouping"));
            }
        }
        digits.push_str(group);
    }

    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected digits after decimal comma"));
        }
        digits.push('.');
        digits.push_str(frac);
    }

    Decimal::from_str(&digits).map_err(|e| invalid(&e.to_string()))
}

/// True if the token is made only of digits and separators, i.e. it is a
/// value candidate worth handing to `parse_amount`.
pub fn looks_numeric(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    s.bytes().next().is_some_and(|b| b.is_ascii_digit())
        && s.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b',')
}
