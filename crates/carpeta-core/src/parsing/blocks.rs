use crate::model::Period;

/// Form field code printed beside the PERIODO label, e.g. `PERIODO [15] 202509`.
pub const PERIOD_FIELD_CODE: &str = "15";

/// One declaration block: the text from a period marker up to the next
/// marker (or end of text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSegment<'a> {
    pub period: Period,
    /// Byte offset of the marker in the full text.
    pub offset: usize,
    pub text: &'a str,
}

/// Split the text into one segment per period marker, in document order.
///
/// Segmentation only looks at marker occurrences, never at column
/// position, so blocks whose header columns were interleaved by the text
/// conversion are still cut at the right place. Returns an empty vector
/// when no marker is present.
pub fn locate_periods(text: &str) -> Vec<PeriodSegment<'_>> {
    let markers = find_markers(text);

    markers
        .iter()
        .enumerate()
        .map(|(i, &(offset, period))| {
            let end = markers
                .get(i + 1)
                .map(|&(next, _)| next)
                .unwrap_or(text.len());
            tracing::debug!(%period, offset, len = end - offset, "located declaration block");
            PeriodSegment {
                period,
                offset,
                text: &text[offset..end],
            }
        })
        .collect()
}

fn find_markers(text: &str) -> Vec<(usize, Period)> {
    text.match_indices('[')
        .filter_map(|(open, _)| marker_at(&text[open..]).map(|p| (open, p)))
        .collect()
}

/// Recognize `[15]` followed by a six-digit period at the start of `s`.
/// Whitespace inside the brackets (`[ 15 ]`) is tolerated.
fn marker_at(s: &str) -> Option<Period> {
    let close = s.find(']')?;
    if close > 8 || s[1..close].trim() != PERIOD_FIELD_CODE {
        return None;
    }

    let rest = s[close + 1..].trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end != 6 {
        return None;
    }

    rest[..end].parse().ok()
}
