//! Legacy timestamp handling for the `parse_time` and `iso_time` SQL
//! functions.
//!
//! The accepted input shapes are a fixed compatibility surface tied to
//! upstream feed formats. They are kept as a data-driven pattern table;
//! extending or "fixing" the set would change which feeds parse.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// Spellings of an unset date: the empty string and the unexpanded forms of
/// a version-control date tag.
const UNSET: [&str; 5] = ["", "$Date$", "$Date: $", "$Date:$", "$Date"];

/// Marker prefix of an expanded version-control date tag.
const TAG_MARKER: &str = "$Date:";

struct TimePattern {
    /// Strip the version-control tag marker before matching.
    tagged: bool,
    /// Number of whitespace tokens the dated part spans.
    tokens: usize,
    /// chrono format for the dated part, offset excluded — the offset is
    /// re-extracted from the raw text instead (see [`parse_time`]).
    format: &'static str,
}

/// The five accepted shapes, tried in order; first match wins.
const PATTERNS: [TimePattern; 5] = [
    // 2011-08-09 08:20:34 +0200 (Tue, 09 Aug 2011)
    TimePattern { tagged: false, tokens: 2, format: "%Y-%m-%d %H:%M:%S" },
    // $Date: 2011-08-09 08:20:34 +0200 (Tue, 09 Aug 2011) $
    TimePattern { tagged: true, tokens: 2, format: "%Y-%m-%d %H:%M:%S" },
    // Tue Aug 9 08:20:34 2011 +0200
    TimePattern { tagged: false, tokens: 5, format: "%a %b %d %H:%M:%S %Y" },
    // $Date: Tue Aug 9 08:20:34 2011 +0200 $
    TimePattern { tagged: true, tokens: 5, format: "%a %b %d %H:%M:%S %Y" },
    // $Date: Tue, 09 Aug 2011 08:20:34 +0200 $
    TimePattern { tagged: true, tokens: 5, format: "%a, %d %b %Y %H:%M:%S" },
];

/// Parse a feed timestamp to epoch seconds.
///
/// Unset spellings and anything unparsable degrade to 0 — "unknown time" is
/// an ordinary outcome for feed data, never a query error.
///
/// The calendar fields are parsed without their offset, then the numeric UTC
/// offset is independently pulled back out of the original text and applied:
/// west of UTC (negative) is added back, east (positive) subtracted.
pub fn parse_time(text: &str) -> i64 {
    let trimmed = text.trim();
    if UNSET.contains(&trimmed) {
        return 0;
    }
    for pattern in &PATTERNS {
        let Some(naive) = match_pattern(trimmed, pattern) else {
            continue;
        };
        return naive.and_utc().timestamp() - extract_offset_seconds(trimmed);
    }
    warn!(text, "unparsable timestamp, treating as unset");
    0
}

/// Format epoch seconds as UTC ISO-8601. Epoch 0 is the unset sentinel and
/// renders as the empty string. None when the epoch is outside the
/// representable calendar range.
pub fn iso_time(epoch: i64) -> Option<String> {
    if epoch == 0 {
        return Some(String::new());
    }
    let dt: DateTime<Utc> = DateTime::from_timestamp(epoch, 0)?;
    Some(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

fn match_pattern(text: &str, pattern: &TimePattern) -> Option<NaiveDateTime> {
    let rest = if pattern.tagged {
        text.strip_prefix(TAG_MARKER)?.trim_start()
    } else {
        text
    };
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() < pattern.tokens {
        return None;
    }
    let dated = tokens[..pattern.tokens].join(" ");
    NaiveDateTime::parse_from_str(&dated, pattern.format).ok()
}

/// Pull the first numeric UTC offset token (`+0200`, `-05`, `+1030`) out of
/// the raw text. Texts without one count as offset zero.
fn extract_offset_seconds(text: &str) -> i64 {
    for token in text.split_whitespace() {
        let Some((sign, digits)) = split_offset_token(token) else {
            continue;
        };
        let (hours, minutes) = if digits.len() <= 2 {
            (digits.parse::<i64>().unwrap_or(0), 0)
        } else {
            let split = digits.len() - 2;
            (
                digits[..split].parse::<i64>().unwrap_or(0),
                digits[split..].parse::<i64>().unwrap_or(0),
            )
        };
        return sign * (hours * 3600 + minutes * 60);
    }
    0
}

fn split_offset_token(token: &str) -> Option<(i64, &str)> {
    let (sign, digits) = match token.as_bytes().first()? {
        b'+' => (1, &token[1..]),
        b'-' => (-1, &token[1..]),
        _ => return None,
    };
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((sign, digits))
}
