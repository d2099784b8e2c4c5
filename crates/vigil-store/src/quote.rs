//! SQL string quoting.
//!
//! User-supplied values go through bound parameters; these helpers exist for
//! what parameters cannot express — dynamic table/column names and compat
//! text embedded into statement templates. Every call site that splices
//! external text into SQL must go through one of these, never raw
//! concatenation.

/// Double every apostrophe in `s`. No surrounding quote marks are added;
/// callers wrap the result themselves or use [`literal`].
pub fn quote(s: &str) -> String {
    s.replace('\'', "''")
}

/// Quote exactly the first `length` bytes of `s`.
///
/// Supports embedding prefixes of low-level buffers that are not
/// null-terminated. If `length` does not fall on a character boundary it is
/// backed off to the previous boundary rather than splitting a code point.
pub fn quote_bounded(s: &str, length: usize) -> String {
    let mut end = length.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    quote(&s[..end])
}

/// Render an optional string as a SQL literal: the `NULL` keyword when
/// absent, otherwise a fully quoted `'...'` literal.
pub fn literal(s: Option<&str>) -> String {
    match s {
        None => "NULL".to_string(),
        Some(s) => format!("'{}'", quote(s)),
    }
}

/// True when `s` is a bare lower-case SQL identifier. Dynamic table and
/// column names must pass this check before they may be spliced into a
/// statement template.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_lowercase() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_doubles_apostrophes() {
        assert_eq!(quote("O'Neil's"), "O''Neil''s");
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote(""), "");
    }

    #[test]
    fn quote_bounded_cuts_at_byte_length() {
        assert_eq!(quote_bounded("abc'def", 4), "abc''");
        assert_eq!(quote_bounded("abc", 10), "abc");
    }

    #[test]
    fn quote_bounded_respects_char_boundaries() {
        // 'é' is two bytes; cutting inside it backs off to the boundary.
        assert_eq!(quote_bounded("é", 1), "");
        assert_eq!(quote_bounded("é", 2), "é");
    }

    #[test]
    fn literal_renders_null_and_wrapped() {
        assert_eq!(literal(None), "NULL");
        assert_eq!(literal(Some("it's")), "'it''s'");
    }

    #[test]
    fn identifier_check_rejects_injection() {
        assert!(is_identifier("task"));
        assert!(is_identifier("lsc_credential"));
        assert!(!is_identifier("task; DROP TABLE tasks"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("Task"));
    }
}
