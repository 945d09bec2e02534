//! Shared text scanning: the top-level segmenter and string escaping.
//!
//! One scanning discipline serves both array and object bodies: a single
//! left-to-right pass tracking bracket depth, an in-string flag toggled
//! on unescaped quotes, and a one-shot escape flag. A separator only
//! counts at depth zero outside a string.

use crate::error::DecodeError;

/// Strips the outer delimiter pair off a trimmed value text.
pub(crate) fn strip_wrapped(
    text: &str,
    open: char,
    close: char,
) -> Result<&str, DecodeError> {
    let rest = text
        .strip_prefix(open)
        .ok_or_else(|| DecodeError::malformed(format!("expected `{open}`")))?;
    rest.strip_suffix(close)
        .ok_or_else(|| DecodeError::malformed(format!("missing closing `{close}`")))
}

/// Splits a bracket/brace body into its top-level comma-separated parts.
///
/// An empty (or all-whitespace) body yields no parts.
pub(crate) fn split_segments(body: &str) -> Result<Vec<&str>, DecodeError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, ch) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if in_string {
            match ch {
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(DecodeError::malformed(format!(
                        "unbalanced `{ch}` at byte {index}"
                    )));
                }
            }
            ',' if depth == 0 => {
                segments.push(body[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }

    if in_string {
        return Err(DecodeError::malformed("unterminated string"));
    }
    if depth != 0 {
        return Err(DecodeError::malformed("unbalanced opening delimiter"));
    }

    segments.push(body[start..].trim());
    Ok(segments)
}

/// Splits an object entry at its first top-level colon.
pub(crate) fn split_key_value(segment: &str) -> Result<(&str, &str), DecodeError> {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in segment.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if in_string {
            match ch {
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            ':' if depth == 0 => {
                return Ok((segment[..index].trim(), segment[index + 1..].trim()));
            }
            _ => {}
        }
    }

    Err(DecodeError::malformed(format!(
        "missing `:` in object entry `{segment}`"
    )))
}

/// Parses a quoted string literal, applying the escape set
/// `\" \\ \n \r \t \b \f`.
pub(crate) fn read_quoted(text: &str) -> Result<String, DecodeError> {
    let mut chars = text.chars();
    if chars.next() != Some('"') {
        return Err(DecodeError::malformed(format!(
            "expected quoted string, found `{text}`"
        )));
    }

    let mut out = String::new();
    let mut closed = false;
    while let Some(ch) = chars.next() {
        if closed {
            return Err(DecodeError::malformed(
                "unexpected characters after closing quote",
            ));
        }
        match ch {
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('b') => out.push('\u{0008}'),
                Some('f') => out.push('\u{000C}'),
                Some(other) => {
                    return Err(DecodeError::malformed(format!("invalid escape `\\{other}`")));
                }
                None => return Err(DecodeError::malformed("unterminated string")),
            },
            '"' => closed = true,
            other => out.push(other),
        }
    }

    if !closed {
        return Err(DecodeError::malformed("unterminated string"));
    }
    Ok(out)
}

/// Writes `text` as a quoted string literal with the minimal escape set.
pub(crate) fn write_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_respect_nesting_and_strings() {
        let parts = split_segments(r#"1, [2, 3], {"a": 4}, "x, y""#).unwrap();
        assert_eq!(parts, ["1", "[2, 3]", r#"{"a": 4}"#, r#""x, y""#]);
    }

    #[test]
    fn segments_ignore_escaped_quotes() {
        let parts = split_segments(r#""a\",b", 2"#).unwrap();
        assert_eq!(parts, [r#""a\",b""#, "2"]);
    }

    #[test]
    fn empty_body_has_no_segments() {
        assert!(split_segments("  ").unwrap().is_empty());
    }

    #[test]
    fn unbalanced_bodies_are_malformed() {
        assert!(split_segments("[1, 2").is_err());
        assert!(split_segments("1]").is_err());
        assert!(split_segments(r#""open"#).is_err());
    }

    #[test]
    fn key_value_splits_at_first_top_level_colon() {
        let (key, value) = split_key_value(r#""when": "12:30""#).unwrap();
        assert_eq!(key, r#""when""#);
        assert_eq!(value, r#""12:30""#);

        let (key, value) = split_key_value(r#""nested": {"a": 1}"#).unwrap();
        assert_eq!(key, r#""nested""#);
        assert_eq!(value, r#"{"a": 1}"#);

        assert!(split_key_value(r#""no colon here""#).is_err());
    }

    #[test]
    fn quoted_round_trip() {
        let source = "line\none\t\"quoted\" \\ \u{0008}\u{000C}";
        let mut wire = String::new();
        write_quoted(&mut wire, source);
        assert_eq!(read_quoted(&wire).unwrap(), source);
    }

    #[test]
    fn bad_escapes_are_malformed() {
        assert!(read_quoted(r#""a\x""#).is_err());
        assert!(read_quoted(r#""open"#).is_err());
        assert!(read_quoted(r#""done" trailing"#).is_err());
        assert!(read_quoted("bare").is_err());
    }
}
