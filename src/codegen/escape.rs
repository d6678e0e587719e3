//! String-literal escaping (spec §9 O-1).
//!
//! The source program emits literals by direct textual interpolation with
//! no escaping at all, which breaks as soon as a literal contains a quote,
//! backslash, or newline. This crate resolves that open question with the
//! minimal table that keeps the emitted Zig lexeme well-formed.
use super::error::CodegenError;

pub fn escape_zig_string(raw: &str) -> Result<String, CodegenError> {
    if raw.contains('\0') {
        return Err(CodegenError::NulByteInStringLiteral);
    }

    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    Ok(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_plain_text_through_unchanged() {
        assert_eq!(escape_zig_string("abc").unwrap(), "abc");
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_zig_string(r#"say "hi"\now"#).unwrap(), r#"say \"hi\"\\now"#);
    }

    #[test]
    fn escapes_newlines_and_carriage_returns() {
        assert_eq!(escape_zig_string("a\nb\rc").unwrap(), "a\\nb\\rc");
    }

    #[test]
    fn rejects_embedded_nul_bytes() {
        assert!(escape_zig_string("a\0b").is_err());
    }
}
