//! Form input sanitization.
//!
//! Every free-text field that reaches the database passes through
//! [`sanitize_text`] once, at intake. Output is safe to interpolate
//! into HTML without further escaping. Length limits are enforced by
//! validation on [`clean_text`], before escaping, so nothing here truncates.

/// Maximum length for short single-line fields (names, contacts).
pub const MAX_SHORT_FIELD: usize = 100;

/// Maximum length for long-form fields (diagnosis).
pub const MAX_LONG_FIELD: usize = 2_000;

/// Sanitize raw form text: strip invisible and control characters,
/// trim, then HTML-escape.
pub fn sanitize_text(raw: &str) -> String {
    escape_html(&clean_text(raw))
}

/// Strip invisible and control characters and trim, without escaping.
/// Length limits on form fields apply to this text.
pub fn clean_text(raw: &str) -> String {
    let text = remove_invisible_unicode(raw);
    remove_control_characters(&text).trim().to_string()
}

/// Remove zero-width and invisible Unicode characters.
fn remove_invisible_unicode(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'  // Zero-width chars
                | '\u{202A}'..='\u{202E}' // Directional formatting
                | '\u{2060}'..='\u{2064}' // Invisible operators
                | '\u{2066}'..='\u{2069}' // Directional isolates
                | '\u{FEFF}'              // BOM
                | '\u{00AD}'              // Soft hyphen
            )
        })
        .collect()
}

/// Remove control characters except newline and tab.
fn remove_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize_text("Jane Doe"), "Jane Doe");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            sanitize_text("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn sql_metacharacters_are_neutralised_as_text() {
        let out = sanitize_text("O'Brien\"; DROP TABLE patients;--");
        assert!(!out.contains('\''));
        assert!(!out.contains('"'));
        assert!(out.starts_with("O&#x27;Brien"));
    }

    #[test]
    fn invisible_and_control_characters_removed() {
        let out = sanitize_text("Ja\u{200B}ne\u{0007} D\u{FEFF}oe");
        assert_eq!(out, "Jane Doe");
    }

    #[test]
    fn newlines_and_tabs_kept_inside_text() {
        assert_eq!(sanitize_text("line one\n\tline two"), "line one\n\tline two");
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        assert_eq!(sanitize_text("   padded  \n"), "padded");
    }

    #[test]
    fn long_escaped_text_is_not_cut() {
        let raw = format!("{}&", "a".repeat(MAX_SHORT_FIELD));
        let out = sanitize_text(&raw);
        assert_eq!(out.chars().count(), MAX_SHORT_FIELD + 5);
        assert!(out.ends_with("&amp;"));
    }

    #[test]
    fn clean_text_strips_without_escaping() {
        assert_eq!(clean_text("  a\u{200B}<b>\u{0007} "), "a<b>");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize_text(""), "");
        assert_eq!(sanitize_text("  \u{200B} "), "");
    }
}
