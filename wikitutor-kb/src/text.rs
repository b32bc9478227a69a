//! Plain-text normalization for article content
//!
//! Wikipedia hands back either plain-text extracts or rendered HTML for the
//! lead section. Both go through [`normalize_text`] before they are stored
//! or compared against link titles.

use once_cell::sync::Lazy;
use regex::Regex;

static STYLE_OR_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(style|script)\b[^>]*>.*?</(style|script)\s*>").unwrap());
static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BLOCK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(p|br|div|li|ul|ol|table|tr|h[1-6])\b[^>]*>").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+|[a-z]|citation needed|note \d+)\]").unwrap());
static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|\d+);").unwrap());
static INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Strip markup and citation markers, decode entities and collapse whitespace
///
/// Paragraph breaks survive as a single blank line; runs of spaces and tabs
/// become one space.
pub fn normalize_text(raw: &str) -> String {
    let text = STYLE_OR_SCRIPT.replace_all(raw, "");
    let text = HTML_COMMENT.replace_all(&text, "");
    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = HTML_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = CITATION.replace_all(&text, "");
    let text = INLINE_SPACE.replace_all(&text, " ");

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINES.replace_all(joined.trim(), "\n\n").into_owned()
}

fn decode_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_citations() {
        let html = r#"<p><b>Rust</b> is a <a href="/wiki/Programming_language">programming language</a>.<sup class="reference">[1]</sup></p>"#;
        assert_eq!(normalize_text(html), "Rust is a programming language.");
    }

    #[test]
    fn test_drops_style_and_script_bodies() {
        let html = "<style>.mw-parser-output{color:red}</style><p>Text</p><script>var x = 1;</script>";
        assert_eq!(normalize_text(html), "Text");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(normalize_text("Tom &amp; Jerry&nbsp;&#8211; &lt;cartoon&gt;"), "Tom & Jerry \u{2013} <cartoon>");
        assert_eq!(normalize_text("caf&#xe9;"), "caf\u{e9}");
    }

    #[test]
    fn test_collapses_whitespace_keeping_paragraphs() {
        let raw = "First   line\t here.\n\n\n\n  Second paragraph.  ";
        assert_eq!(normalize_text(raw), "First line here.\n\nSecond paragraph.");
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(normalize_text("Alan Turing was a mathematician."), "Alan Turing was a mathematician.");
        assert_eq!(normalize_text("   "), "");
    }
}
