//! Plain-text extraction from XHTML chapters
//!
//! Chapters are first read as XML. Anything quick-xml rejects goes through
//! a tolerant regex pass instead, so broken markup still yields its text.

use std::borrow::Cow;
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

/// Elements whose content is never reading text
const SKIPPED_ELEMENTS: &[&[u8]] = &[b"head", b"title", b"script", b"style"];

/// Extract the words of one chapter, in document order
///
/// Invalid UTF-8 is replaced rather than rejected, and every tag boundary
/// separates words.
pub fn extract(data: &[u8]) -> Vec<String> {
    let markup = String::from_utf8_lossy(data);
    let markup = escape_bare_angles(markup.trim_start_matches('\u{feff}'));
    let markup: &str = &markup;

    let text = match strip_markup(markup) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("Markup is not well-formed ({}), using lenient stripping", e);
            strip_markup_lenient(markup)
        }
    };

    split_words(&text)
}

/// Split plain text on whitespace
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn is_skipped(name: &[u8]) -> bool {
    SKIPPED_ELEMENTS
        .iter()
        .any(|skipped| name.eq_ignore_ascii_case(skipped))
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// A `<` followed by whitespace can never open a tag; keep it as text
fn escape_bare_angles(markup: &str) -> Cow<'_, str> {
    static BARE_LT: OnceLock<Regex> = OnceLock::new();

    let bare_lt =
        BARE_LT.get_or_init(|| Regex::new(r"<(\s)").expect("bare angle pattern is valid"));
    bare_lt.replace_all(markup, "&lt;$1")
}

fn strip_markup(markup: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(markup);
    reader.check_end_names(false);

    let mut text = String::with_capacity(markup.len() / 2);
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if is_skipped(e.local_name().as_ref()) {
                    skip_depth += 1;
                }
                text.push(' ');
            }
            Event::End(e) => {
                if skip_depth > 0 && is_skipped(e.local_name().as_ref()) {
                    skip_depth -= 1;
                }
                text.push(' ');
            }
            Event::Text(e) if skip_depth == 0 => {
                text.push_str(&decode_entities(&String::from_utf8_lossy(&e)));
            }
            Event::CData(e) if skip_depth == 0 => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            // Empty elements, comments, declarations
            _ => text.push(' '),
        }
    }

    Ok(text)
}

fn strip_markup_lenient(markup: &str) -> String {
    static SKIPPED: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();

    let skipped = SKIPPED.get_or_init(|| {
        Regex::new(r"(?is)<(?:head|title|script|style)\b[^>]*>.*?</\s*(?:head|title|script|style)\s*>")
            .expect("skipped-element pattern is valid")
    });
    // A tag left open at the end of input runs to the end
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]*(?:>|$)").expect("tag pattern is valid"));

    let without_skipped = skipped.replace_all(markup, " ");
    let without_tags = tags.replace_all(&without_skipped, " ");
    decode_entities(&without_tags).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::fixture::chapter_document;

    fn words(markup: &str) -> Vec<String> {
        extract(markup.as_bytes())
    }

    #[test]
    fn test_extract_inline_markup() {
        assert_eq!(words("<p>Hello <b>World</b></p>"), vec!["Hello", "World"]);
    }

    #[test]
    fn test_extract_collapses_whitespace() {
        assert_eq!(words("<p>Second   Page</p>"), vec!["Second", "Page"]);
        assert_eq!(words("<p>\n  line\tone\r\n two </p>"), vec!["line", "one", "two"]);
    }

    #[test]
    fn test_extract_separates_adjacent_elements() {
        assert_eq!(words("<p>foo</p><p>bar</p>"), vec!["foo", "bar"]);
        assert_eq!(words("<P>foo</P><BR/><P>bar</P>"), vec!["foo", "bar"]);
    }

    #[test]
    fn test_extract_keeps_bare_less_than() {
        assert_eq!(words("<p>if a < b then</p>"), vec!["if", "a", "<", "b", "then"]);
        assert_eq!(words("<p>x <\ty</p><p>z</p>"), vec!["x", "<", "y", "z"]);
    }

    #[test]
    fn test_extract_empty_content() {
        assert!(extract(b"").is_empty());
        assert!(words("<p></p><div>  </div>").is_empty());
        assert!(words(&chapter_document("")).is_empty());
    }

    #[test]
    fn test_extract_full_document_skips_head() {
        let doc = chapter_document("<h1>Chapter One</h1><p>It began.</p>");
        assert_eq!(words(&doc), vec!["Chapter", "One", "It", "began."]);
    }

    #[test]
    fn test_extract_skips_script_and_style() {
        let markup = "<style>p { color: red; }</style><p>Visible</p><script>var x = 1;</script>";
        assert_eq!(words(markup), vec!["Visible"]);
    }

    #[test]
    fn test_extract_decodes_entities() {
        assert_eq!(
            words("<p>caf&eacute; &amp; tea&nbsp;time &#8212; done</p>"),
            vec!["café", "&", "tea", "time", "—", "done"]
        );
    }

    #[test]
    fn test_extract_keeps_case_and_duplicates() {
        assert_eq!(
            words("<p>The the THE</p><p>the</p>"),
            vec!["The", "the", "THE", "the"]
        );
    }

    #[test]
    fn test_extract_replaces_invalid_utf8() {
        let result = extract(b"<p>ok \xff\xfe bad</p>");
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], "ok");
        assert!(result[1].contains('\u{fffd}'));
        assert_eq!(result[2], "bad");
    }

    #[test]
    fn test_extract_unclosed_tags() {
        assert_eq!(words("<p>Unclosed <b>bold"), vec!["Unclosed", "bold"]);
        assert_eq!(words("<div><p>broken</div> tail"), vec!["broken", "tail"]);
        assert_eq!(words("<p>Hello <b"), vec!["Hello"]);
    }

    #[test]
    fn test_lenient_stripping() {
        let text = strip_markup_lenient("<head><title>T</title></head><p>a<i>b</i></p><span class=\"x");
        assert_eq!(split_words(&text), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_cdata() {
        assert_eq!(words("<p><![CDATA[raw <text>]]></p>"), vec!["raw", "<text>"]);
    }
}
