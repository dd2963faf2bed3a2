//! Unclosed-comment guard for raw text content.
//!
//! Legacy and HTML5 tokenizers disagree about where a `script` or `style`
//! body ends once `<!--` escaping text spans are involved. Content is only
//! written when every tokenizer would end it at the renderer's own end tag:
//!
//! - `</tag` never appears;
//! - `<tag` never appears inside an escaping text span;
//! - every `-->` closes a span opened by an earlier `<!--`;
//! - no `<!--` span is left open.
//!
//! Matching folds ASCII case.

use memchr::memchr2_iter;

use crate::limits::MAX_SNIPPET_CHARS;
use crate::report::BadMarkup;

/// Raw text that the guard refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardViolation {
    /// Byte offset of the offending sequence.
    pub offset: usize,
    /// Text from `offset`, at most [`MAX_SNIPPET_CHARS`] characters.
    pub snippet: String,
}

impl GuardViolation {
    fn at(text: &str, offset: usize) -> Self {
        let snippet = text[offset..].chars().take(MAX_SNIPPET_CHARS).collect();
        Self { offset, snippet }
    }

    /// Turn into the report for element `tag`.
    pub fn into_report(self, tag: &str) -> BadMarkup {
        BadMarkup::InvalidRawText {
            element: tag.to_owned(),
            snippet: self.snippet,
        }
    }
}

/// True if `text[at..]` starts with `prefix` followed by `tag`, ignoring
/// ASCII case in the tag.
#[inline]
fn starts_with_tag(text: &[u8], at: usize, prefix: &[u8], tag: &[u8]) -> bool {
    let Some(rest) = text.get(at..) else {
        return false;
    };
    rest.starts_with(prefix)
        && rest
            .get(prefix.len()..prefix.len() + tag.len())
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
}

/// Byte offset of the first sequence in `text` that would let the content
/// of element `tag` end somewhere other than its end tag.
///
/// # Example
/// ```
/// use safemark::guard::find_unsafe_raw_text;
///
/// assert_eq!(find_unsafe_raw_text("script", "if (a < b) f()"), None);
/// assert_eq!(find_unsafe_raw_text("script", "<!--alert('</script>')"), Some(11));
/// assert_eq!(find_unsafe_raw_text("script", "x-->y"), Some(1));
/// ```
pub fn find_unsafe_raw_text(tag: &str, text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let tag = tag.as_bytes();
    // Start of the escaping text span we are in, if any.
    let mut span_start: Option<usize> = None;

    for i in memchr2_iter(b'<', b'>', bytes) {
        if bytes[i] == b'<' {
            if bytes[i..].starts_with(b"<!--") {
                span_start.get_or_insert(i);
            } else if starts_with_tag(bytes, i, b"</", tag) {
                return Some(i);
            } else if span_start.is_some() && starts_with_tag(bytes, i, b"<", tag) {
                return Some(i);
            }
        } else if i >= 2 && &bytes[i - 2..i] == b"--" {
            let dashes = i - 2;
            match span_start {
                None => return Some(dashes),
                // `<!-->` and `<!--->` share dashes with the opener and do
                // not close it.
                Some(start) if start + 4 <= dashes => span_start = None,
                Some(_) => {}
            }
        }
    }
    span_start
}

/// Check the content of element `tag`.
pub fn check_raw_text(tag: &str, text: &str) -> Result<(), GuardViolation> {
    match find_unsafe_raw_text(tag, text) {
        Some(offset) => Err(GuardViolation::at(text, offset)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(tag: &str, text: &str) -> Option<String> {
        check_raw_text(tag, text).err().map(|v| v.snippet)
    }

    #[test]
    fn test_plain_scripts_pass() {
        assert_eq!(snippet("script", "var a = 1 < 2 && 3 > 2;"), None);
        assert_eq!(snippet("script", "//</scrip"), None);
        assert_eq!(snippet("script", "document.write('<b>')"), None);
        assert_eq!(snippet("style", ""), None);
    }

    #[test]
    fn test_end_tag_in_content() {
        assert_eq!(
            snippet("script", "document.write('<SCRIPT>alert(42)</SCRIPT>')").as_deref(),
            Some("</SCRIPT>'")
        );
        assert_eq!(snippet("style", "/* </Style> */").as_deref(), Some("</Style> *"));
    }

    #[test]
    fn test_open_tag_inside_span() {
        assert_eq!(
            snippet("script", "  var example = 'Consider this string: <!-- <script>';\n").as_deref(),
            Some("<script>';")
        );
        assert_eq!(
            snippet("script", "<!-- if ( player<script ) { ... } -->").as_deref(),
            Some("<script ) ")
        );
    }

    #[test]
    fn test_unbalanced_spans() {
        assert_eq!(
            snippet("script", "if (x<!--y) { ... }\n").as_deref(),
            Some("<!--y) { .")
        );
        assert_eq!(
            snippet("script", "if (x-->y) { ... }\n").as_deref(),
            Some("-->y) { ..")
        );
        assert_eq!(snippet("script", "// <!----> <!--->").as_deref(), Some("<!--->"));
        assert_eq!(snippet("script", "<!-->").as_deref(), Some("<!-->"));
    }

    #[test]
    fn test_balanced_span_passes() {
        assert_eq!(snippet("script", "<!-- f() -->"), None);
        assert_eq!(snippet("script", "<!---->"), None);
        assert_eq!(snippet("style", "<!-- a --> b <!-- c -->"), None);
    }

    #[test]
    fn test_end_tag_inside_span() {
        assert_eq!(
            snippet("script", "<!--alert('</script>')").as_deref(),
            Some("</script>'")
        );
    }

    #[test]
    fn test_snippet_is_char_bounded() {
        let v = check_raw_text("script", "x-->\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}").unwrap_err();
        assert_eq!(v.offset, 1);
        assert_eq!(v.snippet.chars().count(), MAX_SNIPPET_CHARS);
    }
}
