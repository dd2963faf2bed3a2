//! Context encoders.
//!
//! Fast-path optimized: scans for the first character that needs work,
//! then bulk-copies segments between replacements.
//!
//! All three contexts share one replacement table. Besides the HTML
//! specials it numerically escapes `"`, `'`, `=` and a few other ASCII
//! characters that non-HTML-aware post-processing (template engines,
//! string replacement) could otherwise turn back into markup.

use crate::codeunits::is_noncharacter;

/// Marker inserted between two adjacent `{` in text content.
pub const BRACE_SPLITTER: &str = "<!-- -->";

/// Replacement for each ASCII character, `None` if it passes through.
/// An empty replacement elides the character.
const REPLACEMENTS: [Option<&str>; 0x80] = {
    let mut table: [Option<&str>; 0x80] = [None; 0x80];
    let mut i = 0;
    while i < 0x20 {
        // Output stays in the intersection of HTML5 and XML 1.0 `Char`.
        if !matches!(i as u8, b'\t' | b'\n' | b'\r') {
            table[i] = Some("");
        }
        i += 1;
    }
    table[b'"' as usize] = Some("&#34;");
    table[b'&' as usize] = Some("&amp;");
    table[b'\'' as usize] = Some("&#39;");
    // UTF-7
    table[b'+' as usize] = Some("&#43;");
    table[b'<' as usize] = Some("&lt;");
    table[b'=' as usize] = Some("&#61;");
    table[b'>' as usize] = Some("&gt;");
    // Conditional compilation in legacy IE.
    table[b'@' as usize] = Some("&#64;");
    table[b'`' as usize] = Some("&#96;");
    table[0x7F] = Some("&#127;");
    table
};

/// What to do with a character outside the ASCII table.
enum Wide {
    Keep,
    Drop,
    Numeric,
}

#[inline]
fn classify_wide(ch: char) -> Wide {
    let cp = ch as u32;
    if cp >= 0x10000 {
        // Supplementary characters are emitted as references so they cannot
        // be mis-encoded as UTF-8 surrogates downstream.
        Wide::Numeric
    } else if is_noncharacter(cp) {
        Wide::Drop
    } else {
        match cp {
            // Line separators end JavaScript string literals.
            0x2028 | 0x2029 => Wide::Numeric,
            // Small-form variants and fullwidth ASCII, which some consumers
            // fold to ASCII specials.
            0xFE60..=0xFE6F | 0xFEFF | 0xFF01..=0xFF5E => Wide::Numeric,
            _ => Wide::Keep,
        }
    }
}

/// Returns true if `ch` is copied to the output unchanged.
#[inline]
fn passes_through(ch: char) -> bool {
    let cp = ch as u32;
    if cp < 0x80 {
        REPLACEMENTS[cp as usize].is_none() && ch != '{'
    } else {
        matches!(classify_wide(ch), Wide::Keep)
    }
}

/// Append `&#N;` (below U+0080) or lowercase `&#xH;` for `cp`.
///
/// `cp` is not validated, so callers can reference any value.
///
/// # Example
/// ```
/// use safemark::escape::append_numeric_entity;
///
/// let mut out = String::new();
/// append_numeric_entity(u32::from('@'), &mut out);
/// append_numeric_entity(0x1D11E, &mut out);
/// assert_eq!(out, "&#64;&#x1d11e;");
/// ```
pub fn append_numeric_entity(cp: u32, out: &mut String) {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let mut digits = [0u8; 10];
    let mut len = 0;
    let mut rest = cp;
    if cp < 0x80 {
        out.push_str("&#");
        loop {
            digits[len] = b'0' + (rest % 10) as u8;
            len += 1;
            rest /= 10;
            if rest == 0 {
                break;
            }
        }
    } else {
        out.push_str("&#x");
        while rest != 0 {
            digits[len] = HEX[(rest & 0xF) as usize];
            len += 1;
            rest >>= 4;
        }
    }
    for &d in digits[..len].iter().rev() {
        out.push(char::from(d));
    }
    out.push(';');
}

/// Shared encoding loop. `split_braces` enables `{{` splitting, with
/// `brace_pending` carrying whether the last emitted character was `{`.
fn encode_onto(text: &str, out: &mut String, split_braces: bool, brace_pending: &mut bool) {
    let Some(first) = text.find(|ch: char| !passes_through(ch)) else {
        if !text.is_empty() {
            *brace_pending = false;
        }
        out.push_str(text);
        return;
    };

    if first > 0 {
        *brace_pending = false;
        out.push_str(&text[..first]);
    }

    let mut copied = first;
    for (pos, ch) in text[first..].char_indices() {
        let pos = pos + first;
        if passes_through(ch) {
            continue;
        }
        if copied < pos {
            *brace_pending = false;
            out.push_str(&text[copied..pos]);
        }
        copied = pos + ch.len_utf8();

        let cp = ch as u32;
        if ch == '{' {
            if split_braces && *brace_pending {
                out.push_str(BRACE_SPLITTER);
            }
            out.push('{');
            *brace_pending = true;
        } else if cp < 0x80 {
            // Elided characters leave the brace state alone: they never
            // separate two braces in the output.
            if let Some(repl) = REPLACEMENTS[cp as usize] {
                if !repl.is_empty() {
                    *brace_pending = false;
                    out.push_str(repl);
                }
            }
        } else {
            match classify_wide(ch) {
                Wide::Keep => unreachable!("pass-through characters are copied in bulk"),
                Wide::Drop => {}
                Wide::Numeric => {
                    *brace_pending = false;
                    append_numeric_entity(cp, out);
                }
            }
        }
    }

    if copied < text.len() {
        *brace_pending = false;
        out.push_str(&text[copied..]);
    }
}

/// Encoder for text content of elements with a normal content model.
///
/// Remembers a trailing `{` so that `{{` split across two calls is
/// still broken up.
///
/// # Example
/// ```
/// use safemark::escape::PcdataEncoder;
///
/// let mut enc = PcdataEncoder::new();
/// let mut out = String::new();
/// enc.encode_onto("{", &mut out);
/// enc.encode_onto("{angularVariable}}", &mut out);
/// assert_eq!(out, "{<!-- -->{angularVariable}}");
/// ```
#[derive(Debug, Default, Clone)]
pub struct PcdataEncoder {
    brace_pending: bool,
}

impl PcdataEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `text` onto `out`.
    #[inline]
    pub fn encode_onto(&mut self, text: &str, out: &mut String) {
        encode_onto(text, out, true, &mut self.brace_pending);
    }

    /// Forget a trailing `{`. Call after writing anything other than text.
    #[inline]
    pub fn reset(&mut self) {
        self.brace_pending = false;
    }
}

/// Encode text content with a fresh [`PcdataEncoder`].
#[inline]
pub fn encode_pcdata_onto(text: &str, out: &mut String) {
    PcdataEncoder::new().encode_onto(text, out);
}

/// Encode the content of an escapable raw text element (`title`, `textarea`).
#[inline]
pub fn encode_rcdata_onto(text: &str, out: &mut String) {
    encode_onto(text, out, false, &mut false);
}

/// Encode an attribute value. The result is safe inside either quote style.
///
/// # Example
/// ```
/// use safemark::escape::encode_attr_onto;
///
/// let mut out = String::new();
/// encode_attr_onto("a nonce=xyz ", &mut out);
/// assert_eq!(out, "a nonce&#61;xyz ");
/// ```
#[inline]
pub fn encode_attr_onto(value: &str, out: &mut String) {
    encode_onto(value, out, false, &mut false);
}

/// Encode text content and return it as a new string.
///
/// Prefer [`encode_pcdata_onto`] to reuse buffers.
pub fn escape_text_to_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    encode_pcdata_onto(text, &mut out);
    out
}
