//! HTML character reference decoding.
//!
//! Handles both reference forms:
//! - Numeric references: `&#123;` `&#x7B;`, with or without the `;`
//! - Named references from the full HTML5 table, including the legacy
//!   names browsers accept without a `;`
//!
//! Decoding never fails. Anything that is not a well-formed reference is
//! kept as literal text, and references to characters XML cannot carry are
//! dropped. Uses Cow for zero-copy when no `&` is present.

mod table;

use std::borrow::Cow;
use std::sync::LazyLock;

use memchr::memchr;
use rustc_hash::FxHashMap;

use crate::limits::MAX_CODE_POINT;

/// One row of the named reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entity {
    /// Reference name without `&` and `;`, exact case.
    pub name: &'static str,
    /// One or two characters the reference expands to.
    pub expansion: &'static str,
    /// Whether browsers also accept the name without a trailing `;`.
    pub semicolon_optional: bool,
}

static ENTITY_TABLE: LazyLock<FxHashMap<&'static str, Entity>> = LazyLock::new(|| {
    table::ENTITIES
        .iter()
        .map(|&(name, expansion, semicolon_optional)| {
            (
                name,
                Entity {
                    name,
                    expansion,
                    semicolon_optional,
                },
            )
        })
        .collect()
});

/// Look up a reference name (without `&` or `;`), case-sensitively.
///
/// # Example
/// ```
/// use safemark::entities::lookup_entity;
///
/// assert_eq!(lookup_entity("Alpha").map(|e| e.expansion), Some("\u{391}"));
/// assert_eq!(lookup_entity("alpha").map(|e| e.expansion), Some("\u{3b1}"));
/// assert!(lookup_entity("bogus").is_none());
/// ```
pub fn lookup_entity(name: &str) -> Option<&'static Entity> {
    ENTITY_TABLE.get(name)
}

/// Number of names in the table.
pub fn entity_count() -> usize {
    ENTITY_TABLE.len()
}

/// XML 1.0 `Char` production.
#[inline]
pub fn is_xml_char(cp: u32) -> bool {
    matches!(cp,
        0x9 | 0xA | 0xD
        | 0x20..=0xD7FF
        | 0xE000..=0xFFFD
        | 0x10000..=MAX_CODE_POINT)
}

/// Decode character references in `s`.
///
/// Inside attribute values (`in_attribute`), a legacy reference without `;`
/// that is followed by `=` or an alphanumeric character is left alone, so
/// `?a=1&param=2` survives as written.
///
/// # Example
/// ```
/// use safemark::entities::decode_html;
///
/// assert_eq!(decode_html("a &lt; b&#x21;", false), "a < b!");
/// assert_eq!(decode_html("?foo&param=bar", false), "?foo\u{b6}m=bar");
/// assert_eq!(decode_html("?foo&param=bar", true), "?foo&param=bar");
/// ```
pub fn decode_html(s: &str, in_attribute: bool) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let Some(first_amp) = memchr(b'&', bytes) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len());
    let mut copied = 0;
    let mut amp = first_amp;
    loop {
        out.push_str(&s[copied..amp]);
        copied = decode_reference(s, amp, in_attribute, &mut out);
        match memchr(b'&', &bytes[copied..]) {
            Some(offset) => amp = copied + offset,
            None => break,
        }
    }
    out.push_str(&s[copied..]);
    Cow::Owned(out)
}

/// Decode the reference starting at the `&` at byte `amp`, which callers
/// find with `memchr`.
///
/// Appends the decoded text, or the literal source text if there is no
/// reference here, and returns the byte offset to resume scanning from.
pub(crate) fn decode_reference(s: &str, amp: usize, in_attribute: bool, out: &mut String) -> usize {
    debug_assert_eq!(s.as_bytes().get(amp), Some(&b'&'));
    if s.as_bytes().get(amp + 1) == Some(&b'#') {
        decode_numeric_reference(s, amp, out)
    } else {
        decode_named_reference(s, amp, in_attribute, out)
    }
}

/// Decode a numeric reference whose `&#` starts at byte `amp`.
///
/// A digit run followed by `;`, the end of input, or a non-alphanumeric
/// character is a reference; the `;` is consumed, any other terminator is
/// not. A digit run followed by an alphanumeric character, or an empty
/// digit run, is copied literally.
pub(crate) fn decode_numeric_reference(s: &str, amp: usize, out: &mut String) -> usize {
    let bytes = s.as_bytes();
    let mut digits_start = amp + 2;
    let hex = matches!(bytes.get(digits_start), Some(b'x' | b'X'));
    if hex {
        digits_start += 1;
    }

    let mut end = digits_start;
    let mut value: u32 = 0;
    while let Some(&b) = bytes.get(end) {
        let digit = if hex {
            match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => break,
            }
        } else if b.is_ascii_digit() {
            b - b'0'
        } else {
            break;
        };
        let radix = if hex { 16 } else { 10 };
        // Saturate past the largest code point; the value is dropped anyway.
        value = value
            .saturating_mul(radix)
            .saturating_add(u32::from(digit))
            .min(MAX_CODE_POINT + 1);
        end += 1;
    }

    if end == digits_start {
        out.push_str(&s[amp..digits_start]);
        return digits_start;
    }

    let resume = match s[end..].chars().next() {
        Some(';') => end + 1,
        Some(ch) if ch.is_alphanumeric() => {
            out.push_str(&s[amp..end]);
            return end;
        }
        _ => end,
    };

    if is_xml_char(value) {
        if let Some(ch) = char::from_u32(value) {
            out.push(ch);
        }
    }
    resume
}

#[inline]
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Decode a named reference whose `&` is at byte `amp`.
pub(crate) fn decode_named_reference(s: &str, amp: usize, in_attribute: bool, out: &mut String) -> usize {
    let bytes = s.as_bytes();
    let name_start = amp + 1;
    let run = bytes[name_start..]
        .iter()
        .take(table::LONGEST_NAME + 1)
        .take_while(|&&b| is_name_byte(b))
        .count();

    if run == 0 {
        out.push('&');
        return name_start;
    }

    // The whole run followed by `;`.
    let run_end = name_start + run;
    if bytes.get(run_end) == Some(&b';') {
        if let Some(entity) = lookup_entity(&s[name_start..run_end]) {
            out.push_str(entity.expansion);
            return run_end + 1;
        }
        if run == 3 && s[name_start..run_end].eq_ignore_ascii_case("amp") {
            out.push('&');
            return run_end + 1;
        }
    }

    // Legacy names without `;`, longest first.
    let limit = run.min(table::LONGEST_NAME);
    for len in (1..=limit).rev() {
        let end = name_start + len;
        let name = &s[name_start..end];
        let expansion = match lookup_entity(name) {
            Some(entity) if entity.semicolon_optional => entity.expansion,
            _ if len == 3 && name.eq_ignore_ascii_case("amp") => "&",
            _ => continue,
        };
        if in_attribute && is_ambiguous_continuation(bytes.get(end).copied()) {
            break;
        }
        out.push_str(expansion);
        return end;
    }

    out.push('&');
    name_start
}

/// Whether the byte after a `;`-less reference in an attribute value means
/// the reference was never meant as one.
#[inline]
fn is_ambiguous_continuation(next: Option<u8>) -> bool {
    matches!(next, Some(b) if b == b'=' || is_name_byte(b))
}
