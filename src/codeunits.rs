//! Removal of code units that must never reach the output.
//!
//! Banned are U+0000 and the other C0 controls except TAB, LF and CR, the
//! noncharacters ending in `FFFE`/`FFFF` in every plane, and (for UTF-16
//! input) surrogates that do not form a well-ordered pair.
//!
//! Every entry point returns the input untouched, without allocating, when
//! nothing in it is banned.

use std::borrow::Cow;

/// Lookup table for banned ASCII code units.
/// Index by byte value, true if the unit is removed.
const BANNED_ASCII: [bool; 0x80] = {
    let mut table = [false; 0x80];
    let mut i = 0;
    while i < 0x20 {
        table[i] = !matches!(i as u8, b'\t' | b'\n' | b'\r');
        i += 1;
    }
    table
};

/// True for `U+xFFFE` and `U+xFFFF` in any plane.
#[inline]
pub fn is_noncharacter(cp: u32) -> bool {
    cp & 0xFFFE == 0xFFFE
}

/// True if `ch` is removed by [`strip_banned_code_units`].
#[inline]
pub fn is_banned(ch: char) -> bool {
    let cp = ch as u32;
    if cp < 0x80 {
        BANNED_ASCII[cp as usize]
    } else {
        is_noncharacter(cp)
    }
}

/// Strip banned characters from `s`.
///
/// # Example
/// ```
/// use std::borrow::Cow;
/// use safemark::codeunits::strip_banned_code_units;
///
/// assert_eq!(strip_banned_code_units("foo\u{0}bar"), "foobar");
/// assert!(matches!(strip_banned_code_units("foobar"), Cow::Borrowed(_)));
/// ```
pub fn strip_banned_code_units(s: &str) -> Cow<'_, str> {
    let Some(first) = s.find(is_banned) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    out.extend(s[first..].chars().filter(|&ch| !is_banned(ch)));
    Cow::Owned(out)
}

/// Strip banned characters from a buffer without reallocating it.
pub fn strip_banned_in_place(buf: &mut String) {
    if buf.contains(is_banned) {
        buf.retain(|ch| !is_banned(ch));
    }
}

#[inline]
fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

#[inline]
fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

#[inline]
fn pair_to_code_point(high: u16, low: u16) -> u32 {
    0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
}

/// Length of the prefix of `units` that contains nothing banned.
fn clean_prefix_utf16(units: &[u16]) -> usize {
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        if unit < 0x80 {
            if BANNED_ASCII[unit as usize] {
                return i;
            }
        } else if is_high_surrogate(unit) {
            match units.get(i + 1) {
                Some(&low) if is_low_surrogate(low) => {
                    if is_noncharacter(pair_to_code_point(unit, low)) {
                        return i;
                    }
                    i += 1;
                }
                _ => return i,
            }
        } else if is_low_surrogate(unit) || is_noncharacter(u32::from(unit)) {
            return i;
        }
        i += 1;
    }
    units.len()
}

/// Strip banned code units from UTF-16 text.
///
/// Surrogates are paired greedily from the left: a high surrogate directly
/// followed by a low surrogate is kept as a pair, every other surrogate is
/// dropped on its own.
///
/// # Example
/// ```
/// use safemark::codeunits::strip_banned_utf16;
///
/// let input = [0x66, 0xD800, 0xD800, 0xDC00, 0x62];
/// assert_eq!(&*strip_banned_utf16(&input), &[0x66, 0xD800, 0xDC00, 0x62]);
/// ```
pub fn strip_banned_utf16(units: &[u16]) -> Cow<'_, [u16]> {
    let clean = clean_prefix_utf16(units);
    if clean == units.len() {
        return Cow::Borrowed(units);
    }

    let mut out = Vec::with_capacity(units.len());
    out.extend_from_slice(&units[..clean]);
    let mut i = clean;
    while i < units.len() {
        let unit = units[i];
        i += 1;
        if unit < 0x80 {
            if !BANNED_ASCII[unit as usize] {
                out.push(unit);
            }
        } else if is_high_surrogate(unit) {
            if let Some(&low) = units.get(i) {
                if is_low_surrogate(low) {
                    i += 1;
                    if !is_noncharacter(pair_to_code_point(unit, low)) {
                        out.push(unit);
                        out.push(low);
                    }
                }
            }
        } else if !is_low_surrogate(unit) && !is_noncharacter(u32::from(unit)) {
            out.push(unit);
        }
    }
    Cow::Owned(out)
}
