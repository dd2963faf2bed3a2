//! Format limits and DoS prevention constants.
//!
//! These bound how much work any single name, reference, or report can
//! cause, regardless of how hostile the input is.

/// Maximum length of an element or attribute name, in bytes.
pub const MAX_NAME_LEN: usize = 128;

/// Number of characters of offending raw text quoted in a guard report.
pub const MAX_SNIPPET_CHARS: usize = 10;

/// Largest Unicode scalar value.
pub const MAX_CODE_POINT: u32 = 0x10_FFFF;

/// Initial capacity of a raw-text buffer.
pub const RAW_TEXT_INITIAL_CAPACITY: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_reasonable() {
        const { assert!(MAX_NAME_LEN >= 32) };
        const { assert!(MAX_SNIPPET_CHARS >= 4) };
        const { assert!(MAX_CODE_POINT == char::MAX as u32) };
    }
}
