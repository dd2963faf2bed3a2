//! Element and attribute name grammar.

use crate::limits::MAX_NAME_LEN;

/// Check an element or attribute name before it is written as markup.
///
/// Names start with an ASCII letter, continue with ASCII letters, digits or
/// `-`, and are at most [`MAX_NAME_LEN`] bytes. Namespace prefixes (`:`) and
/// anything else a tokenizer could split on are rejected.
///
/// # Example
/// ```
/// use safemark::names::is_valid_html_name;
///
/// assert!(is_valid_html_name("data-x1"));
/// assert!(!is_valid_html_name("svg:rect"));
/// assert!(!is_valid_html_name("-1"));
/// ```
pub fn is_valid_html_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) if bytes.len() <= MAX_NAME_LEN => {
            first.is_ascii_alphabetic()
                && rest.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'-')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "div", "DIV", "h1", "data-foo", "my-element", "x-"] {
            assert!(is_valid_html_name(name), "{name}");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", ":svg", "svg:", "-1", "1a", "svg::svg", "a@b", "a b", "a>", "\u{e9}t\u{e9}"] {
            assert!(!is_valid_html_name(name), "{name}");
        }
    }

    #[test]
    fn test_name_length_limit() {
        let longest = "a".repeat(MAX_NAME_LEN);
        assert!(is_valid_html_name(&longest));
        assert!(!is_valid_html_name(&format!("{longest}a")));
    }
}
