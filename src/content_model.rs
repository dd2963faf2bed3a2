//! Content models of the elements the renderer treats specially.
//!
//! Lookups fold ASCII case; the tag as written is only replaced for the
//! legacy elements whose content model browsers disagree about.

/// How the body of an element is tokenized by a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentModel {
    /// Child elements and escaped text.
    Normal,
    /// Text only, but references are still decoded (`title`, `textarea`).
    Escapable,
    /// Text only, taken literally up to the end tag (`script`, `style`).
    Unescapable,
}

/// Output tag and content model for a start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementKind {
    pub model: ContentModel,
    /// Replacement tag name, if the element must not be written as named.
    pub substitute: Option<&'static str>,
}

impl ElementKind {
    const NORMAL: Self = Self {
        model: ContentModel::Normal,
        substitute: None,
    };
}

/// Classify an element by name.
///
/// `xmp`, `listing` and `plaintext` are written as `pre` and treated as
/// escapable raw text: XHTML consumers and HTML browsers do not agree on
/// where their content ends.
///
/// # Example
/// ```
/// use safemark::content_model::{classify, ContentModel};
///
/// assert_eq!(classify("SCRIPT").model, ContentModel::Unescapable);
/// assert_eq!(classify("Xmp").substitute, Some("pre"));
/// assert_eq!(classify("div").model, ContentModel::Normal);
/// ```
pub fn classify(name: &str) -> ElementKind {
    let model = match_folded(name, &[
        ("script", ContentModel::Unescapable),
        ("style", ContentModel::Unescapable),
        ("iframe", ContentModel::Unescapable),
        ("noembed", ContentModel::Unescapable),
        ("noframes", ContentModel::Unescapable),
        ("title", ContentModel::Escapable),
        ("textarea", ContentModel::Escapable),
    ]);
    if let Some(model) = model {
        return ElementKind {
            model,
            substitute: None,
        };
    }
    if ["xmp", "listing", "plaintext"]
        .iter()
        .any(|legacy| name.eq_ignore_ascii_case(legacy))
    {
        return ElementKind {
            model: ContentModel::Escapable,
            substitute: Some("pre"),
        };
    }
    ElementKind::NORMAL
}

fn match_folded(name: &str, table: &[(&str, ContentModel)]) -> Option<ContentModel> {
    table
        .iter()
        .find(|(tag, _)| name.eq_ignore_ascii_case(tag))
        .map(|&(_, model)| model)
}

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// True for elements written as a start tag only.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|tag| name.eq_ignore_ascii_case(tag))
}
