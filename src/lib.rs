//! safemark: streaming HTML renderer and HTML text codecs
//!
//! Renders open-tag / text / close-tag events as HTML that is well-formed
//! however hostile the input, and decodes or encodes text for the HTML
//! contexts it is written into.
//!
//! # Design Principles
//! - Streaming: markup is written as events arrive, only raw text bodies are
//!   buffered
//! - Fail closed: anything that cannot be written safely is dropped and
//!   reported, never passed through
//! - Borrow when possible: codecs return `Cow` and copy nothing for clean input
//! - No regex: byte-level scanning with `memchr`

pub mod codeunits;
pub mod content_model;
pub mod entities;
pub mod escape;
pub mod guard;
pub mod limits;
pub mod names;
pub mod release;
pub mod render;
pub mod report;

use rustc_hash::FxHashSet;

// Re-export primary types
pub use entities::decode_html;
pub use escape::{encode_attr_onto, encode_pcdata_onto, encode_rcdata_onto, escape_text_to_string};
pub use release::{AutoCloseRenderer, NoRelease, Release};
pub use render::HtmlStreamRenderer;
pub use report::{BadMarkup, BadMarkupHandler, ErrorHandler, LogBadMarkup, LogIoErrors};

/// Renderer options.
#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    /// Run the unclosed-comment guard over raw text content.
    pub strict_unclosed_comment_check: bool,
    /// Lowercased names of elements the guard skips.
    exempt_tag_names: FxHashSet<String>,
}

impl RendererConfig {
    /// Permissive configuration with no exemptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the unclosed-comment guard.
    pub fn strict(mut self) -> Self {
        self.strict_unclosed_comment_check = true;
        self
    }

    /// Skip the guard for element `tag` (case-insensitive).
    pub fn exempt(mut self, tag: &str) -> Self {
        self.exempt_tag_names.insert(tag.to_ascii_lowercase());
        self
    }

    pub fn is_exempt(&self, tag: &str) -> bool {
        if tag.bytes().any(|b| b.is_ascii_uppercase()) {
            self.exempt_tag_names
                .iter()
                .any(|exempt| exempt.eq_ignore_ascii_case(tag))
        } else {
            self.exempt_tag_names.contains(tag)
        }
    }

    /// True if raw text written inside element `tag` must pass the guard.
    /// `tag` is the element name as opened, not its output substitute.
    pub fn checks_raw_text(&self, tag: &str) -> bool {
        self.strict_unclosed_comment_check && !self.is_exempt(tag)
    }
}

/// One renderer event, for rendering a prepared sequence in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    OpenTag {
        name: &'a str,
        attrs: Vec<(&'a str, &'a str)>,
    },
    Text(&'a str),
    CloseTag(&'a str),
}

/// Output of [`render_events`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    /// Bad markup reports, in the order they were raised.
    pub reports: Vec<BadMarkup>,
}

/// Render a complete event sequence as a document.
///
/// This is the primary API for simple use cases.
///
/// # Panics
/// Panics if the events are not properly nested.
///
/// # Example
/// ```
/// use safemark::{Event, RendererConfig, render_events};
///
/// let rendered = render_events(
///     &[
///         Event::OpenTag { name: "p", attrs: vec![("title", "a\"b")] },
///         Event::Text("1 < 2"),
///         Event::CloseTag("p"),
///     ],
///     &RendererConfig::default(),
/// );
/// assert_eq!(rendered.html, "<p title=\"a&#34;b\">1 &lt; 2</p>");
/// assert!(rendered.reports.is_empty());
/// ```
pub fn render_events(events: &[Event<'_>], config: &RendererConfig) -> Rendered {
    let mut reports = Vec::new();
    let mut out = Vec::with_capacity(256);
    {
        let mut renderer = HtmlStreamRenderer::new(
            &mut out,
            LogIoErrors,
            |report: BadMarkup| reports.push(report),
            config.clone(),
        );
        renderer.open_document();
        for event in events {
            match event {
                Event::OpenTag { name, attrs } => renderer.open_tag(name, attrs.iter().copied()),
                Event::Text(text) => renderer.text(text),
                Event::CloseTag(name) => renderer.close_tag(name),
            }
        }
        renderer.close_document();
    }
    let html = match String::from_utf8(out) {
        Ok(html) => html,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    };
    Rendered { html, reports }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_permissive() {
        let config = RendererConfig::default();
        assert!(!config.strict_unclosed_comment_check);
        assert!(!config.checks_raw_text("script"));
    }

    #[test]
    fn test_exemptions_fold_case() {
        let config = RendererConfig::new().strict().exempt("SCRIPT");
        assert!(config.is_exempt("script"));
        assert!(config.is_exempt("Script"));
        assert!(!config.checks_raw_text("script"));
        assert!(config.checks_raw_text("style"));
    }

    #[test]
    fn test_exemption_lookup_mixed_case() {
        let config = RendererConfig::new().exempt("Style").exempt("xmp");
        for tag in ["style", "STYLE", "sTyLe", "XMP", "Xmp"] {
            assert!(config.is_exempt(tag), "{tag}");
        }
        assert!(!config.is_exempt("styles"));
        assert!(!config.is_exempt("SCRIPT"));
        assert!(!config.is_exempt(""));
    }

    #[test]
    fn test_render_events_collects_reports() {
        let rendered = render_events(
            &[
                Event::OpenTag {
                    name: "div",
                    attrs: vec![("on:click", "x"), ("id", "y")],
                },
                Event::CloseTag("div"),
            ],
            &RendererConfig::default(),
        );
        assert_eq!(rendered.html, "<div id=\"y\"></div>");
        assert_eq!(
            rendered.reports,
            vec![BadMarkup::InvalidAttributeName("on:click".into())]
        );
    }

    #[test]
    fn test_render_events_closes_open_elements() {
        let rendered = render_events(
            &[Event::OpenTag {
                name: "ul",
                attrs: vec![],
            }],
            &RendererConfig::default(),
        );
        assert_eq!(rendered.html, "<ul></ul>");
    }
}
