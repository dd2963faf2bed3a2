//! Streaming HTML renderer.
//!
//! Turns open-tag / text / close-tag events into markup whose structure a
//! browser cannot reinterpret. Each open element is a frame on a stack;
//! raw text elements buffer their content until they close so the
//! unclosed-comment guard sees it in one piece.

use std::io::{self, Write};

use smallvec::SmallVec;

use crate::RendererConfig;
use crate::codeunits::{strip_banned_code_units, strip_banned_in_place};
use crate::content_model::{ContentModel, classify, is_void_element};
use crate::escape::{PcdataEncoder, encode_attr_onto, encode_rcdata_onto};
use crate::guard::check_raw_text;
use crate::limits::RAW_TEXT_INITIAL_CAPACITY;
use crate::names::is_valid_html_name;
use crate::report::{BadMarkup, BadMarkupHandler, ErrorHandler, LogBadMarkup, LogIoErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentState {
    Unopened,
    Open,
    Closed,
}

/// Text buffered for a raw text element.
#[derive(Debug)]
struct RawText {
    text: String,
    /// Names of tags dropped inside the element, innermost last.
    stray: SmallVec<[String; 2]>,
}

impl RawText {
    fn new() -> Self {
        Self {
            text: String::with_capacity(RAW_TEXT_INITIAL_CAPACITY),
            stray: SmallVec::new(),
        }
    }
}

#[derive(Debug)]
enum Body {
    Markup,
    /// Start tag was dropped; nothing is written for the end tag either.
    Suppressed,
    Escapable(RawText),
    Unescapable(RawText),
}

#[derive(Debug)]
struct Frame {
    /// Tag name as given to `open_tag`.
    name: String,
    substitute: Option<&'static str>,
    body: Body,
}

/// Renders a stream of structural events as HTML.
///
/// Call [`open_document`](Self::open_document), then any sequence of
/// [`open_tag`](Self::open_tag), [`text`](Self::text) and
/// [`close_tag`](Self::close_tag), then
/// [`close_document`](Self::close_document).
///
/// # Example
/// ```
/// use safemark::{HtmlStreamRenderer, RendererConfig};
///
/// let mut reports = Vec::new();
/// let mut renderer = HtmlStreamRenderer::new(
///     Vec::new(),
///     |err: std::io::Error| panic!("{err}"),
///     |report: safemark::BadMarkup| reports.push(report),
///     RendererConfig::default(),
/// );
/// renderer.open_document();
/// renderer.open_tag("a", [("href", "/x?a=1&b=2")]);
/// renderer.text("<b>hi</b>");
/// renderer.close_tag("a");
/// renderer.close_document();
///
/// let html = String::from_utf8(renderer.into_inner()).unwrap();
/// assert_eq!(html, "<a href=\"/x?a&#61;1&amp;b&#61;2\">&lt;b&gt;hi&lt;/b&gt;</a>");
/// ```
pub struct HtmlStreamRenderer<W, E = LogIoErrors, B = LogBadMarkup> {
    out: W,
    on_error: E,
    on_bad_markup: B,
    config: RendererConfig,
    state: DocumentState,
    failed: bool,
    stack: SmallVec<[Frame; 8]>,
    pcdata: PcdataEncoder,
    /// Markup staged for the next sink write.
    pending: String,
}

impl<W: Write> HtmlStreamRenderer<W, LogIoErrors, LogBadMarkup> {
    /// Create a renderer that logs failures and bad markup.
    pub fn logging(out: W, config: RendererConfig) -> Self {
        Self::new(out, LogIoErrors, LogBadMarkup, config)
    }
}

impl<W: Write, E: ErrorHandler, B: BadMarkupHandler> HtmlStreamRenderer<W, E, B> {
    pub fn new(out: W, on_error: E, on_bad_markup: B, config: RendererConfig) -> Self {
        Self {
            out,
            on_error,
            on_bad_markup,
            config,
            state: DocumentState::Unopened,
            failed: false,
            stack: SmallVec::new(),
            pcdata: PcdataEncoder::new(),
            pending: String::with_capacity(256),
        }
    }

    /// Start the document.
    ///
    /// # Panics
    /// Panics if the document was already opened.
    pub fn open_document(&mut self) {
        assert!(
            self.state == DocumentState::Unopened,
            "open_document called on a document that is {:?}",
            self.state
        );
        self.state = DocumentState::Open;
    }

    /// Close every open element, then flush the sink.
    ///
    /// # Panics
    /// Panics if the document is not open.
    pub fn close_document(&mut self) {
        self.assert_open("close_document");
        while let Some(frame) = self.stack.pop() {
            self.close_frame(frame);
        }
        self.state = DocumentState::Closed;
        if !self.failed {
            if let Err(err) = self.out.flush() {
                self.fail(err);
            }
        }
    }

    /// Write a start tag.
    ///
    /// Invalid tag names drop the whole tag, invalid attribute names drop
    /// that attribute; both are reported. Inside a raw text element the tag
    /// is dropped and reported, and text that follows joins the element's
    /// content.
    ///
    /// # Panics
    /// Panics if the document is not open.
    pub fn open_tag<I, K, V>(&mut self, name: &str, attrs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.assert_open("open_tag");
        let void = is_void_element(name);

        if let Some(Frame {
            name: outer,
            body: Body::Escapable(raw) | Body::Unescapable(raw),
            ..
        }) = self.stack.last_mut()
        {
            log::debug!("dropping <{name}> inside <{outer}>");
            if !void {
                raw.stray.push(name.to_owned());
            }
            self.on_bad_markup.handle(BadMarkup::TagInRawText(name.to_owned()));
            return;
        }

        if !is_valid_html_name(name) {
            self.on_bad_markup.handle(BadMarkup::InvalidElementName(name.to_owned()));
            if !void {
                self.stack.push(Frame {
                    name: name.to_owned(),
                    substitute: None,
                    body: Body::Suppressed,
                });
            }
            return;
        }

        let kind = classify(name);
        let tag = kind.substitute.unwrap_or(name);
        self.pcdata.reset();
        self.pending.push('<');
        self.pending.push_str(tag);
        for (attr_name, value) in attrs {
            let attr_name = attr_name.as_ref();
            if !is_valid_html_name(attr_name) {
                self.on_bad_markup
                    .handle(BadMarkup::InvalidAttributeName(attr_name.to_owned()));
                continue;
            }
            self.pending.push(' ');
            self.pending.push_str(attr_name);
            self.pending.push_str("=\"");
            encode_attr_onto(value.as_ref(), &mut self.pending);
            self.pending.push('"');
        }
        self.pending.push('>');
        self.flush_pending();

        if void {
            return;
        }
        let body = match kind.model {
            ContentModel::Normal => Body::Markup,
            ContentModel::Escapable => Body::Escapable(RawText::new()),
            ContentModel::Unescapable => Body::Unescapable(RawText::new()),
        };
        self.stack.push(Frame {
            name: name.to_owned(),
            substitute: kind.substitute,
            body,
        });
    }

    /// Write an end tag, flushing raw text content first.
    ///
    /// End tags for void elements are ignored.
    ///
    /// # Panics
    /// Panics if the document is not open, or if `name` does not match the
    /// innermost open element (ignoring ASCII case). Inside a raw text
    /// element a mismatched end tag is reported as bad markup instead.
    pub fn close_tag(&mut self, name: &str) {
        self.assert_open("close_tag");
        let void = is_void_element(name);
        let Some(top) = self.stack.last_mut() else {
            assert!(void, "close_tag({name:?}) with no open element");
            return;
        };

        // Inside raw text only the element's own end tag closes it.
        if let Body::Escapable(raw) | Body::Unescapable(raw) = &mut top.body {
            let stray = raw
                .stray
                .last()
                .is_some_and(|stray| stray.eq_ignore_ascii_case(name));
            if stray {
                raw.stray.pop();
            }
            if stray || !top.name.eq_ignore_ascii_case(name) {
                log::debug!("dropping </{name}> inside <{}>", top.name);
                self.on_bad_markup.handle(BadMarkup::TagInRawText(name.to_owned()));
                return;
            }
        }

        if !top.name.eq_ignore_ascii_case(name) {
            assert!(
                void,
                "close_tag({name:?}) does not match the open element {:?}",
                top.name
            );
            return;
        }

        if let Some(frame) = self.stack.pop() {
            self.close_frame(frame);
        }
    }

    /// Write text content.
    ///
    /// In a raw text element the text is buffered until the element closes.
    ///
    /// # Panics
    /// Panics if the document is not open.
    pub fn text(&mut self, text: &str) {
        self.assert_open("text");
        match self.stack.last_mut() {
            Some(Frame {
                body: Body::Escapable(raw) | Body::Unescapable(raw),
                ..
            }) => raw.text.push_str(text),
            _ => {
                let text = strip_banned_code_units(text);
                self.pcdata.encode_onto(&text, &mut self.pending);
                self.flush_pending();
            }
        }
    }

    /// True between `open_document` and `close_document`.
    pub fn is_document_open(&self) -> bool {
        self.state == DocumentState::Open
    }

    /// True once a sink write has failed. Nothing is written after that.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Take the sink back. Open elements are not closed.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Record a sink failure and stop writing.
    pub(crate) fn fail(&mut self, err: io::Error) {
        self.failed = true;
        self.on_error.handle(err);
    }

    fn assert_open(&self, event: &str) {
        assert!(
            self.state == DocumentState::Open,
            "{event} called on a document that is {:?}",
            self.state
        );
    }

    fn close_frame(&mut self, frame: Frame) {
        let Frame {
            name,
            substitute,
            body,
        } = frame;
        let tag = substitute.unwrap_or(name.as_str());
        match body {
            Body::Suppressed => return,
            Body::Markup => {}
            Body::Escapable(raw) => self.write_raw_text(&name, tag, raw.text, true),
            Body::Unescapable(raw) => self.write_raw_text(&name, tag, raw.text, false),
        }
        self.pcdata.reset();
        self.pending.push_str("</");
        self.pending.push_str(tag);
        self.pending.push('>');
        self.flush_pending();
    }

    /// Stage the buffered content of raw text element `name`, written out as
    /// `tag`, or drop it if the guard rejects it.
    ///
    /// Exemptions and reports use the element name; the scan uses the output
    /// tag since that is the end tag a browser will look for.
    fn write_raw_text(&mut self, name: &str, tag: &str, mut text: String, escapable: bool) {
        strip_banned_in_place(&mut text);
        if self.config.checks_raw_text(name) {
            if let Err(violation) = check_raw_text(tag, &text) {
                log::debug!(
                    "dropping {} bytes of <{name}> content, unsafe at offset {}",
                    text.len(),
                    violation.offset
                );
                self.on_bad_markup.handle(violation.into_report(name));
                return;
            }
        }
        if escapable {
            encode_rcdata_onto(&text, &mut self.pending);
        } else {
            self.pending.push_str(&text);
        }
    }

    fn flush_pending(&mut self) {
        if !self.failed && !self.pending.is_empty() {
            if let Err(err) = self.out.write_all(self.pending.as_bytes()) {
                self.fail(err);
            }
        }
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestRenderer<'a> = HtmlStreamRenderer<Vec<u8>, LogIoErrors, Box<dyn FnMut(BadMarkup) + 'a>>;

    fn renderer(reports: &mut Vec<BadMarkup>, config: RendererConfig) -> TestRenderer<'_> {
        let on_bad_markup: Box<dyn FnMut(BadMarkup) + '_> = Box::new(move |report| reports.push(report));
        let mut r = HtmlStreamRenderer::new(Vec::new(), LogIoErrors, on_bad_markup, config);
        r.open_document();
        r
    }

    fn finish(mut r: TestRenderer<'_>) -> String {
        r.close_document();
        String::from_utf8(r.into_inner()).unwrap()
    }

    const NO_ATTRS: [(&str, &str); 0] = [];

    #[test]
    fn test_document_lifecycle() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        assert!(r.is_document_open());
        r.open_tag("p", NO_ATTRS);
        r.text("hi");
        assert_eq!(r.depth(), 1);
        r.close_document();
        assert!(!r.is_document_open());
        assert_eq!(r.depth(), 0);
        assert_eq!(String::from_utf8(r.into_inner()).unwrap(), "<p>hi</p>");
        assert!(reports.is_empty());
    }

    #[test]
    #[should_panic(expected = "open_document called on a document that is Open")]
    fn test_double_open_panics() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.open_document();
    }

    #[test]
    #[should_panic(expected = "text called on a document that is Unopened")]
    fn test_text_before_open_panics() {
        let mut r = HtmlStreamRenderer::logging(Vec::new(), RendererConfig::default());
        r.text("x");
    }

    #[test]
    #[should_panic(expected = "close_document called on a document that is Closed")]
    fn test_double_close_panics() {
        let mut r = HtmlStreamRenderer::logging(Vec::new(), RendererConfig::default());
        r.open_document();
        r.close_document();
        r.close_document();
    }

    #[test]
    #[should_panic(expected = "does not match the open element")]
    fn test_mismatched_close_panics() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.open_tag("b", NO_ATTRS);
        r.close_tag("i");
    }

    #[test]
    #[should_panic(expected = "with no open element")]
    fn test_unopened_close_panics() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.close_tag("div");
    }

    #[test]
    fn test_close_tag_ignores_case() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.open_tag("DiV", NO_ATTRS);
        r.close_tag("div");
        assert_eq!(finish(r), "<DiV></DiV>");
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.open_tag("p", NO_ATTRS);
        r.open_tag("br", NO_ATTRS);
        r.close_tag("br");
        r.open_tag("img", [("src", "a.png")]);
        r.text("x");
        r.close_tag("p");
        assert_eq!(finish(r), "<p><br><img src=\"a.png\">x</p>");
    }

    #[test]
    fn test_suppressed_tag_keeps_text_and_balance() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.open_tag("svg:rect", [("x", "1")]);
        r.text("kept");
        r.close_tag("svg:rect");
        assert_eq!(finish(r), "kept");
        assert_eq!(reports, vec![BadMarkup::InvalidElementName("svg:rect".into())]);
    }

    #[test]
    fn test_stray_tags_in_raw_text() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.open_tag("style", NO_ATTRS);
        r.text("a{}");
        r.open_tag("br", NO_ATTRS);
        r.open_tag("i", NO_ATTRS);
        r.text("b{}");
        r.close_tag("i");
        r.close_tag("style");
        assert_eq!(finish(r), "<style>a{}b{}</style>");
        assert_eq!(
            reports,
            vec![
                BadMarkup::TagInRawText("br".into()),
                BadMarkup::TagInRawText("i".into()),
                BadMarkup::TagInRawText("i".into()),
            ]
        );
    }

    #[test]
    fn test_unmatched_close_in_raw_text_is_reported() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.open_tag("script", NO_ATTRS);
        r.text("x");
        r.close_tag("b");
        r.close_tag("script");
        assert_eq!(finish(r), "<script>x</script>");
        assert_eq!(reports, vec![BadMarkup::TagInRawText("b".into())]);
    }

    #[test]
    fn test_substituted_element_exempt_by_own_name() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::new().strict().exempt("XMP"));
        r.open_tag("xmp", NO_ATTRS);
        r.text("a <!-- b");
        r.close_tag("xmp");
        assert_eq!(finish(r), "<pre>a &lt;!-- b</pre>");
        assert!(reports.is_empty());
    }

    #[test]
    fn test_substituted_element_report_names_element() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::new().strict().exempt("pre"));
        r.open_tag("listing", NO_ATTRS);
        r.text("a <!-- b");
        r.close_tag("listing");
        assert_eq!(finish(r), "<pre></pre>");
        assert_eq!(
            reports,
            vec![BadMarkup::InvalidRawText {
                element: "listing".into(),
                snippet: "<!-- b".into(),
            }]
        );
    }

    #[test]
    fn test_close_document_flushes_raw_text() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.open_tag("div", NO_ATTRS);
        r.open_tag("script", NO_ATTRS);
        r.text("f()");
        assert_eq!(finish(r), "<div><script>f()</script></div>");
    }

    #[test]
    fn test_braces_not_joined_across_markup() {
        let mut reports = Vec::new();
        let mut r = renderer(&mut reports, RendererConfig::default());
        r.text("{");
        r.text("{a}}");
        r.open_tag("b", NO_ATTRS);
        r.close_tag("b");
        r.text("{");
        r.open_tag("i", NO_ATTRS);
        r.text("{");
        r.close_tag("i");
        assert_eq!(finish(r), "{<!-- -->{a}}<b></b>{<i>{</i>");
    }

    struct FailingSink {
        attempts: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_reported_once() {
        let mut errors = Vec::new();
        let mut r = HtmlStreamRenderer::new(
            FailingSink { attempts: 0 },
            |err: io::Error| errors.push(err.to_string()),
            LogBadMarkup,
            RendererConfig::default(),
        );
        r.open_document();
        r.open_tag("p", NO_ATTRS);
        r.text("one");
        r.text("two");
        assert!(r.is_failed());
        r.close_document();
        assert!(!r.is_document_open());
        assert_eq!(r.into_inner().attempts, 1);
        assert_eq!(errors, vec!["disk full".to_string()]);
    }
}
