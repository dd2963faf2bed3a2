use std::io::{self, Write};

use safemark::{AutoCloseRenderer, BadMarkup, Event, HtmlStreamRenderer, RendererConfig, render_events};

fn permissive() -> RendererConfig {
    RendererConfig::new().exempt("script")
}

fn strict() -> RendererConfig {
    RendererConfig::new().strict()
}

fn open<'a>(name: &'a str) -> Event<'a> {
    Event::OpenTag { name, attrs: vec![] }
}

fn open_with<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> Event<'a> {
    Event::OpenTag {
        name,
        attrs: attrs.to_vec(),
    }
}

/// Render `events` and return the HTML plus report messages.
fn render(config: RendererConfig, events: &[Event<'_>]) -> (String, Vec<String>) {
    let rendered = render_events(events, &config);
    let messages = rendered.reports.iter().map(ToString::to_string).collect();
    (rendered.html, messages)
}

// --- Names ---

#[test]
fn illegal_element_names_are_dropped() {
    let (html, errors) = render(
        permissive(),
        &[open(":svg"), open("svg:"), open("-1"), open("svg::svg"), open("a@b")],
    );
    assert!(!html.contains('<'), "{html}");
    assert_eq!(
        errors,
        [
            "Invalid element name : :svg",
            "Invalid element name : svg:",
            "Invalid element name : -1",
            "Invalid element name : svg::svg",
            "Invalid element name : a@b",
        ]
    );
}

#[test]
fn illegal_attribute_names_are_dropped() {
    let (html, errors) = render(
        permissive(),
        &[
            open_with("div", &[(":svg", "x")]),
            open_with("div", &[("svg:", "x")]),
            open_with("div", &[("-1", "x")]),
            open_with("div", &[("svg::svg", "x")]),
            open_with("div", &[("a@b", "x")]),
        ],
    );
    assert!(!html.contains('='), "{html}");
    assert_eq!(html, "<div><div><div><div><div></div></div></div></div></div>");
    assert_eq!(
        errors,
        [
            "Invalid attr name : :svg",
            "Invalid attr name : svg:",
            "Invalid attr name : -1",
            "Invalid attr name : svg::svg",
            "Invalid attr name : a@b",
        ]
    );
}

#[test]
fn attribute_values_are_escaped() {
    let (html, errors) = render(
        permissive(),
        &[open_with("a", &[("href", "javascript:x='1'"), ("title", "\"<>&")]), Event::CloseTag("a")],
    );
    assert_eq!(
        html,
        "<a href=\"javascript:x&#61;&#39;1&#39;\" title=\"&#34;&lt;&gt;&amp;\"></a>"
    );
    assert!(errors.is_empty());
}

// --- Unescapable raw text ---

#[test]
fn cdata_contains_end_tag() {
    let (html, errors) = render(
        strict(),
        &[
            open_with("script", &[("type", "text/javascript")]),
            Event::Text("document.write('<SCRIPT>alert(42)</SCRIPT>')"),
            Event::CloseTag("script"),
        ],
    );
    assert_eq!(html, "<script type=\"text/javascript\"></script>");
    assert_eq!(errors, ["Invalid CDATA text content : </SCRIPT>'"]);
}

#[test]
fn cdata_end_tag_split_across_chunks_with_nuls() {
    let (html, errors) = render(
        strict(),
        &[
            open_with("style", &[("type", "text/css")]),
            Event::Text("/* </St"),
            Event::Text("\0yle> */"),
            Event::CloseTag("style"),
        ],
    );
    assert_eq!(html, "<style type=\"text/css\"></style>");
    assert_eq!(errors, ["Invalid CDATA text content : </Style> *"]);
}

#[test]
fn comment_open_then_script_tag() {
    let js = "  var example = 'Consider this string: <!-- <script>';\n  console.log(example);\n";
    let (html, errors) = render(strict(), &[open("script"), Event::Text(js), Event::CloseTag("script")]);
    assert_eq!(html, "<script></script>");
    assert_eq!(errors, ["Invalid CDATA text content : <script>';"]);
}

#[test]
fn unclosed_comment_open() {
    let (html, errors) = render(
        strict(),
        &[open("script"), Event::Text("if (x<!--y) { ... }\n"), Event::CloseTag("script")],
    );
    assert_eq!(html, "<script></script>");
    assert_eq!(errors, ["Invalid CDATA text content : <!--y) { ."]);
}

#[test]
fn comment_close_without_open() {
    let (html, errors) = render(
        strict(),
        &[open("script"), Event::Text("if (x-->y) { ... }\n"), Event::CloseTag("script")],
    );
    assert_eq!(html, "<script></script>");
    assert_eq!(errors, ["Invalid CDATA text content : -->y) { .."]);
}

#[test]
fn short_comments_in_script() {
    let (html, errors) = render(
        strict(),
        &[open("script"), Event::Text("// <!----> <!--->"), Event::CloseTag("script")],
    );
    assert_eq!(html, "<script></script>");
    assert_eq!(errors, ["Invalid CDATA text content : <!--->"]);
}

#[test]
fn script_tag_inside_comment() {
    let (html, errors) = render(
        strict(),
        &[
            open("script"),
            Event::Text("<!-- if ( player<script ) { ... } -->"),
            Event::CloseTag("script"),
        ],
    );
    assert_eq!(html, "<script></script>");
    assert_eq!(errors, ["Invalid CDATA text content : <script ) "]);
}

const BALANCED_SCRIPT: &str = "<!--\nif (x < !--y) { ... }\nif (!--y > x) { ... }\nif (!(--y) > x) { ... }\nif (player < script) { ... }\nif (script > player) { ... }\n-->";

#[test]
fn balanced_comment_passes_in_both_modes() {
    for config in [permissive(), strict()] {
        let (html, errors) = render(
            config,
            &[open("script"), Event::Text(BALANCED_SCRIPT), Event::CloseTag("script")],
        );
        assert_eq!(html, format!("<script>{BALANCED_SCRIPT}</script>"));
        assert!(errors.is_empty(), "{errors:?}");
    }
}

#[test]
fn unclosed_escaping_text_span() {
    let (html, errors) = render(
        strict(),
        &[open("script"), Event::Text("<!--alert('</script>')"), Event::CloseTag("script")],
    );
    assert_eq!(html, "<script></script>");
    assert_eq!(errors, ["Invalid CDATA text content : </script>'"]);
}

#[test]
fn non_strict_mode_passes_raw_text_through() {
    let (html, errors) = render(
        RendererConfig::default(),
        &[open("script"), Event::Text("<!--alert('</script>')"), Event::CloseTag("script")],
    );
    assert_eq!(html, "<script><!--alert('</script>')</script>");
    assert!(errors.is_empty());
}

#[test]
fn exempt_element_skips_guard() {
    let config = RendererConfig::new().strict().exempt("STYLE");
    let (html, errors) = render(
        config,
        &[
            open("style"),
            Event::Text("a{}/*<!--*/"),
            Event::CloseTag("style"),
            open("script"),
            Event::Text("<!--"),
            Event::CloseTag("script"),
        ],
    );
    assert_eq!(html, "<style>a{}/*<!--*/</style><script></script>");
    assert_eq!(errors, ["Invalid CDATA text content : <!--"]);
}

#[test]
fn almost_complete_end_tag() {
    let (html, errors) = render(
        permissive(),
        &[open("script"), Event::Text("//</scrip"), Event::CloseTag("script")],
    );
    assert_eq!(html, "<script>//</scrip</script>");
    assert!(errors.is_empty());
}

#[test]
fn tag_in_cdata() {
    let (html, errors) = render(
        permissive(),
        &[
            open("script"),
            Event::Text("alert('"),
            open("b"),
            Event::Text("foo"),
            Event::CloseTag("b"),
            Event::Text("')"),
            Event::CloseTag("script"),
        ],
    );
    assert_eq!(html, "<script>alert('foo')</script>");
    assert_eq!(
        errors,
        [
            "Tag content cannot appear inside CDATA element : b",
            "Tag content cannot appear inside CDATA element : b",
        ]
    );
}

#[test]
fn unmatched_close_tag_in_cdata() {
    let (html, errors) = render(
        permissive(),
        &[
            open("script"),
            Event::Text("x"),
            Event::CloseTag("b"),
            Event::CloseTag("p"),
            Event::CloseTag("script"),
        ],
    );
    assert_eq!(html, "<script>x</script>");
    assert_eq!(
        errors,
        [
            "Tag content cannot appear inside CDATA element : b",
            "Tag content cannot appear inside CDATA element : p",
        ]
    );
}

#[test]
fn raw_text_is_sanitized_but_not_escaped() {
    let (html, _) = render(
        RendererConfig::default(),
        &[open("style"), Event::Text("a>b{color:\u{0}red}\u{FFFE}"), Event::CloseTag("style")],
    );
    assert_eq!(html, "<style>a>b{color:red}</style>");
}

// --- Escapable raw text ---

#[test]
fn rcdata_contains_end_tag() {
    let (html, errors) = render(
        permissive(),
        &[open("textarea"), Event::Text("<textarea></textarea>"), Event::CloseTag("textarea")],
    );
    assert_eq!(html, "<textarea>&lt;textarea&gt;&lt;/textarea&gt;</textarea>");
    assert!(errors.is_empty());
}

#[test]
fn html_comment_in_rcdata() {
    let text = "// <!----> <!---> <!--";
    let (html, errors) = render(
        permissive(),
        &[
            open("title"),
            Event::Text(text),
            Event::CloseTag("title"),
            open("textarea"),
            Event::Text(text),
            Event::CloseTag("textarea"),
        ],
    );
    assert_eq!(
        html,
        "<title>// &lt;!----&gt; &lt;!---&gt; &lt;!--</title><textarea>// &lt;!----&gt; &lt;!---&gt; &lt;!--</textarea>"
    );
    assert!(errors.is_empty());
}

#[test]
fn rcdata_does_not_split_braces() {
    let (html, _) = render(
        permissive(),
        &[open("title"), Event::Text("{{x}}"), Event::CloseTag("title")],
    );
    assert_eq!(html, "<title>{{x}}</title>");
}

#[test]
fn pre_substitutes() {
    for tag in ["Xmp", "xmp", "LISTING"] {
        let (html, errors) = render(
            permissive(),
            &[open(tag), Event::Text("<form>Hello, World</form>"), Event::CloseTag(tag)],
        );
        assert_eq!(html, "<pre>&lt;form&gt;Hello, World&lt;/form&gt;</pre>", "{tag}");
        assert!(errors.is_empty());
    }
}

#[test]
fn unmatched_close_tag_in_rcdata() {
    let (html, errors) = render(
        permissive(),
        &[open("title"), Event::Text("a<b"), Event::CloseTag("div"), Event::CloseTag("title")],
    );
    assert_eq!(html, "<title>a&lt;b</title>");
    assert_eq!(errors, ["Tag content cannot appear inside CDATA element : div"]);
}

#[test]
fn substituted_elements_are_exempt_by_name() {
    let config = RendererConfig::new().strict().exempt("Xmp");
    let rendered = render_events(
        &[
            open("xmp"),
            Event::Text("a <!-- b"),
            Event::CloseTag("xmp"),
            open("listing"),
            Event::Text("a <!-- b"),
            Event::CloseTag("listing"),
        ],
        &config,
    );
    assert_eq!(rendered.html, "<pre>a &lt;!-- b</pre><pre></pre>");
    assert_eq!(
        rendered.reports,
        [BadMarkup::InvalidRawText {
            element: "listing".into(),
            snippet: "<!-- b".into(),
        }]
    );
}

#[test]
fn plaintext_is_closed_at_document_end() {
    let (html, _) = render(
        permissive(),
        &[open("plaintext"), Event::Text("<form>Hello, World</form>")],
    );
    assert_eq!(html, "<pre>&lt;form&gt;Hello, World&lt;/form&gt;</pre>");
}

// --- Normal content ---

#[test]
fn balanced_comment_in_noscript() {
    let (html, _) = render(
        permissive(),
        &[open("noscript"), Event::Text("<!--<script>foo</script>-->"), Event::CloseTag("noscript")],
    );
    assert_eq!(html, "<noscript>&lt;!--&lt;script&gt;foo&lt;/script&gt;--&gt;</noscript>");
}

#[test]
fn unbalanced_comment_in_noscript() {
    let (html, _) = render(
        permissive(),
        &[
            open("noscript"),
            Event::Text("<!--<script>foo</script>--"),
            Event::CloseTag("noscript"),
            open("noscript"),
            Event::Text("<script>foo</script>-->"),
            Event::CloseTag("noscript"),
        ],
    );
    assert_eq!(
        html,
        "<noscript>&lt;!--&lt;script&gt;foo&lt;/script&gt;--</noscript><noscript>&lt;script&gt;foo&lt;/script&gt;--&gt;</noscript>"
    );
}

#[test]
fn supplementary_codepoints() {
    let (html, _) = render(permissive(), &[Event::Text("\u{2F81A}")]);
    assert_eq!(html, "&#x2f81a;");
}

#[test]
fn braces_split_across_text_events() {
    let (split, _) = render(permissive(), &[Event::Text("{"), Event::Text("{angularVariable}}")]);
    let (whole, _) = render(permissive(), &[Event::Text("{{angularVariable}}")]);
    assert_eq!(split, "{<!-- -->{angularVariable}}");
    assert_eq!(split, whole);
}

// --- Sink handling ---

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }
}

#[test]
fn io_failure_is_reported_once_and_document_still_closes() {
    let mut errors = Vec::new();
    let mut renderer = HtmlStreamRenderer::new(
        BrokenPipe,
        |err: io::Error| errors.push(err.kind()),
        |_: BadMarkup| {},
        RendererConfig::default(),
    );
    renderer.open_document();
    renderer.open_tag("p", [("id", "x")]);
    renderer.text("a");
    renderer.close_tag("p");
    renderer.close_document();
    assert!(renderer.is_failed());
    assert!(!renderer.is_document_open());
    drop(renderer);
    assert_eq!(errors, [io::ErrorKind::BrokenPipe]);
}

#[test]
fn auto_close_renderer_finishes_document() {
    let mut out = Vec::new();
    {
        let mut renderer = AutoCloseRenderer::logging(&mut out, strict());
        renderer.open_document();
        renderer.open_tag("ul", [("class", "x")]);
        renderer.open_tag("li", std::iter::empty::<(&str, &str)>());
        renderer.text("one");
    }
    assert_eq!(String::from_utf8(out).unwrap(), "<ul class=\"x\"><li>one</li></ul>");
}

// --- Contract violations ---

#[test]
#[should_panic(expected = "does not match the open element")]
fn mismatched_close_is_fatal() {
    render(permissive(), &[open("div"), open("span"), Event::CloseTag("div")]);
}

#[test]
#[should_panic(expected = "open_tag called on a document that is Closed")]
fn events_after_close_are_fatal() {
    let mut renderer = HtmlStreamRenderer::logging(Vec::new(), RendererConfig::default());
    renderer.open_document();
    renderer.close_document();
    renderer.open_tag("p", [("a", "b")]);
}
