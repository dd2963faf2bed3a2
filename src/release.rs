//! Sink release and the auto-closing renderer.
//!
//! A sink is released once the document is finished: buffered writers are
//! flushed, files are flushed to the OS. [`AutoCloseRenderer`] ties this to
//! scope exit.

use std::fs::File;
use std::io::{self, BufWriter, Stderr, Stdout, Write};
use std::ops::{Deref, DerefMut};

use crate::RendererConfig;
use crate::render::HtmlStreamRenderer;
use crate::report::{BadMarkupHandler, ErrorHandler, LogBadMarkup, LogIoErrors};

/// A sink that holds something to give back when output is complete.
pub trait Release {
    fn release(&mut self) -> io::Result<()>;
}

impl Release for Vec<u8> {
    #[inline]
    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Release for File {
    fn release(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Release for Stdout {
    fn release(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Release for Stderr {
    fn release(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl<W: Write + Release> Release for BufWriter<W> {
    fn release(&mut self) -> io::Result<()> {
        self.flush()?;
        self.get_mut().release()
    }
}

impl<R: Release + ?Sized> Release for &mut R {
    #[inline]
    fn release(&mut self) -> io::Result<()> {
        (**self).release()
    }
}

/// Adapter for sinks with nothing to release.
#[derive(Debug, Default)]
pub struct NoRelease<W>(pub W);

impl<W> NoRelease<W> {
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> Write for NoRelease<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.write_all(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W> Release for NoRelease<W> {
    #[inline]
    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Renderer that closes its document and releases its sink when dropped.
///
/// Dereferences to [`HtmlStreamRenderer`]. Use [`close`](Self::close) to
/// observe the release result; dropping reports it to the error handler.
///
/// # Example
/// ```
/// use safemark::{AutoCloseRenderer, RendererConfig};
///
/// let mut out = Vec::new();
/// {
///     let mut renderer = AutoCloseRenderer::logging(&mut out, RendererConfig::default());
///     renderer.open_document();
///     renderer.open_tag("p", [("class", "note")]);
///     renderer.text("unterminated");
/// }
/// assert_eq!(out, b"<p class=\"note\">unterminated</p>");
/// ```
pub struct AutoCloseRenderer<W: Write + Release, E: ErrorHandler = LogIoErrors, B: BadMarkupHandler = LogBadMarkup> {
    inner: HtmlStreamRenderer<W, E, B>,
    released: bool,
}

impl<W: Write + Release> AutoCloseRenderer<W, LogIoErrors, LogBadMarkup> {
    pub fn logging(out: W, config: RendererConfig) -> Self {
        Self::from_renderer(HtmlStreamRenderer::logging(out, config))
    }
}

impl<W: Write + Release, E: ErrorHandler, B: BadMarkupHandler> AutoCloseRenderer<W, E, B> {
    pub fn new(out: W, on_error: E, on_bad_markup: B, config: RendererConfig) -> Self {
        Self::from_renderer(HtmlStreamRenderer::new(out, on_error, on_bad_markup, config))
    }

    pub fn from_renderer(inner: HtmlStreamRenderer<W, E, B>) -> Self {
        Self {
            inner,
            released: false,
        }
    }

    /// Close the document if it is open, then release the sink.
    ///
    /// Only the first call releases; later calls return `Ok(())`.
    pub fn close(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        if self.inner.is_document_open() {
            self.inner.close_document();
        }
        self.released = true;
        self.inner.get_mut().release()
    }
}

impl<W: Write + Release, E: ErrorHandler, B: BadMarkupHandler> Deref for AutoCloseRenderer<W, E, B> {
    type Target = HtmlStreamRenderer<W, E, B>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<W: Write + Release, E: ErrorHandler, B: BadMarkupHandler> DerefMut for AutoCloseRenderer<W, E, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<W: Write + Release, E: ErrorHandler, B: BadMarkupHandler> Drop for AutoCloseRenderer<W, E, B> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Unwinding out of a half-written element: release without
        // writing end tags.
        if std::thread::panicking() {
            self.released = true;
            if let Err(err) = self.inner.get_mut().release() {
                log::warn!("releasing html sink during panic failed: {err}");
            }
            return;
        }
        if let Err(err) = self.close() {
            self.inner.fail(err);
        }
    }
}
