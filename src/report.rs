//! Reports and the callbacks that receive them.
//!
//! The renderer has two advisory channels: one for sink I/O failures, one
//! for markup it had to drop. Neither stops rendering.

use std::fmt;
use std::io;

/// Markup the renderer refused to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadMarkup {
    /// A start tag with an invalid name was dropped.
    InvalidElementName(String),
    /// An attribute with an invalid name was dropped from its tag.
    InvalidAttributeName(String),
    /// A start or end tag arrived inside a raw text element and was dropped.
    TagInRawText(String),
    /// The buffered content of a raw text element was dropped.
    InvalidRawText {
        element: String,
        /// Text from the offending position, at most ten characters.
        snippet: String,
    },
}

impl fmt::Display for BadMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadMarkup::InvalidElementName(name) => write!(f, "Invalid element name : {name}"),
            BadMarkup::InvalidAttributeName(name) => write!(f, "Invalid attr name : {name}"),
            BadMarkup::TagInRawText(name) => {
                write!(f, "Tag content cannot appear inside CDATA element : {name}")
            }
            BadMarkup::InvalidRawText { snippet, .. } => {
                write!(f, "Invalid CDATA text content : {snippet}")
            }
        }
    }
}

impl std::error::Error for BadMarkup {}

/// Receives sink failures.
pub trait ErrorHandler {
    fn handle(&mut self, err: io::Error);
}

impl<F: FnMut(io::Error)> ErrorHandler for F {
    fn handle(&mut self, err: io::Error) {
        self(err)
    }
}

/// Receives reports about dropped markup.
pub trait BadMarkupHandler {
    fn handle(&mut self, report: BadMarkup);
}

impl<F: FnMut(BadMarkup)> BadMarkupHandler for F {
    fn handle(&mut self, report: BadMarkup) {
        self(report)
    }
}

/// Logs sink failures at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogIoErrors;

impl ErrorHandler for LogIoErrors {
    fn handle(&mut self, err: io::Error) {
        log::warn!("html output failed: {err}");
    }
}

/// Logs bad markup at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBadMarkup;

impl BadMarkupHandler for LogBadMarkup {
    fn handle(&mut self, report: BadMarkup) {
        log::warn!("{report}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            BadMarkup::InvalidElementName(":svg".into()).to_string(),
            "Invalid element name : :svg"
        );
        assert_eq!(
            BadMarkup::InvalidAttributeName("a@b".into()).to_string(),
            "Invalid attr name : a@b"
        );
        assert_eq!(
            BadMarkup::TagInRawText("b".into()).to_string(),
            "Tag content cannot appear inside CDATA element : b"
        );
        assert_eq!(
            BadMarkup::InvalidRawText {
                element: "script".into(),
                snippet: "</script>'".into(),
            }
            .to_string(),
            "Invalid CDATA text content : </script>'"
        );
    }

    #[test]
    fn test_closures_are_handlers() {
        let mut seen = Vec::new();
        {
            let mut handler = |report: BadMarkup| seen.push(report);
            BadMarkupHandler::handle(&mut handler, BadMarkup::TagInRawText("i".into()));
        }
        assert_eq!(seen, vec![BadMarkup::TagInRawText("i".into())]);
    }
}
