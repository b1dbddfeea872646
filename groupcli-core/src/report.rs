//! Rendering of handler failures on the diagnostic stream.

use std::io::{self, Write};

use crate::handler::HandlerError;

/// How much of a failure to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// `<Kind>: <message>` on one line.
    Terse,
    /// Kind and message, the cause chain and the captured stack trace.
    Verbose,
}

impl Verbosity {
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            Verbosity::Verbose
        } else {
            Verbosity::Terse
        }
    }
}

pub fn render(error: &HandlerError, verbosity: Verbosity) -> String {
    let mut text = error.to_string();
    if verbosity == Verbosity::Terse {
        return text;
    }

    let causes: Vec<String> = error.causes().collect();
    if !causes.is_empty() {
        text.push_str("\n\nCaused by:");
        for (i, cause) in causes.iter().enumerate() {
            text.push_str(&format!("\n    {i}: {cause}"));
        }
    }
    text.push_str(&format!("\n\nStack backtrace:\n{}", error.backtrace()));
    text
}

pub fn report(error: &HandlerError, verbosity: Verbosity, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", render(error, verbosity))?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terse_is_kind_and_message() {
        let err = HandlerError::new("ValueError", "doom and gloom");
        assert_eq!(render(&err, Verbosity::Terse), "ValueError: doom and gloom");

        let mut out = Vec::new();
        report(&err, Verbosity::Terse, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ValueError: doom and gloom\n");
    }

    #[test]
    fn verbose_adds_causes_and_trace() {
        let err = HandlerError::new("ValueError", "bad digit").context("loading input");
        let text = render(&err, Verbosity::Verbose);
        assert!(text.starts_with("ValueError: loading input"));
        assert!(text.contains("Caused by:\n    0: bad digit"));
        assert!(text.contains("Stack backtrace:"));
    }
}
