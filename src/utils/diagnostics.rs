//! Error reporting.

use std::io::{self, IsTerminal};
use std::ops::Range;

use codespan_reporting::diagnostic::{
    Diagnostic as InnerDiagnostic, Label, Severity,
};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use codespan_reporting::term::{self, Config};

use super::error::Error;

pub struct Diagnostic(InnerDiagnostic<()>);

impl Diagnostic {
    pub fn error() -> Diagnostic {
        Self(InnerDiagnostic::error())
    }

    pub fn with_message<M: Into<String>>(mut self, message: M) -> Diagnostic {
        self.0.message = message.into();
        self
    }

    pub fn with_primary<S, L>(mut self, span: S, label: L) -> Diagnostic
    where
        S: Into<Range<usize>>,
        L: Into<String>,
    {
        self.0
            .labels
            .push(Label::primary((), span).with_message(label));

        self
    }

    pub fn with_secondary<S, L>(mut self, span: S, label: L) -> Diagnostic
    where
        S: Into<Range<usize>>,
        L: Into<String>,
    {
        self.0
            .labels
            .push(Label::secondary((), span).with_message(label));

        self
    }

    pub fn with_note<N: Into<String>>(mut self, note: N) -> Diagnostic {
        self.0.notes.push(note.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }

    pub fn is_error(&self) -> bool {
        self.0.severity >= Severity::Error
    }
}

impl From<io::Error> for Diagnostic {
    fn from(err: io::Error) -> Self {
        Diagnostic::error().with_message(err.to_string())
    }
}

impl From<Error> for Diagnostic {
    fn from(err: Error) -> Self {
        Diagnostic::error().with_message(err.to_string())
    }
}

pub struct Reporter<'src> {
    file: SimpleFile<&'src str, &'src str>,
    writer: Option<StandardStream>,
    errors: usize,
    history: Vec<String>,
}

impl Reporter<'_> {
    pub fn new<'src>(filename: &'src str, source: &'src str) -> Reporter<'src> {
        let choice = if std::io::stderr().is_terminal() {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };

        Reporter {
            file: SimpleFile::new(filename, source),
            writer: Some(StandardStream::stderr(choice)),
            errors: 0,
            history: Vec::new(),
        }
    }

    /// Creates a reporter which records diagnostic messages instead of
    /// printing them.
    pub fn silent<'src>(filename: &'src str, source: &'src str) -> Reporter<'src> {
        Reporter {
            file: SimpleFile::new(filename, source),
            writer: None,
            errors: 0,
            history: Vec::new(),
        }
    }

    pub fn emit(&mut self, diagnostic: &Diagnostic) {
        if diagnostic.is_error() {
            self.errors += 1;
        }

        let Some(writer) = &mut self.writer else {
            self.history.push(diagnostic.message().to_owned());

            return;
        };

        if let Err(err) =
            term::emit(writer, &Config::default(), &self.file, &diagnostic.0)
        {
            log::error!("failed to print diagnostic: {err}");
        }
    }

    /// Number of errors emitted so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Messages recorded by a [`Reporter::silent`] reporter.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}
