//! Abstract syntax for configuration files.

use std::ops::Range;

use pest::error::InputLocation;

/// A byte range in the configuration source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl From<pest::Span<'_>> for Span {
    fn from(span: pest::Span) -> Self {
        Span {
            start: span.start(),
            end: span.end(),
        }
    }
}

impl From<InputLocation> for Span {
    fn from(location: InputLocation) -> Self {
        match location {
            InputLocation::Pos(pos) => Span {
                start: pos,
                end: pos,
            },
            InputLocation::Span((start, end)) => Span { start, end },
        }
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// A piece of text and its location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned {
    pub text: String,
    pub span: Span,
}

#[derive(Debug)]
pub struct File {
    pub sections: Vec<Section>,
}

/// A `[name]` header followed by its entries.
#[derive(Debug)]
pub struct Section {
    pub name: Spanned,
    pub entries: Vec<Entry>,
}

/// A `key = value` line. The value has surrounding whitespace removed.
#[derive(Debug)]
pub struct Entry {
    pub key: Spanned,
    pub value: Spanned,
}
