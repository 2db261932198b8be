//! Error taxonomy shared by the model, the loader and the generator.

use std::fmt;

use strum_macros::IntoStaticStr;

/// Category of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum ErrorKind {
    /// Unknown section or key, or a field required for generation is unset.
    #[strum(to_string = "configuration")]
    Configuration,
    /// A value outside of its domain.
    #[strum(to_string = "validation")]
    Validation,
    /// A template or the output file is inaccessible.
    #[strum(to_string = "resource")]
    Resource,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

pub type WbResult<T> = Result<T, Error>;

impl Error {
    pub fn configuration<M: Into<String>>(message: M) -> Error {
        Error {
            kind: ErrorKind::Configuration,
            message: message.into(),
        }
    }

    pub fn validation<M: Into<String>>(message: M) -> Error {
        Error {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn resource<M: Into<String>>(message: M) -> Error {
        Error {
            kind: ErrorKind::Resource,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind: &'static str = self.kind.into();

        write!(f, "{} error: {}", kind, self.message)
    }
}

impl std::error::Error for Error {}
