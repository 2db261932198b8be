pub mod diagnostics;
pub mod error;

pub use diagnostics::{Diagnostic, Reporter};
pub use error::{Error, ErrorKind, WbResult};
