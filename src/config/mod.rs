//! Configuration front end.

pub mod ast;
mod loader;
mod parser;

pub use loader::load;
pub use parser::ConfigParser;
