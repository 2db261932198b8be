pub mod backend;
pub mod config;
pub mod model;
pub mod opts;
pub mod utils;
