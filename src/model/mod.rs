//! Bus component model.

mod component;
mod intercon;

pub use component::{
    Component, DataFlow, Endianness, Granularity, MasterParams, Role, Signal,
    SignalFlags, SlaveParams,
};
pub use intercon::{DEFAULT_NAME, Intercon};
