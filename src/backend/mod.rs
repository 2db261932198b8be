mod decode;
mod generate;
mod ports;
mod resolve;
mod templates;

pub use decode::{byte_lanes, ByteLane, DecodeChain};
pub use generate::{generate, timestamp, write_output};
pub use ports::{slave_ports, MasterExtras};
pub use resolve::{resolve, MasterPort, Plan, SlavePort};
pub use templates::{
    load_templates, render, Bindings, Placeholder, TemplateId, Templates,
};
