//! Checks that an interconnect is complete and consistent, and extracts the
//! plain values code generation works with.

use std::fmt::Display;

use itertools::Itertools;

use crate::model::{
    Component, Endianness, Granularity, Intercon, Signal, SignalFlags,
};
use crate::utils::{Error, WbResult};

/// The master as seen by the generator.
#[derive(Clone, Debug)]
pub struct MasterPort<'a> {
    pub name: &'a str,
    pub data_width: u32,
    pub address_width: u32,
    pub endianness: Endianness,
    pub signals: SignalFlags,
}

/// A slave as seen by the generator.
#[derive(Clone, Debug)]
pub struct SlavePort<'a> {
    pub name: &'a str,
    pub data_width: u32,
    pub endianness: Endianness,
    pub base_address: u64,
    pub address_size: u64,
    pub address_high: u32,
    pub address_low: u32,
    pub signals: SignalFlags,
}

impl SlavePort<'_> {
    /// Upper bound compared against by the address decoder.
    pub fn decode_bound(&self) -> u64 {
        self.base_address.saturating_add(self.address_size)
    }

    /// Whether both sides enable an optional signal.
    pub fn wired(&self, master: &MasterPort<'_>, signal: Signal) -> bool {
        master.signals.enabled(signal) && self.signals.enabled(signal)
    }
}

/// A validated interconnect.
#[derive(Clone, Debug)]
pub struct Plan<'a> {
    pub name: &'a str,
    pub data_width: u32,
    pub address_width: u32,
    tag_widths: [u32; 3],
    pub master: MasterPort<'a>,
    /// Slaves in ascending base-address order.
    pub slaves: Vec<SlavePort<'a>>,
}

impl Plan<'_> {
    /// Width of a tag bus. Only meaningful for tags some component enables.
    pub fn tag_width(&self, tag: Signal) -> u32 {
        match tag {
            Signal::Tga => self.tag_widths[0],
            Signal::Tgc => self.tag_widths[1],
            Signal::Tgd => self.tag_widths[2],
            Signal::Err | Signal::Rty => 0,
        }
    }
}

fn required<T, W: Display>(value: Option<T>, what: W) -> WbResult<T> {
    value.ok_or_else(|| Error::configuration(format!("{what} is not set")))
}

fn byte_multiple<W: Display>(width: u32, what: W) -> WbResult<u32> {
    if width % 8 != 0 {
        return Err(Error::configuration(format!(
            "{what} must be a multiple of 8, got {width}"
        )));
    }

    Ok(width)
}

pub fn resolve(intercon: &Intercon) -> WbResult<Plan<'_>> {
    let master = intercon
        .master()
        .ok_or_else(|| Error::configuration("no master is configured"))?;

    if intercon.slaves().is_empty() {
        return Err(Error::configuration("at least one slave is required"));
    }

    let data_width = byte_multiple(
        required(intercon.data_bus_width(), "bus data width")?,
        "bus data width",
    )?;
    let address_width =
        required(intercon.address_bus_width(), "bus address width")?;

    let master = resolve_master(master, data_width, address_width)?;

    let mut tag_widths = [0; 3];

    let tags = [Signal::Tga, Signal::Tgc, Signal::Tgd];

    for (slot, tag) in tags.into_iter().enumerate() {
        let used = master.signals.enabled(tag)
            || intercon.slaves().iter().any(|s| s.signals().enabled(tag));

        if !used {
            continue;
        }

        let width =
            required(intercon.tag_bits(tag), format!("number of {tag} bits"))?;

        if width == 0 {
            return Err(Error::configuration(format!(
                "{tag} is enabled but the number of {tag} bits is 0"
            )));
        }

        tag_widths[slot] = width;
    }

    let slaves = intercon
        .slaves()
        .iter()
        .map(|slave| resolve_slave(slave, &master, address_width))
        .collect::<WbResult<Vec<_>>>()?;

    check_names(&master, &slaves)?;

    let slaves = slaves
        .into_iter()
        .sorted_by_key(|slave| slave.base_address)
        .collect::<Vec<_>>();

    for (prev, next) in slaves.iter().tuple_windows() {
        if prev.base_address == next.base_address {
            return Err(Error::configuration(format!(
                "slaves `{}` and `{}` share the base address {:#x}",
                prev.name, next.name, next.base_address
            )));
        }

        if prev.decode_bound() > next.base_address {
            return Err(Error::configuration(format!(
                "address range of slave `{}` ({:#x}..{:#x}) overlaps slave `{}` at {:#x}",
                prev.name,
                prev.base_address,
                prev.decode_bound(),
                next.name,
                next.base_address
            )));
        }
    }

    Ok(Plan {
        name: intercon.name(),
        data_width,
        address_width,
        tag_widths,
        master,
        slaves,
    })
}

/// Port names are derived from component names, and VHDL identifiers are
/// case-insensitive.
fn check_names(
    master: &MasterPort<'_>,
    slaves: &[SlavePort<'_>],
) -> WbResult<()> {
    for (i, slave) in slaves.iter().enumerate() {
        if slave.name.eq_ignore_ascii_case(master.name) {
            return Err(Error::configuration(format!(
                "slave `{}` has the same name as master `{}`",
                slave.name, master.name
            )));
        }

        let clash = slaves[..i]
            .iter()
            .find(|other| other.name.eq_ignore_ascii_case(slave.name));

        if let Some(other) = clash {
            return Err(Error::configuration(format!(
                "slaves `{}` and `{}` have the same name",
                other.name, slave.name
            )));
        }
    }

    Ok(())
}

fn resolve_master(
    master: &Component,
    data_width: u32,
    address_width: u32,
) -> WbResult<MasterPort<'_>> {
    let name = required(master.name(), "master name")?;
    let what = |field: &str| format!("{field} of master `{name}`");

    let port = MasterPort {
        name,
        data_width: required(master.data_bus_width(), what("data bus width"))?,
        address_width: required(
            master.address_bus_width(),
            what("address bus width"),
        )?,
        endianness: required(master.endianness(), what("endianess"))?,
        signals: *master.signals(),
    };

    if port.data_width != data_width {
        return Err(Error::configuration(format!(
            "{} is {}, but the bus is {data_width} bits wide",
            what("data bus width"),
            port.data_width
        )));
    }

    if port.address_width != address_width {
        return Err(Error::configuration(format!(
            "{} is {}, but the bus address is {address_width} bits wide",
            what("address bus width"),
            port.address_width
        )));
    }

    Ok(port)
}

fn resolve_slave<'a>(
    slave: &'a Component,
    master: &MasterPort<'_>,
    address_width: u32,
) -> WbResult<SlavePort<'a>> {
    let name = required(slave.name(), "slave name")?;
    let what = |field: &str| format!("{field} of slave `{name}`");

    let port = SlavePort {
        name,
        data_width: byte_multiple(
            required(slave.data_bus_width(), what("data bus width"))?,
            what("data bus width"),
        )?,
        endianness: required(slave.endianness(), what("endianess"))?,
        base_address: required(slave.base_address(), what("base address"))?,
        address_size: required(slave.address_size(), what("address size"))?,
        address_high: required(
            slave.address_high(),
            what("highest address bit"),
        )?,
        address_low: required(slave.address_low(), what("lowest address bit"))?,
        signals: *slave.signals(),
    };

    if slave.granularity() == Some(Granularity::Word) {
        required(slave.word_size(), what("word size"))?;
    }

    if port.address_high < port.address_low {
        return Err(Error::validation(format!(
            "{} ({}) is below the lowest address bit ({})",
            what("highest address bit"),
            port.address_high,
            port.address_low
        )));
    }

    if port.address_high >= address_width {
        return Err(Error::configuration(format!(
            "{} ({}) is outside of the {address_width}-bit address bus",
            what("highest address bit"),
            port.address_high
        )));
    }

    if port.endianness == master.endianness {
        if port.data_width != master.data_width {
            return Err(Error::configuration(format!(
                "{} is {}, but the bus is {} bits wide",
                what("data bus width"),
                port.data_width,
                master.data_width
            )));
        }
    } else if port.data_width > master.data_width {
        return Err(Error::configuration(format!(
            "{} ({}) is wider than the master, so its byte order cannot be converted",
            what("data bus width"),
            port.data_width
        )));
    }

    Ok(port)
}
