//! Bus masters and slaves.

use std::fmt;

use strum::{EnumCount, VariantArray};
use strum_macros::{
    Display, EnumCount, EnumString, IntoStaticStr, VariantArray,
};

use crate::utils::{Error, WbResult};

/// Byte order of a data bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Endianness {
    #[strum(serialize = "little", to_string = "Little Endian")]
    Little,
    #[strum(serialize = "big", to_string = "Big Endian")]
    Big,
}

/// Direction of the data flow as seen from the component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DataFlow {
    #[strum(serialize = "r", to_string = "Read only")]
    Read,
    #[strum(serialize = "w", to_string = "Write only")]
    Write,
    #[strum(serialize = "rw", to_string = "Read/Write")]
    ReadWrite,
}

/// Unit in which a slave's address space is indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Granularity {
    #[strum(serialize = "byte", to_string = "Byte")]
    Byte,
    #[strum(serialize = "word", to_string = "Word")]
    Word,
}

/// Optional bus signals.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Display,
    EnumCount,
    EnumString,
    IntoStaticStr,
    VariantArray,
)]
#[strum(serialize_all = "lowercase")]
pub enum Signal {
    /// Error acknowledge.
    Err,
    /// Retry acknowledge.
    Rty,
    /// Address tag.
    Tga,
    /// Cycle tag.
    Tgc,
    /// Data tag, carried in both directions.
    Tgd,
}

impl Signal {
    pub const ALL: &'static [Signal] = <Self as VariantArray>::VARIANTS;

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }

    /// Whether the signal is a tag bus whose width is set on the
    /// interconnect.
    pub const fn is_tag(self) -> bool {
        matches!(self, Signal::Tga | Signal::Tgc | Signal::Tgd)
    }
}

/// Enable flags for the optional signals. Unset flags read as `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignalFlags([Option<bool>; Signal::COUNT]);

impl SignalFlags {
    pub fn get(&self, signal: Signal) -> Option<bool> {
        self.0[signal.index()]
    }

    pub fn set(&mut self, signal: Signal, enabled: bool) {
        self.0[signal.index()] = Some(enabled);
    }

    /// Whether the signal is enabled; unset counts as disabled.
    pub fn enabled(&self, signal: Signal) -> bool {
        self.get(signal).unwrap_or(false)
    }
}

/// Master-specific parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MasterParams {
    pub address_bus_width: Option<u32>,
}

/// Slave-specific parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlaveParams {
    pub base_address: Option<u64>,
    pub address_size: Option<u64>,
    pub granularity: Option<Granularity>,
    pub word_size: Option<u32>,
    pub address_high: Option<u32>,
    pub address_low: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Master(MasterParams),
    Slave(SlaveParams),
}

impl Role {
    pub fn is_master(&self) -> bool {
        matches!(self, Role::Master(_))
    }

    pub fn is_slave(&self) -> bool {
        matches!(self, Role::Slave(_))
    }
}

/// A bus master or slave.
///
/// Every field starts out unset. Setters check their argument and leave the
/// field untouched when it is rejected, so a partially described component
/// can still be inspected and printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    name: Option<String>,
    data_bus_width: Option<u32>,
    endianness: Option<Endianness>,
    data_flow: Option<DataFlow>,
    signals: SignalFlags,
    role: Role,
}

fn positive(what: &str, value: i64) -> WbResult<u32> {
    if value <= 0 {
        return Err(Error::validation(format!(
            "{what} must be positive, got {value}"
        )));
    }

    u32::try_from(value)
        .map_err(|_| Error::validation(format!("{what} is too large: {value}")))
}

fn non_negative(what: &str, value: i64) -> WbResult<u64> {
    u64::try_from(value).map_err(|_| {
        Error::validation(format!("{what} cannot be negative, got {value}"))
    })
}

fn bit_index(what: &str, value: i64) -> WbResult<u32> {
    let value = non_negative(what, value)?;

    u32::try_from(value)
        .map_err(|_| Error::validation(format!("{what} is too large: {value}")))
}

impl Component {
    fn new(role: Role) -> Component {
        Component {
            name: None,
            data_bus_width: None,
            endianness: None,
            data_flow: None,
            signals: SignalFlags::default(),
            role,
        }
    }

    pub fn master() -> Component {
        Component::new(Role::Master(MasterParams::default()))
    }

    pub fn slave() -> Component {
        Component::new(Role::Slave(SlaveParams::default()))
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_master(&self) -> bool {
        self.role.is_master()
    }

    pub fn is_slave(&self) -> bool {
        self.role.is_slave()
    }

    pub fn set_name(&mut self, name: &str) -> WbResult<()> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::validation("name cannot be empty"));
        }

        self.name = Some(name.to_owned());

        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_data_bus_width(&mut self, width: i64) -> WbResult<()> {
        self.data_bus_width = Some(positive("data bus width", width)?);

        Ok(())
    }

    pub fn data_bus_width(&self) -> Option<u32> {
        self.data_bus_width
    }

    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = Some(endianness);
    }

    pub fn endianness(&self) -> Option<Endianness> {
        self.endianness
    }

    pub fn set_data_flow(&mut self, data_flow: DataFlow) {
        self.data_flow = Some(data_flow);
    }

    pub fn data_flow(&self) -> Option<DataFlow> {
        self.data_flow
    }

    pub fn set_signal(&mut self, signal: Signal, enabled: bool) {
        self.signals.set(signal, enabled);
    }

    pub fn signal(&self, signal: Signal) -> Option<bool> {
        self.signals.get(signal)
    }

    pub fn signals(&self) -> &SignalFlags {
        &self.signals
    }

    fn master_params_mut(&mut self, what: &str) -> WbResult<&mut MasterParams> {
        match &mut self.role {
            Role::Master(params) => Ok(params),
            Role::Slave(_) => Err(Error::validation(format!(
                "{what} can only be set on a master"
            ))),
        }
    }

    fn slave_params_mut(&mut self, what: &str) -> WbResult<&mut SlaveParams> {
        match &mut self.role {
            Role::Slave(params) => Ok(params),
            Role::Master(_) => Err(Error::validation(format!(
                "{what} can only be set on a slave"
            ))),
        }
    }

    pub fn set_address_bus_width(&mut self, width: i64) -> WbResult<()> {
        let width = positive("address bus width", width)?;

        self.master_params_mut("address bus width")?.address_bus_width =
            Some(width);

        Ok(())
    }

    pub fn address_bus_width(&self) -> Option<u32> {
        match &self.role {
            Role::Master(params) => params.address_bus_width,
            Role::Slave(_) => None,
        }
    }

    pub fn slave_params(&self) -> Option<&SlaveParams> {
        match &self.role {
            Role::Slave(params) => Some(params),
            Role::Master(_) => None,
        }
    }

    pub fn set_base_address(&mut self, address: i64) -> WbResult<()> {
        let address = non_negative("base address", address)?;

        self.slave_params_mut("base address")?.base_address = Some(address);

        Ok(())
    }

    pub fn base_address(&self) -> Option<u64> {
        self.slave_params()?.base_address
    }

    pub fn set_address_size(&mut self, size: i64) -> WbResult<()> {
        let size = non_negative("address size", size)?;

        self.slave_params_mut("address size")?.address_size = Some(size);

        Ok(())
    }

    pub fn address_size(&self) -> Option<u64> {
        self.slave_params()?.address_size
    }

    pub fn set_granularity(&mut self, granularity: Granularity) -> WbResult<()> {
        self.slave_params_mut("addressing granularity")?.granularity =
            Some(granularity);

        Ok(())
    }

    pub fn granularity(&self) -> Option<Granularity> {
        self.slave_params()?.granularity
    }

    pub fn set_word_size(&mut self, size: i64) -> WbResult<()> {
        let size = positive("word size", size)?;

        self.slave_params_mut("word size")?.word_size = Some(size);

        Ok(())
    }

    pub fn word_size(&self) -> Option<u32> {
        self.slave_params()?.word_size
    }

    pub fn set_address_high(&mut self, bit: i64) -> WbResult<()> {
        let bit = bit_index("highest address bit", bit)?;
        let params = self.slave_params_mut("highest address bit")?;

        if let Some(low) = params.address_low.filter(|&low| bit < low) {
            return Err(Error::validation(format!(
                "highest address bit {bit} is below the lowest address bit {low}"
            )));
        }

        params.address_high = Some(bit);

        Ok(())
    }

    pub fn address_high(&self) -> Option<u32> {
        self.slave_params()?.address_high
    }

    pub fn set_address_low(&mut self, bit: i64) -> WbResult<()> {
        let bit = bit_index("lowest address bit", bit)?;
        let params = self.slave_params_mut("lowest address bit")?;

        if let Some(high) = params.address_high.filter(|&high| bit > high) {
            return Err(Error::validation(format!(
                "lowest address bit {bit} is above the highest address bit {high}"
            )));
        }

        params.address_low = Some(bit);

        Ok(())
    }

    pub fn address_low(&self) -> Option<u32> {
        self.slave_params()?.address_low
    }
}

/// Formats an optional field, printing a placeholder when it is unset.
pub(crate) struct OrUnset<T>(pub Option<T>);

impl<T: fmt::Display> fmt::Display for OrUnset<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str("Not defined"),
        }
    }
}

struct Hex(u64);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.role {
            Role::Master(_) => "Master",
            Role::Slave(_) => "Slave",
        };

        writeln!(
            f,
            "------------------ Wishbone {}: {} ------------------",
            kind,
            OrUnset(self.name())
        )?;
        writeln!(f, "Name: {}", OrUnset(self.name()))?;
        writeln!(f, "Width of databus: {}", OrUnset(self.data_bus_width))?;
        writeln!(f, "Endianess: {}", OrUnset(self.endianness))?;
        writeln!(f, "Direction of dataflow: {}", OrUnset(self.data_flow))?;

        for &signal in Signal::ALL {
            writeln!(
                f,
                "Enable {} signal: {}",
                signal,
                OrUnset(self.signal(signal))
            )?;
        }

        match &self.role {
            Role::Master(params) => {
                writeln!(f, "Master specific:")?;
                write!(
                    f,
                    "\tSize of Addressbus: {}",
                    OrUnset(params.address_bus_width)
                )
            }
            Role::Slave(params) => {
                writeln!(f, "Slave specific:")?;
                writeln!(
                    f,
                    "\tBaseaddress: {}",
                    OrUnset(params.base_address.map(Hex))
                )?;
                writeln!(
                    f,
                    "\tAddresssize: {}",
                    OrUnset(params.address_size.map(Hex))
                )?;
                writeln!(
                    f,
                    "\tAddressinggranularity: {}",
                    OrUnset(params.granularity)
                )?;
                writeln!(f, "\tWordsize: {}", OrUnset(params.word_size))?;
                writeln!(
                    f,
                    "\tHighest addressbit: {}",
                    OrUnset(params.address_high)
                )?;
                write!(
                    f,
                    "\tLowest addressbit: {}",
                    OrUnset(params.address_low)
                )
            }
        }
    }
}
