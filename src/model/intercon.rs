//! The interconnect aggregate: one master, its slaves and bus-wide
//! parameters.

use std::fmt;

use super::component::{Component, OrUnset, Signal};
use crate::utils::{Error, WbResult};

pub const DEFAULT_NAME: &str = "wb_intercon";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intercon {
    name: String,
    tag_bits: [Option<u32>; 3],
    data_bus_width: Option<u32>,
    address_bus_width: Option<u32>,
    master: Option<Component>,
    slaves: Vec<Component>,
}

fn tag_index(signal: Signal) -> Option<usize> {
    match signal {
        Signal::Tga => Some(0),
        Signal::Tgc => Some(1),
        Signal::Tgd => Some(2),
        Signal::Err | Signal::Rty => None,
    }
}

fn bus_width(what: &str, width: i64) -> WbResult<u32> {
    if width <= 0 {
        return Err(Error::validation(format!(
            "{what} must be positive, got {width}"
        )));
    }

    u32::try_from(width)
        .map_err(|_| Error::validation(format!("{what} is too large: {width}")))
}

impl Intercon {
    pub fn new() -> Intercon {
        Intercon {
            name: DEFAULT_NAME.to_owned(),
            tag_bits: [None; 3],
            data_bus_width: None,
            address_bus_width: None,
            master: None,
            slaves: Vec::new(),
        }
    }

    pub fn set_name(&mut self, name: &str) -> WbResult<()> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::validation("interconnect name cannot be empty"));
        }

        self.name = name.to_owned();

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the width of a tag bus. Zero is allowed for tags no component
    /// uses.
    pub fn set_tag_bits(&mut self, tag: Signal, bits: i64) -> WbResult<()> {
        let Some(index) = tag_index(tag) else {
            return Err(Error::validation(format!("`{tag}` is not a tag bus")));
        };

        let bits = u32::try_from(bits).map_err(|_| {
            Error::validation(format!(
                "number of {tag} bits must be a non-negative integer, got {bits}"
            ))
        })?;

        self.tag_bits[index] = Some(bits);

        Ok(())
    }

    pub fn tag_bits(&self, tag: Signal) -> Option<u32> {
        self.tag_bits[tag_index(tag)?]
    }

    pub fn set_data_bus_width(&mut self, width: i64) -> WbResult<()> {
        self.data_bus_width = Some(bus_width("data bus width", width)?);

        Ok(())
    }

    pub fn data_bus_width(&self) -> Option<u32> {
        self.data_bus_width
    }

    pub fn set_address_bus_width(&mut self, width: i64) -> WbResult<()> {
        self.address_bus_width = Some(bus_width("address bus width", width)?);

        Ok(())
    }

    pub fn address_bus_width(&self) -> Option<u32> {
        self.address_bus_width
    }

    /// Installs the master, replacing a previous one.
    pub fn set_master(&mut self, master: Component) -> WbResult<()> {
        if !master.is_master() {
            return Err(Error::validation(format!(
                "`{}` is not a master",
                OrUnset(master.name())
            )));
        }

        self.master = Some(master);

        Ok(())
    }

    pub fn master(&self) -> Option<&Component> {
        self.master.as_ref()
    }

    /// Adds a slave. Slaves are identified by name, so unnamed slaves and
    /// names already in use, ignoring ASCII case, are rejected.
    pub fn add_slave(&mut self, slave: Component) -> WbResult<()> {
        if !slave.is_slave() {
            return Err(Error::validation(format!(
                "`{}` is not a slave",
                OrUnset(slave.name())
            )));
        }

        let Some(name) = slave.name() else {
            return Err(Error::configuration("slave has no name"));
        };

        if self
            .slaves
            .iter()
            .filter_map(Component::name)
            .any(|other| other.eq_ignore_ascii_case(name))
        {
            return Err(Error::configuration(format!(
                "duplicate slave name `{name}`"
            )));
        }

        self.slaves.push(slave);

        Ok(())
    }

    pub fn slave(&self, name: &str) -> Option<&Component> {
        self.slaves.iter().find(|slave| slave.name() == Some(name))
    }

    /// Slaves in the order they were added.
    pub fn slaves(&self) -> &[Component] {
        &self.slaves
    }
}

impl Default for Intercon {
    fn default() -> Self {
        Intercon::new()
    }
}

impl fmt::Display for Intercon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "------------------ Intercon ------------------")?;
        writeln!(f, "Name : {}", self.name)?;

        for tag in [Signal::Tga, Signal::Tgc, Signal::Tgd] {
            writeln!(
                f,
                "Amount of {} bits: {}",
                <&'static str>::from(tag).to_uppercase(),
                OrUnset(self.tag_bits(tag))
            )?;
        }

        writeln!(f, "Size of Databus: {}", OrUnset(self.data_bus_width))?;
        write!(f, "Size of Addressbus: {}", OrUnset(self.address_bus_width))?;

        if let Some(master) = &self.master {
            write!(f, "\n{master}")?;
        }

        for slave in &self.slaves {
            write!(f, "\n{slave}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ErrorKind;

    fn named_slave(name: &str) -> Component {
        let mut slave = Component::slave();
        slave.set_name(name).unwrap();
        slave
    }

    #[test]
    fn master_must_be_a_master() {
        let mut intercon = Intercon::new();

        assert!(intercon.set_master(named_slave("ram")).is_err());
        assert!(intercon.master().is_none());

        intercon.set_master(Component::master()).unwrap();
        assert!(intercon.master().is_some());
    }

    #[test]
    fn slaves_are_deduplicated_by_name() {
        let mut intercon = Intercon::new();

        intercon.add_slave(named_slave("ram")).unwrap();

        let mut twin = named_slave("ram");
        twin.set_base_address(0x800).unwrap();

        let err = intercon.add_slave(twin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        assert!(intercon.add_slave(named_slave("RAM")).is_err());
        assert!(intercon.add_slave(Component::slave()).is_err());
        assert!(intercon.add_slave(Component::master()).is_err());

        intercon.add_slave(named_slave("rom")).unwrap();
        assert_eq!(intercon.slaves().len(), 2);
        assert!(intercon.slave("rom").is_some());
    }

    #[test]
    fn tag_widths() {
        let mut intercon = Intercon::new();

        intercon.set_tag_bits(Signal::Tga, 0).unwrap();
        intercon.set_tag_bits(Signal::Tgd, 8).unwrap();
        assert!(intercon.set_tag_bits(Signal::Tgc, -1).is_err());
        assert!(intercon.set_tag_bits(Signal::Err, 1).is_err());

        assert_eq!(intercon.tag_bits(Signal::Tga), Some(0));
        assert_eq!(intercon.tag_bits(Signal::Tgc), None);
        assert_eq!(intercon.tag_bits(Signal::Tgd), Some(8));
        assert_eq!(intercon.tag_bits(Signal::Rty), None);
    }

    #[test]
    fn summary() {
        let mut intercon = Intercon::new();
        intercon.set_data_bus_width(32).unwrap();
        intercon.add_slave(named_slave("ram")).unwrap();

        let text = intercon.to_string();

        assert!(text.starts_with("------------------ Intercon"));
        assert!(text.contains("Name : wb_intercon"));
        assert!(text.contains("Amount of TGA bits: Not defined"));
        assert!(text.contains("Size of Databus: 32"));
        assert!(text.contains("Wishbone Slave: ram"));
    }
}
