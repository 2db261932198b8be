//! Declarations for the optional signals.

use std::fmt;

use super::resolve::{Plan, SlavePort};
use crate::model::Signal;

const PORT_INDENT: &str = "\n\t\t\t";

fn vector(width: u32) -> String {
    format!("std_logic_vector({} downto 0)", width.saturating_sub(1))
}

/// Master-side text for the optional signals the master enables.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MasterExtras {
    /// Port declarations, each terminated by `;`.
    pub ports: String,
    /// Internal signal declarations.
    pub signals: String,
    /// Assignments between the ports and the internal signals.
    pub assignments: String,
}

impl MasterExtras {
    pub fn build(plan: &Plan<'_>) -> MasterExtras {
        let text = |part| MasterText { plan, part }.to_string();

        MasterExtras {
            ports: text(Part::Ports),
            signals: text(Part::Signals),
            assignments: text(Part::Assignments),
        }
    }
}

#[derive(Clone, Copy)]
enum Part {
    Ports,
    Signals,
    Assignments,
}

struct MasterText<'p, 'a> {
    plan: &'p Plan<'a>,
    part: Part,
}

impl fmt::Display for MasterText<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let master = &self.plan.master;
        let name = master.name;

        for &signal in Signal::ALL {
            if !master.signals.enabled(signal) {
                continue;
            }

            let ty = vector(self.plan.tag_width(signal));

            match (self.part, signal) {
                (Part::Ports, Signal::Err | Signal::Rty) => write!(
                    f,
                    "{PORT_INDENT}{name}_{signal}_i : out std_logic := '0';"
                )?,
                (Part::Signals, Signal::Err | Signal::Rty) => {
                    write!(f, "\nsignal {signal} : std_logic := '0';")?
                }
                (Part::Assignments, Signal::Err | Signal::Rty) => {
                    write!(f, "\n\t{name}_{signal}_i <= {signal};")?
                }
                (Part::Ports, Signal::Tga | Signal::Tgc) => {
                    write!(f, "{PORT_INDENT}{name}_{signal}_o : in  {ty};")?
                }
                (Part::Signals, Signal::Tga | Signal::Tgc) => write!(
                    f,
                    "\nsignal {signal} : {ty} := (others => '0');"
                )?,
                (Part::Assignments, Signal::Tga | Signal::Tgc) => {
                    write!(f, "\n\t{signal} <= {name}_{signal}_o;")?
                }
                (Part::Ports, Signal::Tgd) => write!(
                    f,
                    "{PORT_INDENT}{name}_tgd_i : out {ty} := (others => '0');\
                     {PORT_INDENT}{name}_tgd_o : in  {ty};"
                )?,
                (Part::Signals, Signal::Tgd) => write!(
                    f,
                    "\nsignal tgdm2s : {ty} := (others => '0');\
                     \nsignal tgds2m : {ty} := (others => '0');"
                )?,
                (Part::Assignments, Signal::Tgd) => write!(
                    f,
                    "\n\ttgdm2s <= {name}_tgd_o;\n\t{name}_tgd_i <= tgds2m;"
                )?,
            }
        }

        Ok(())
    }
}

/// Port declarations for the optional signals a slave enables, each
/// preceded by `;`. Unless the slave is the last port block, a closing `;`
/// separates it from the next one.
pub fn slave_ports(
    plan: &Plan<'_>,
    slave: &SlavePort<'_>,
    last: bool,
) -> String {
    SlavePorts { plan, slave, last }.to_string()
}

struct SlavePorts<'p, 'a> {
    plan: &'p Plan<'a>,
    slave: &'p SlavePort<'a>,
    last: bool,
}

impl fmt::Display for SlavePorts<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = self.slave.name;

        for &signal in Signal::ALL {
            if !self.slave.signals.enabled(signal) {
                continue;
            }

            let ty = vector(self.plan.tag_width(signal));

            match signal {
                Signal::Err | Signal::Rty => {
                    write!(f, ";{PORT_INDENT}{name}_{signal}_o : in  std_logic")?
                }
                Signal::Tga | Signal::Tgc => write!(
                    f,
                    ";{PORT_INDENT}{name}_{signal}_i : out {ty} := (others => '0')"
                )?,
                Signal::Tgd => write!(
                    f,
                    ";{PORT_INDENT}{name}_tgd_i : out {ty} := (others => '0')\
                     ;{PORT_INDENT}{name}_tgd_o : in  {ty}"
                )?,
            }
        }

        if !self.last {
            write!(f, ";")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::resolve::resolve;
    use crate::model::{Component, Endianness, Intercon};

    fn bus(master_signals: &[Signal], slave_signals: &[Signal]) -> Intercon {
        let mut master = Component::master();
        master.set_name("cpu").unwrap();
        master.set_data_bus_width(32).unwrap();
        master.set_address_bus_width(16).unwrap();
        master.set_endianness(Endianness::Little);

        for &signal in master_signals {
            master.set_signal(signal, true);
        }

        let mut slave = Component::slave();
        slave.set_name("ram").unwrap();
        slave.set_data_bus_width(32).unwrap();
        slave.set_endianness(Endianness::Little);
        slave.set_base_address(0).unwrap();
        slave.set_address_size(0x400).unwrap();
        slave.set_address_high(9).unwrap();
        slave.set_address_low(0).unwrap();

        for &signal in slave_signals {
            slave.set_signal(signal, true);
        }

        let mut intercon = Intercon::new();
        intercon.set_data_bus_width(32).unwrap();
        intercon.set_address_bus_width(16).unwrap();
        intercon.set_tag_bits(Signal::Tga, 4).unwrap();
        intercon.set_tag_bits(Signal::Tgc, 3).unwrap();
        intercon.set_tag_bits(Signal::Tgd, 8).unwrap();
        intercon.set_master(master).unwrap();
        intercon.add_slave(slave).unwrap();
        intercon
    }

    #[test]
    fn no_optional_signals() {
        let intercon = bus(&[], &[]);
        let plan = resolve(&intercon).unwrap();

        assert_eq!(MasterExtras::build(&plan), MasterExtras::default());
        assert_eq!(slave_ports(&plan, &plan.slaves[0], true), "");
        assert_eq!(slave_ports(&plan, &plan.slaves[0], false), ";");
    }

    #[test]
    fn master_error_signal() {
        let intercon = bus(&[Signal::Err], &[]);
        let plan = resolve(&intercon).unwrap();
        let extras = MasterExtras::build(&plan);

        assert_eq!(
            extras.ports,
            "\n\t\t\tcpu_err_i : out std_logic := '0';"
        );
        assert_eq!(extras.signals, "\nsignal err : std_logic := '0';");
        assert_eq!(extras.assignments, "\n\tcpu_err_i <= err;");
    }

    #[test]
    fn tag_buses_are_sized_by_the_interconnect() {
        let intercon = bus(&[Signal::Tga, Signal::Tgd], &[Signal::Tgc]);
        let plan = resolve(&intercon).unwrap();
        let extras = MasterExtras::build(&plan);

        assert!(extras
            .ports
            .contains("cpu_tga_o : in  std_logic_vector(3 downto 0);"));
        assert!(extras.ports.contains(
            "cpu_tgd_i : out std_logic_vector(7 downto 0) := (others => '0');"
        ));
        assert!(extras
            .ports
            .contains("cpu_tgd_o : in  std_logic_vector(7 downto 0);"));
        assert!(extras.signals.contains("signal tgdm2s"));
        assert!(extras.signals.contains("signal tgds2m"));
        assert!(extras.assignments.contains("tga <= cpu_tga_o;"));
        assert!(extras.assignments.contains("cpu_tgd_i <= tgds2m;"));

        let ports = slave_ports(&plan, &plan.slaves[0], true);

        assert_eq!(
            ports,
            ";\n\t\t\tram_tgc_i : out std_logic_vector(2 downto 0) := (others => '0')"
        );
    }
}
