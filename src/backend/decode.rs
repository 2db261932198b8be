//! Address decoder, bus adaptation and latch prevention.
//!
//! The decoder is a combinational `if`/`elsif`/`else` chain with one branch
//! per slave. Every signal it drives is tracked together with its idle
//! value. A branch that does not drive a tracked signal in full first sets it
//! to idle, and the final `else` idles all of them, so no path through the
//! chain leaves a signal undriven.

use std::fmt;

use super::resolve::{MasterPort, Plan, SlavePort};
use crate::model::Signal;

const BRANCH_INDENT: &str = "\n\t\t\t\t\t";
const BODY_INDENT: &str = "\n\t\t\t\t\t\t";

/// One byte lane of an endianness conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteLane {
    /// Index of the lane on the slave side.
    pub index: u32,
    /// Master select bit routed to the slave's select bit `index`.
    pub select: u32,
    /// Master-side bit range, `(high, low)`.
    pub master: (u32, u32),
    /// Slave-side bit range, `(high, low)`.
    pub slave: (u32, u32),
}

/// Computes the byte lanes which reverse the byte order between a master
/// and a narrower or equally wide slave.
///
/// # Examples
///
/// ```
/// # use wb_intercon::backend::byte_lanes;
/// #
/// let lanes: Vec<_> = byte_lanes(32, 16).collect();
///
/// assert_eq!(lanes.len(), 2);
/// assert_eq!(lanes[0].select, 3);
/// assert_eq!(lanes[0].master, (31, 24));
/// assert_eq!(lanes[0].slave, (7, 0));
/// assert_eq!(lanes[1].master, (23, 16));
/// assert_eq!(lanes[1].slave, (15, 8));
/// ```
pub fn byte_lanes(
    master_width: u32,
    slave_width: u32,
) -> impl Iterator<Item = ByteLane> {
    let selects = master_width / 8;

    (0..slave_width / 8).map(move |i| ByteLane {
        index: i,
        select: selects.saturating_sub(i + 1),
        master: (
            master_width.saturating_sub(1 + 8 * i),
            master_width.saturating_sub(8 * (i + 1)),
        ),
        slave: (8 * (i + 1) - 1, 8 * i),
    })
}

/// A signal driven by the decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Target {
    name: String,
    vector: bool,
}

impl Target {
    fn idle(&self) -> &'static str {
        if self.vector {
            "(others => '0')"
        } else {
            "'0'"
        }
    }
}

#[derive(Clone, Debug)]
enum Statement {
    Comment(&'static str),
    Assign {
        target: usize,
        slice: Option<(u32, u32)>,
        value: String,
    },
}

#[derive(Clone, Debug)]
struct Branch {
    base_address: u64,
    address_size: u64,
    bound: u64,
    statements: Vec<Statement>,
}

impl Branch {
    fn drives_fully(&self, target: usize) -> bool {
        self.statements.iter().any(|statement| {
            matches!(
                statement,
                Statement::Assign { target: t, slice: None, .. } if *t == target
            )
        })
    }
}

/// The decode chain of an interconnect.
#[derive(Clone, Debug)]
pub struct DecodeChain {
    targets: Vec<Target>,
    branches: Vec<Branch>,
}

/// Registers a driven signal, returning its index.
fn track(targets: &mut Vec<Target>, name: String, vector: bool) -> usize {
    if let Some(index) = targets.iter().position(|t| t.name == name) {
        return index;
    }

    targets.push(Target { name, vector });
    targets.len() - 1
}

/// Builds the statements of one branch.
struct BranchBuilder<'c> {
    targets: &'c mut Vec<Target>,
    statements: Vec<Statement>,
}

impl BranchBuilder<'_> {
    fn assign<V: Into<String>>(&mut self, name: String, vector: bool, value: V) {
        let target = track(self.targets, name, vector);

        self.statements.push(Statement::Assign {
            target,
            slice: None,
            value: value.into(),
        });
    }

    fn assign_slice<V: Into<String>>(
        &mut self,
        name: String,
        slice: (u32, u32),
        value: V,
    ) {
        let target = track(self.targets, name, true);

        self.statements.push(Statement::Assign {
            target,
            slice: Some(slice),
            value: value.into(),
        });
    }

    fn comment(&mut self, text: &'static str) {
        self.statements.push(Statement::Comment(text));
    }
}

impl DecodeChain {
    pub fn build(plan: &Plan<'_>) -> DecodeChain {
        let mut targets = Vec::new();

        // The fallback idles the inputs of every slave, then the shared
        // signals returned to the master.
        for slave in &plan.slaves {
            let name = slave.name;

            for (port, vector) in [
                ("dat_i", true),
                ("sel_i", true),
                ("adr_i", true),
                ("cyc_i", false),
                ("stb_i", false),
                ("we_i", false),
            ] {
                track(&mut targets, format!("{name}_{port}"), vector);
            }

            for (signal, port) in [
                (Signal::Tga, "tga_i"),
                (Signal::Tgc, "tgc_i"),
                (Signal::Tgd, "tgd_i"),
            ] {
                if slave.wired(&plan.master, signal) {
                    track(&mut targets, format!("{name}_{port}"), true);
                }
            }
        }

        track(&mut targets, "dats2m".to_owned(), true);
        track(&mut targets, "ack".to_owned(), false);

        for (signal, name, vector) in [
            (Signal::Err, "err", false),
            (Signal::Rty, "rty", false),
            (Signal::Tgd, "tgds2m", true),
        ] {
            if plan.master.signals.enabled(signal) {
                track(&mut targets, name.to_owned(), vector);
            }
        }

        let branches = plan
            .slaves
            .iter()
            .map(|slave| Self::build_branch(&mut targets, &plan.master, slave))
            .collect();

        DecodeChain { targets, branches }
    }

    fn build_branch(
        targets: &mut Vec<Target>,
        master: &MasterPort<'_>,
        slave: &SlavePort<'_>,
    ) -> Branch {
        log::debug!(
            "Decoding slave `{}` at {:#x}, size {:#x}",
            slave.name,
            slave.base_address,
            slave.address_size
        );

        let mut builder = BranchBuilder {
            targets,
            statements: Vec::new(),
        };

        let name = slave.name;

        if slave.endianness == master.endianness {
            builder.assign(format!("{name}_dat_i"), true, "datm2s");
            builder.assign("dats2m".to_owned(), true, format!("{name}_dat_o"));
            builder.assign(format!("{name}_sel_i"), true, "sel");
        } else {
            log::debug!(
                "Converting byte order between `{}` and `{}`",
                master.name,
                name
            );

            builder.comment("conversion of endianess");

            for lane in byte_lanes(master.data_width, slave.data_width) {
                let (mhi, mlo) = lane.master;
                let (shi, slo) = lane.slave;

                builder.assign_slice(
                    format!("{name}_sel_i"),
                    (lane.index, lane.index),
                    format!("sel({} downto {})", lane.select, lane.select),
                );
                builder.assign_slice(
                    format!("{name}_dat_i"),
                    (shi, slo),
                    format!("datm2s({mhi} downto {mlo})"),
                );
                builder.assign_slice(
                    "dats2m".to_owned(),
                    (mhi, mlo),
                    format!("{name}_dat_o({shi} downto {slo})"),
                );
            }

            builder.comment("end of conversion");
        }

        builder.assign("ack".to_owned(), false, format!("{name}_ack_o"));
        builder.assign(
            format!("{name}_adr_i"),
            true,
            format!("adr({} downto {})", slave.address_high, slave.address_low),
        );
        builder.assign(format!("{name}_cyc_i"), false, "cyc");
        builder.assign(format!("{name}_stb_i"), false, "stb");
        builder.assign(format!("{name}_we_i"), false, "we");

        if slave.wired(master, Signal::Err) {
            builder.assign("err".to_owned(), false, format!("{name}_err_o"));
        }

        if slave.wired(master, Signal::Rty) {
            builder.assign("rty".to_owned(), false, format!("{name}_rty_o"));
        }

        if slave.wired(master, Signal::Tga) {
            builder.assign(format!("{name}_tga_i"), true, "tga");
        }

        if slave.wired(master, Signal::Tgc) {
            builder.assign(format!("{name}_tgc_i"), true, "tgc");
        }

        if slave.wired(master, Signal::Tgd) {
            builder.assign(format!("{name}_tgd_i"), true, "tgdm2s");
            builder.assign("tgds2m".to_owned(), true, format!("{name}_tgd_o"));
        }

        Branch {
            base_address: slave.base_address,
            address_size: slave.address_size,
            bound: slave.decode_bound(),
            statements: builder.statements,
        }
    }

    /// Number of range comparisons in the chain.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Names of all signals driven by the chain.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|target| target.name.as_str())
    }

    /// Idle assignments for every tracked signal, one per line.
    pub fn defaults<'c>(
        &'c self,
        indent: &'c str,
        comment: &'c str,
    ) -> impl fmt::Display + 'c {
        Defaults {
            chain: self,
            indent,
            comment,
        }
    }
}

struct Defaults<'c> {
    chain: &'c DecodeChain,
    indent: &'c str,
    comment: &'c str,
}

impl fmt::Display for Defaults<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let indent = self.indent;

        write!(f, "{indent}-- {}", self.comment)?;

        for target in &self.chain.targets {
            write!(f, "{indent}{} <= {};", target.name, target.idle())?;
        }

        Ok(())
    }
}

/// Renders the `if`/`elsif`/`else` chain.
impl fmt::Display for DecodeChain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, branch) in self.branches.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "elsif" };

            write!(
                f,
                "{BRANCH_INDENT}-- Baseaddress: {:#x}, size: {:#x}\
                 {BRANCH_INDENT}{keyword} (to_integer(unsigned(adr)) <= {}) then",
                branch.base_address, branch.address_size, branch.bound
            )?;

            for (index, target) in self.targets.iter().enumerate() {
                if !branch.drives_fully(index) {
                    write!(
                        f,
                        "{BODY_INDENT}{} <= {};",
                        target.name,
                        target.idle()
                    )?;
                }
            }

            for statement in &branch.statements {
                match statement {
                    Statement::Comment(text) => {
                        write!(f, "{BODY_INDENT}-- {text}")?;
                    }
                    Statement::Assign {
                        target,
                        slice,
                        value,
                    } => {
                        let name = &self.targets[*target].name;

                        match slice {
                            Some((hi, lo)) => write!(
                                f,
                                "{BODY_INDENT}{name}({hi} downto {lo}) <= {value};"
                            )?,
                            None => {
                                write!(f, "{BODY_INDENT}{name} <= {value};")?
                            }
                        }
                    }
                }
            }
        }

        write!(
            f,
            "{BRANCH_INDENT}else{}{BRANCH_INDENT}end if;",
            self.defaults(
                BODY_INDENT,
                "prevent latches on invalid slave selection"
            )
        )
    }
}
