//! Assembles the interconnect from the two templates.

use std::fs;
use std::path::Path;

use super::decode::DecodeChain;
use super::ports::{slave_ports, MasterExtras};
use super::resolve::{resolve, Plan, SlavePort};
use super::templates::{render, Bindings, Placeholder, TemplateId, Templates};
use crate::model::Intercon;
use crate::utils::{Error, WbResult};

const IDLE_INDENT: &str = "\n\t\t\t\t\t";

/// Current local time in the format written to the generated header.
pub fn timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Generates the interconnect text. The output only depends on the
/// arguments, so equal inputs produce identical text.
pub fn generate(
    intercon: &Intercon,
    templates: &Templates,
    date: &str,
) -> WbResult<String> {
    let plan = resolve(intercon)?;

    log::debug!(
        "Generating `{}` with master `{}` and {} slave(s)",
        plan.name,
        plan.master.name,
        plan.slaves.len()
    );

    let chain = DecodeChain::build(&plan);
    let extras = MasterExtras::build(&plan);

    let slaves = plan
        .slaves
        .iter()
        .enumerate()
        .map(|(i, slave)| {
            let last = i + 1 == plan.slaves.len();
            format!("{}\n", slave_block(templates, &plan, slave, last))
        })
        .collect::<String>();

    let master = &plan.master;
    let mut bindings = Bindings::new();

    bindings
        .bind(Placeholder::Date, date)
        .bind(Placeholder::InterconName, plan.name)
        .bind(Placeholder::MasterName, master.name)
        .bind(Placeholder::MasterDataWidth, master.data_width - 1)
        .bind(Placeholder::MasterAddressWidth, master.address_width - 1)
        .bind(Placeholder::MasterSelectWidth, master.data_width / 8 - 1)
        .bind(Placeholder::MasterPorts, extras.ports)
        .bind(Placeholder::Signals, extras.signals)
        .bind(Placeholder::Assignments, extras.assignments)
        .bind(Placeholder::Slaves, slaves)
        .bind(Placeholder::Interconnection, &chain)
        .bind(
            Placeholder::AntiLatch,
            chain.defaults(
                "\n\t\t\t\t\t\t",
                "prevent latches on invalid slave selection",
            ),
        )
        .bind(
            Placeholder::IdleDefaults,
            chain.defaults(IDLE_INDENT, "prevent latches on invalid cycles"),
        )
        .bind(Placeholder::BusAddressWidth, plan.address_width - 1)
        .bind(Placeholder::BusDataWidth, plan.data_width - 1)
        .bind(Placeholder::BusSelectWidth, plan.data_width / 8 - 1);

    Ok(render(templates.get(TemplateId::Intercon), &bindings))
}

fn slave_block(
    templates: &Templates,
    plan: &Plan<'_>,
    slave: &SlavePort<'_>,
    last: bool,
) -> String {
    let mut bindings = Bindings::new();

    bindings
        .bind(Placeholder::SlaveName, slave.name)
        .bind(Placeholder::SlaveDataWidth, slave.data_width - 1)
        .bind(Placeholder::SlaveAddressHigh, slave.address_high)
        .bind(Placeholder::SlaveAddressLow, slave.address_low)
        .bind(Placeholder::SlaveSelectWidth, slave.data_width / 8 - 1)
        .bind(Placeholder::SlavePorts, slave_ports(plan, slave, last));

    render(templates.get(TemplateId::Slave), &bindings)
}

/// Writes the generated text, creating the parent directory if needed.
pub fn write_output(path: &Path, text: &str) -> WbResult<()> {
    let context = |err: std::io::Error| {
        Error::resource(format!("cannot write `{}`: {err}", path.display()))
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty())
    {
        fs::create_dir_all(dir).map_err(context)?;
    }

    fs::write(path, text).map_err(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::load_templates;
    use crate::config::{self, ConfigParser};
    use crate::model::{Component, Endianness, Signal};
    use crate::utils::{ErrorKind, Reporter};

    use std::path::PathBuf;

    const DATE: &str = "2024-01-01 00:00:00.000000";

    fn templates() -> Templates {
        Templates {
            intercon: "-- %date%\nentity %iname%\n%mname%_ack_i : out std_logic;\
                       %madditional%\n%slaves%\n%additionalsignals%\nbegin\
                       %additional_assignments%\n\
                       if (cyc = '1' and stb = '1') then%interconnection%\n\
                       else%antilatch2%\nend if;\n\
                       adr(%intabwidth% downto 0) dat(%intdbwidth% downto 0) \
                       sel(%selwidth% downto 0)\n"
                .to_owned(),
            slave: "%sname% (%sdbwidth%) (%sadhi% downto %sadlo%) \
                    (%sselwidth%)%sadditional%"
                .to_owned(),
        }
    }

    fn master(err: bool) -> Component {
        let mut master = Component::master();
        master.set_name("cpu").unwrap();
        master.set_data_bus_width(32).unwrap();
        master.set_address_bus_width(16).unwrap();
        master.set_endianness(Endianness::Little);
        master.set_signal(Signal::Err, err);
        master
    }

    fn slave(name: &str, base: i64, endianness: Endianness) -> Component {
        let mut slave = Component::slave();
        slave.set_name(name).unwrap();
        slave.set_data_bus_width(32).unwrap();
        slave.set_endianness(endianness);
        slave.set_base_address(base).unwrap();
        slave.set_address_size(0x400).unwrap();
        slave.set_address_high(15).unwrap();
        slave.set_address_low(0).unwrap();
        slave
    }

    fn intercon(master: Component, slaves: Vec<Component>) -> Intercon {
        let mut intercon = Intercon::new();
        intercon.set_data_bus_width(32).unwrap();
        intercon.set_address_bus_width(16).unwrap();
        intercon.set_master(master).unwrap();

        for slave in slaves {
            intercon.add_slave(slave).unwrap();
        }

        intercon
    }

    #[test]
    fn single_slave_with_error_signal() {
        let mut ram = slave("ram", 0, Endianness::Little);
        ram.set_signal(Signal::Err, true);

        let text =
            generate(&intercon(master(true), vec![ram]), &templates(), DATE)
                .unwrap();

        assert!(text.starts_with("-- 2024-01-01 00:00:00.000000\n"));
        assert!(text.contains("entity wb_intercon"));
        assert!(text.contains("if (to_integer(unsigned(adr)) <= 1024) then"));
        assert!(!text.contains("elsif"));
        assert!(text.contains("ram_dat_i <= datm2s;"));
        assert!(text.contains("dats2m <= ram_dat_o;"));
        assert!(text.contains("ram_sel_i <= sel;"));
        assert!(!text.contains("conversion of endianess"));
        assert!(text.contains("err <= ram_err_o;"));
        assert!(text.contains("cpu_err_i <= err;"));
        assert!(text.contains("cpu_err_i : out std_logic := '0';"));
        assert!(text.contains("ram_err_o : in  std_logic"));
        assert!(text.contains("-- prevent latches on invalid slave selection"));
        assert!(text.contains("ram (31) (15 downto 0) (3)"));
        assert!(text.contains("adr(15 downto 0) dat(31 downto 0) sel(3 downto 0)"));
    }

    #[test]
    fn byte_swapped_slave() {
        let ram = slave("ram", 0, Endianness::Big);
        let text =
            generate(&intercon(master(false), vec![ram]), &templates(), DATE)
                .unwrap();

        assert!(text.contains("-- conversion of endianess"));
        assert!(text.contains("-- end of conversion"));
        assert_eq!(text.matches("ram_sel_i(").count(), 4);
        assert_eq!(text.matches("ram_dat_i(").count(), 4);
        assert!(text.contains("ram_sel_i(0 downto 0) <= sel(3 downto 3);"));
        assert!(text.contains("dats2m(7 downto 0) <= ram_dat_o(31 downto 24);"));
        assert!(!text.contains("ram_dat_i <= datm2s;"));
    }

    #[test]
    fn one_sided_flags_are_not_wired() {
        let ram = slave("ram", 0, Endianness::Little);
        let text =
            generate(&intercon(master(true), vec![ram]), &templates(), DATE)
                .unwrap();

        assert!(!text.contains("ram_err_o"));
        assert!(text.contains("cpu_err_i : out std_logic := '0';"));
        assert!(text.contains("signal err : std_logic := '0';"));
        assert!(text.contains("err <= '0';"));

        let mut rom = slave("rom", 0, Endianness::Little);
        rom.set_signal(Signal::Rty, true);

        let text =
            generate(&intercon(master(false), vec![rom]), &templates(), DATE)
                .unwrap();

        assert!(text.contains("rom_rty_o : in  std_logic"));
        assert!(!text.contains("rty <="));
        assert!(!text.contains("signal rty"));
    }

    fn tagged_bus(master_flags: bool, slave_flags: bool) -> Intercon {
        let mut cpu = master(false);
        let mut ram = slave("ram", 0, Endianness::Little);

        for &signal in Signal::ALL {
            cpu.set_signal(signal, master_flags);
            ram.set_signal(signal, slave_flags);
        }

        let mut bus = intercon(cpu, vec![ram]);
        bus.set_tag_bits(Signal::Tga, 2).unwrap();
        bus.set_tag_bits(Signal::Tgc, 3).unwrap();
        bus.set_tag_bits(Signal::Tgd, 8).unwrap();
        bus
    }

    const SLAVE_WIRING: [&str; 6] = [
        "err <= ram_err_o;",
        "rty <= ram_rty_o;",
        "ram_tga_i <= tga;",
        "ram_tgc_i <= tgc;",
        "ram_tgd_i <= tgdm2s;",
        "tgds2m <= ram_tgd_o;",
    ];

    #[test]
    fn optional_signals_wired_on_both_sides() {
        let text = generate(&tagged_bus(true, true), &templates(), DATE)
            .unwrap();

        for line in SLAVE_WIRING {
            assert!(text.contains(line), "missing `{line}`");
        }

        let (_, idle) = text
            .split_once("else\n\t\t\t\t\t-- prevent latches on invalid cycles")
            .unwrap();

        for line in [
            "err <= '0';",
            "rty <= '0';",
            "ram_tga_i <= (others => '0');",
            "ram_tgc_i <= (others => '0');",
            "ram_tgd_i <= (others => '0');",
            "tgds2m <= (others => '0');",
        ] {
            assert!(idle.contains(line), "`{line}` is not idled");
        }
    }

    #[test]
    fn optional_signals_enabled_on_one_side() {
        for (master_flags, slave_flags) in [(true, false), (false, true)] {
            let bus = tagged_bus(master_flags, slave_flags);
            let text = generate(&bus, &templates(), DATE).unwrap();

            for line in SLAVE_WIRING {
                assert!(!text.contains(line), "unexpected `{line}`");
            }

            assert_eq!(text.contains("cpu_tgd_i <= tgds2m;"), master_flags);
            assert_eq!(
                text.contains("ram_tgd_o : in  std_logic_vector(7 downto 0)"),
                slave_flags
            );
        }
    }

    #[test]
    fn no_slaves_is_an_error() {
        let err = generate(&intercon(master(false), vec![]), &templates(), DATE)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn slaves_follow_the_memory_map() {
        let bus = intercon(
            master(false),
            vec![
                slave("uart", 0x800, Endianness::Little),
                slave("ram", 0x0, Endianness::Little),
                slave("rom", 0x400, Endianness::Little),
            ],
        );

        let text = generate(&bus, &templates(), DATE).unwrap();

        let ram = text.find("if (to_integer(unsigned(adr)) <= 1024)").unwrap();
        let rom = text.find("elsif (to_integer(unsigned(adr)) <= 2048)").unwrap();
        let uart = text.find("elsif (to_integer(unsigned(adr)) <= 3072)").unwrap();

        assert!(ram < rom && rom < uart);
        assert_eq!(text.matches("elsif").count(), 2);

        // Port blocks are separated by `;`, the last one is not.
        assert!(text.contains("ram (31) (15 downto 0) (3);\n"));
        assert!(text.contains("rom (31) (15 downto 0) (3);\n"));
        assert!(text.contains("uart (31) (15 downto 0) (3)\n"));
    }

    #[test]
    fn idle_branch_covers_every_signal() {
        let mut ram = slave("ram", 0, Endianness::Little);
        ram.set_signal(Signal::Tga, true);

        let mut master = master(true);
        master.set_signal(Signal::Tga, true);

        let mut bus = intercon(master, vec![ram]);
        bus.set_tag_bits(Signal::Tga, 2).unwrap();

        let text = generate(&bus, &templates(), DATE).unwrap();
        let chain = DecodeChain::build(&resolve(&bus).unwrap());

        let (_, idle) = text
            .split_once("else\n\t\t\t\t\t-- prevent latches on invalid cycles")
            .unwrap();

        for target in chain.targets() {
            assert!(
                idle.contains(&format!("\n\t\t\t\t\t{target} <= ")),
                "`{target}` is not idled"
            );
        }

        assert!(idle.contains("ram_tga_i <= (others => '0');"));
    }

    #[test]
    fn generation_is_reproducible() {
        let bus = intercon(
            master(true),
            vec![
                slave("rom", 0x400, Endianness::Big),
                slave("ram", 0x0, Endianness::Little),
            ],
        );

        let first = generate(&bus, &templates(), DATE).unwrap();
        let second = generate(&bus, &templates(), DATE).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn bundled_templates_are_fully_substituted() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
        let templates = load_templates(&[dir.as_path()]).unwrap();

        let mut ram = slave("ram", 0, Endianness::Little);
        ram.set_signal(Signal::Err, true);

        let mut rom = slave("rom", 0x400, Endianness::Big);
        rom.set_signal(Signal::Tgd, true);

        let mut master = master(true);
        master.set_signal(Signal::Tgd, true);

        let mut bus = intercon(master, vec![ram, rom]);
        bus.set_tag_bits(Signal::Tgd, 8).unwrap();

        let text = generate(&bus, &templates, DATE).unwrap();

        assert!(!text.contains('%'));
        assert!(!text.contains("Not defined"));
        assert!(text.contains("entity wb_intercon is"));
        assert!(text.contains("rom_tgd_o : in  std_logic_vector(7 downto 0)"));
    }

    #[test]
    fn bundled_sample_configuration() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let src = fs::read_to_string(root.join("cfg/wishbone.ini")).unwrap();

        let file = ConfigParser::parse_file(&src).unwrap();
        let mut reporter = Reporter::silent("wishbone.ini", &src);
        let bus = config::load(&file, &mut reporter).unwrap();

        let templates = load_templates(&[root.join("templates").as_path()])
            .unwrap();
        let text = generate(&bus, &templates, DATE).unwrap();

        assert!(text.contains("ram_tga_i <= tga;"));
        assert!(text.contains("rom_adr_i <= adr(9 downto 1);"));
        assert_eq!(text.matches("rom_sel_i(").count(), 2);
    }

    #[test]
    fn output_directory_is_created() {
        let dir = std::env::temp_dir()
            .join(format!("wb-intercon-{}", std::process::id()));
        let path = dir.join("vhdl").join("out.vhdl");

        write_output(&path, "text").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "text");

        fs::remove_dir_all(&dir).unwrap();
    }
}
