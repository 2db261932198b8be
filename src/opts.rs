use std::path::PathBuf;

use argh::FromArgs;
use log::LevelFilter;

/// Wishbone interconnect generator.
#[derive(FromArgs)]
pub struct Opts {
    /// interconnect description
    #[argh(positional, default = "PathBuf::from(\"cfg/wishbone.ini\")")]
    pub config: PathBuf,

    /// add directory to template search path
    #[argh(option, short = 't')]
    pub templates: Vec<PathBuf>,

    /// output file, defaults to `vhdl/<name>.vhdl`
    #[argh(option, short = 'o')]
    pub output: Option<PathBuf>,

    /// print the parsed interconnect
    #[argh(switch, short = 'p')]
    pub print: bool,

    /// logging level
    #[argh(option, long = "log", default = "LevelFilter::Warn")]
    pub log_level: LevelFilter,
}

impl Opts {
    /// Parse options from `env::args`.
    pub fn parse() -> Opts {
        argh::from_env()
    }

    /// Where the generated interconnect is written.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from("vhdl").join(format!("{name}.vhdl"))
        })
    }
}
