use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use std::{fs, iter};

use wb_intercon::backend;
use wb_intercon::config::{self, ast::Span, ConfigParser};
use wb_intercon::opts::Opts;
use wb_intercon::utils::{Diagnostic, Reporter};

fn main() -> ExitCode {
    let start = Instant::now();
    let opts = Opts::parse();

    env_logger::Builder::new()
        .filter_level(opts.log_level)
        .init();

    let filename = opts.config.to_string_lossy();

    let src = match fs::read_to_string(&opts.config) {
        Ok(src) => src,
        Err(err) => {
            Reporter::new(&filename, "").emit(
                &Diagnostic::from(err)
                    .with_note(format!("while reading `{filename}`")),
            );

            return ExitCode::FAILURE;
        }
    };

    let mut reporter = Reporter::new(&filename, &src);

    let file = match ConfigParser::parse_file(&src) {
        Ok(file) => file,
        Err(err) => {
            reporter.emit(
                &Diagnostic::error()
                    .with_message("syntax error")
                    .with_primary(
                        Span::from(err.location.clone()),
                        err.variant.message(),
                    ),
            );

            return ExitCode::FAILURE;
        }
    };

    let Some(intercon) = config::load(&file, &mut reporter) else {
        return ExitCode::FAILURE;
    };

    if opts.print {
        println!("{intercon}");
    }

    let search_paths: Vec<_> = opts
        .templates
        .iter()
        .map(PathBuf::as_path)
        .chain(iter::once(Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/templates"
        ))))
        .collect();

    let output = opts.output_path(intercon.name());

    let result = backend::load_templates(&search_paths)
        .and_then(|templates| {
            backend::generate(&intercon, &templates, &backend::timestamp())
        })
        .and_then(|text| backend::write_output(&output, &text));

    if let Err(err) = result {
        reporter.emit(&Diagnostic::from(err));

        return ExitCode::FAILURE;
    }

    log::info!(
        "Wrote `{}` in {:.3}s",
        output.display(),
        start.elapsed().as_secs_f64()
    );

    ExitCode::SUCCESS
}
