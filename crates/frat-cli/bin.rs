//! The `fuzzyrat` command-line front end (`spec.md` §6.3): reads a
//! grammar file, compiles it, and writes the requested number of random
//! sentences to stdout, one per line.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use frat::{Context, FratError};
use std::io::Write;
use std::process::ExitCode;

fn command() -> Command {
    Command::new("fuzzyrat")
        .version("0.1.0")
        .about("Random-sentence generator driven by a context-free grammar")
        .arg(Arg::new("grammar-file").help("Grammar file to compile").required(true))
        .arg(
            Arg::new("start")
                .short('s')
                .value_name("name")
                .help("Start production, overriding the grammar's first declared one")
                .required(false),
        )
        .arg(
            Arg::new("count")
                .short('c')
                .value_name("n")
                .help("Number of sentences to emit")
                .required(false)
                .value_parser(value_parser!(u32))
                .default_value("1"),
        )
        .arg(
            Arg::new("no-space")
                .short('n')
                .help("Disable whitespace insertion")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("space")
                .long("space")
                .value_name("pattern")
                .help("Custom whitespace pattern, parsed through the regex sub-grammar")
                .required(false),
        )
}

fn main() -> ExitCode {
    frat::logging::init();

    // `try_get_matches` instead of `get_matches`: a usage error (missing
    // required arg, unknown flag) must route through our own log sink and
    // exit 1 (`spec.md` §6.3/§6.4), not through clap's own `Error::exit`,
    // which prints straight to stderr and exits 2.
    let matches = match command().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => {
            frat::logging::error_line(&format!("[error]: {}", err.to_string().trim_end()));
            return ExitCode::FAILURE;
        }
    };

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            frat::logging::error_line(&message);
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> Result<(), String> {
    let grammar_file = matches.get_one::<String>("grammar-file").expect("required argument");

    let mut ctx =
        Context::from_file(grammar_file).map_err(|e| format_top_level_error(grammar_file, &e))?;

    if let Some(name) = matches.get_one::<String>("start") {
        ctx.set_start_production(name.clone());
    }

    if matches.get_flag("no-space") {
        ctx.set_space_pattern(Some(String::new()));
    } else if let Some(pattern) = matches.get_one::<String>("space") {
        ctx.set_space_pattern(Some(pattern.clone()));
    }

    let code = ctx.compile().map_err(|e| format_compile_error(&ctx, &e))?;

    let count = *matches.get_one::<u32>("count").unwrap_or(&1);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for _ in 0..count {
        let sentence = code.exec().map_err(|e| e.to_string())?;
        out.write_all(&sentence).map_err(|e| e.to_string())?;
        out.write_all(b"\n").map_err(|e| e.to_string())?;
        out.flush().map_err(|e| e.to_string())?;
    }

    Ok(())
}

fn format_top_level_error(path: &str, err: &FratError) -> String {
    format!("[error] ({path}): {err}")
}

fn format_compile_error(ctx: &Context, err: &FratError) -> String {
    ctx.format_diagnostic(err).unwrap_or_else(|| format!("[error]: {err}"))
}
