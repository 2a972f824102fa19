use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use trellis_core::{CompileOptions, Compilation, SourceFile, TrellisErrorExt, compile_source, parse_source};

mod disassembler;
mod logger;
mod output;

const DEFAULT_CONFIG: &str = "trellis.json";

fn main() -> ExitCode {
    let cli = Command::new("Trellis CLI")
        .version("0.1.0")
        .about("Compile Trellis modules to stack bytecode");

    let cli = setup_cli(cli);
    let matches = cli.get_matches();
    logger::init(matches.get_count("verbose"));
    dispatch_commands(&matches)
}

fn file_arg(help: &'static str) -> Arg {
    Arg::new("file").help(help).required(true).index(1)
}

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Compile options file (defaults to trellis.json next to the source)")
        .long("config")
        .value_parser(clap::value_parser!(PathBuf))
        .value_name("FILE")
}

/// Sets up the subcommands and their arguments.
fn setup_cli(cli: Command) -> Command {
    cli.arg(
        Arg::new("verbose")
            .help("Raise log verbosity (repeatable)")
            .short('v')
            .long("verbose")
            .action(ArgAction::Count)
            .global(true),
    )
    .subcommand(
        Command::new("build")
            .about("Compile a source file and write its bytecode program")
            .arg(file_arg("The source file to build"))
            .arg(
                Arg::new("output")
                    .help("Write the program as JSON to this file")
                    .short('o')
                    .long("output")
                    .value_parser(clap::value_parser!(PathBuf))
                    .value_name("FILE"),
            )
            .arg(
                Arg::new("dump")
                    .help("Print an intermediate stage")
                    .short('d')
                    .long("dump")
                    .value_parser(["syntax", "ir", "ir-table", "bytecode"])
                    .value_name("STAGE"),
            )
            .arg(config_arg()),
    )
    .subcommand(
        Command::new("check")
            .about("Run every pass and report diagnostics without emitting bytecode")
            .arg(file_arg("The source file to check"))
            .arg(config_arg()),
    )
}

/// Dispatches the subcommand and maps the outcome to an exit code.
fn dispatch_commands(matches: &ArgMatches) -> ExitCode {
    let mut reporter = output::Reporter::new(std::io::stderr());
    let result = match matches.subcommand() {
        Some(("build", sub_m)) => build(sub_m, &mut reporter),
        Some(("check", sub_m)) => check(sub_m, &mut reporter),
        _ => {
            println!("No valid subcommand was used. Use --help for more information.");
            Ok(false)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let _ = reporter.diagnostic(e.as_ref());
            ExitCode::FAILURE
        }
    }
}

fn load_source(sub_m: &ArgMatches) -> Result<SourceFile, Box<dyn TrellisErrorExt>> {
    let file = sub_m
        .get_one::<String>("file")
        .map(PathBuf::from)
        .unwrap_or_default();
    SourceFile::new(file)
}

/// `--config` wins; otherwise a `trellis.json` beside the source is used
/// when present, and the defaults when not.
fn load_options(sub_m: &ArgMatches, source: &SourceFile) -> Result<CompileOptions, Box<dyn TrellisErrorExt>> {
    let explicit = sub_m.get_one::<PathBuf>("config").cloned();
    let beside = source
        .path
        .parent()
        .map(|dir| dir.join(DEFAULT_CONFIG))
        .filter(|p| p.is_file());

    match explicit.or(beside) {
        Some(path) => {
            log::info!("loading compile options from {}", path.display());
            CompileOptions::load_from_file(&path).map_err(|e| Box::new(e) as Box<dyn TrellisErrorExt>)
        }
        None => Ok(CompileOptions::default()),
    }
}

fn report(compilation: &Compilation, reporter: &mut output::Reporter<std::io::Stderr>) -> bool {
    for diagnostic in &compilation.diagnostics {
        let _ = reporter.diagnostic(diagnostic);
    }
    !compilation.has_errors()
}

fn build(sub_m: &ArgMatches, reporter: &mut output::Reporter<std::io::Stderr>) -> Result<bool, Box<dyn TrellisErrorExt>> {
    let source = load_source(sub_m)?;
    let options = load_options(sub_m, &source)?;
    let dump = sub_m.get_one::<String>("dump").map(String::as_str);

    if dump == Some("syntax") {
        let unit = parse_source(&source)?;
        print!("{}", unit);
    }

    let compilation = compile_source(&source, &options)?;
    let ok = report(&compilation, reporter);

    match dump {
        Some("ir") => print!("{}", trellis_core::ir::dump(&compilation.tree)),
        Some("ir-table") => println!("{}", output::ir_table(&compilation.tree)),
        Some("bytecode") => {
            if let Some(program) = &compilation.program {
                print!("{}", disassembler::disassemble(program));
            }
        }
        _ => {}
    }

    // no program when a pass reported an error or bytecode is disabled
    let Some(program) = &compilation.program else {
        return Ok(ok);
    };
    if let Some(out) = sub_m.get_one::<PathBuf>("output") {
        write_program(out, program)?;
        let _ = reporter.success(&format!("wrote {}", out.display()));
    }
    Ok(true)
}

fn check(sub_m: &ArgMatches, reporter: &mut output::Reporter<std::io::Stderr>) -> Result<bool, Box<dyn TrellisErrorExt>> {
    let source = load_source(sub_m)?;
    let options = CompileOptions {
        emit_bytecode: false,
        ..load_options(sub_m, &source)?
    };
    let compilation = compile_source(&source, &options)?;
    let ok = report(&compilation, reporter);
    if ok {
        let _ = reporter.success(&format!("{}: no errors", source.name));
    }
    Ok(ok)
}

fn write_program(path: &Path, program: &trellis_core::Program) -> Result<(), Box<dyn TrellisErrorExt>> {
    let json = program
        .to_json()
        .map_err(|e| output::CliError::boxed(path, format!("serialize program: {}", e)))?;
    fs::write(path, json).map_err(|e| output::CliError::boxed(path, format!("write output: {}", e)))
}
