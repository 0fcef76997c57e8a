//! `ld2415h-codegen` - LD2415H configuration validator and code generator

use clap::Parser;
use clap::error::ErrorKind;

use ld2415h_codegen::cli::args::Cli;
use ld2415h_codegen::cli::commands;
use ld2415h_codegen::error::ExitCode;
use ld2415h_codegen::observability::init_logging;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(ExitCode::USAGE_ERROR);
        }
    };

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
