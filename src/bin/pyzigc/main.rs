//! # pyzigc
//!
//! This binary is the ahead-of-time compiler for pyzig. It combines the
//! parser, analysis pass, code generator, and build driver into a single
//! application.
extern crate pyzig;

mod cli;
mod commands;

use cli::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    let result = match &args.command {
        Commands::Build(build_args) => commands::build::build_executable(build_args),
        Commands::CheckRuntime => commands::check_runtime::check_runtime(),
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }

    Ok(())
}
