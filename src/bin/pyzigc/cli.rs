//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments for pyzigc.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Struct containing the CLI configuration for pyzigc.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Specify the log level of the compiler.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of pyzigc.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// A log level, where also warnings are logged.
    #[value(alias("1"))]
    Warn,

    /// Also log information about the general state of the compiler, e.g., which stage is
    /// running and which paths were resolved.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally in the compiler.
    #[value(alias("3"))]
    Debug,

    /// Log extra information, including the full argv passed to `zig`.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Transpile a source file and compile it into a standalone executable.
    Build(BuildArgs),

    /// Locate and validate the runtime support library without compiling anything.
    CheckRuntime,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// The path to the source file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// The path to the output binary.
    #[arg(index = 2)]
    pub output: std::path::PathBuf,

    /// Whether to dump the lowered AST (for debugging).
    #[arg(long)]
    pub dump_ast: bool,

    /// Whether to dump the analysis result (for debugging).
    #[arg(long)]
    pub dump_analysis: bool,

    /// Keep the temporary build directory instead of deleting it.
    #[arg(long)]
    pub keep_temp: bool,
}
