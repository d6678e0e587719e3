//! Ahead-of-time transpiler from a typed Python subset to Zig.
//!
//! The pipeline is four stages, each its own module: [`ast`] parses and
//! lowers source text, [`analysis`] scans the result for runtime and
//! mutability requirements, [`codegen`] emits Zig source text, and
//! [`build`] hands that text to `zig build-exe`.
pub mod analysis;
pub mod ast;
pub mod build;
pub mod codegen;

use std::fmt::Display;

/// Crate-level error, `From`-converted from each stage's own error type.
/// The CLI matches on this to choose an exit code and message; kept as a
/// closed enum rather than `Box<dyn Error>` since every stage error is
/// already known at compile time.
#[derive(Debug)]
pub enum TranspileError {
    Parse(ast::ParseError),
    Codegen(codegen::CodegenError),
    Build(build::BuildError),
}

impl Display for TranspileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranspileError::Parse(e) => write!(f, "{e}"),
            TranspileError::Codegen(e) => write!(f, "{e}"),
            TranspileError::Build(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TranspileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranspileError::Parse(e) => Some(e),
            TranspileError::Codegen(e) => Some(e),
            TranspileError::Build(e) => Some(e),
        }
    }
}

impl From<ast::ParseError> for TranspileError {
    fn from(e: ast::ParseError) -> Self {
        TranspileError::Parse(e)
    }
}

impl From<codegen::CodegenError> for TranspileError {
    fn from(e: codegen::CodegenError) -> Self {
        TranspileError::Codegen(e)
    }
}

impl From<build::BuildError> for TranspileError {
    fn from(e: build::BuildError) -> Self {
        TranspileError::Build(e)
    }
}
