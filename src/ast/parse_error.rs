use std::{fmt::Display, io, path::PathBuf};

use ruff_python_parser::ParseError as RuffParseError;

use super::LowerError;

/// Error which happened while turning a source file into a [`super::ParsedModule`].
#[derive(Debug)]
pub enum ParseError {
    /// The file could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The source text is not valid Python syntax.
    Syntax { path: PathBuf, message: String },
    /// The source is valid Python but reaches outside the accepted subset.
    Unsupported(LowerError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io { path, source } => {
                write!(f, "could not read {}: {source}", path.display())
            }
            ParseError::Syntax { path, message } => {
                write!(f, "{}: {message}", path.display())
            }
            ParseError::Unsupported(inner) => write!(f, "{inner}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<LowerError> for ParseError {
    fn from(value: LowerError) -> Self {
        ParseError::Unsupported(value)
    }
}

pub(super) fn syntax_error(path: &std::path::Path, error: RuffParseError) -> ParseError {
    ParseError::Syntax {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
