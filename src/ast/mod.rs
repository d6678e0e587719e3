//! Abstract syntax tree for the accepted source subset.
//!
//! The types in this module are the *closed* node set this compiler
//! understands. They are produced by lowering the full Python AST that
//! `ruff_python_parser` hands back; anything outside this set turns into a
//! [`LowerError::Unsupported`] rather than reaching later stages.
mod lower;
mod parse_error;

pub use lower::LowerError;
pub use parse_error::ParseError;

use std::path::{Path, PathBuf};

/// A parsed source file: its AST root, the original text, and the path it
/// came from. The text and path are kept around for diagnostics further
/// down the pipeline.
#[derive(Debug, Clone)]
pub struct ParsedModule {
    pub ast: Module,
    pub source: String,
    pub path: PathBuf,
}

/// Position of a node in the original source, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Ordered sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_annotation: Option<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    Int,
    Float,
    Bool,
    Str,
    /// Anything else the source writer wrote as an annotation; maps to
    /// Zig's `anytype` placeholder at emission time.
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeAnnotation>,
    pub body: Vec<Stmt>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub test: Expr,
    pub body: Vec<Stmt>,
    pub or_else: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub test: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    FunctionDef(FunctionDef),
    If(If),
    While(While),
    Return { value: Option<Expr>, position: Position },
    Assign(Assign),
    ExprStmt(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    LtE,
    Gt,
    GtE,
    Eq,
    NotEq,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Str(String),
    Num(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name { id: String, position: Position },
    Constant { value: Constant, position: Position },
    BinOp {
        left: Box<Expr>,
        op: BinOpKind,
        right: Box<Expr>,
        position: Position,
    },
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
        position: Position,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        position: Position,
    },
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::Name { position, .. }
            | Expr::Constant { position, .. }
            | Expr::BinOp { position, .. }
            | Expr::Compare { position, .. }
            | Expr::Call { position, .. } => *position,
        }
    }
}

/// Reads `path` as text and lowers it into a [`ParsedModule`].
///
/// This is the single entry point of the parser component: a thin adapter
/// around `ruff_python_parser`'s syntactic analysis, responsible only for
/// producing an AST of the shape above. No semantic checks happen here.
pub fn parse_file(path: &Path) -> Result<ParsedModule, ParseError> {
    let source = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let ast = lower::lower_source(&source, path)?;

    Ok(ParsedModule {
        ast,
        source,
        path: path.to_path_buf(),
    })
}
