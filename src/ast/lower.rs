//! Lowers the full Python AST produced by `ruff_python_parser` into the
//! closed node set this compiler accepts. Every `ruff` node kind outside
//! that set turns into [`LowerError::Unsupported`] carrying the node kind's
//! name, exactly as spec'd.
use std::{fmt::Display, path::Path};

use ruff_python_ast::{self as rast, Expr as RExpr, Number, Operator as ROperator, Stmt as RStmt};
use ruff_python_parser::parse_module;
use ruff_text_size::{Ranged, TextSize};

use super::{
    parse_error::syntax_error, Assign, BinOpKind, CompareOp, Constant, Expr, FunctionDef, If,
    Module, Param, ParseError, Position, Stmt, TypeAnnotation, While,
};

#[derive(Debug, Clone)]
pub enum LowerError {
    Unsupported { node_kind: &'static str, position: Position },
}

impl Display for LowerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LowerError::Unsupported { node_kind, position } => write!(
                f,
                "unsupported construct '{node_kind}' at {}:{}",
                position.line, position.column
            ),
        }
    }
}

impl std::error::Error for LowerError {}

fn unsupported<T>(node_kind: &'static str, position: Position) -> Result<T, LowerError> {
    Err(LowerError::Unsupported { node_kind, position })
}

/// Precomputed byte offsets of every line start, for O(log n) offset -> (line, column).
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    fn position(&self, offset: TextSize) -> Position {
        let offset = usize::from(offset);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let column = offset - self.line_starts[line];
        Position { line: line + 1, column: column + 1 }
    }
}

pub(super) fn lower_source(source: &str, path: &Path) -> Result<Module, ParseError> {
    let parsed = parse_module(source).map_err(|e| syntax_error(path, e))?;
    let module = parsed.into_syntax();
    let lines = LineIndex::new(source);

    let body = module
        .body
        .into_iter()
        .map(|stmt| lower_stmt(stmt, &lines))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Module { body })
}

fn lower_block(stmts: Vec<RStmt>, lines: &LineIndex) -> Result<Vec<Stmt>, LowerError> {
    stmts.into_iter().map(|s| lower_stmt(s, lines)).collect()
}

fn lower_stmt(stmt: RStmt, lines: &LineIndex) -> Result<Stmt, LowerError> {
    match stmt {
        RStmt::FunctionDef(f) => lower_function_def(f, lines).map(Stmt::FunctionDef),
        RStmt::If(s) => lower_if(s, lines).map(Stmt::If),
        RStmt::While(s) => lower_while(s, lines),
        RStmt::Return(s) => lower_return(s, lines),
        RStmt::Assign(s) => lower_assign(s, lines),
        RStmt::Expr(s) => Ok(Stmt::ExprStmt(lower_expr(*s.value, lines)?)),
        other => unsupported(stmt_kind_name(&other), position_of_stmt(&other, lines)),
    }
}

fn stmt_kind_name(stmt: &RStmt) -> &'static str {
    match stmt {
        RStmt::FunctionDef(_) => "FunctionDef",
        RStmt::ClassDef(_) => "ClassDef",
        RStmt::Return(_) => "Return",
        RStmt::Delete(_) => "Delete",
        RStmt::Assign(_) => "Assign",
        RStmt::AugAssign(_) => "AugAssign",
        RStmt::AnnAssign(_) => "AnnAssign",
        RStmt::TypeAlias(_) => "TypeAlias",
        RStmt::For(_) => "For",
        RStmt::While(_) => "While",
        RStmt::If(_) => "If",
        RStmt::With(_) => "With",
        RStmt::Match(_) => "Match",
        RStmt::Raise(_) => "Raise",
        RStmt::Try(_) => "Try",
        RStmt::Assert(_) => "Assert",
        RStmt::Import(_) => "Import",
        RStmt::ImportFrom(_) => "ImportFrom",
        RStmt::Global(_) => "Global",
        RStmt::Nonlocal(_) => "Nonlocal",
        RStmt::Expr(_) => "Expr",
        RStmt::Pass(_) => "Pass",
        RStmt::Break(_) => "Break",
        RStmt::Continue(_) => "Continue",
        RStmt::IpyEscapeCommand(_) => "IpyEscapeCommand",
    }
}

fn position_of_stmt(stmt: &RStmt, lines: &LineIndex) -> Position {
    lines.position(stmt.range().start())
}

fn lower_function_def(f: rast::StmtFunctionDef, lines: &LineIndex) -> Result<FunctionDef, LowerError> {
    let position = lines.position(f.range.start());

    let params = &f.parameters;
    if !params.posonlyargs.is_empty()
        || !params.kwonlyargs.is_empty()
        || params.vararg.is_some()
        || params.kwarg.is_some()
    {
        return unsupported("FunctionDef", position);
    }

    let mut lowered_params = Vec::with_capacity(params.args.len());
    for p in &params.args {
        if p.default.is_some() {
            return unsupported("FunctionDef", position);
        }
        let type_annotation = match &p.parameter.annotation {
            Some(expr) => Some(lower_type_annotation(expr)),
            None => None,
        };
        lowered_params.push(Param {
            name: p.parameter.name.id.to_string(),
            type_annotation,
        });
    }

    let return_type = f.returns.as_deref().map(lower_type_annotation);
    let body = lower_block(f.body.to_vec(), lines)?;

    Ok(FunctionDef {
        name: f.name.id.to_string(),
        params: lowered_params,
        return_type,
        body,
        position,
    })
}

fn lower_type_annotation(expr: &RExpr) -> TypeAnnotation {
    match expr {
        RExpr::Name(name) => match name.id.as_str() {
            "int" => TypeAnnotation::Int,
            "float" => TypeAnnotation::Float,
            "bool" => TypeAnnotation::Bool,
            "str" => TypeAnnotation::Str,
            _ => TypeAnnotation::Any,
        },
        _ => TypeAnnotation::Any,
    }
}

fn lower_if(s: rast::StmtIf, lines: &LineIndex) -> Result<If, LowerError> {
    let test = lower_expr(*s.test, lines)?;
    let body = lower_block(s.body.to_vec(), lines)?;
    let or_else = lower_elif_else(s.elif_else_clauses, lines)?;
    Ok(If { test, body, or_else })
}

/// Python's `elif` is syntax sugar for a nested `if` inside the `else`
/// branch; we flatten `elif_else_clauses` back into that nested shape so
/// the rest of the pipeline only ever sees the two-branch `If` of §3.
fn lower_elif_else(clauses: Vec<rast::ElifElseClause>, lines: &LineIndex) -> Result<Vec<Stmt>, LowerError> {
    let mut tail = Vec::new();
    for clause in clauses.into_iter().rev() {
        match clause.test {
            Some(test) => {
                let nested = If {
                    test: lower_expr(test, lines)?,
                    body: lower_block(clause.body.to_vec(), lines)?,
                    or_else: tail,
                };
                tail = vec![Stmt::If(nested)];
            }
            None => {
                tail = lower_block(clause.body.to_vec(), lines)?;
            }
        }
    }
    Ok(tail)
}

fn lower_while(s: rast::StmtWhile, lines: &LineIndex) -> Result<Stmt, LowerError> {
    let position = lines.position(s.range.start());
    if !s.orelse.is_empty() {
        return unsupported("While", position);
    }
    Ok(Stmt::While(While {
        test: lower_expr(*s.test, lines)?,
        body: lower_block(s.body.to_vec(), lines)?,
    }))
}

fn lower_return(s: rast::StmtReturn, lines: &LineIndex) -> Result<Stmt, LowerError> {
    let position = lines.position(s.range.start());
    let value = match s.value {
        Some(expr) => Some(lower_expr(*expr, lines)?),
        None => None,
    };
    Ok(Stmt::Return { value, position })
}

fn lower_assign(s: rast::StmtAssign, lines: &LineIndex) -> Result<Stmt, LowerError> {
    let position = lines.position(s.range.start());
    if s.targets.len() != 1 {
        return unsupported("Assign", position);
    }
    let target = match &s.targets[0] {
        RExpr::Name(name) => name.id.to_string(),
        _ => return unsupported("Assign", position),
    };
    let value = lower_expr(*s.value, lines)?;
    Ok(Stmt::Assign(Assign { target, value }))
}

fn lower_expr(expr: RExpr, lines: &LineIndex) -> Result<Expr, LowerError> {
    let position = lines.position(expr.range().start());
    match expr {
        RExpr::Name(name) => Ok(Expr::Name { id: name.id.to_string(), position }),
        RExpr::NumberLiteral(n) => lower_number(n.value, position),
        RExpr::StringLiteral(s) => Ok(Expr::Constant {
            value: Constant::Str(s.value.to_string()),
            position,
        }),
        RExpr::BinOp(b) => {
            let op = lower_bin_op(&b.op, position)?;
            Ok(Expr::BinOp {
                left: Box::new(lower_expr(*b.left, lines)?),
                op,
                right: Box::new(lower_expr(*b.right, lines)?),
                position,
            })
        }
        RExpr::Compare(c) => {
            // Only the first operator/comparator pair is consulted; chained
            // comparisons collapse to it, per spec.
            let ops = c.ops.into_vec();
            let comparators = c.comparators.into_vec();
            let op = lower_compare_op(ops.first().copied().unwrap_or(rast::CmpOp::Eq));
            let first_comparator = comparators
                .into_iter()
                .next()
                .ok_or(LowerError::Unsupported { node_kind: "Compare", position })?;
            Ok(Expr::Compare {
                left: Box::new(lower_expr(*c.left, lines)?),
                op,
                right: Box::new(lower_expr(first_comparator, lines)?),
                position,
            })
        }
        RExpr::Call(c) => {
            let rast::Arguments { args, keywords, .. } = c.arguments;
            if !keywords.is_empty() {
                return unsupported("Call", position);
            }
            let mut lowered_args = Vec::with_capacity(args.len());
            for arg in args.into_vec() {
                if matches!(arg, RExpr::Starred(_)) {
                    return unsupported("Call", position);
                }
                lowered_args.push(lower_expr(arg, lines)?);
            }
            Ok(Expr::Call {
                callee: Box::new(lower_expr(*c.func, lines)?),
                args: lowered_args,
                position,
            })
        }
        other => unsupported(expr_kind_name(&other), position),
    }
}

fn lower_number(value: Number, position: Position) -> Result<Expr, LowerError> {
    match value {
        Number::Int(i) => Ok(Expr::Constant {
            value: Constant::Num(i.to_string()),
            position,
        }),
        Number::Float(f) => {
            let mut text = format!("{f}");
            if !text.contains('.') && !text.contains('e') && !text.contains('E') {
                text.push_str(".0");
            }
            Ok(Expr::Constant { value: Constant::Num(text), position })
        }
        Number::Complex { .. } => unsupported("Complex", position),
    }
}

fn lower_bin_op(op: &ROperator, position: Position) -> Result<BinOpKind, LowerError> {
    match op {
        ROperator::Add => Ok(BinOpKind::Add),
        ROperator::Sub => Ok(BinOpKind::Sub),
        ROperator::Mult => Ok(BinOpKind::Mult),
        ROperator::Div => Ok(BinOpKind::Div),
        ROperator::Mod => Ok(BinOpKind::Mod),
        _ => unsupported("BinOp", position),
    }
}

fn lower_compare_op(op: rast::CmpOp) -> CompareOp {
    match op {
        rast::CmpOp::Lt => CompareOp::Lt,
        rast::CmpOp::LtE => CompareOp::LtE,
        rast::CmpOp::Gt => CompareOp::Gt,
        rast::CmpOp::GtE => CompareOp::GtE,
        rast::CmpOp::Eq => CompareOp::Eq,
        rast::CmpOp::NotEq => CompareOp::NotEq,
        // Identity/membership tests are outside the subset; the emitter's
        // operator table defaults unknown kinds to equality, same as spec.
        _ => CompareOp::Eq,
    }
}

fn expr_kind_name(expr: &RExpr) -> &'static str {
    match expr {
        RExpr::BoolOp(_) => "BoolOp",
        RExpr::Named(_) => "NamedExpr",
        RExpr::BinOp(_) => "BinOp",
        RExpr::UnaryOp(_) => "UnaryOp",
        RExpr::Lambda(_) => "Lambda",
        RExpr::If(_) => "IfExp",
        RExpr::Dict(_) => "Dict",
        RExpr::Set(_) => "Set",
        RExpr::ListComp(_) => "ListComp",
        RExpr::SetComp(_) => "SetComp",
        RExpr::DictComp(_) => "DictComp",
        RExpr::Generator(_) => "GeneratorExp",
        RExpr::Await(_) => "Await",
        RExpr::Yield(_) => "Yield",
        RExpr::YieldFrom(_) => "YieldFrom",
        RExpr::Compare(_) => "Compare",
        RExpr::Call(_) => "Call",
        RExpr::FString(_) => "FString",
        RExpr::TString(_) => "TString",
        RExpr::StringLiteral(_) => "StringLiteral",
        RExpr::BytesLiteral(_) => "BytesLiteral",
        RExpr::NumberLiteral(_) => "NumberLiteral",
        RExpr::BooleanLiteral(_) => "BooleanLiteral",
        RExpr::NoneLiteral(_) => "NoneLiteral",
        RExpr::EllipsisLiteral(_) => "EllipsisLiteral",
        RExpr::Attribute(_) => "Attribute",
        RExpr::Subscript(_) => "Subscript",
        RExpr::Starred(_) => "Starred",
        RExpr::Name(_) => "Name",
        RExpr::List(_) => "List",
        RExpr::Tuple(_) => "Tuple",
        RExpr::Slice(_) => "Slice",
        RExpr::IpyEscapeCommand(_) => "IpyEscapeCommand",
    }
}
