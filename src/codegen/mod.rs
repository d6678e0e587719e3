//! Code generator: walks the AST one final time and emits a single Zig
//! source string.
//!
//! The emitter owns an append-only line buffer, an indentation level, and a
//! declared-names set that starts fresh for every [`generate`] call — it is
//! never shared with the set [`crate::analysis::Analysis`] built while
//! scanning the same program. See spec §4.3 for the per-construct rules
//! this module implements.
mod error;
mod escape;

pub use error::CodegenError;

use std::collections::HashSet;

use crate::analysis::{flatten_add_chain, Analysis};
use crate::ast::{
    Assign, BinOpKind, CompareOp, Constant, Expr, FunctionDef, If, Module, Param, Stmt,
    TypeAnnotation, While,
};

const INDENT_UNIT: &str = "    ";

struct Emitter {
    output: Vec<String>,
    indent: usize,
    declared: HashSet<String>,
}

impl Emitter {
    fn new() -> Self {
        Self { output: Vec::new(), indent: 0, declared: HashSet::new() }
    }

    fn indent_str(&self) -> String {
        INDENT_UNIT.repeat(self.indent)
    }

    fn emit_line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if line.is_empty() {
            self.output.push(String::new());
        } else {
            self.output.push(format!("{}{}", self.indent_str(), line));
        }
    }

    fn emit_function(&mut self, f: &FunctionDef, analysis: &Analysis) -> Result<(), CodegenError> {
        let params = f
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, param_type(p)))
            .collect::<Vec<_>>()
            .join(", ");
        let return_type = f.return_type.as_ref().map(zig_type).unwrap_or_else(|| "void".to_owned());

        self.emit_line(format!("fn {}({params}) {return_type} {{", f.name));
        self.indent += 1;
        self.emit_body(&f.body, analysis, true)?;
        self.indent -= 1;
        self.emit_line("}");
        self.emit_line("");
        Ok(())
    }

    /// Emits a statement list. `drop_leading_docstring` is set only for
    /// function bodies: a string-constant expression statement at the head
    /// of a function body is a docstring and is silently dropped.
    fn emit_body(&mut self, body: &[Stmt], analysis: &Analysis, drop_leading_docstring: bool) -> Result<(), CodegenError> {
        for (i, stmt) in body.iter().enumerate() {
            if i == 0 && drop_leading_docstring && is_docstring(stmt) {
                continue;
            }
            self.emit_stmt(stmt, analysis)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt, analysis: &Analysis) -> Result<(), CodegenError> {
        match stmt {
            Stmt::FunctionDef(f) => self.emit_function(f, analysis),
            Stmt::If(s) => self.emit_if(s, analysis),
            Stmt::While(s) => self.emit_while(s, analysis),
            Stmt::Return { value, .. } => self.emit_return(value.as_ref(), analysis),
            Stmt::Assign(a) => self.emit_assign(a, analysis),
            Stmt::ExprStmt(e) => self.emit_expr_stmt(e, analysis),
        }
    }

    fn emit_if(&mut self, s: &If, analysis: &Analysis) -> Result<(), CodegenError> {
        let (test, _) = self.lower_expr(&s.test, analysis)?;
        self.emit_line(format!("if ({test}) {{"));
        self.indent += 1;
        self.emit_body(&s.body, analysis, false)?;
        self.indent -= 1;
        if !s.or_else.is_empty() {
            self.emit_line("} else {");
            self.indent += 1;
            self.emit_body(&s.or_else, analysis, false)?;
            self.indent -= 1;
        }
        self.emit_line("}");
        Ok(())
    }

    fn emit_while(&mut self, s: &While, analysis: &Analysis) -> Result<(), CodegenError> {
        let (test, _) = self.lower_expr(&s.test, analysis)?;
        self.emit_line(format!("while ({test}) {{"));
        self.indent += 1;
        self.emit_body(&s.body, analysis, false)?;
        self.indent -= 1;
        self.emit_line("}");
        Ok(())
    }

    fn emit_return(&mut self, value: Option<&Expr>, analysis: &Analysis) -> Result<(), CodegenError> {
        match value {
            Some(expr) => {
                let (code, fallible) = self.lower_expr(expr, analysis)?;
                if fallible {
                    self.emit_line(format!("return try {code};"));
                } else {
                    self.emit_line(format!("return {code};"));
                }
            }
            None => self.emit_line("return;"),
        }
        Ok(())
    }

    fn emit_expr_stmt(&mut self, expr: &Expr, analysis: &Analysis) -> Result<(), CodegenError> {
        let (code, fallible) = self.lower_expr(expr, analysis)?;
        if fallible {
            self.emit_line(format!("_ = try {code};"));
        } else {
            self.emit_line(format!("_ = {code};"));
        }
        Ok(())
    }

    fn emit_assign(&mut self, assign: &Assign, analysis: &Analysis) -> Result<(), CodegenError> {
        let target = &assign.target;
        let is_first = !self.declared.contains(target);
        if is_first {
            self.declared.insert(target.clone());
        }
        let keyword = if analysis.reassigned_vars.contains(target) { "var" } else { "const" };

        if let Expr::BinOp { op: BinOpKind::Add, .. } = &assign.value {
            if self.emit_chained_add(target, &assign.value, keyword, is_first, analysis)? {
                return Ok(());
            }
        }

        let (code, fallible) = self.lower_expr(&assign.value, analysis)?;
        if is_first {
            if fallible {
                self.emit_line(format!("{keyword} {target} = try {code};"));
                self.emit_line(format!("defer runtime.decref({target}, allocator);"));
            } else if keyword == "var" {
                self.emit_line(format!("var {target}: i64 = {code};"));
            } else {
                self.emit_line(format!("const {target} = {code};"));
            }
        } else if fallible {
            self.emit_line(format!("{target} = try {code};"));
        } else {
            self.emit_line(format!("{target} = {code};"));
        }
        Ok(())
    }

    /// The chained-add fast path. Returns `Ok(true)` if it produced the
    /// assignment (the object path, taken when any chain part is fallible
    /// or the program needs the runtime at all); `Ok(false)` defers to the
    /// ordinary primitive path (the chain was pure arithmetic).
    fn emit_chained_add(
        &mut self,
        target: &str,
        value: &Expr,
        keyword: &str,
        is_first: bool,
        analysis: &Analysis,
    ) -> Result<bool, CodegenError> {
        let parts = flatten_add_chain(value);
        let mut lowered = Vec::with_capacity(parts.len());
        let mut any_fallible = false;
        for part in &parts {
            let (code, fallible) = self.lower_expr(part, analysis)?;
            any_fallible |= fallible;
            lowered.push((code, fallible));
        }

        if !any_fallible && !analysis.needs_runtime {
            return Ok(false);
        }

        let mut temp_vars = Vec::with_capacity(lowered.len());
        for (i, (code, fallible)) in lowered.into_iter().enumerate() {
            if fallible {
                let temp = format!("_temp_{target}_{i}");
                self.emit_line(format!("const {temp} = try {code};"));
                self.emit_line(format!("defer runtime.decref({temp}, allocator);"));
                temp_vars.push(temp);
            } else {
                temp_vars.push(code);
            }
        }

        let result_var = if temp_vars.len() == 1 {
            temp_vars.into_iter().next().unwrap()
        } else {
            let mut result = temp_vars[0].clone();
            let last = temp_vars.len() - 1;
            for (i, next_part) in temp_vars.iter().enumerate().skip(1) {
                let next_var = format!("_concat_{target}_{i}");
                self.emit_line(format!(
                    "const {next_var} = try runtime.String.concat(allocator, {result}, {next_part});"
                ));
                if i < last {
                    self.emit_line(format!("defer runtime.decref({next_var}, allocator);"));
                }
                result = next_var;
            }
            result
        };

        if is_first {
            self.emit_line(format!("{keyword} {target} = {result_var};"));
            self.emit_line(format!("defer runtime.decref({target}, allocator);"));
        } else {
            self.emit_line(format!("{target} = {result_var};"));
        }
        Ok(true)
    }

    /// Lowers an expression to `(code, is_fallible)`.
    fn lower_expr(&mut self, expr: &Expr, analysis: &Analysis) -> Result<(String, bool), CodegenError> {
        match expr {
            Expr::Name { id, .. } => Ok((id.clone(), false)),
            Expr::Constant { value: Constant::Str(s), .. } => {
                let escaped = escape::escape_zig_string(s)?;
                Ok((format!("runtime.String.create(allocator, \"{escaped}\")"), true))
            }
            Expr::Constant { value: Constant::Num(text), .. } => Ok((text.clone(), false)),
            Expr::Compare { left, op, right, .. } => {
                let (l, _) = self.lower_expr(left, analysis)?;
                let (r, _) = self.lower_expr(right, analysis)?;
                Ok((format!("{l} {} {r}", compare_op_str(*op)), false))
            }
            Expr::BinOp { left, op, right, .. } => {
                let (l, lf) = self.lower_expr(left, analysis)?;
                let (r, rf) = self.lower_expr(right, analysis)?;
                if lf || rf {
                    Ok((format!("runtime.String.concat(allocator, {l}, {r})"), true))
                } else {
                    Ok((format!("{l} {} {r}", bin_op_str(*op)), false))
                }
            }
            Expr::Call { callee, args, .. } => self.lower_call(callee, args, analysis),
        }
    }

    fn lower_call(&mut self, callee: &Expr, args: &[Expr], analysis: &Analysis) -> Result<(String, bool), CodegenError> {
        if let Expr::Name { id, .. } = callee {
            if id == "print" {
                return self.lower_print(args, analysis);
            }
        }

        let (callee_code, _) = self.lower_expr(callee, analysis)?;
        let mut arg_codes = Vec::with_capacity(args.len());
        for arg in args {
            let (code, fallible) = self.lower_expr(arg, analysis)?;
            if fallible {
                return Err(CodegenError::FallibleArgumentInCall);
            }
            arg_codes.push(code);
        }
        Ok((format!("{callee_code}({})", arg_codes.join(", ")), false))
    }

    fn lower_print(&mut self, args: &[Expr], analysis: &Analysis) -> Result<(String, bool), CodegenError> {
        if args.is_empty() {
            return Ok(("std.debug.print(\"\\n\", .{})".to_owned(), false));
        }

        let arg = &args[0];
        if analysis.needs_runtime {
            if let Expr::Name { id, .. } = arg {
                return Ok((
                    format!("std.debug.print(\"{{s}}\\n\", .{{runtime.String.getValue({id})}})"),
                    false,
                ));
            }
            let (code, fallible) = self.lower_expr(arg, analysis)?;
            if fallible {
                return Ok((
                    format!("std.debug.print(\"{{s}}\\n\", .{{runtime.String.getValue(try {code})}})"),
                    false,
                ));
            }
            return Ok((format!("std.debug.print(\"{{}}\\n\", .{{{code}}})"), false));
        }

        let (code, _) = self.lower_expr(arg, analysis)?;
        Ok((format!("std.debug.print(\"{{}}\\n\", .{{{code}}})"), false))
    }
}

fn is_docstring(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::ExprStmt(Expr::Constant { value: Constant::Str(_), .. }))
}

fn param_type(param: &Param) -> String {
    param.type_annotation.as_ref().map(zig_type).unwrap_or_else(|| "i64".to_owned())
}

fn zig_type(annotation: &TypeAnnotation) -> String {
    match annotation {
        TypeAnnotation::Int => "i64".to_owned(),
        TypeAnnotation::Float => "f64".to_owned(),
        TypeAnnotation::Bool => "bool".to_owned(),
        TypeAnnotation::Str => "[]const u8".to_owned(),
        TypeAnnotation::Any => "anytype".to_owned(),
    }
}

fn bin_op_str(op: BinOpKind) -> &'static str {
    match op {
        BinOpKind::Add => "+",
        BinOpKind::Sub => "-",
        BinOpKind::Mult => "*",
        BinOpKind::Div => "/",
        BinOpKind::Mod => "%",
    }
}

fn compare_op_str(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Lt => "<",
        CompareOp::LtE => "<=",
        CompareOp::Gt => ">",
        CompareOp::GtE => ">=",
        CompareOp::Eq => "==",
        CompareOp::NotEq => "!=",
    }
}

/// Emits a complete Zig source string for `module`, given the analysis
/// already run over it. See spec §4.3 for the top-level structure.
pub fn generate(module: &Module, analysis: &Analysis) -> Result<String, CodegenError> {
    let mut emitter = Emitter::new();

    emitter.emit_line("const std = @import(\"std\");");
    if analysis.needs_runtime {
        emitter.emit_line("const runtime = @import(\"runtime\");");
    }
    emitter.emit_line("");

    let mut functions = Vec::new();
    let mut top_level = Vec::new();
    for stmt in &module.body {
        match stmt {
            Stmt::FunctionDef(f) => functions.push(f),
            other => top_level.push(other),
        }
    }

    for f in functions {
        emitter.emit_function(f, analysis)?;
    }

    if !top_level.is_empty() {
        if analysis.needs_allocator {
            emitter.emit_line("pub fn main() !void {");
            emitter.indent += 1;
            emitter.emit_line("var gpa = std.heap.GeneralPurposeAllocator(.{}){};");
            emitter.emit_line("defer _ = gpa.deinit();");
            emitter.emit_line("const allocator = gpa.allocator();");
            emitter.emit_line("");
        } else {
            emitter.emit_line("pub fn main() void {");
            emitter.indent += 1;
        }

        for stmt in top_level {
            emitter.emit_stmt(stmt, analysis)?;
        }

        emitter.indent -= 1;
        emitter.emit_line("}");
    }

    Ok(emitter.output.join("\n") + "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Assign, Position};

    fn pos() -> Position {
        Position { line: 1, column: 1 }
    }

    fn name(id: &str) -> Expr {
        Expr::Name { id: id.to_owned(), position: pos() }
    }

    fn num(text: &str) -> Expr {
        Expr::Constant { value: Constant::Num(text.to_owned()), position: pos() }
    }

    fn string(text: &str) -> Expr {
        Expr::Constant { value: Constant::Str(text.to_owned()), position: pos() }
    }

    fn assign(target: &str, value: Expr) -> Stmt {
        Stmt::Assign(Assign { target: target.to_owned(), value })
    }

    fn print_call(arg: Expr) -> Stmt {
        Stmt::ExprStmt(Expr::Call {
            callee: Box::new(name("print")),
            args: vec![arg],
            position: pos(),
        })
    }

    #[test]
    fn integer_only_program_emits_void_main_with_no_allocator() {
        let module = Module { body: vec![assign("total", num("0")), print_call(name("total"))] };
        let analysis = Analysis::run(&module);
        let code = generate(&module, &analysis).unwrap();
        assert!(code.contains("pub fn main() void {"));
        assert!(!code.contains("GeneralPurposeAllocator"));
        assert!(!code.contains("const runtime"));
    }

    #[test]
    fn a_single_print_of_a_string_flips_to_fallible_allocator_entry() {
        let module = Module { body: vec![Stmt::ExprStmt(string("hi"))] };
        let analysis = Analysis::run(&module);
        let code = generate(&module, &analysis).unwrap();
        assert!(code.contains("pub fn main() !void {"));
        assert!(code.contains("GeneralPurposeAllocator"));
        assert!(code.contains("const runtime = @import(\"runtime\");"));
    }

    #[test]
    fn mutable_primitive_gets_explicit_type_and_plain_restore() {
        let module = Module {
            body: vec![assign("x", num("1")), assign("x", num("2")), print_call(name("x"))],
        };
        let analysis = Analysis::run(&module);
        let code = generate(&module, &analysis).unwrap();
        assert!(code.contains("var x: i64 = 1;"));
        assert!(code.contains("x = 2;"));
        assert!(!code.contains("var x = 2"));
    }

    #[test]
    fn immutable_primitive_has_no_explicit_type() {
        let module = Module { body: vec![assign("y", num("7")), print_call(name("y"))] };
        let analysis = Analysis::run(&module);
        let code = generate(&module, &analysis).unwrap();
        assert!(code.contains("const y = 7;"));
    }

    #[test]
    fn string_concat_chain_produces_temps_and_intermediate_releases() {
        let chain = Expr::BinOp {
            left: Box::new(Expr::BinOp {
                left: Box::new(string("a")),
                op: BinOpKind::Add,
                right: Box::new(string("b")),
                position: pos(),
            }),
            op: BinOpKind::Add,
            right: Box::new(string("c")),
            position: pos(),
        };
        let module = Module { body: vec![assign("s", chain), print_call(name("s"))] };
        let analysis = Analysis::run(&module);
        let code = generate(&module, &analysis).unwrap();

        assert!(code.contains("_temp_s_0"));
        assert!(code.contains("_temp_s_1"));
        assert!(code.contains("_temp_s_2"));
        assert!(code.contains("_concat_s_1"));
        assert!(code.contains("defer runtime.decref(_concat_s_1, allocator);"));
        assert!(code.contains("_concat_s_2"));
        assert!(!code.contains("defer runtime.decref(_concat_s_2, allocator);"));
        assert!(code.contains("defer runtime.decref(s, allocator);"));
    }

    #[test]
    fn docstring_at_head_of_function_body_is_dropped() {
        let module = Module {
            body: vec![Stmt::FunctionDef(FunctionDef {
                name: "f".to_owned(),
                params: vec![],
                return_type: None,
                body: vec![Stmt::ExprStmt(string("does a thing")), Stmt::Return { value: Some(num("1")), position: pos() }],
                position: pos(),
            })],
        };
        let analysis = Analysis::run(&module);
        let code = generate(&module, &analysis).unwrap();
        assert!(!code.contains("does a thing"));
        assert!(code.contains("return 1;"));
    }

    #[test]
    fn fallible_argument_in_a_general_call_is_rejected() {
        let module = Module {
            body: vec![Stmt::ExprStmt(Expr::Call {
                callee: Box::new(name("log")),
                args: vec![string("boom")],
                position: pos(),
            })],
        };
        let analysis = Analysis::run(&module);
        assert!(matches!(generate(&module, &analysis), Err(CodegenError::FallibleArgumentInCall)));
    }

    #[test]
    fn emission_is_deterministic() {
        let module = Module { body: vec![assign("x", num("1")), print_call(name("x"))] };
        let analysis = Analysis::run(&module);
        let first = generate(&module, &analysis).unwrap();
        let second = generate(&module, &analysis).unwrap();
        assert_eq!(first, second);
    }
}
