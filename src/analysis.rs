//! Semantic analysis: runtime-requirement detection and reassignment
//! detection.
//!
//! Both traversals are pure functions of the AST and are deterministic and
//! side-effect-free against their inputs, as required. They are fused into
//! a single [`Analysis`] struct (permitted by the design notes) but keep
//! their own working state; neither shares the emitter's declared-names
//! set, which is reset fresh at the start of emission.
use std::collections::HashSet;

use crate::ast::{BinOpKind, Constant, Expr, Module, Stmt};

/// Result of running both analysis sub-passes over a module.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub needs_runtime: bool,
    pub needs_allocator: bool,
    pub reassigned_vars: HashSet<String>,
    declared: HashSet<String>,
}

impl Analysis {
    /// Runs runtime detection and reassignment detection over every
    /// top-level statement and returns the combined result.
    pub fn run(module: &Module) -> Self {
        let mut analysis = Analysis::default();
        for stmt in &module.body {
            analysis.detect_runtime_stmt(stmt);
            analysis.detect_reassignment_stmt(stmt);
        }
        analysis
    }

    fn flag_runtime(&mut self) {
        self.needs_runtime = true;
        self.needs_allocator = true;
    }

    fn detect_runtime_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FunctionDef(f) => {
                for s in &f.body {
                    self.detect_runtime_stmt(s);
                }
            }
            Stmt::If(i) => {
                for s in &i.body {
                    self.detect_runtime_stmt(s);
                }
                for s in &i.or_else {
                    self.detect_runtime_stmt(s);
                }
            }
            Stmt::While(w) => {
                for s in &w.body {
                    self.detect_runtime_stmt(s);
                }
            }
            Stmt::Return { value: Some(value), .. } => self.detect_runtime_expr(value),
            Stmt::Return { value: None, .. } => {}
            Stmt::Assign(a) => self.detect_runtime_expr(&a.value),
            Stmt::ExprStmt(e) => self.detect_runtime_expr(e),
        }
    }

    fn detect_runtime_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Constant { value: Constant::Str(_), .. } => self.flag_runtime(),
            Expr::Constant { value: Constant::Num(_), .. } => {}
            Expr::Name { .. } => {}
            Expr::BinOp { left, right, .. } => {
                self.detect_runtime_expr(left);
                self.detect_runtime_expr(right);
            }
            Expr::Compare { left, right, .. } => {
                self.detect_runtime_expr(left);
                self.detect_runtime_expr(right);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    self.detect_runtime_expr(arg);
                }
            }
        }
    }

    fn detect_reassignment_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(a) => {
                if self.declared.contains(&a.target) {
                    self.reassigned_vars.insert(a.target.clone());
                } else {
                    self.declared.insert(a.target.clone());
                }
            }
            Stmt::FunctionDef(f) => {
                for s in &f.body {
                    self.detect_reassignment_stmt(s);
                }
            }
            Stmt::If(i) => {
                for s in &i.body {
                    self.detect_reassignment_stmt(s);
                }
                for s in &i.or_else {
                    self.detect_reassignment_stmt(s);
                }
            }
            Stmt::While(w) => {
                for s in &w.body {
                    self.detect_reassignment_stmt(s);
                }
            }
            Stmt::Return { .. } | Stmt::ExprStmt(_) => {}
        }
    }
}

/// A binary-add chain `((a+b)+c)+d` flattens to `[a, b, c, d]` by recursive
/// left-descent, stopping at any non-`Add` node. Used both by the emitter's
/// chained-add fast path and by its tests.
pub fn flatten_add_chain(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::BinOp { left, op: BinOpKind::Add, right, .. } => {
            let mut parts = flatten_add_chain(left);
            parts.push(right.as_ref());
            parts
        }
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Assign, CompareOp, Constant, Expr, Position, Stmt, While};

    fn pos() -> Position {
        Position { line: 1, column: 1 }
    }

    fn name(id: &str) -> Expr {
        Expr::Name { id: id.to_owned(), position: pos() }
    }

    fn str_const(s: &str) -> Expr {
        Expr::Constant { value: Constant::Str(s.to_owned()), position: pos() }
    }

    fn num_const(s: &str) -> Expr {
        Expr::Constant { value: Constant::Num(s.to_owned()), position: pos() }
    }

    fn assign(target: &str, value: Expr) -> Stmt {
        Stmt::Assign(Assign { target: target.to_owned(), value })
    }

    #[test]
    fn integer_only_program_does_not_need_runtime() {
        let module = Module {
            body: vec![assign("total", num_const("0")), Stmt::ExprStmt(name("total"))],
        };
        let analysis = Analysis::run(&module);
        assert!(!analysis.needs_runtime);
        assert!(!analysis.needs_allocator);
    }

    #[test]
    fn a_single_string_literal_anywhere_flips_the_flag() {
        let module = Module { body: vec![assign("s", str_const("hi"))] };
        let analysis = Analysis::run(&module);
        assert!(analysis.needs_runtime);
        assert!(analysis.needs_allocator);
    }

    #[test]
    fn a_string_literal_in_a_loop_condition_does_not_flip_the_flag() {
        let condition = Expr::Compare {
            left: Box::new(name("line")),
            op: CompareOp::NotEq,
            right: Box::new(str_const("stop")),
            position: pos(),
        };
        let module = Module { body: vec![Stmt::While(While { test: condition, body: vec![] })] };
        let analysis = Analysis::run(&module);
        assert!(!analysis.needs_runtime);
        assert!(!analysis.needs_allocator);
    }

    #[test]
    fn reassigned_name_is_recorded_only_on_second_sighting() {
        let module = Module {
            body: vec![assign("x", num_const("1")), assign("x", num_const("2"))],
        };
        let analysis = Analysis::run(&module);
        assert!(analysis.reassigned_vars.contains("x"));
    }

    #[test]
    fn single_assignment_name_is_not_reassigned() {
        let module = Module { body: vec![assign("y", num_const("7"))] };
        let analysis = Analysis::run(&module);
        assert!(!analysis.reassigned_vars.contains("y"));
    }

    #[test]
    fn flattens_left_leaning_add_chain_in_order() {
        let expr = Expr::BinOp {
            left: Box::new(Expr::BinOp {
                left: Box::new(Expr::BinOp {
                    left: Box::new(name("a")),
                    op: BinOpKind::Add,
                    right: Box::new(name("b")),
                    position: pos(),
                }),
                op: BinOpKind::Add,
                right: Box::new(name("c")),
                position: pos(),
            }),
            op: BinOpKind::Add,
            right: Box::new(name("d")),
            position: pos(),
        };
        let parts = flatten_add_chain(&expr);
        assert_eq!(parts.len(), 4);
        for (part, expected) in parts.iter().zip(["a", "b", "c", "d"]) {
            assert_eq!(*part, &name(expected));
        }
    }
}
