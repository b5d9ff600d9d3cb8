//! sc: statement coverage. Every statement directly inside a `begin
//! ... end` block gets one mutant that replaces it with `halt(1)`,
//! guarded the usual way; killing this mutant just means the test
//! suite actually executed that statement at all. Grounded in the
//! original `mutation.py`'s `SCMutationVisitor`, which builds a bomb
//! statement and sets its `iffalse` branch to the original statement —
//! not, as this file previously did, folding `and`/`or` operands
//! together (that collapse belongs to `cor`).

use crate::ast::{Argument, Expr, ExprKind, Stmt, StmtKind};
use crate::diag::Span;
use crate::types::ty::TypeId;
use super::{guard, MutationOp, MutationPass};

pub(super) fn maybe_mutate(pass: &mut MutationPass, stmt: &mut Stmt) {
  let StmtKind::Block(stmts) = &mut stmt.k else { return };
  for i in 0..stmts.len() {
    let span = stmts[i].span.clone();
    let original = stmts[i].clone();
    let bomb = halt_stmt(&span, pass.int_ty);
    stmts[i] = guard(pass, &span, MutationOp::Sc, describe(&original), "halt".into(), original, bomb);
  }
}

fn halt_stmt(span: &Span, int_ty: TypeId) -> Stmt {
  let one = Expr { span: span.clone(), ty: Some(int_ty), k: ExprKind::Integer(1) };
  Stmt { span: span.clone(), ty: None, k: StmtKind::CallStmt { name: "halt".into(), args: vec![Argument { expr: one }] } }
}

fn describe(s: &Stmt) -> String {
  match &s.k {
    StmtKind::Assignment { .. } => "assignment".into(),
    StmtKind::If { .. } => "if".into(),
    StmtKind::While { .. } => "while".into(),
    StmtKind::Repeat { .. } => "repeat".into(),
    StmtKind::For { .. } => "for".into(),
    StmtKind::Case { .. } => "case".into(),
    StmtKind::Goto(_) => "goto".into(),
    StmtKind::Labeled { .. } => "labeled".into(),
    StmtKind::CallStmt { name, .. } => format!("call {name}"),
    StmtKind::With { .. } => "with".into(),
    StmtKind::Block(_) => "block".into(),
  }
}
