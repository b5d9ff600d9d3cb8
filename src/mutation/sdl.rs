//! sdl: statement deletion. Every statement directly inside a `begin
//! ... end` block gets one mutant with that statement replaced by a
//! no-op, guarded the same way every other operator's mutants are.
//! Grounded in the original `mutation.py`'s `StatementDeletionVisitor`,
//! which skips the last statement of a block (deleting it changes
//! nothing observable) and skips blocks of a single statement (nothing
//! left to run).

use crate::ast::{Stmt, StmtKind};
use super::{guard, MutationOp, MutationPass};

pub(super) fn maybe_mutate(pass: &mut MutationPass, stmt: &mut Stmt) {
  let StmtKind::Block(stmts) = &mut stmt.k else { return };
  if stmts.len() < 2 { return; }
  let noop = Stmt { span: stmt.span.clone(), ty: None, k: StmtKind::Block(Vec::new()) };
  for i in 0..stmts.len().saturating_sub(1) {
    let span = stmts[i].span.clone();
    let original = stmts[i].clone();
    let mutant = noop.clone();
    stmts[i] = guard(pass, &span, MutationOp::Sdl, describe(&original), "<deleted>".into(), original, mutant);
  }
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
