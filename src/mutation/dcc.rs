//! dcc: decision/condition coverage. Wraps *every* bool-typed
//! subexpression anywhere in a statement's expression trees — not just
//! an `if`/`while`/`repeat`'s own top-level test — forcing it to `true`
//! once and to `false` once, so neither value a condition could take is
//! left unexercised by the test suite. Also treats every `case` arm,
//! and its `otherwise` branch, as a decision point of its own: each arm
//! gets a bomb that fires in place of the arm's body, and a case whose
//! labels don't cover its selector's full range gets a synthesized
//! `otherwise: halt` if it doesn't already have one. Grounded in the
//! original `mutation.py`'s `BoolMutationVisitor.wrap_operand` (which
//! walks `BinaryOp`/`UnaryOp`/`VarLoad`/`FunctionCall` nodes of boolean
//! type wherever they occur) and `visit_CaseStatementNode`/
//! `visit_CaseListElementNode`.

use crate::ast::{Argument, CaseArm, CaseLabel, Expr, ExprKind, Stmt, StmtKind};
use crate::diag::Span;
use crate::types::ty::{Type, TypeArena, TypeId};
use super::{bool_const, guard, is_bool_const_ref, is_bool_type, walk_exprs_in_stmt, walk_exprs_in_stmt_mut, MutationOp, MutationPass};

pub(super) fn maybe_mutate(pass: &mut MutationPass, stmt: &mut Stmt) {
  mutate_bool_subexprs(pass, stmt);
  if matches!(stmt.k, StmtKind::Case { .. }) {
    mutate_case(pass, stmt);
  }
}

/// A node this pass is willing to force: a `BinaryOp`, `UnaryOp`,
/// `VarLoad`, or `FunctionCall` of boolean type, excluding a bare
/// reference to the `true`/`false` builtins (already constant, so
/// forcing it either way produces nothing new — the same "already
/// constant" skip the original applies via `cond.type.value`).
fn is_bool_site(arena: &TypeArena, e: &Expr) -> bool {
  e.ty.is_some_and(|ty| is_bool_type(arena, ty))
    && matches!(e.k, ExprKind::BinaryOp { .. } | ExprKind::UnaryOp { .. } | ExprKind::VarLoad(_) | ExprKind::FunctionCall { .. })
    && !is_bool_const_ref(e)
}

fn count_bool_sites(stmt: &Stmt, arena: &TypeArena) -> usize {
  let mut n = 0;
  walk_exprs_in_stmt(stmt, &mut |e| if is_bool_site(arena, e) { n += 1; });
  n
}

fn replace_nth_bool_site(stmt: &mut Stmt, arena: &TypeArena, index: usize, replacement: Expr) {
  let mut n = 0;
  let mut replacement = Some(replacement);
  walk_exprs_in_stmt_mut(stmt, &mut |e| {
    if is_bool_site(arena, e) {
      if n == index { if let Some(r) = replacement.take() { *e = r; } }
      n += 1;
    }
  });
}

fn mutate_bool_subexprs(pass: &mut MutationPass, stmt: &mut Stmt) {
  let total = count_bool_sites(stmt, pass.arena);
  let mut result: Option<Stmt> = None;
  for index in 0..total {
    let span = stmt.span.clone();
    for value in [true, false] {
      let mut mutant = stmt.clone();
      replace_nth_bool_site(&mut mutant, pass.arena, index, bool_const(&span, pass.bool_ty, value));
      let base = result.take().unwrap_or_else(|| stmt.clone());
      result = Some(guard(pass, &span, MutationOp::Dcc, format!("<boolean site {index}>"), format!("forced {value}"), base, mutant));
    }
  }
  if let Some(r) = result { *stmt = r; }
}

/// Bombs every `case` arm in place of running its body, and bombs (or
/// synthesizes) the `otherwise` branch when the selector's label
/// coverage is incomplete.
fn mutate_case(pass: &mut MutationPass, stmt: &mut Stmt) {
  let (arm_count, needs_synthetic_otherwise) = {
    let StmtKind::Case { selector, arms, otherwise } = &stmt.k else { return };
    let complete = selector.ty
      .and_then(|t| selector_bounds(pass.arena, t))
      .is_none_or(|(lo, hi)| covered_count(arms) >= hi - lo + 1);
    (arms.len(), otherwise.is_none() && !complete)
  };
  let span = stmt.span.clone();
  let StmtKind::Case { arms, otherwise, .. } = &mut stmt.k else { return };
  for i in 0..arm_count {
    let arm_span = arms[i].body.span.clone();
    let original = (*arms[i].body).clone();
    let bomb = halt_stmt(&arm_span, pass.int_ty);
    arms[i].body = Box::new(guard(pass, &arm_span, MutationOp::Dcc, "<case arm>".into(), "halt".into(), original, bomb));
  }
  if let Some(o) = otherwise {
    let o_span = o.span.clone();
    let original = (**o).clone();
    let bomb = halt_stmt(&o_span, pass.int_ty);
    **o = guard(pass, &o_span, MutationOp::Dcc, "<otherwise>".into(), "halt".into(), original, bomb);
  } else if needs_synthetic_otherwise {
    let bomb = halt_stmt(&span, pass.int_ty);
    let empty = Stmt::block(span.clone(), Vec::new());
    let synthesized = guard(pass, &span, MutationOp::Dcc, "<no otherwise>".into(), "otherwise: halt".into(), empty, bomb);
    *otherwise = Some(Box::new(synthesized));
  }
}

fn halt_stmt(span: &Span, int_ty: TypeId) -> Stmt {
  let one = Expr { span: span.clone(), ty: Some(int_ty), k: ExprKind::Integer(1) };
  Stmt { span: span.clone(), ty: None, k: StmtKind::CallStmt { name: "halt".into(), args: vec![Argument { expr: one }] } }
}

/// The inclusive range of ordinal values a case selector's type can
/// take, used to tell whether its arms' labels cover it completely.
fn selector_bounds(arena: &TypeArena, ty: TypeId) -> Option<(i64, i64)> {
  match arena.get(ty) {
    Type::Int { lo, hi, .. } | Type::IntRange { lo, hi, .. } => Some((*lo, *hi)),
    Type::CharRange { lo, hi } => Some((i64::from(*lo), i64::from(*hi))),
    Type::Enum { names, .. } => Some((0, i64::try_from(names.len()).unwrap_or(0) - 1)),
    _ => None,
  }
}

/// Count of distinct values covered by every arm's labels. Case labels
/// are disjoint by Pascal's own rules, so summing each label's width
/// rather than deduplicating is exact.
fn covered_count(arms: &[CaseArm]) -> i64 {
  arms.iter().flat_map(|a| &a.labels).map(|l| match l {
    CaseLabel::Const(_) => 1,
    CaseLabel::Range(lo, hi) => hi - lo + 1,
  }).sum()
}
