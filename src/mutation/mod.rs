//! The mutation pass (spec §4.5): given a single selected operator
//! (the `-m` driver flag, SPEC_FULL §6.3), walks a function body and
//! splices a guarded clone in next to every mutation site it finds,
//! registering each clone in a [`MutationReport`] with a deterministic
//! id. Grounded in the original `mutation.py`'s per-operator visitors,
//! which likewise clone the enclosing statement and wrap it in an
//! `if <mutation selector> then <mutant> else <original>` guard rather
//! than mutating the tree destructively.

pub mod aor;
pub mod cor;
pub mod dcc;
pub mod report;
pub mod ror;
pub mod sc;
pub mod sdl;

use crate::ast::{BinOp, Expr, ExprKind, Stmt, StmtKind, BranchHint};
use crate::diag::Span;
use crate::types::ty::{Type, TypeArena, TypeId};

pub use report::{mutant_id, MutantRecord, MutationOp, MutationReport};

/// Drives a single operator over a single function body. One pass is
/// built per `-m` invocation; running several operators over the same
/// module means running several passes, each against its own
/// [`MutationReport`] (spec §4.5: operators are never combined within
/// one compilation).
pub struct MutationPass<'a> {
  module: String,
  op: MutationOp,
  report: &'a mut MutationReport,
  arena: &'a TypeArena,
  bool_ty: TypeId,
  int_ty: TypeId,
}

impl<'a> MutationPass<'a> {
  #[must_use] pub fn new(module: impl Into<String>, op: MutationOp, report: &'a mut MutationReport, arena: &'a TypeArena, bool_ty: TypeId, int_ty: TypeId) -> Self {
    Self { module: module.into(), op, report, arena, bool_ty, int_ty }
  }

  pub fn run(&mut self, body: &mut Stmt) { self.walk_stmt(body); }

  fn walk_stmt(&mut self, s: &mut Stmt) {
    match self.op {
      MutationOp::Sdl => sdl::maybe_mutate(self, s),
      MutationOp::Dcc => dcc::maybe_mutate(self, s),
      MutationOp::Sc => sc::maybe_mutate(self, s),
      MutationOp::Cor => cor::maybe_mutate(self, s),
      MutationOp::Ror => ror::maybe_mutate(self, s),
      MutationOp::Aor => aor::maybe_mutate(self, s),
    }
    match &mut s.k {
      StmtKind::Block(stmts) => stmts.iter_mut().for_each(|st| self.walk_stmt(st)),
      StmtKind::Assignment { .. } | StmtKind::CallStmt { .. } | StmtKind::Goto(_) => {}
      StmtKind::If { then_branch, else_branch, hint } => {
        // A guard splices a synthetic `if getmutationid()=id then
        // <mutant> else <original>` in place of a real site, marked by
        // `BranchHint::Unlikely` (never set outside this pass). Its
        // `then` branch is synthesized mutant content, not source —
        // recursing into it would let it be rediscovered as a fresh
        // site and re-mutated without bound. Only `else` still holds
        // real, not-yet-fully-explored source.
        if matches!(hint, Some(BranchHint::Unlikely)) {
          if let Some(e) = else_branch { self.walk_stmt(e); }
        } else {
          self.walk_stmt(then_branch);
          if let Some(e) = else_branch { self.walk_stmt(e); }
        }
      }
      StmtKind::While { body, .. } | StmtKind::Repeat { body, .. } | StmtKind::For { body, .. } => self.walk_stmt(body),
      StmtKind::Case { arms, otherwise, .. } => {
        for arm in arms { self.walk_stmt(&mut arm.body); }
        if let Some(o) = otherwise { self.walk_stmt(o); }
      }
      StmtKind::With { body, .. } | StmtKind::Labeled { stmt: body, .. } => self.walk_stmt(body),
    }
  }
}

fn getmutationid_call(span: &Span, int_ty: TypeId) -> Expr {
  Expr { span: span.clone(), ty: Some(int_ty), k: ExprKind::FunctionCall { name: "getmutationid".into(), args: vec![] } }
}

/// Wraps `original` and `mutant` as `if getmutationid() = id then mutant
/// else original`, registers `id` in the pass's report, and returns the
/// replacement statement (SPEC_FULL §4.5.3: the guard carries a
/// `BranchHint::Unlikely` so the lowering pass can bias block layout
/// towards the unmutated path, since almost every run has mutation
/// testing disabled).
fn guard(pass: &mut MutationPass, span: &Span, op: MutationOp, original_text: String, replacement_text: String, original: Stmt, mutant: Stmt) -> Stmt {
  let id = pass.report.record(pass.module.clone(), op, span.line, span.start, span.end, original_text, replacement_text);
  let cond = Expr {
    span: span.clone(), ty: Some(pass.bool_ty),
    k: ExprKind::BinaryOp {
      op: BinOp::Eq,
      lhs: Box::new(getmutationid_call(span, pass.int_ty)),
      rhs: Box::new(Expr { span: span.clone(), ty: Some(pass.int_ty), k: ExprKind::Integer(i64::from(id)) }),
    },
  };
  Stmt {
    span: span.clone(), ty: None,
    k: StmtKind::If { cond, then_branch: Box::new(mutant), else_branch: Some(Box::new(original)), hint: Some(BranchHint::Unlikely) },
  }
}

// ---- Shared expression-tree walkers, used by the four expression-level
// operators (sc, cor, ror, aor) to find and replace mutation sites by a
// stable traversal index without needing raw pointers. ----

fn walk_exprs_in_stmt<'x>(s: &'x Stmt, f: &mut impl FnMut(&'x Expr)) {
  match &s.k {
    StmtKind::Block(stmts) => stmts.iter().for_each(|st| walk_exprs_in_stmt(st, f)),
    StmtKind::Assignment { rhs, .. } => walk_expr_tree(rhs, f),
    StmtKind::If { cond, then_branch, else_branch, .. } => {
      walk_expr_tree(cond, f);
      walk_exprs_in_stmt(then_branch, f);
      if let Some(e) = else_branch { walk_exprs_in_stmt(e, f); }
    }
    StmtKind::While { cond, body } | StmtKind::Repeat { body, cond } => {
      walk_expr_tree(cond, f);
      walk_exprs_in_stmt(body, f);
    }
    StmtKind::For { from, to, body, .. } => { walk_expr_tree(from, f); walk_expr_tree(to, f); walk_exprs_in_stmt(body, f); }
    StmtKind::Case { selector, arms, otherwise } => {
      walk_expr_tree(selector, f);
      for arm in arms { walk_exprs_in_stmt(&arm.body, f); }
      if let Some(o) = otherwise { walk_exprs_in_stmt(o, f); }
    }
    StmtKind::CallStmt { args, .. } => args.iter().for_each(|a| walk_expr_tree(&a.expr, f)),
    StmtKind::With { records, body } => { records.iter().for_each(|r| walk_expr_tree(r, f)); walk_exprs_in_stmt(body, f); }
    StmtKind::Labeled { stmt, .. } => walk_exprs_in_stmt(stmt, f),
    StmtKind::Goto(_) => {}
  }
}

fn walk_expr_tree<'x>(e: &'x Expr, f: &mut impl FnMut(&'x Expr)) {
  f(e);
  match &e.k {
    ExprKind::UnaryOp { operand, .. } => walk_expr_tree(operand, f),
    ExprKind::BinaryOp { lhs, rhs, .. } => { walk_expr_tree(lhs, f); walk_expr_tree(rhs, f); }
    ExprKind::TypeConvert(inner) => walk_expr_tree(inner, f),
    ExprKind::FunctionCall { args, .. } => args.iter().for_each(|a| walk_expr_tree(&a.expr, f)),
    _ => {}
  }
}

fn walk_exprs_in_stmt_mut(s: &mut Stmt, f: &mut impl FnMut(&mut Expr)) {
  match &mut s.k {
    StmtKind::Block(stmts) => stmts.iter_mut().for_each(|st| walk_exprs_in_stmt_mut(st, f)),
    StmtKind::Assignment { rhs, .. } => walk_expr_tree_mut(rhs, f),
    StmtKind::If { cond, then_branch, else_branch, .. } => {
      walk_expr_tree_mut(cond, f);
      walk_exprs_in_stmt_mut(then_branch, f);
      if let Some(e) = else_branch { walk_exprs_in_stmt_mut(e, f); }
    }
    StmtKind::While { cond, body } | StmtKind::Repeat { body, cond } => {
      walk_expr_tree_mut(cond, f);
      walk_exprs_in_stmt_mut(body, f);
    }
    StmtKind::For { from, to, body, .. } => { walk_expr_tree_mut(from, f); walk_expr_tree_mut(to, f); walk_exprs_in_stmt_mut(body, f); }
    StmtKind::Case { selector, arms, otherwise } => {
      walk_expr_tree_mut(selector, f);
      for arm in arms { walk_exprs_in_stmt_mut(&mut arm.body, f); }
      if let Some(o) = otherwise { walk_exprs_in_stmt_mut(o, f); }
    }
    StmtKind::CallStmt { args, .. } => args.iter_mut().for_each(|a| walk_expr_tree_mut(&mut a.expr, f)),
    StmtKind::With { records, body } => { records.iter_mut().for_each(|r| walk_expr_tree_mut(r, f)); walk_exprs_in_stmt_mut(body, f); }
    StmtKind::Labeled { stmt, .. } => walk_exprs_in_stmt_mut(stmt, f),
    StmtKind::Goto(_) => {}
  }
}

fn walk_expr_tree_mut(e: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
  f(e);
  match &mut e.k {
    ExprKind::UnaryOp { operand, .. } => walk_expr_tree_mut(operand, f),
    ExprKind::BinaryOp { lhs, rhs, .. } => { walk_expr_tree_mut(lhs, f); walk_expr_tree_mut(rhs, f); }
    ExprKind::TypeConvert(inner) => walk_expr_tree_mut(inner, f),
    ExprKind::FunctionCall { args, .. } => args.iter_mut().for_each(|a| walk_expr_tree_mut(&mut a.expr, f)),
    _ => {}
  }
}

fn collect_binop_ops(stmt: &Stmt, want: impl Fn(BinOp) -> bool) -> Vec<BinOp> {
  let mut ops = Vec::new();
  walk_exprs_in_stmt(stmt, &mut |e| {
    if let ExprKind::BinaryOp { op, .. } = &e.k { if want(*op) { ops.push(*op); } }
  });
  ops
}

fn replace_binop_at(stmt: &mut Stmt, want: impl Fn(BinOp) -> bool, index: usize, new_op: BinOp) {
  let mut n = 0;
  walk_exprs_in_stmt_mut(stmt, &mut |e| {
    if let ExprKind::BinaryOp { op, .. } = &mut e.k {
      if want(*op) {
        if n == index { *op = new_op; }
        n += 1;
      }
    }
  });
}

/// The binop node itself (not just its operator) at the `index`-th site
/// matching `want`, for operators that need to replace or inspect the
/// whole node rather than swap its operator in place (cor's/aor's
/// operand-elimination mutants, ror's/aor's type inspection). Returns
/// the node's own resolved type alongside its operator and operands,
/// since aor classifies candidates by the binop's *result* type, not
/// either operand's.
fn nth_binop_site(stmt: &Stmt, want: impl Fn(BinOp) -> bool, index: usize) -> Option<(BinOp, Option<TypeId>, Expr, Expr)> {
  let mut n = 0;
  let mut found = None;
  walk_exprs_in_stmt(stmt, &mut |e| {
    if let ExprKind::BinaryOp { op, lhs, rhs } = &e.k {
      if want(*op) {
        if n == index { found = Some((*op, e.ty, (**lhs).clone(), (**rhs).clone())); }
        n += 1;
      }
    }
  });
  found
}

/// Replaces the whole `index`-th binop node matching `want` with
/// `replacement`, rather than just substituting its operator.
fn replace_binop_node_at(stmt: &mut Stmt, want: impl Fn(BinOp) -> bool, index: usize, replacement: Expr) {
  let mut n = 0;
  let mut replacement = Some(replacement);
  walk_exprs_in_stmt_mut(stmt, &mut |e| {
    let is_site = matches!(&e.k, ExprKind::BinaryOp { op, .. } if want(*op));
    if is_site {
      if n == index {
        if let Some(r) = replacement.take() { *e = r; }
      }
      n += 1;
    }
  });
}

/// A `true`/`false` literal of type `bool_ty`, modelled the same way
/// the typer installs the `true`/`false` constants: a `VarLoad` of the
/// builtin name, so a mutant's condition reads exactly like
/// hand-written Pascal rather than some synthetic literal node.
fn bool_const(span: &Span, bool_ty: TypeId, value: bool) -> Expr {
  let name = if value { "true" } else { "false" };
  Expr { span: span.clone(), ty: Some(bool_ty), k: ExprKind::VarLoad(crate::ast::Access::Var(name.into())) }
}

/// True when `e` is itself a bare reference to the `true`/`false`
/// builtin constant, the one shape this crate's AST gives a boolean
/// literal (spec §9: no dedicated bool-literal `ExprKind`). Operators
/// that skip already-constant operands check this rather than a
/// `Type::value` field, since `Type::Bool` carries none.
fn is_bool_const_ref(e: &Expr) -> bool {
  matches!(&e.k, ExprKind::VarLoad(crate::ast::Access::Var(name)) if name.eq_ignore_ascii_case("true") || name.eq_ignore_ascii_case("false"))
}

fn is_bool_type(arena: &TypeArena, ty: TypeId) -> bool { matches!(arena.get(ty), Type::Bool) }

fn is_set_type(arena: &TypeArena, ty: TypeId) -> bool { matches!(arena.get(ty), Type::Set { .. } | Type::EmptySet) }

/// The literal integer value of `e`, if it is one — used to detect
/// equivalent mutants (ror's constant-bound suppression, aor's
/// already-zero operand suppression) the same way the original inspects
/// a folded constant's `.value`.
fn literal_int(e: &Expr) -> Option<i64> {
  match &e.k {
    ExprKind::Integer(n) => Some(*n),
    _ => None,
  }
}

/// The inclusive bounds of an ordinal type, where it has one, used by
/// ror's equivalence-detection suppression (`Type::Bool` has none,
/// which is exactly what excludes boolean operands from it).
fn int_bounds(arena: &TypeArena, ty: TypeId) -> Option<(i64, i64)> {
  match arena.get(ty) {
    Type::Int { lo, hi, .. } | Type::IntRange { lo, hi, .. } => Some((*lo, *hi)),
    Type::CharRange { lo, hi } => Some((i64::from(*lo), i64::from(*hi))),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::Access;
  use crate::diag::Span;
  use crate::types::ty::{Type, TypeArena};

  fn span() -> Span { Span::new("t.pas".into(), 1, 0, 10) }

  fn int_expr(n: i64) -> Expr { Expr { span: span(), ty: None, k: ExprKind::Integer(n) } }
  fn var_expr(name: &str) -> Expr { Expr { span: span(), ty: None, k: ExprKind::VarLoad(Access::Var(name.into())) } }

  #[test]
  fn sdl_deletes_every_statement_but_the_last() {
    let mut arena = TypeArena::new();
    let bool_ty = arena.alloc(Type::Bool);
    let int_ty = arena.alloc(Type::Int { signed: true, width: 16, lo: -32768, hi: 32767, value: None });
    let assign = |name: &str| Stmt { span: span(), ty: None, k: StmtKind::Assignment { lhs: Access::Var(name.into()), rhs: int_expr(1) } };
    let mut body = Stmt::block(span(), vec![assign("a"), assign("b"), assign("c")]);
    let mut report = MutationReport::new("Statement deletion", "t.pas", "deadbeef");
    let mut pass = MutationPass::new("m", MutationOp::Sdl, &mut report, &arena, bool_ty, int_ty);
    pass.run(&mut body);
    assert_eq!(report.mutants.len(), 2);
    let StmtKind::Block(stmts) = &body.k else { panic!("expected block") };
    assert!(matches!(stmts[0].k, StmtKind::If { .. }));
    assert!(matches!(stmts[1].k, StmtKind::If { .. }));
    assert!(matches!(stmts[2].k, StmtKind::Assignment { .. }));
  }

  #[test]
  fn ror_produces_three_mutants_for_one_comparison() {
    let mut arena = TypeArena::new();
    let bool_ty = arena.alloc(Type::Bool);
    let int_ty = arena.alloc(Type::Int { signed: true, width: 16, lo: -32768, hi: 32767, value: None });
    let cond = Expr { span: span(), ty: Some(bool_ty), k: ExprKind::BinaryOp { op: BinOp::Gt, lhs: Box::new(var_expr("x")), rhs: Box::new(int_expr(0)) } };
    let then_branch = Box::new(Stmt { span: span(), ty: None, k: StmtKind::Assignment { lhs: Access::Var("x".into()), rhs: int_expr(1) } });
    let mut stmt = Stmt { span: span(), ty: None, k: StmtKind::If { cond, then_branch, else_branch: None, hint: None } };
    let mut report = MutationReport::new("Relational Operator Replacement", "t.pas", "deadbeef");
    let mut pass = MutationPass::new("m", MutationOp::Ror, &mut report, &arena, bool_ty, int_ty);
    pass.run(&mut stmt);
    assert_eq!(report.mutants.len(), 3);
  }

  #[test]
  fn sc_bombs_every_statement_in_a_block() {
    let mut arena = TypeArena::new();
    let bool_ty = arena.alloc(Type::Bool);
    let int_ty = arena.alloc(Type::Int { signed: true, width: 16, lo: -32768, hi: 32767, value: None });
    let assign = |name: &str| Stmt { span: span(), ty: None, k: StmtKind::Assignment { lhs: Access::Var(name.into()), rhs: int_expr(1) } };
    let mut body = Stmt::block(span(), vec![assign("a"), assign("b")]);
    let mut report = MutationReport::new("Statement Coverage", "t.pas", "deadbeef");
    let mut pass = MutationPass::new("m", MutationOp::Sc, &mut report, &arena, bool_ty, int_ty);
    pass.run(&mut body);
    assert_eq!(report.mutants.len(), 2);
    let StmtKind::Block(stmts) = &body.k else { panic!("expected block") };
    for st in stmts { assert!(matches!(st.k, StmtKind::If { .. }), "each statement should be preceded by a halt guard"); }
  }
}
