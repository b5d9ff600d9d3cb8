//! Call-by-reference fixup (spec §4.4): a second walk that rewrites
//! `VarLoad` arguments into `VarReference` wherever the callee's
//! parameter is declared `Reference{…}`, grounded in the original
//! `typesys.py`'s `CallByRefVisitor`.

use crate::ast::{Access, Argument, Expr, ExprKind, Stmt, StmtKind};
use crate::types::builtins::Builtin;
use crate::types::ty::{Type, TypeArena, TypeId};

/// Per-function table of parameter kinds, built once from the typed
/// program so the fixup pass doesn't need to re-resolve each callee on
/// every call site. Built from [`crate::typer::Typer::function_types`]
/// rather than the symbol table directly, since a module's or nested
/// function's scope (and with it, the symbol table's record of its own
/// functions) is already gone by the time typing finishes.
pub struct ByRefTable {
  by_ref: std::collections::HashMap<String, Vec<bool>>,
}

impl ByRefTable {
  #[must_use] pub fn build(arena: &TypeArena, function_types: &std::collections::HashMap<String, TypeId>) -> Self {
    let mut by_ref = std::collections::HashMap::new();
    for (name, &ty) in function_types {
      if let Type::Function { params, .. } = arena.get(ty) {
        by_ref.insert(name.clone(), params.iter()
          .map(|p| matches!(arena.get(p.ty), Type::Reference { .. })).collect());
      }
    }
    Self { by_ref }
  }

  fn is_by_ref(&self, name: &str, index: usize) -> bool {
    if let Some(b) = Builtin::from_str(name) {
      if b.always_by_ref() { return true; }
    }
    self.by_ref.get(name).and_then(|v| v.get(index)).copied().unwrap_or(false)
  }
}

pub fn fixup_stmt(table: &ByRefTable, s: &mut Stmt) {
  match &mut s.k {
    StmtKind::Block(stmts) => stmts.iter_mut().for_each(|st| fixup_stmt(table, st)),
    StmtKind::Assignment { rhs, .. } => fixup_expr(table, rhs),
    StmtKind::If { cond, then_branch, else_branch, .. } => {
      fixup_expr(table, cond);
      fixup_stmt(table, then_branch);
      if let Some(e) = else_branch { fixup_stmt(table, e); }
    }
    StmtKind::While { cond, body } | StmtKind::Repeat { body, cond } => {
      fixup_expr(table, cond);
      fixup_stmt(table, body);
    }
    StmtKind::For { from, to, body, .. } => {
      fixup_expr(table, from);
      fixup_expr(table, to);
      fixup_stmt(table, body);
    }
    StmtKind::Case { selector, arms, otherwise } => {
      fixup_expr(table, selector);
      for arm in arms { fixup_stmt(table, &mut arm.body); }
      if let Some(o) = otherwise { fixup_stmt(table, o); }
    }
    StmtKind::CallStmt { name, args } => fixup_args(table, name, args),
    StmtKind::With { records, body } => {
      for r in records { fixup_expr(table, r); }
      fixup_stmt(table, body);
    }
    StmtKind::Goto(_) => {}
    StmtKind::Labeled { stmt, .. } => fixup_stmt(table, stmt),
  }
}

fn fixup_expr(table: &ByRefTable, e: &mut Expr) {
  match &mut e.k {
    ExprKind::UnaryOp { operand, .. } => fixup_expr(table, operand),
    ExprKind::BinaryOp { lhs, rhs, .. } => { fixup_expr(table, lhs); fixup_expr(table, rhs); }
    ExprKind::TypeConvert(inner) => fixup_expr(table, inner),
    ExprKind::FunctionCall { name, args } => fixup_args(table, name, args),
    ExprKind::VarLoad(_) | ExprKind::VarReference(_) | ExprKind::Integer(_) | ExprKind::Real(_)
    | ExprKind::Str(_) | ExprKind::CharLit(_) | ExprKind::Set(_) | ExprKind::SetEmpty | ExprKind::Null => {}
  }
}

fn fixup_args(table: &ByRefTable, name: &str, args: &mut [Argument]) {
  for (i, a) in args.iter_mut().enumerate() {
    fixup_expr(table, &mut a.expr);
    if table.is_by_ref(name, i) {
      if let ExprKind::VarLoad(access) = &a.expr.k {
        let access = access_clone(access);
        let ty = a.expr.ty;
        a.expr.k = ExprKind::VarReference(access);
        a.expr.ty = ty;
      }
    }
  }
}

fn access_clone(a: &Access) -> Access {
  match a {
    Access::Var(n) => Access::Var(n.clone()),
    Access::Indexed { base, index } => Access::Indexed { base: Box::new(access_clone(base)), index: index.clone() },
    Access::Field { base, field } => Access::Field { base: Box::new(access_clone(base)), field: field.clone() },
    Access::PointerDeref { base } => Access::PointerDeref { base: Box::new(access_clone(base)) },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::diag::Span;

  fn span() -> Span { Span::new("t.pas".into(), 1, 0, 0) }

  #[test]
  fn read_always_rewrites_varload_to_varreference() {
    let table = ByRefTable { by_ref: std::collections::HashMap::new() };
    let mut args = vec![Argument { expr: Expr::new(span(), ExprKind::VarLoad(Access::Var("x".into()))) }];
    fixup_args(&table, "read", &mut args);
    assert!(matches!(args[0].expr.k, ExprKind::VarReference(_)));
  }

  #[test]
  fn non_reference_param_is_untouched() {
    let table = ByRefTable { by_ref: std::collections::HashMap::new() };
    let mut args = vec![Argument { expr: Expr::new(span(), ExprKind::VarLoad(Access::Var("x".into()))) }];
    fixup_args(&table, "foo", &mut args);
    assert!(matches!(args[0].expr.k, ExprKind::VarLoad(_)));
  }
}
