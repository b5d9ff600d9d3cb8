//! aor: arithmetic operator replacement. Candidates are gated by the
//! binop node's own result type (`IntType` → the other four of
//! `+ - * div mod`, `RealType` → the other three of `+ - * /`, `SetType`
//! → the other two of `+ - *`), plus two operand-elimination mutants
//! that zero one operand (the additive identity for that type) and
//! force the operator to `+` — collapsed here to a direct whole-node
//! replacement with the surviving operand, since `0 + x` and `x + 0`
//! are exactly `x`. Suppressed when the operand being eliminated is
//! already a literal zero/0.0/empty-set (the resulting mutant would be
//! equivalent to the original). Grounded in the original `mutation.py`'s
//! `AorMutationVisitor._MUTANT`/`_VALID_COMBO` tables, whose `IntType`
//! entry excludes plain `/` because a `Slash`-operator node is always
//! upcast to `Real` before this pass ever sees it (SPEC_FULL §4.2.6),
//! so an `Int`-result binop can never actually carry that operator.

use crate::ast::{BinOp, Expr, ExprKind, Stmt};
use crate::types::ty::{Type, TypeArena, TypeId};
use super::{collect_binop_ops, guard, nth_binop_site, replace_binop_at, replace_binop_node_at, MutationOp, MutationPass};

pub(super) fn maybe_mutate(pass: &mut MutationPass, stmt: &mut Stmt) {
  let ops = collect_binop_ops(stmt, BinOp::is_arithmetic);
  let mut result: Option<Stmt> = None;
  for (index, &original_op) in ops.iter().enumerate() {
    let Some((_, ty, lhs, rhs)) = nth_binop_site(stmt, BinOp::is_arithmetic, index) else { continue };
    let Some(kind) = ty.and_then(|t| classify(pass.arena, t)) else { continue };
    for (text, subst) in candidates(kind, original_op, &lhs, &rhs) {
      let mut mutant = stmt.clone();
      match subst {
        Subst::Op(new_op) => replace_binop_at(&mut mutant, BinOp::is_arithmetic, index, new_op),
        Subst::Node(expr) => replace_binop_node_at(&mut mutant, BinOp::is_arithmetic, index, expr),
      }
      let base = result.take().unwrap_or_else(|| stmt.clone());
      let span = stmt.span.clone();
      result = Some(guard(pass, &span, MutationOp::Aor, original_op.symbol().to_string(), text, base, mutant));
    }
  }
  if let Some(r) = result { *stmt = r; }
}

#[derive(Copy, Clone)]
enum Kind { Int, Real, Set }

fn classify(arena: &TypeArena, ty: TypeId) -> Option<Kind> {
  match arena.get(ty) {
    Type::Int { .. } | Type::IntRange { .. } | Type::Enum { .. } | Type::Char { .. } | Type::CharRange { .. } => Some(Kind::Int),
    Type::Real { .. } => Some(Kind::Real),
    Type::Set { .. } | Type::EmptySet => Some(Kind::Set),
    _ => None,
  }
}

fn family_ops(kind: Kind) -> &'static [BinOp] {
  match kind {
    Kind::Int => &[BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div, BinOp::Mod],
    Kind::Real => &[BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Slash],
    Kind::Set => &[BinOp::Add, BinOp::Sub, BinOp::Mul],
  }
}

enum Subst { Op(BinOp), Node(Expr) }

fn candidates(kind: Kind, original_op: BinOp, lhs: &Expr, rhs: &Expr) -> Vec<(String, Subst)> {
  let mut out: Vec<(String, Subst)> = family_ops(kind).iter()
    .filter(|&&op| op != original_op)
    .map(|&op| (op.symbol().to_string(), Subst::Op(op)))
    .collect();
  if !is_zero_identity(kind, lhs) { out.push(("(* NOP *)".into(), Subst::Node(rhs.clone()))); }
  if !is_zero_identity(kind, rhs) { out.push(("(* NOP *)".into(), Subst::Node(lhs.clone()))); }
  out
}

fn is_zero_identity(kind: Kind, e: &Expr) -> bool {
  match (kind, &e.k) {
    (Kind::Int, ExprKind::Integer(0)) => true,
    (Kind::Real, ExprKind::Real(r)) => *r == 0.0,
    (Kind::Set, ExprKind::SetEmpty) => true,
    _ => false,
  }
}
