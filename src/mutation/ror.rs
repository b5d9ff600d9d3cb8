//! ror: relational operator replacement. Every relational comparison
//! gets exactly three mutants from a fixed per-operator table, each
//! table always including one constant (`true` or `false`) alongside
//! two narrower relational substitutions. Skips `Set`-typed operands
//! entirely (the original has no substitution table for set membership
//! comparisons) and suppresses a `=`-to-`>=`/`<=` substitution when the
//! non-literal operand's bound makes it an equivalent mutant (`x >=
//! hi` can never differ from `x = hi` when `x`'s type tops out at
//! `hi`, and symmetrically for `<=`/`lo`). Grounded in the original
//! `mutation.py`'s `RorMutationVisitor._MUTANT` table and its
//! `detect_equivalent_mutant`.

use crate::ast::{BinOp, Expr, Stmt};
use crate::diag::Span;
use crate::types::ty::{TypeArena, TypeId};
use super::{bool_const, collect_binop_ops, guard, int_bounds, is_set_type, literal_int, nth_binop_site, replace_binop_at, replace_binop_node_at, MutationOp, MutationPass};

pub(super) fn maybe_mutate(pass: &mut MutationPass, stmt: &mut Stmt) {
  let ops = collect_binop_ops(stmt, BinOp::is_relational);
  let mut result: Option<Stmt> = None;
  for (index, &original_op) in ops.iter().enumerate() {
    let Some((_, _, lhs, rhs)) = nth_binop_site(stmt, BinOp::is_relational, index) else { continue };
    if is_set_operand(pass.arena, &lhs) || is_set_operand(pass.arena, &rhs) { continue; }
    let span = stmt.span.clone();
    for (text, subst) in candidates(original_op, pass.bool_ty, &span) {
      if is_equivalent_mutant(pass.arena, original_op, &subst, &lhs, &rhs) { continue; }
      let mut mutant = stmt.clone();
      match subst {
        Subst::Op(new_op) => replace_binop_at(&mut mutant, BinOp::is_relational, index, new_op),
        Subst::Node(expr) => replace_binop_node_at(&mut mutant, BinOp::is_relational, index, expr),
      }
      let base = result.take().unwrap_or_else(|| stmt.clone());
      result = Some(guard(pass, &span, MutationOp::Ror, original_op.symbol().to_string(), text, base, mutant));
    }
  }
  if let Some(r) = result { *stmt = r; }
}

fn is_set_operand(arena: &TypeArena, e: &Expr) -> bool {
  e.ty.is_some_and(|ty| is_set_type(arena, ty))
}

enum Subst { Op(BinOp), Node(Expr) }

fn candidates(op: BinOp, bool_ty: TypeId, span: &Span) -> Vec<(String, Subst)> {
  let (a, b, const_value) = match op {
    BinOp::Gt => (BinOp::Le, BinOp::Ne, false),
    BinOp::Lt => (BinOp::Ge, BinOp::Ne, false),
    BinOp::Le => (BinOp::Lt, BinOp::Eq, true),
    BinOp::Ge => (BinOp::Gt, BinOp::Eq, true),
    BinOp::Eq => (BinOp::Ge, BinOp::Le, false),
    BinOp::Ne => (BinOp::Lt, BinOp::Gt, true),
    _ => return Vec::new(),
  };
  vec![
    (a.symbol().to_string(), Subst::Op(a)),
    (b.symbol().to_string(), Subst::Op(b)),
    (const_value.to_string(), Subst::Node(bool_const(span, bool_ty, const_value))),
  ]
}

/// `x = hi` never differs from `x >= hi` when `x`'s type cannot exceed
/// `hi`; symmetrically `x = lo` never differs from `x <= lo`. Only
/// reachable for `=`'s own two operator-swap candidates, and naturally
/// never for a `Bool`-typed operand (`Type::Bool` carries no bounds).
fn is_equivalent_mutant(arena: &TypeArena, original_op: BinOp, subst: &Subst, lhs: &Expr, rhs: &Expr) -> bool {
  if original_op != BinOp::Eq { return false; }
  let Subst::Op(cand) = subst else { return false };
  if *cand != BinOp::Ge && *cand != BinOp::Le { return false; }
  let Some((literal, other)) = literal_int(lhs).map(|n| (n, rhs)).or_else(|| literal_int(rhs).map(|n| (n, lhs))) else { return false };
  let Some(ty) = other.ty else { return false };
  let Some((lo, hi)) = int_bounds(arena, ty) else { return false };
  if *cand == BinOp::Ge { literal == hi } else { literal == lo }
}
