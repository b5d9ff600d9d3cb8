//! cor: conditional operator replacement. Every `and`/`or` connective
//! gets four mutants: the relational collapse (`and`→`=`, `or`→`<>`),
//! the absorbing-constant collapse (`and`→`false`, `or`→`true`), and
//! the two operand-elimination mutants that drop the connective down to
//! just its left or right operand — the case where a connective was
//! written but only one operand was meant to stand alone, formerly (and
//! wrongly) implemented in `sc`. Grounded in the original `mutation.py`'s
//! `CorMutationVisitor._MUTANT` table: `{'and': ['=', 'false', 'left',
//! 'right'], 'or': ['<>', 'true', 'left', 'right']}`. The original
//! builds `left`/`right` by splicing an identity-element literal into
//! the eliminated operand's position; this crate collapses the node to
//! the surviving operand directly, the same observable mutant with one
//! fewer synthesized constant.

use crate::ast::{BinOp, Expr, Stmt};
use crate::types::ty::TypeId;
use super::{bool_const, collect_binop_ops, guard, nth_binop_site, replace_binop_at, replace_binop_node_at, MutationOp, MutationPass};

pub(super) fn maybe_mutate(pass: &mut MutationPass, stmt: &mut Stmt) {
  let ops = collect_binop_ops(stmt, BinOp::is_conditional);
  let mut result: Option<Stmt> = None;
  for (index, &original_op) in ops.iter().enumerate() {
    let Some((_, _, lhs, rhs)) = nth_binop_site(stmt, BinOp::is_conditional, index) else { continue };
    for (text, subst) in alternatives(original_op, pass.bool_ty, &lhs, &rhs) {
      let mut mutant = stmt.clone();
      match subst {
        Subst::Op(new_op) => replace_binop_at(&mut mutant, BinOp::is_conditional, index, new_op),
        Subst::Node(expr) => replace_binop_node_at(&mut mutant, BinOp::is_conditional, index, expr),
      }
      let base = result.take().unwrap_or_else(|| stmt.clone());
      let span = stmt.span.clone();
      result = Some(guard(pass, &span, MutationOp::Cor, original_op.symbol().to_string(), text, base, mutant));
    }
  }
  if let Some(r) = result { *stmt = r; }
}

enum Subst { Op(BinOp), Node(Expr) }

fn alternatives(op: BinOp, bool_ty: TypeId, lhs: &Expr, rhs: &Expr) -> Vec<(String, Subst)> {
  let (swapped, absorbing) = match op {
    BinOp::And => (BinOp::Eq, false),
    BinOp::Or => (BinOp::Ne, true),
    _ => return Vec::new(),
  };
  vec![
    (swapped.symbol().to_string(), Subst::Op(swapped)),
    (absorbing.to_string(), Subst::Node(bool_const(&lhs.span, bool_ty, absorbing))),
    ("left".into(), Subst::Node(lhs.clone())),
    ("right".into(), Subst::Node(rhs.clone())),
  ]
}
