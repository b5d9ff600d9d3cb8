//! `with`-statement lowering: installs a scope hook mapping each field
//! of the named record to a `base + offset` address, so a bare field
//! name inside the body lowers straight to that address instead of
//! being looked up as an ordinary global (spec §4.6.5). The typer's
//! `install_with_record` already made the field names visible to type
//! resolution; this is the lowering-time counterpart that makes them
//! visible to address computation. Grounded in the original
//! `codegen.py`'s `visit_WithNode`.

use crate::ast::{Expr, ExprKind};
use crate::diag::Diagnostic;
use crate::types::ty::Type;
use super::expr::{lower_access, lower_expr};
use super::record;
use super::Lowering;

fn address_of(lw: &mut Lowering, r: &Expr) -> Result<super::Value, Diagnostic> {
  match &r.k {
    ExprKind::VarLoad(access) | ExprKind::VarReference(access) => lower_access(lw, access),
    _ => lower_expr(lw, r),
  }
}

pub fn install_with_scope(lw: &mut Lowering, r: &Expr) -> Result<(), Diagnostic> {
  let base_addr = address_of(lw, r)?;
  let mut hook = std::collections::HashMap::new();
  if let Some(rec_ty) = r.ty {
    let rec_ty = lw.arena.resolve(rec_ty);
    if let Type::Record { fields, variant } = lw.arena.get(rec_ty).clone() {
      for f in &fields {
        if let Some(off) = record::field_offset(lw.arena, rec_ty, &f.name) {
          hook.insert(f.name.clone(), format!("gep {base_addr}, +{off}"));
        }
      }
      if let Some(v) = variant {
        if let Type::Variant { selector, cases } = lw.arena.get(v).clone() {
          if let Some(off) = record::field_offset(lw.arena, rec_ty, &selector.name) {
            hook.insert(selector.name.clone(), format!("gep {base_addr}, +{off}"));
          }
          for case in &cases {
            if let Type::Record { fields, .. } = lw.arena.get(case.record).clone() {
              for f in &fields {
                if let Some(off) = record::field_offset(lw.arena, rec_ty, &f.name) {
                  hook.insert(f.name.clone(), format!("gep {base_addr}, +{off}"));
                }
              }
            }
          }
        }
      }
    }
  }
  lw.push_with_hook(hook);
  Ok(())
}
