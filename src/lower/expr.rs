//! Expression lowering: turns a typed [`Expr`] into a sequence of
//! emitted instructions plus the [`Value`] holding its result.
//! Grounded in the original `codegen.py`'s `visit_*` expression
//! methods, which build one LLVM value per node and thread it back to
//! the caller the same way `lower_expr` returns a [`Value`] here.

use crate::ast::{Access, BinOp, Expr, ExprKind, UnaryOp};
use crate::diag::Diagnostic;
use crate::types::ty::{Type, TypeId};
use super::call;
use super::record;
use super::{Lowering, Value};

/// Recovers the type an `Access` chain denotes by re-deriving it from
/// the symbol table and arena the same way the typer's `type_access`
/// does, since `Access` itself carries no type (only the `Expr` that
/// wraps the outermost one does).
fn access_type(lw: &Lowering, a: &Access) -> Option<TypeId> {
  match a {
    Access::Var(name) => lw.symtab.find_symbol(name).ok().map(|s| s.ty),
    Access::Indexed { base, .. } => Some(lw.arena.resolve(access_type(lw, base)?)),
    Access::Field { base, field } => {
      let bt = lw.arena.resolve(access_type(lw, base)?);
      match lw.arena.get(bt) {
        Type::Record { fields, variant } => {
          if let Some(f) = fields.iter().find(|f| &f.name == field) { return Some(f.ty); }
          let v = (*variant)?;
          if let Type::Variant { selector, cases } = lw.arena.get(v) {
            if &selector.name == field { return Some(selector.ty); }
            for c in cases {
              if let Type::Record { fields, .. } = lw.arena.get(c.record) {
                if let Some(f) = fields.iter().find(|f| &f.name == field) { return Some(f.ty); }
              }
            }
          }
          None
        }
        _ => None,
      }
    }
    Access::PointerDeref { base } => {
      let bt = lw.arena.resolve(access_type(lw, base)?);
      match lw.arena.get(bt) {
        Type::Pointer { pointee } | Type::Reference { referee: pointee } => Some(*pointee),
        _ => None,
      }
    }
  }
}

/// Lowers an lvalue to the *address* it denotes, without loading
/// through it. Used directly by assignment, `with`, and
/// call-by-reference argument passing; [`lower_expr`] calls this and
/// then emits a `load` for ordinary reads.
pub fn lower_access(lw: &mut Lowering, a: &Access) -> Result<Value, Diagnostic> {
  match a {
    Access::Var(name) => match lw.lookup_with_hook(name) {
      Some(hook) => Ok(Value::immediate(hook.to_owned())),
      None => Ok(Value::immediate(format!("@{name}"))),
    },
    Access::Indexed { base, index } => {
      let base_addr = lower_access(lw, base)?;
      let idx = lower_expr(lw, index)?;
      let base_ty = access_type(lw, base);
      let elem_bytes = base_ty.map_or(1, |t| record::element_width_bytes(lw.arena, t));
      let t = lw.new_temp();
      lw.emit(format!("{t} = gep {base_addr}, {idx} * {elem_bytes}"));
      Ok(t)
    }
    Access::Field { base, field } => {
      let base_addr = lower_access(lw, base)?;
      let base_ty = access_type(lw, base);
      let offset = base_ty.and_then(|t| record::field_offset(lw.arena, t, field)).unwrap_or(0);
      let t = lw.new_temp();
      lw.emit(format!("{t} = gep {base_addr}, +{offset}"));
      Ok(t)
    }
    Access::PointerDeref { base } => {
      let base_addr = lower_access(lw, base)?;
      let t = lw.new_temp();
      lw.emit(format!("{t} = load ptr, {base_addr}"));
      Ok(t)
    }
  }
}

pub fn lower_expr(lw: &mut Lowering, e: &Expr) -> Result<Value, Diagnostic> {
  let ty_text = e.ty.map(|t| lw.arena.id_string(t)).unwrap_or_default();
  match &e.k {
    ExprKind::Integer(n) => Ok(Value::immediate(n.to_string())),
    ExprKind::Real(r) => Ok(Value::immediate(format!("{r}"))),
    ExprKind::Str(s) => Ok(Value::immediate(format!("{s:?}"))),
    ExprKind::CharLit(c) => Ok(Value::immediate(format!("'{}'", char::from(*c)))),
    ExprKind::Null => Ok(Value::immediate("null")),
    ExprKind::SetEmpty => Ok(Value::immediate("0")),
    ExprKind::Set(members) => {
      let t = lw.new_temp();
      lw.emit(format!("{t} = alloca bitset ; {ty_text}"));
      for m in members {
        let lo = lower_expr(lw, &m.lo)?;
        if let Some(hi) = &m.hi {
          let hi = lower_expr(lw, hi)?;
          lw.emit(format!("{t} |= setrange {lo}, {hi}"));
        } else {
          lw.emit(format!("{t} |= setbit {lo}"));
        }
      }
      Ok(t)
    }
    ExprKind::VarLoad(access) => {
      let addr = lower_access(lw, access)?;
      let t = lw.new_temp();
      lw.emit(format!("{t} = load {ty_text}, {addr}"));
      Ok(t)
    }
    ExprKind::VarReference(access) => lower_access(lw, access),
    ExprKind::UnaryOp { op, operand } => {
      let v = lower_expr(lw, operand)?;
      let t = lw.new_temp();
      let mnemonic = match op { UnaryOp::Neg => "neg", UnaryOp::Pos => "mov", UnaryOp::Not => "not" };
      lw.emit(format!("{t} = {mnemonic} {v}"));
      Ok(t)
    }
    ExprKind::BinaryOp { op, lhs, rhs } => {
      let l = lower_expr(lw, lhs)?;
      let r = lower_expr(lw, rhs)?;
      let t = lw.new_temp();
      lw.emit(format!("{t} = {} {l}, {r}", mnemonic_for(*op)));
      Ok(t)
    }
    ExprKind::FunctionCall { name, args } => call::lower_call(lw, name, args, &e.span),
    ExprKind::TypeConvert(inner) => {
      let v = lower_expr(lw, inner)?;
      let t = lw.new_temp();
      lw.emit(format!("{t} = convert {v} to {ty_text}"));
      Ok(t)
    }
  }
}

fn mnemonic_for(op: BinOp) -> &'static str {
  match op {
    BinOp::Add => "add", BinOp::Sub => "sub", BinOp::Mul => "mul",
    BinOp::Slash => "fdiv", BinOp::Div => "sdiv", BinOp::Mod => "srem",
    BinOp::And => "and", BinOp::Or => "or",
    BinOp::Eq => "icmp eq", BinOp::Ne => "icmp ne", BinOp::Lt => "icmp lt",
    BinOp::Le => "icmp le", BinOp::Gt => "icmp gt", BinOp::Ge => "icmp ge",
    BinOp::In => "setcontains",
  }
}
