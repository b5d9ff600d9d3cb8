//! Pure constant folding over the typed AST, grounded in the original
//! `typesys.py`'s `ConstantEvalVisitor`. Used by the typer to evaluate
//! `const` declarations and `case` labels, and by `aor`'s zero-identity
//! suppression and `ror`'s equivalent-mutant detection.

use crate::ast::{Access, BinOp, Expr, ExprKind, UnaryOp};
use crate::diag::TypeError;
use crate::symtab::SymbolTable;

/// A folded constant value. Strings/chars are folded so `case`/`const`
/// can reference character literals, but most folding targets `Int`.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
  Int(i64),
  Real(f64),
  Bool(bool),
  Char(u8),
  Str(String),
}

impl ConstValue {
  #[must_use] pub fn as_int(&self) -> Option<i64> {
    match self {
      ConstValue::Int(v) => Some(*v),
      ConstValue::Bool(b) => Some(i64::from(*b)),
      ConstValue::Char(c) => Some(i64::from(*c)),
      ConstValue::Real(_) | ConstValue::Str(_) => None,
    }
  }
  #[must_use] pub fn as_bool(&self) -> Option<bool> {
    match self { ConstValue::Bool(b) => Some(*b), ConstValue::Int(v) => Some(*v != 0), _ => None }
  }
}

/// Fold `expr` to a constant, or raise `IllegalConstantExpression` per
/// spec §4.2.4 the moment a non-const subtree is reached (variable
/// loads of anything other than a previously-installed constant,
/// function calls, etc.).
pub fn eval_const(expr: &Expr, symtab: &SymbolTable) -> Result<ConstValue, TypeError> {
  match &expr.k {
    ExprKind::Integer(v) => Ok(ConstValue::Int(*v)),
    ExprKind::Real(v) => Ok(ConstValue::Real(*v)),
    ExprKind::CharLit(c) => Ok(ConstValue::Char(*c)),
    ExprKind::Str(s) => Ok(ConstValue::Str(s.clone())),
    ExprKind::TypeConvert(inner) => eval_const(inner, symtab),
    ExprKind::UnaryOp { op, operand } => {
      let v = eval_const(operand, symtab)?;
      match op {
        UnaryOp::Pos => Ok(v),
        UnaryOp::Neg => match v {
          ConstValue::Int(i) => Ok(ConstValue::Int(-i)),
          ConstValue::Real(r) => Ok(ConstValue::Real(-r)),
          _ => Err(TypeError::IllegalConstantExpression),
        },
        UnaryOp::Not => match v {
          ConstValue::Bool(b) => Ok(ConstValue::Bool(!b)),
          ConstValue::Int(i) => Ok(ConstValue::Int(!i)),
          _ => Err(TypeError::IllegalConstantExpression),
        },
      }
    }
    ExprKind::BinaryOp { op, lhs, rhs } => {
      let l = eval_const(lhs, symtab)?;
      let r = eval_const(rhs, symtab)?;
      eval_binop(*op, &l, &r)
    }
    ExprKind::VarLoad(Access::Var(name)) => symtab.find_const(name)
      .map_err(|_| TypeError::IllegalConstantExpression),
    _ => Err(TypeError::IllegalConstantExpression),
  }
}

fn eval_binop(op: BinOp, l: &ConstValue, r: &ConstValue) -> Result<ConstValue, TypeError> {
  use ConstValue::{Bool, Int, Real};
  let err = || TypeError::IllegalConstantExpression;
  match op {
    BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Slash | BinOp::Div | BinOp::Mod => {
      if let (Some(a), Some(b)) = (real_of(l), real_of(r)) {
        if matches!(l, Real(_)) || matches!(r, Real(_)) || op == BinOp::Slash {
          return Ok(Real(apply_real(op, a, b).ok_or_else(err)?));
        }
        let (a, b) = (l.as_int().ok_or_else(err)?, r.as_int().ok_or_else(err)?);
        Ok(Int(apply_int(op, a, b).ok_or_else(err)?))
      } else { Err(err()) }
    }
    BinOp::And => Ok(Bool(l.as_bool().ok_or_else(err)? && r.as_bool().ok_or_else(err)?)),
    BinOp::Or => Ok(Bool(l.as_bool().ok_or_else(err)? || r.as_bool().ok_or_else(err)?)),
    BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
      let (a, b) = (l.as_int().ok_or_else(err)?, r.as_int().ok_or_else(err)?);
      Ok(Bool(match op {
        BinOp::Eq => a == b, BinOp::Ne => a != b, BinOp::Lt => a < b,
        BinOp::Le => a <= b, BinOp::Gt => a > b, BinOp::Ge => a >= b,
        BinOp::In => unreachable!(),
        _ => unreachable!(),
      }))
    }
    BinOp::In => Err(err()),
  }
}

fn real_of(v: &ConstValue) -> Option<f64> {
  match v { ConstValue::Real(r) => Some(*r), ConstValue::Int(i) => Some(*i as f64), _ => None }
}

fn apply_real(op: BinOp, a: f64, b: f64) -> Option<f64> {
  match op {
    BinOp::Add => Some(a + b), BinOp::Sub => Some(a - b), BinOp::Mul => Some(a * b),
    BinOp::Slash => Some(a / b), _ => None,
  }
}

fn apply_int(op: BinOp, a: i64, b: i64) -> Option<i64> {
  match op {
    BinOp::Add => a.checked_add(b), BinOp::Sub => a.checked_sub(b), BinOp::Mul => a.checked_mul(b),
    BinOp::Div => a.checked_div(b), BinOp::Mod => a.checked_rem(b), _ => None,
  }
}
