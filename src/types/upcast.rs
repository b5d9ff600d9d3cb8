//! Arithmetic/relational upcast and assignment downcast rules
//! (spec §4.2.1–§4.2.3), grounded in the original `typesys.py`'s
//! `upcast`/`upcast_arithmetic`/`upcast_relational`/`downcast_assignment`
//! family of free functions.

use crate::diag::TypeError;
use crate::types::ty::{Type, TypeArena, TypeId};

/// Binary operator kinds relevant to upcasting. `Div`/`Mod` are the
/// Pascal keyword operators `div`/`mod`; `Slash` is `/`, which always
/// yields `TempReal`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithOp { Add, Sub, Mul, Slash, Div, Mod }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RelOp { Eq, Ne, Lt, Le, Gt, Ge, In }

const TEMPREAL_WIDTH: u8 = 80;

fn is_real(arena: &TypeArena, id: TypeId) -> bool { matches!(arena.get(id), Type::Real { .. }) }
fn is_int(arena: &TypeArena, id: TypeId) -> bool {
  matches!(arena.get(id), Type::Int { .. } | Type::IntRange { .. } | Type::Enum { .. } | Type::Char { .. } | Type::CharRange { .. })
}

/// Integer signedness/width merge per spec §4.2.1's "Integer
/// signedness merge" bullet.
fn merge_int(arena: &mut TypeArena, lhs: TypeId, rhs: TypeId) -> TypeId {
  let (l_signed, l_width, l_lo, l_hi) = int_shape(arena, lhs);
  let (r_signed, r_width, r_lo, r_hi) = int_shape(arena, rhs);

  // A constant operand that fits the other's range takes the other's type.
  if let Type::Int { value: Some(v), .. } = arena.get(lhs) {
    if *v >= r_lo && *v <= r_hi { return rhs; }
  }
  if let Type::Int { value: Some(v), .. } = arena.get(rhs) {
    if *v >= l_lo && *v <= l_hi { return lhs; }
  }

  let width = l_width.max(r_width).max(16);
  if l_signed == r_signed {
    let (lo, hi) = int_bounds(l_signed, width);
    return arena.alloc(Type::Int { signed: l_signed, width, lo, hi, value: None });
  }
  // mixed signedness
  let (signed_width, unsigned_width) = if l_signed { (l_width, r_width) } else { (r_width, l_width) };
  let width = if signed_width > unsigned_width {
    signed_width
  } else {
    unsigned_width.saturating_mul(2)
  };
  let width = width.max(16);
  let (lo, hi) = int_bounds(true, width);
  arena.alloc(Type::Int { signed: true, width, lo, hi, value: None })
}

fn int_shape(arena: &TypeArena, id: TypeId) -> (bool, u8, i64, i64) {
  match arena.get(id) {
    Type::Int { signed, width, lo, hi, .. } => (*signed, *width, *lo, *hi),
    Type::IntRange { lo, hi, width } => (*lo < 0, *width, *lo, *hi),
    Type::Enum { names, width } => (false, *width, 0, names.len() as i64 - 1),
    Type::Char { .. } => (false, 8, 0, 255),
    Type::CharRange { lo, hi } => (false, 8, i64::from(*lo), i64::from(*hi)),
    _ => (true, 16, i64::from(i16::MIN), i64::from(i16::MAX)),
  }
}

fn int_bounds(signed: bool, width: u8) -> (i64, i64) {
  if signed {
    let hi = (1i64 << (width - 1)) - 1;
    (-(hi + 1), hi)
  } else {
    (0, (1i64 << width) - 1)
  }
}

/// The common type two operands of an arithmetic operator upcast to,
/// per spec §4.2.1. `div`/`mod` on any `Real` operand is rejected.
pub fn upcast_arithmetic(arena: &mut TypeArena, op: ArithOp, lhs: TypeId, rhs: TypeId) -> Result<TypeId, TypeError> {
  let lhs_real = is_real(arena, lhs);
  let rhs_real = is_real(arena, rhs);

  if matches!(arena.get(lhs), Type::Any) || matches!(arena.get(rhs), Type::Any) {
    return Ok(arena.alloc(Type::Real { width: TEMPREAL_WIDTH }));
  }

  if matches!(op, ArithOp::Div | ArithOp::Mod) && (lhs_real || rhs_real) {
    return Err(TypeError::InvalidBinaryExpr("div/mod forbidden with Real operand".into()));
  }

  if op == ArithOp::Slash { return Ok(arena.alloc(Type::Real { width: TEMPREAL_WIDTH })); }

  if lhs_real && rhs_real {
    let lw = width_of_real(arena, lhs);
    let rw = width_of_real(arena, rhs);
    return Ok(if lw >= rw { lhs } else { rhs });
  }
  if lhs_real || rhs_real {
    // Resolves the open question in SPEC_FULL §4.2.6: always produce a
    // fresh TempReal rather than returning one operand's type unchanged.
    return Ok(arena.alloc(Type::Real { width: TEMPREAL_WIDTH }));
  }
  if is_int(arena, lhs) && is_int(arena, rhs) { return Ok(merge_int(arena, lhs, rhs)); }
  Err(TypeError::InvalidBinaryExpr("non-numeric operand to arithmetic operator".into()))
}

fn width_of_real(arena: &TypeArena, id: TypeId) -> u8 {
  match arena.get(id) { Type::Real { width } => *width, _ => 0 }
}

/// Relational upcast per spec §4.2.2: both operands upcast to a
/// common type (reusing the arithmetic rule), result is always `Bool`.
pub fn upcast_relational(arena: &mut TypeArena, op: RelOp, lhs: TypeId, rhs: TypeId, bool_ty: TypeId) -> Result<TypeId, TypeError> {
  if op == RelOp::In {
    let element = match arena.get(rhs) {
      Type::Set { element } => *element,
      Type::EmptySet => lhs,
      _ => return Err(TypeError::InvalidBinaryExpr("'in' requires a set RHS".into())),
    };
    if !arena.type_eq(lhs, element) {
      return Err(TypeError::InvalidBinaryExpr("'in' LHS must match the set's element type".into()));
    }
    return Ok(bool_ty);
  }
  upcast_arithmetic(arena, ArithOp::Add, lhs, rhs)?;
  Ok(bool_ty)
}

/// Assignment downcast per spec §4.2.3. Returns `Ok(true)` when the
/// conversion is lossy enough to warrant the "narrowing downcast"
/// warning `spec.md` §7 requires, `Ok(false)` for a lossless one.
pub fn downcast_assignment(arena: &TypeArena, source: TypeId, target: TypeId) -> Result<bool, TypeError> {
  if arena.type_eq(source, target) { return Ok(false); }
  match (arena.get(source), arena.get(target)) {
    (Type::Int { lo: slo, hi: shi, .. }, Type::Int { lo: tlo, hi: thi, .. })
    | (Type::IntRange { lo: slo, hi: shi, .. }, Type::Int { lo: tlo, hi: thi, .. })
    | (Type::Int { lo: slo, hi: shi, .. }, Type::IntRange { lo: tlo, hi: thi, .. }) =>
      Ok(slo < tlo || shi > thi),
    (Type::Int { .. } | Type::IntRange { .. }, Type::Real { .. }) => Ok(false),
    (Type::Real { width: sw, .. }, Type::Real { width: tw, .. }) => Ok(sw > tw),
    (Type::Set { .. }, Type::Set { .. }) => Ok(false),
    (Type::EmptySet, Type::Set { .. }) => Ok(false),
    (Type::Array { element: se, range: sr }, Type::Array { element: te, range: tr }) => {
      if arena.width(*se) != arena.width(*te) {
        return Err(TypeError::IllegalCast { source: arena.id_string(source), target: arena.id_string(target) });
      }
      let slen = arena.width(*sr) / arena.width(*se).max(1);
      let tlen = arena.width(*tr) / arena.width(*te).max(1);
      Ok(slen > tlen)
    }
    (Type::Array { element, .. }, Type::String { .. }) |
    (Type::String { .. }, Type::Array { element, .. }) => {
      if arena.width(*element) != 8 {
        return Err(TypeError::IllegalCast { source: arena.id_string(source), target: arena.id_string(target) });
      }
      Ok(false)
    }
    (Type::Reference { .. } | Type::Pointer { .. } | Type::Array { .. }, Type::Reference { referee } | Type::Pointer { referee })
      if matches!(arena.get(*referee), Type::Any) => Ok(false),
    (Type::Pointer { pointee }, _) if matches!(arena.get(*pointee), Type::Any) &&
      matches!(arena.get(target), Type::Pointer { .. }) => Ok(false),
    (Type::Reference { referee: sref }, Type::Reference { referee: tref }) => {
      if arena.width(*sref) != arena.width(*tref) {
        return Err(TypeError::IllegalCast { source: arena.id_string(source), target: arena.id_string(target) });
      }
      downcast_assignment(arena, *sref, *tref)
    }
    _ => Err(TypeError::IllegalCast { source: arena.id_string(source), target: arena.id_string(target) }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn int(arena: &mut TypeArena, signed: bool, width: u8) -> TypeId {
    let (lo, hi) = int_bounds(signed, width);
    arena.alloc(Type::Int { signed, width, lo, hi, value: None })
  }

  #[test]
  fn scenario_integer_promotion() {
    // var i: integer; var w: word; i := w + 1;
    let mut arena = TypeArena::new();
    let word = int(&mut arena, false, 16);
    let one = arena.alloc(Type::Int { signed: true, width: 16, lo: -32768, hi: 32767, value: Some(1) });
    let sum = upcast_arithmetic(&mut arena, ArithOp::Add, word, one).unwrap();
    let Type::Int { signed, width, .. } = arena.get(sum) else { panic!("expected Int") };
    assert!(*signed);
    assert_eq!(*width, 32);
  }

  #[test]
  fn real_plus_int_is_always_tempreal() {
    let mut arena = TypeArena::new();
    let r = arena.alloc(Type::Real { width: 32 });
    let i = int(&mut arena, true, 16);
    let sum = upcast_arithmetic(&mut arena, ArithOp::Add, r, i).unwrap();
    assert!(matches!(arena.get(sum), Type::Real { width: 80 }));
  }

  #[test]
  fn div_rejects_real_operand() {
    let mut arena = TypeArena::new();
    let r = arena.alloc(Type::Real { width: 32 });
    let i = int(&mut arena, true, 16);
    assert!(upcast_arithmetic(&mut arena, ArithOp::Div, r, i).is_err());
  }
}
