//! Record/variant layout: byte offsets for fields and bitcast targets
//! for variant arms, computed structurally from [`TypeArena::width`]
//! rather than stored redundantly on [`crate::types::ty::Field`].
//! Grounded in the original `codegen.py`'s record-lowering helpers,
//! which likewise compute a field's offset on demand by summing the
//! widths of the fields that precede it.

use crate::types::ty::{Type, TypeArena, TypeId};

/// Byte offset of `field_name` within `rec_ty`, including into its
/// variant part if the field isn't one of the fixed fields (every
/// variant arm shares the same starting offset, since the variant part
/// is laid out as one further field appended after the fixed ones,
/// spec §4.6.2's "record layout: struct + arena + bitcast").
#[must_use] pub fn field_offset(arena: &TypeArena, rec_ty: TypeId, field_name: &str) -> Option<u32> {
  let Type::Record { fields, variant } = arena.get(rec_ty) else { return None };
  let mut offset = 0u32;
  for f in fields {
    if f.name == field_name { return Some(offset / 8); }
    offset += arena.width(f.ty);
  }
  let variant = (*variant)?;
  let Type::Variant { selector, cases } = arena.get(variant) else { return None };
  if selector.name == field_name { return Some(offset / 8); }
  let selector_width = arena.width(selector.ty);
  for case in cases {
    if let Type::Record { fields, .. } = arena.get(case.record) {
      let mut case_offset = offset + selector_width;
      for f in fields {
        if f.name == field_name { return Some(case_offset / 8); }
        case_offset += arena.width(f.ty);
      }
    }
  }
  None
}

/// The width, in bytes, of the element type of an array or string
/// access, used to scale an index into a byte offset.
#[must_use] pub fn element_width_bytes(arena: &TypeArena, base_ty: TypeId) -> u32 {
  match arena.get(base_ty) {
    Type::Array { element, .. } => arena.width(*element).div_ceil(8),
    Type::String { .. } => 1,
    _ => 1,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn field_offset_accounts_for_preceding_fields() {
    let mut arena = TypeArena::new();
    let int16 = arena.alloc(Type::Int { signed: true, width: 16, lo: -32768, hi: 32767, value: None });
    let byte = arena.alloc(Type::Int { signed: false, width: 8, lo: 0, hi: 255, value: None });
    let rec = arena.alloc(Type::Record {
      fields: vec![
        crate::types::ty::Field { name: "a".into(), ty: int16, index: 0 },
        crate::types::ty::Field { name: "b".into(), ty: byte, index: 1 },
      ],
      variant: None,
    });
    assert_eq!(field_offset(&arena, rec, "a"), Some(0));
    assert_eq!(field_offset(&arena, rec, "b"), Some(2));
    assert_eq!(field_offset(&arena, rec, "missing"), None);
  }
}
