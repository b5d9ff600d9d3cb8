//! The structural type universe (spec §3.1) and its arena.
//!
//! Types are allocated into a [`TypeArena`] and referenced everywhere
//! else by [`TypeId`], rather than passed around as owned recursive
//! values. This is the "explicit indirection (index into a type
//! arena)" the design notes call for in place of in-place mutation of
//! a `Deferred` placeholder: resolving a deferred name is a
//! `TypeArena::redirect` call, never a write through a shared `&mut
//! Type`.

use std::fmt;

/// An index into a [`TypeArena`]. Two `TypeId`s may resolve to
/// structurally-equal types without being the same index; compare with
/// [`TypeArena::eq`], never `==` on the raw id, unless you specifically
/// want identity rather than structural equality.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

/// A named field within a [`Type::Record`] or [`Type::ScopeHook`].
#[derive(Clone, Debug)]
pub struct Field {
  pub name: String,
  pub ty: TypeId,
  pub index: u32,
}

/// A named, ordered parameter of a [`Type::Function`].
#[derive(Clone, Debug)]
pub struct Parameter {
  pub name: String,
  pub ty: TypeId,
}

/// One arm of a [`Type::Variant`]; a synthetic record sharing the
/// variant's arena storage.
#[derive(Clone, Debug)]
pub struct VariantCase {
  pub label: i64,
  pub record: TypeId,
}

/// The structural type universe, per spec §3.1. Every variant's
/// invariants are enforced by the constructors in [`TypeArena`] rather
/// than by this enum directly, since an out-of-arena `Type` value
/// cannot check them against sibling types.
#[derive(Clone, Debug)]
pub enum Type {
  Int { signed: bool, width: u8, lo: i64, hi: i64, value: Option<i64> },
  IntRange { lo: i64, hi: i64, width: u8 },
  Enum { names: Vec<String>, width: u8 },
  Bool,
  Char { value: Option<u8> },
  CharRange { lo: u8, hi: u8 },
  Real { width: u8 },
  Array { element: TypeId, range: TypeId },
  String { length: u32 },
  Set { element: TypeId },
  EmptySet,
  Record { fields: Vec<Field>, variant: Option<TypeId> },
  Variant { selector: Box<Field>, cases: Vec<VariantCase> },
  Pointer { pointee: TypeId },
  Reference { referee: TypeId },
  Function {
    module: String,
    name: String,
    ret: TypeId,
    params: Vec<Parameter>,
    scope_level: u32,
    scope_hook: Option<TypeId>,
  },
  File { component: TypeId },
  ScopeHook { name: String, fields: Vec<Field> },
  Any,
  Void,
  /// A name that could not yet be resolved when first encountered
  /// inside a `type` block. Always followed through
  /// [`TypeArena::resolve`] before lowering; `spec.md` §3.1 requires
  /// every `Deferred` be rewritten before lowering begins.
  Deferred { name: String },
}

impl Type {
  /// Width in bits, where defined. Records/variants/arrays compute it
  /// from their members via [`TypeArena::width`].
  fn own_width(&self) -> Option<u32> {
    match *self {
      Type::Int { width, .. } | Type::IntRange { width, .. } => Some(u32::from(width)),
      Type::Enum { width, .. } => Some(u32::from(width)),
      Type::Bool => Some(1),
      Type::Char { .. } | Type::CharRange { .. } => Some(8),
      Type::Real { width } => Some(u32::from(width)),
      Type::EmptySet => Some(1),
      Type::Any => Some(8),
      _ => None,
    }
  }
}

/// The arena all [`Type`] values live in for the duration of a
/// compilation. Deferred-name resolution is an entry in `redirects`,
/// consulted by every dereference, rather than a mutation of the
/// `Type` value itself.
#[derive(Default)]
pub struct TypeArena {
  types: Vec<Type>,
  redirects: std::collections::HashMap<u32, u32>,
}

impl TypeArena {
  #[must_use] pub fn new() -> Self { Self::default() }

  pub fn alloc(&mut self, ty: Type) -> TypeId {
    let id = u32::try_from(self.types.len()).expect("type arena overflow");
    self.types.push(ty);
    TypeId(id)
  }

  /// Record that `deferred` should now be treated as `resolved`. Does
  /// not touch the `Deferred` value in place; future lookups of
  /// `deferred` are redirected instead.
  pub fn redirect(&mut self, deferred: TypeId, resolved: TypeId) {
    self.redirects.insert(deferred.0, resolved.0);
  }

  /// Follow any redirect chain and return the live type.
  #[must_use] pub fn get(&self, mut id: TypeId) -> &Type {
    let mut seen = 0;
    while let Some(&next) = self.redirects.get(&id.0) {
      id = TypeId(next);
      seen += 1;
      assert!(seen <= self.types.len(), "cyclic type redirect");
    }
    &self.types[id.0 as usize]
  }

  /// Resolve `id` all the way through redirects, returning the final
  /// [`TypeId`] rather than the `Type` value. Used when a node needs
  /// to store a stable reference rather than a snapshot.
  #[must_use] pub fn resolve(&self, mut id: TypeId) -> TypeId {
    while let Some(&next) = self.redirects.get(&id.0) { id = TypeId(next); }
    id
  }

  /// The bit width of a type, computed structurally for composites.
  #[must_use] pub fn width(&self, id: TypeId) -> u32 {
    match self.get(id) {
      Type::Array { element, range } => {
        let elt = self.width(*element);
        let (lo, hi) = self.range_bounds(*range);
        elt * u32::try_from(hi - lo + 1).unwrap_or(0)
      }
      Type::String { length } => 8 * length,
      Type::Set { element } => 1u32 << self.width(*element).min(31),
      Type::Record { fields, variant } => {
        let base: u32 = fields.iter().map(|f| self.width(f.ty)).sum();
        base + variant.map_or(0, |v| self.width(v))
      }
      Type::Variant { cases, .. } =>
        cases.iter().map(|c| self.width(c.record)).max().unwrap_or(0),
      Type::Pointer { .. } | Type::Reference { .. } => 64,
      ty => ty.own_width().unwrap_or(0),
    }
  }

  fn range_bounds(&self, id: TypeId) -> (i64, i64) {
    match self.get(id) {
      Type::IntRange { lo, hi, .. } => (*lo, *hi),
      Type::CharRange { lo, hi } => (i64::from(*lo), i64::from(*hi)),
      Type::Int { lo, hi, .. } => (*lo, *hi),
      _ => (0, 0),
    }
  }

  /// The structural signature string used for equality (spec §3.1:
  /// "Equality is by identifier string").
  #[must_use] pub fn id_string(&self, id: TypeId) -> String {
    match self.get(id) {
      Type::Int { signed, width, lo, hi, .. } =>
        format!("p86.int[{}][{signed}][{lo}..{hi}]", width),
      Type::IntRange { lo, hi, width } => format!("p86.range[{width}][{lo}..{hi}]"),
      Type::Enum { names, .. } => format!("p86.enum[{}]", names.join(",")),
      Type::Bool => "p86.bool".into(),
      Type::Char { .. } => "p86.char".into(),
      Type::CharRange { lo, hi } => format!("p86.charrange[{lo}..{hi}]"),
      Type::Real { width } => format!("p86.real[{width}]"),
      Type::Array { element, range } =>
        format!("p86.array[{}][{}]", self.id_string(*element), self.id_string(*range)),
      Type::String { length } => format!("p86.string[{length}]"),
      Type::Set { element } => format!("p86.set of {}", self.id_string(*element)),
      Type::EmptySet => "p86.emptyset".into(),
      Type::Record { fields, variant } => {
        let fs: Vec<_> = fields.iter().map(|f| format!("{}:{}", f.name, self.id_string(f.ty))).collect();
        format!("p86.record[{}][{}]", fs.join(","), variant.map_or(String::new(), |v| self.id_string(v)))
      }
      Type::Variant { cases, .. } => {
        let cs: Vec<_> = cases.iter().map(|c| format!("{}:{}", c.label, self.id_string(c.record))).collect();
        format!("p86.variant[{}]", cs.join(","))
      }
      Type::Pointer { pointee } => format!("p86.pointer[{}]", self.id_string(*pointee)),
      Type::Reference { referee } => format!("p86.reference[{}]", self.id_string(*referee)),
      Type::Function { module, name, params, ret, .. } => {
        let ps: Vec<_> = params.iter().map(|p| self.id_string(p.ty)).collect();
        format!("p86.function[{module}.{name}][{}][{}]", ps.join(","), self.id_string(*ret))
      }
      Type::File { component } => format!("p86.file[{}]", self.id_string(*component)),
      Type::ScopeHook { name, .. } => format!("p86.scopehook[{name}]"),
      Type::Any => "p86.any".into(),
      Type::Void => "p86.void".into(),
      Type::Deferred { name } => format!("p86.deferred[{name}]"),
    }
  }

  #[must_use] pub fn type_eq(&self, a: TypeId, b: TypeId) -> bool {
    self.id_string(a) == self.id_string(b)
  }
}

impl fmt::Display for TypeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn width_of_set_matches_spec_example() {
    let mut arena = TypeArena::new();
    let range = arena.alloc(Type::IntRange { lo: 1, hi: 11, width: 16 });
    let set = arena.alloc(Type::Set { element: range });
    assert_eq!(arena.width(set), 1u32 << 16.min(31));
  }

  #[test]
  fn deferred_redirect_changes_id_string() {
    let mut arena = TypeArena::new();
    let deferred = arena.alloc(Type::Deferred { name: "shape".into() });
    let real = arena.alloc(Type::Bool);
    assert_eq!(arena.id_string(deferred), "p86.deferred[shape]");
    arena.redirect(deferred, real);
    assert_eq!(arena.id_string(deferred), "p86.bool");
  }

  #[test]
  fn structural_equality_ignores_identity() {
    let mut arena = TypeArena::new();
    let a = arena.alloc(Type::Int { signed: true, width: 16, lo: -32768, hi: 32767, value: None });
    let b = arena.alloc(Type::Int { signed: true, width: 16, lo: -32768, hi: 32767, value: None });
    assert!(arena.type_eq(a, b));
  }
}
