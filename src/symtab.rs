//! Lexical scope stack: the symbols/typedefs/functions/goto-label
//! namespaces described in spec §3.2 and §4.1, grounded in the
//! original `symtab.py`'s `Scope`/`SymbolTable` classes.
//!
//! Single-threaded, owned exclusively by whichever pass currently
//! holds it; no interior mutability or sharing, matching spec §5.

use std::collections::HashMap;

use crate::diag::SymtabError;
use crate::types::constfold::ConstValue;
use crate::types::ty::TypeId;

/// The value a symbol-table entry holds: either a run-time variable
/// (with an optional lowering-time handle, filled in once the pass
/// that owns it has allocated storage) or a previously-folded
/// constant.
#[derive(Clone, Debug)]
pub enum Value {
  Variable { handle: Option<String> },
  Constant(ConstValue),
}

#[derive(Clone, Debug)]
pub struct Symbol {
  pub ty: TypeId,
  pub value: Value,
}

#[derive(Clone, Debug)]
pub struct FunctionSymbol {
  pub ty: TypeId,
  pub handle: Option<String>,
}

/// A forward-and-backward goto target: the LLIR label once known, plus
/// every jump site recorded before the label was reached so the
/// lowering pass can patch them once it is.
#[derive(Clone, Debug, Default)]
pub struct GotoBlock {
  pub handle: Option<String>,
  pub entries: Vec<String>,
}

#[derive(Default)]
pub struct Scope {
  symbols: HashMap<String, Symbol>,
  typedefs: HashMap<String, TypeId>,
  functions: HashMap<String, FunctionSymbol>,
  gotos: HashMap<String, GotoBlock>,
}

impl Scope {
  pub fn dump_symbols(&self) -> impl Iterator<Item = &str> { self.symbols.keys().map(String::as_str) }
}

/// The stack of scopes a single compilation walks through. Enter/exit
/// is strict LIFO (spec §4.1); there is no way to exit a scope other
/// than the one most recently entered.
#[derive(Default)]
pub struct SymbolTable {
  scopes: Vec<Scope>,
  label_counter: u32,
}

impl SymbolTable {
  #[must_use] pub fn new() -> Self { let mut t = Self::default(); t.scopes.push(Scope::default()); t }

  pub fn enter_scope(&mut self) { self.scopes.push(Scope::default()); }

  pub fn exit_scope(&mut self) -> Result<Scope, SymtabError> {
    if self.scopes.len() <= 1 { return Err(SymtabError::ScopeUnderflow); }
    Ok(self.scopes.pop().expect("checked non-empty above"))
  }

  #[must_use] pub fn depth(&self) -> usize { self.scopes.len() }

  fn innermost(&mut self) -> &mut Scope { self.scopes.last_mut().expect("at least one scope") }

  pub fn install_symbol(&mut self, name: impl Into<String>, ty: TypeId, handle: Option<String>) {
    self.innermost().symbols.insert(name.into(), Symbol { ty, value: Value::Variable { handle } });
  }

  pub fn install_const(&mut self, name: impl Into<String>, ty: TypeId, value: ConstValue) {
    self.innermost().symbols.insert(name.into(), Symbol { ty, value: Value::Constant(value) });
  }

  pub fn install_typedef(&mut self, name: impl Into<String>, ty: TypeId) {
    self.innermost().typedefs.insert(name.into(), ty);
  }

  pub fn install_function(&mut self, name: impl Into<String>, ty: TypeId, handle: Option<String>) {
    self.innermost().functions.insert(name.into(), FunctionSymbol { ty, handle });
  }

  pub fn install_goto(&mut self, name: impl Into<String>) -> &mut GotoBlock {
    self.innermost().gotos.entry(name.into()).or_default()
  }

  #[must_use] pub fn find_symbol(&self, name: &str) -> Result<&Symbol, SymtabError> {
    self.scopes.iter().rev().find_map(|s| s.symbols.get(name))
      .ok_or_else(|| SymtabError::UnknownSymbol(name.to_owned()))
  }

  pub fn find_const(&self, name: &str) -> Result<ConstValue, SymtabError> {
    match &self.find_symbol(name)?.value {
      Value::Constant(v) => Ok(v.clone()),
      Value::Variable { .. } => Err(SymtabError::UnknownSymbol(name.to_owned())),
    }
  }

  #[must_use] pub fn find_typedef(&self, name: &str) -> Result<TypeId, SymtabError> {
    self.scopes.iter().rev().find_map(|s| s.typedefs.get(name).copied())
      .ok_or_else(|| SymtabError::UnknownTypedef(name.to_owned()))
  }

  #[must_use] pub fn find_function(&self, name: &str) -> Result<&FunctionSymbol, SymtabError> {
    self.scopes.iter().rev().find_map(|s| s.functions.get(name))
      .ok_or_else(|| SymtabError::UnknownFunction(name.to_owned()))
  }

  pub fn find_goto(&mut self, name: &str) -> &mut GotoBlock {
    // Gotos are resolved within the innermost function scope; installing
    // lazily on first reference lets a forward jump register its entry
    // before the label itself has been walked.
    self.innermost().gotos.entry(name.to_owned()).or_default()
  }

  /// A globally-unique name for anonymous records/variants/selectors
  /// and for mutation-guard labels.
  pub fn label(&mut self, prefix: &str) -> String {
    self.label_counter += 1;
    format!("{prefix}.{}", self.label_counter)
  }

  /// Every symbol name reachable right now, innermost-first; used by
  /// the `with`-statement lowering to detect shadowing.
  pub fn visible_symbols(&self) -> impl Iterator<Item = &str> {
    self.scopes.iter().rev().flat_map(Scope::dump_symbols)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::ty::{Type, TypeArena};

  #[test]
  fn scope_discipline_hides_inner_symbols() {
    let mut arena = TypeArena::new();
    let bool_ty = arena.alloc(Type::Bool);
    let mut st = SymbolTable::new();
    st.install_symbol("outer", bool_ty, None);
    st.enter_scope();
    st.install_symbol("inner", bool_ty, None);
    assert!(st.find_symbol("inner").is_ok());
    assert!(st.find_symbol("outer").is_ok());
    st.exit_scope().unwrap();
    assert!(st.find_symbol("inner").is_err());
    assert!(st.find_symbol("outer").is_ok());
  }

  #[test]
  fn reinstalling_same_name_shadows_silently() {
    let mut arena = TypeArena::new();
    let bool_ty = arena.alloc(Type::Bool);
    let int_ty = arena.alloc(Type::Int { signed: true, width: 16, lo: -32768, hi: 32767, value: None });
    let mut st = SymbolTable::new();
    st.install_symbol("x", bool_ty, None);
    st.install_symbol("x", int_ty, None);
    assert_eq!(st.find_symbol("x").unwrap().ty, int_ty);
  }

  #[test]
  fn exit_scope_underflow_is_an_error() {
    let mut st = SymbolTable::new();
    assert!(matches!(st.exit_scope(), Err(SymtabError::ScopeUnderflow)));
  }

  #[test]
  fn labels_are_unique() {
    let mut st = SymbolTable::new();
    let a = st.label("variant");
    let b = st.label("variant");
    assert_ne!(a, b);
  }
}
