//! The mutant runtime shim (spec §4.7, §6.4): a small, always-linked
//! bookkeeping layer the lowering pass emits calls into, rather than a
//! library this crate executes itself. Every module's constructor
//! threads one linked-list node per mutant it owns onto a shared global
//! list; `setmutation`/`setmutationid` walk that list to pick the
//! active mutant, and `getmutationid`/`getmutationmod` read back what
//! was picked. Grounded in the original `runtime.py`'s `P86` namespace
//! of globals and the four selector/reader routines it exposes.

/// The `P86.` ABI names this crate's lowering pass emits calls to and
/// globals it references, collected in one place per SPEC_FULL §4.7.1
/// rather than inlined at each call site.
pub mod abi {
  pub const SETMUTATION: &str = "P86.setmutation";
  pub const SETMUTATIONID: &str = "P86.setmutationid";
  pub const GETMUTATIONID: &str = "P86.getmutationid";
  pub const GETMUTATIONMOD: &str = "P86.getmutationmod";
  pub const GETMUTATIONCOUNT: &str = "P86.getmutationcount";

  pub const MUTANT_ID: &str = "P86.mutant_id";
  pub const MUTANT_MOD: &str = "P86.mutant_mod";
  pub const MUTANT_COUNT: &str = "P86.mutant_count";
  pub const MUTANT_LIST: &str = "P86.mutant_list";

  pub const ARGC: &str = "P86.argc";
  pub const ARGV: &str = "P86.argv";

  #[must_use] pub fn ctor_name(module: &str) -> String { format!("P86.ctor.{module}") }
  #[must_use] pub fn builtin_name(kind: &str, name: &str) -> String { format!("P86.{kind}.{name}") }
}

/// One node of the mutant linked list a module constructor threads
/// together at program start (spec §4.7: `{id, module-name-string,
/// next}`). This is the in-memory mirror of the node the lowering pass
/// emits as LLIR; nothing in this crate walks the list at compile time,
/// but a test harness can build one directly to exercise the selector
/// logic below without going through LLIR text at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutantNode {
  pub id: u32,
  pub module: String,
}

/// An in-process model of the runtime's global selector state, used by
/// tests to check `setmutation`/`getmutationid` semantics without
/// executing emitted IR. The real program's globals are the emitted
/// `P86.mutant_id`/`P86.mutant_mod`/`P86.mutant_count`/`P86.mutant_list`
/// this mirrors one-for-one.
#[derive(Default, Debug)]
pub struct MutantRegistry {
  list: Vec<MutantNode>,
  active_id: u32,
  active_mod: String,
}

impl MutantRegistry {
  #[must_use] pub fn new() -> Self { Self::default() }

  /// What a module's constructor does: append one node per mutant id it
  /// owns, preserving the order mutants were registered in within that
  /// module (spec §4.7: "prepends... for each mutant id it owns" — this
  /// crate orders by append within a module and by link order across
  /// modules, since §8.3 scenario 6 only constrains the resulting
  /// count and per-index lookup, not intra-module ordering).
  pub fn link_module(&mut self, module: &str, mutant_ids: impl IntoIterator<Item = u32>) {
    for id in mutant_ids { self.list.push(MutantNode { id, module: module.to_string() }); }
  }

  #[must_use] pub fn getmutationcount(&self) -> u32 { self.list.len() as u32 }

  /// Walks the list `n` steps and writes the reached node's id and
  /// module into the two active-selection globals; `n == 0` deactivates
  /// every mutant (spec §4.7).
  pub fn setmutation(&mut self, n: u32) {
    if n == 0 {
      self.active_id = 0;
      self.active_mod.clear();
      return;
    }
    match self.list.get((n - 1) as usize) {
      Some(node) => { self.active_id = node.id; self.active_mod = node.module.clone(); }
      None => { self.active_id = 0; self.active_mod.clear(); }
    }
  }

  /// Linearly scans by index until `getmutationid()` would equal
  /// `target_id`, i.e. until the node at that position carries the
  /// requested id (spec §4.7).
  pub fn setmutationid(&mut self, target_id: u32) {
    if target_id == 0 {
      self.setmutation(0);
      return;
    }
    match self.list.iter().position(|n| n.id == target_id) {
      Some(idx) => self.setmutation(idx as u32 + 1),
      None => self.setmutation(0),
    }
  }

  #[must_use] pub fn getmutationid(&self) -> u32 { self.active_id }
  #[must_use] pub fn getmutationmod(&self) -> &str { &self.active_mod }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn setmutation_zero_deactivates() {
    let mut r = MutantRegistry::new();
    r.link_module("m", [0xAAAA_BBBB, 0xCCCC_DDDD]);
    r.setmutation(1);
    assert_ne!(r.getmutationid(), 0);
    r.setmutation(0);
    assert_eq!(r.getmutationid(), 0);
    assert_eq!(r.getmutationmod(), "");
  }

  #[test]
  fn cross_module_linking_preserves_count_and_lookup() {
    let mut r = MutantRegistry::new();
    r.link_module("alpha", [1, 2, 3]);
    r.link_module("beta", [4, 5, 6]);
    assert_eq!(r.getmutationcount(), 6);
    r.setmutation(4);
    assert_eq!(r.getmutationid(), 4);
    assert_eq!(r.getmutationmod(), "beta");
    r.setmutation(0);
    assert_eq!(r.getmutationid(), 0);
  }

  #[test]
  fn setmutationid_scans_by_id_not_position() {
    let mut r = MutantRegistry::new();
    r.link_module("m", [10, 20, 30]);
    r.setmutationid(20);
    assert_eq!(r.getmutationid(), 20);
    assert_eq!(r.getmutationmod(), "m");
    r.setmutationid(999);
    assert_eq!(r.getmutationid(), 0);
  }
}
