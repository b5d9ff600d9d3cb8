//! The mutation report: one record per mutant produced by any of the
//! six operators, serialized to JSON (spec §6.2) and consulted by the
//! runtime shim's `getmutationcount`/`getmutationid`/`getmutationmod`.

use md5::{Digest, Md5};
use serde::Serialize;

/// Which operator produced a given mutant, per spec §4.5.1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOp {
  /// Statement deletion: delete one statement from a block.
  Sdl,
  /// Statement coverage: precede a statement with a halt bomb.
  Sc,
  /// Decision/condition coverage: force a boolean subexpression constant.
  Dcc,
  /// Relational operator replacement.
  Ror,
  /// Conditional (logical connective) operator replacement.
  Cor,
  /// Arithmetic operator replacement.
  Aor,
}

impl MutationOp {
  #[must_use] pub fn as_str(self) -> &'static str {
    match self {
      MutationOp::Sdl => "sdl",
      MutationOp::Sc => "sc",
      MutationOp::Dcc => "dcc",
      MutationOp::Ror => "ror",
      MutationOp::Cor => "cor",
      MutationOp::Aor => "aor",
    }
  }

  /// The human-readable operator name the original `report.py` passes
  /// as `MutationReport.name` (e.g. for a run summary header).
  #[must_use] pub fn display_name(self) -> &'static str {
    match self {
      MutationOp::Sdl => "Statement deletion",
      MutationOp::Sc => "Statement Coverage",
      MutationOp::Dcc => "Decision/Condition Coverage",
      MutationOp::Ror => "Relational Operator Replacement",
      MutationOp::Cor => "Conditional Operator Replacement",
      MutationOp::Aor => "Arithmetic Operator Replacement",
    }
  }
}

/// A single generated mutant, recorded before the guarded clone is
/// spliced into the tree so the id written into the guard matches the
/// id recorded here.
#[derive(Clone, Debug, Serialize)]
pub struct MutantRecord {
  pub id: u32,
  pub module: String,
  pub op: MutationOp,
  pub line: u32,
  pub lexpos: u32,
  pub lexendpos: u32,
  pub original: String,
  pub replacement: String,
}

/// Deterministic 32-bit mutant id: an MD5 digest of the fields that
/// make a mutant unique, truncated to its first four bytes. Grounded in
/// `report.py`'s `add_mutant`, whose id is a hash of exactly
/// `(source md5, line, lexpos, lexendpos, replacement)` — module name
/// and operator are display metadata, not part of the identity, so
/// re-running the same operator over unchanged source reproduces the
/// same ids even if a module is renamed (spec §8.1).
#[must_use] pub fn mutant_id(source_md5: &str, line: u32, lexpos: u32, lexendpos: u32, replacement: &str) -> u32 {
  let mut h = Md5::new();
  h.update(source_md5.as_bytes());
  h.update(line.to_le_bytes());
  h.update(lexpos.to_le_bytes());
  h.update(lexendpos.to_le_bytes());
  h.update(replacement.as_bytes());
  let digest = h.finalize();
  u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// The full set of mutants discovered across a compilation, in
/// discovery order; `index_of` recovers the position `setmutation(n)`
/// (1-based, spec §4.7) refers to. `name`/`filename`/`md5` mirror the
/// three arguments the original's `MutationReport(name, filename,
/// md5_hash)` constructor takes: `name` is the operator's display name,
/// `filename` the module under test, and `md5` the content hash of its
/// preprocessed source, computed upstream of this crate and threaded in
/// through [`crate::CompileOptions::source_md5`].
#[derive(Serialize)]
pub struct MutationReport {
  pub name: String,
  pub filename: String,
  pub md5: String,
  pub mutants: Vec<MutantRecord>,
}

impl MutationReport {
  #[must_use] pub fn new(name: impl Into<String>, filename: impl Into<String>, md5: impl Into<String>) -> Self {
    Self { name: name.into(), filename: filename.into(), md5: md5.into(), mutants: Vec::new() }
  }

  /// Computes the mutant's id from this report's content hash and
  /// pushes the record, mirroring `add_mutant`'s dedup: a second mutant
  /// that hashes to an id already present is dropped rather than
  /// duplicated.
  pub fn record(&mut self, module: String, op: MutationOp, line: u32, lexpos: u32, lexendpos: u32, original: String, replacement: String) -> u32 {
    let id = mutant_id(&self.md5, line, lexpos, lexendpos, &replacement);
    if !self.mutants.iter().any(|m| m.id == id) {
      self.mutants.push(MutantRecord { id, module, op, line, lexpos, lexendpos, original, replacement });
    }
    id
  }

  #[must_use] pub fn to_json(&self) -> String {
    serde_json::to_string_pretty(self).expect("mutation report is always serializable")
  }

  #[must_use] pub fn module_count(&self, module: &str) -> u32 {
    u32::try_from(self.mutants.iter().filter(|m| m.module == module).count()).unwrap_or(u32::MAX)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mutant_id_is_deterministic_and_content_sensitive() {
    let a = mutant_id("abc123", 3, 10, 14, ">=");
    let b = mutant_id("abc123", 3, 10, 14, ">=");
    let c = mutant_id("abc123", 3, 10, 14, "<=");
    let d = mutant_id("def456", 3, 10, 14, ">=");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
  }

  #[test]
  fn mutant_id_ignores_module_and_operator() {
    // Unlike the module/operator-keyed scheme this replaces, renaming a
    // module must not change the id of an unchanged mutation site.
    let a = mutant_id("abc123", 3, 10, 14, ">=");
    let b = mutant_id("abc123", 3, 10, 14, ">=");
    assert_eq!(a, b);
  }

  #[test]
  fn module_count_filters_by_module() {
    let mut report = MutationReport::new("Relational Operator Replacement", "t.pas", "abc123");
    report.record("a".into(), MutationOp::Ror, 1, 0, 1, ">".into(), ">=".into());
    report.record("b".into(), MutationOp::Ror, 1, 0, 1, ">".into(), "<".into());
    assert_eq!(report.module_count("a"), 1);
    assert_eq!(report.module_count("b"), 1);
    assert_eq!(report.module_count("c"), 0);
  }

  #[test]
  fn record_dedups_by_id() {
    let mut report = MutationReport::new("Relational Operator Replacement", "t.pas", "abc123");
    let a = report.record("m".into(), MutationOp::Ror, 1, 0, 1, ">".into(), ">=".into());
    let b = report.record("m".into(), MutationOp::Ror, 1, 0, 1, ">".into(), ">=".into());
    assert_eq!(a, b);
    assert_eq!(report.mutants.len(), 1);
  }
}
