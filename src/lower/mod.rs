//! Lowering (spec §4.6): turns a fully typed, mutation-expanded AST
//! into LLIR — a small SSA-flavoured textual form handed off to an
//! external code generator for register allocation and assembly/JIT
//! emission (spec §1's "external collaborators"), so this pass stops at
//! well-formed three-address-ish text rather than machine code.
//! Grounded in the original `codegen.py`'s `Context` class, which
//! tracks the current function's block list, a monotonic temp/label
//! counter, and the goto/label patch table this module's `goto`
//! handling mirrors.

pub mod call;
pub mod expr;
pub mod globals;
pub mod record;
pub mod stmt;
pub mod withstmt;

use std::fmt;

use crate::ast::Program;
use crate::diag::Diagnostic;
use crate::symtab::SymbolTable;
use crate::types::ty::TypeArena;

/// One SSA value: either a numbered temporary (`%7`) or an immediate
/// operand already rendered to text (a constant, a global, a
/// previously-named parameter).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Value(pub String);

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl Value {
  #[must_use] pub fn immediate(text: impl Into<String>) -> Self { Self(text.into()) }
}

pub struct Block {
  pub label: String,
  pub body: String,
}

pub struct Func {
  pub name: String,
  pub ret: String,
  pub params: Vec<(String, String)>,
  pub blocks: Vec<Block>,
}

pub struct Global {
  pub name: String,
  pub ty: String,
  pub init: Option<String>,
}

/// One lowered compilation unit: a module's globals, its functions, and
/// the synthesized constructor that links the module's mutant list
/// into the runtime's global chain (spec §4.7, §6.4).
#[derive(Default)]
pub struct LlModule {
  pub name: String,
  pub globals: Vec<Global>,
  pub functions: Vec<Func>,
}

impl fmt::Display for LlModule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "; module {}", self.name)?;
    for g in &self.globals {
      writeln!(f, "@{} = global {} {}", g.name, g.ty, g.init.as_deref().unwrap_or("zeroinitializer"))?;
    }
    for fun in &self.functions {
      let params = fun.params.iter().map(|(n, t)| format!("{t} %{n}")).collect::<Vec<_>>().join(", ");
      writeln!(f, "define {} @{}({params}) {{", fun.ret, fun.name)?;
      for b in &fun.blocks {
        writeln!(f, "{}:", b.label)?;
        write!(f, "{}", b.body)?;
      }
      writeln!(f, "}}")?;
    }
    Ok(())
  }
}

/// The lowering pass's working state for a single function body: the
/// arena/symtab it reads types and handles from, the module it is
/// building up, and the current block's in-progress text plus the
/// counters used to name fresh temporaries, labels, and goto targets.
pub struct Lowering<'a> {
  pub arena: &'a TypeArena,
  pub symtab: &'a mut SymbolTable,
  pub module: LlModule,
  temp_counter: u32,
  label_counter: u32,
  finished: Vec<Block>,
  cur_label: String,
  cur_body: String,
  with_hooks: Vec<std::collections::HashMap<String, String>>,
}

impl<'a> Lowering<'a> {
  #[must_use] pub fn new(module_name: impl Into<String>, arena: &'a TypeArena, symtab: &'a mut SymbolTable) -> Self {
    Self {
      arena, symtab,
      module: LlModule { name: module_name.into(), ..LlModule::default() },
      temp_counter: 0, label_counter: 0,
      finished: Vec::new(),
      cur_label: "entry".into(),
      cur_body: String::new(),
      with_hooks: Vec::new(),
    }
  }

  /// Opens a new `with`-statement scope: field accesses by bare name
  /// resolve to `base + offset` for as long as this scope is active
  /// (spec §4.6.5, the `ScopeHook` type's lowering-time counterpart).
  pub fn push_with_hook(&mut self, hook: std::collections::HashMap<String, String>) { self.with_hooks.push(hook); }

  pub fn pop_with_hook(&mut self) { self.with_hooks.pop(); }

  #[must_use] pub fn lookup_with_hook(&self, name: &str) -> Option<&str> {
    self.with_hooks.iter().rev().find_map(|h| h.get(name)).map(String::as_str)
  }

  pub fn new_temp(&mut self) -> Value {
    self.temp_counter += 1;
    Value(format!("%t{}", self.temp_counter))
  }

  pub fn new_label(&mut self, prefix: &str) -> String {
    self.label_counter += 1;
    format!("{prefix}.{}", self.label_counter)
  }

  pub fn emit(&mut self, line: impl fmt::Display) {
    use std::fmt::Write as _;
    let _ = writeln!(self.cur_body, "  {line}");
  }

  /// Seals the block in progress and starts a fresh one under `label`.
  /// Every block the lowering pass opens is eventually sealed this way
  /// except the last, which `finish_function` seals.
  pub fn start_block(&mut self, label: impl Into<String>) {
    let sealed = Block { label: std::mem::replace(&mut self.cur_label, label.into()), body: std::mem::take(&mut self.cur_body) };
    self.finished.push(sealed);
  }

  pub fn finish_function(&mut self, name: impl Into<String>, ret: impl Into<String>, params: Vec<(String, String)>) {
    let last = Block { label: std::mem::replace(&mut self.cur_label, "entry".into()), body: std::mem::take(&mut self.cur_body) };
    let mut blocks = std::mem::take(&mut self.finished);
    blocks.push(last);
    self.module.functions.push(Func { name: name.into(), ret: ret.into(), params, blocks });
  }
}

/// Lowers every module and the top-level program body into one
/// [`LlModule`] per Pascal-86 `module` plus a final `program` module
/// holding the entry point (spec §4.6.1: "one LLIR module per source
/// module, plus a synthesized entry module for the program body").
pub fn lower_program(arena: &TypeArena, symtab: &mut SymbolTable, prog: &mut Program) -> Result<Vec<LlModule>, Diagnostic> {
  let mut out = Vec::with_capacity(prog.modules.len() + 1);
  for m in &mut prog.modules {
    let mut lw = Lowering::new(m.name.clone(), arena, symtab);
    globals::lower_module_globals(&mut lw, m);
    for f in &mut m.functions { call::lower_function(&mut lw, &m.name, f)?; }
    out.push(lw.module);
  }
  let mut entry = Lowering::new(prog.name.clone(), arena, symtab);
  globals::lower_program_globals(&mut entry, prog);
  stmt::lower_stmt(&mut entry, &mut prog.body)?;
  entry.emit("ret void");
  entry.finish_function("main", "void", vec![]);
  out.push(entry.module);
  Ok(out)
}
