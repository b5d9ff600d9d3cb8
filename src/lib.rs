//! Typed-AST compiler core and mutation-testing engine for Pascal-86.
//!
//! The crate root wires together the fixed pass pipeline (symbol table
//! → type system → typer → call-by-reference fixup → mutation →
//! lowering → runtime shim) behind one entry point, [`Compiler`], so a
//! caller — the `p86c` binary, or a test — drives the whole thing with
//! a single [`CompileOptions`] value instead of touching each pass.
//! Parsing itself is out of scope (spec §1's "external collaborators");
//! callers hand in an already-built [`ast::Program`].

pub mod ast;
pub mod callref;
pub mod diag;
pub mod lower;
pub mod mutation;
pub mod runtime;
pub mod symtab;
pub mod typer;
pub mod types;

use ast::{FunctionDecl, Program};
use diag::Diagnostic;
use lower::LlModule;
use mutation::{MutationOp, MutationPass, MutationReport};
use typer::Typer;

/// The core's own input surface (SPEC_FULL §2.1): everything the
/// pipeline itself branches on, as an explicit value rather than global
/// state. The `p86c` binary's `clap`-derived `Options` maps its flags
/// down to this narrower struct; driver-only concerns (`-S`/`-b`/`-o`
/// output paths, `-O`/`-T`/`-mcpu`/`-mattrs` codegen targeting, `-D`/
/// `-I` preprocessor plumbing) stay on that side since the external
/// code generator, not this crate, consumes them.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
  /// `-m {sc,dcc,ror,cor,aor,sdl}`: run exactly one mutation operator
  /// over every module, or none if this is a plain compile.
  pub mutation_op: Option<MutationOp>,
  /// Hex md5 of the (preprocessed) source text, supplied by the
  /// external front-end. Threaded into every mutant's id so re-running
  /// the same operator over unchanged source reproduces identical ids
  /// (spec §3.4, §8.1) — this crate never sees source bytes itself.
  pub source_md5: String,
}

/// Everything a successful compilation produces: one [`LlModule`] per
/// source module plus the synthesized entry module (spec §4.6.1), and
/// the mutation report if `-m` was given.
pub struct CompileOutput {
  pub modules: Vec<LlModule>,
  pub mutation_report: Option<MutationReport>,
}

/// Drives the fixed pass pipeline over one already-parsed program.
#[derive(Default)]
pub struct Compiler {
  pub options: CompileOptions,
}

impl Compiler {
  #[must_use] pub fn new(options: CompileOptions) -> Self { Self { options } }

  pub fn compile(&self, prog: &mut Program) -> Result<CompileOutput, Diagnostic> {
    let mut typer = Typer::new();
    log::info!("typing program {}", prog.name);
    typer.type_program(prog)?;

    let by_ref = callref::ByRefTable::build(&typer.arena, typer.function_types());
    log::debug!("call-by-reference fixup: {} functions with reference parameters tracked", typer.function_types().len());
    for m in &mut prog.modules {
      for f in &mut m.functions { fixup_function(&by_ref, f); }
    }
    callref::fixup_stmt(&by_ref, &mut prog.body);

    let mutation_report = if let Some(op) = self.options.mutation_op {
      log::info!("running mutation operator {op:?}");
      let mut report = MutationReport::new(op.display_name(), prog.name.clone(), self.options.source_md5.clone());
      for m in &mut prog.modules {
        let bool_ty = typer.boolean_type();
        let int_ty = typer.integer_type();
        let mut pass = MutationPass::new(m.name.clone(), op, &mut report, &typer.arena, bool_ty, int_ty);
        for f in &mut m.functions { mutate_function(&mut pass, f); }
      }
      log::info!("{} mutants registered", report.mutants.len());
      Some(report)
    } else {
      None
    };

    let modules = lower::lower_program(&typer.arena, &mut typer.symtab, prog)?;
    Ok(CompileOutput { modules, mutation_report })
  }
}

fn fixup_function(table: &callref::ByRefTable, f: &mut FunctionDecl) {
  callref::fixup_stmt(table, &mut f.body);
  for n in &mut f.nested { fixup_function(table, n); }
}

fn mutate_function(pass: &mut MutationPass, f: &mut FunctionDecl) {
  pass.run(&mut f.body);
  for n in &mut f.nested { mutate_function(pass, n); }
}
