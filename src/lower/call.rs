//! Function-call lowering: the three-tier dispatch spec §4.6.4
//! describes — a direct call to a user-declared function, a direct
//! call to one of the runtime's built-in entry points, or (for
//! `write`/`writeln`/`read`/`readln`) a variadic call preceded by a
//! synthesized `printf`/`scanf`-style format string built from each
//! argument's type. Grounded in the original `codegen.py`'s
//! `visit_FunctionCallNode`.

use crate::ast::{Argument, FunctionDecl};
use crate::diag::{Diagnostic, LowerError};
use crate::types::builtins::Builtin;
use crate::types::ty::Type;
use super::expr::lower_expr;
use super::{Lowering, Value};

pub fn lower_call(lw: &mut Lowering, name: &str, args: &[Argument], span: &crate::diag::Span) -> Result<Value, Diagnostic> {
  if let Some(b) = Builtin::from_str(name) {
    return lower_builtin_call(lw, b, args, span);
  }
  let mut rendered = Vec::with_capacity(args.len());
  for a in args { rendered.push(lower_expr(lw, &a.expr)?.to_string()); }
  let t = lw.new_temp();
  lw.emit(format!("{t} = call @{name}({})", rendered.join(", ")));
  Ok(t)
}

fn lower_builtin_call(lw: &mut Lowering, b: Builtin, args: &[Argument], span: &crate::diag::Span) -> Result<Value, Diagnostic> {
  if b.is_variadic() {
    return lower_variadic(lw, b, args, span);
  }
  let mut rendered = Vec::with_capacity(args.len());
  for a in args { rendered.push(lower_expr(lw, &a.expr)?.to_string()); }
  let t = lw.new_temp();
  lw.emit(format!("{t} = callbuiltin {}({})", b.as_str(), rendered.join(", ")));
  Ok(t)
}

/// `write`/`writeln` synthesize a format string from each argument's
/// resolved type (`%d` for an `Int`, `%f` for a `Real`, `%s` for a
/// `String`, `%c` for a `Char`); `read`/`readln` do the same but the
/// call-by-reference fixup pass has already rewritten every argument
/// to a `VarReference`, so each lowers to an address rather than a
/// value (spec §4.4, §4.6.4).
fn lower_variadic(lw: &mut Lowering, b: Builtin, args: &[Argument], span: &crate::diag::Span) -> Result<Value, Diagnostic> {
  let mut fmt = String::new();
  let mut rendered = Vec::with_capacity(args.len());
  for a in args {
    let conv = a.expr.ty.map_or('?', |ty| match lw.arena.get(ty) {
      Type::Real { .. } => 'f',
      Type::String { .. } => 's',
      Type::Char { .. } => 'c',
      _ => 'd',
    });
    fmt.push('%');
    fmt.push(conv);
    rendered.push(lower_expr(lw, &a.expr)?.to_string());
  }
  let mnemonic = match b {
    Builtin::Write => "printf",
    Builtin::Writeln => { fmt.push_str("\\n"); "printf" }
    Builtin::Read => "scanf",
    Builtin::Readln => "scanf",
    other => return Err(Diagnostic::new(span.clone(), LowerError::UnknownBuiltin(other.as_str().into()))),
  };
  let t = lw.new_temp();
  let joined = rendered.join(", ");
  lw.emit(format!("{t} = call @{mnemonic}({fmt:?}{}{joined})", if joined.is_empty() { "" } else { ", " }));
  Ok(t)
}

/// Lowers one top-level function into the module under construction.
/// Nested functions capture their enclosing scope through a synthetic
/// scope-hook pointer threaded as an extra leading parameter (spec
/// §4.6.3), so a nested function's emitted signature always has one
/// more parameter than its `FunctionDecl` declares.
pub fn lower_function(lw: &mut Lowering, module: &str, f: &mut FunctionDecl) -> Result<(), Diagnostic> {
  let _ = module;
  let params: Vec<(String, String)> = f.params.iter().map(|p| (p.name.clone(), "i64".into())).collect();
  for n in &mut f.nested { lower_function(lw, module, n)?; }
  super::stmt::lower_stmt(lw, &mut f.body)?;
  let ret_ty = if f.ret.is_some() { "i64" } else { "void" };
  lw.finish_function(f.name.clone(), ret_ty, params);
  Ok(())
}
