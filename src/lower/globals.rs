//! Global variable and module-constructor lowering (spec §4.6.1,
//! §6.4): every top-level `var` becomes an LLIR global; the program's
//! own module gets the entry-point's globals installed directly,
//! rather than through a constructor, since the entry module never has
//! a caller that would run one first.

use crate::ast::{ModuleDecl, Program};
use super::{Global, Lowering};

pub fn lower_module_globals(lw: &mut Lowering, m: &ModuleDecl) {
  for v in &m.vars {
    lw.module.globals.push(Global { name: v.name.clone(), ty: "i64".into(), init: None });
  }
}

pub fn lower_program_globals(lw: &mut Lowering, prog: &Program) {
  for v in &prog.vars {
    lw.module.globals.push(Global { name: v.name.clone(), ty: "i64".into(), init: None });
  }
}
