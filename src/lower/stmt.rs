//! Statement lowering: control flow becomes basic blocks wired by
//! branch instructions; assignment becomes a `store`; `goto`/labels
//! patch the block graph directly rather than threading through a
//! separate fixup table, since [`Lowering`] seals blocks in emission
//! order. Grounded in the original `codegen.py`'s statement-lowering
//! `visit_*` methods.

use crate::ast::{CaseLabel, ForDir, Stmt, StmtKind};
use crate::diag::Diagnostic;
use super::expr::{lower_access, lower_expr};
use super::withstmt;
use super::Lowering;

pub fn lower_stmt(lw: &mut Lowering, s: &mut Stmt) -> Result<(), Diagnostic> {
  match &mut s.k {
    StmtKind::Block(stmts) => { for st in stmts { lower_stmt(lw, st)?; } Ok(()) }
    StmtKind::Assignment { lhs, rhs } => {
      let v = lower_expr(lw, rhs)?;
      let addr = lower_access(lw, lhs)?;
      lw.emit(format!("store {v}, {addr}"));
      Ok(())
    }
    StmtKind::If { cond, then_branch, else_branch, hint } => {
      let c = lower_expr(lw, cond)?;
      let then_label = lw.new_label("if.then");
      let else_label = lw.new_label("if.else");
      let join_label = lw.new_label("if.end");
      let weight = if hint.is_some() { " !unlikely" } else { "" };
      lw.emit(format!("br {c}, {then_label}, {else_label}{weight}"));
      lw.start_block(then_label);
      lower_stmt(lw, then_branch)?;
      lw.emit(format!("jmp {join_label}"));
      lw.start_block(else_label);
      if let Some(e) = else_branch { lower_stmt(lw, e)?; }
      lw.emit(format!("jmp {join_label}"));
      lw.start_block(join_label);
      Ok(())
    }
    StmtKind::While { cond, body } => {
      let head = lw.new_label("while.head");
      let tail = lw.new_label("while.body");
      let end = lw.new_label("while.end");
      lw.emit(format!("jmp {head}"));
      lw.start_block(head.clone());
      let c = lower_expr(lw, cond)?;
      lw.emit(format!("br {c}, {tail}, {end}"));
      lw.start_block(tail);
      lower_stmt(lw, body)?;
      lw.emit(format!("jmp {head}"));
      lw.start_block(end);
      Ok(())
    }
    StmtKind::Repeat { body, cond } => {
      let head = lw.new_label("repeat.body");
      let end = lw.new_label("repeat.end");
      lw.start_block(head.clone());
      lower_stmt(lw, body)?;
      let c = lower_expr(lw, cond)?;
      lw.emit(format!("br {c}, {end}, {head}"));
      lw.start_block(end);
      Ok(())
    }
    StmtKind::For { var, from, to, dir, body } => {
      let from_v = lower_expr(lw, from)?;
      let to_v = lower_expr(lw, to)?;
      let var_addr = format!("@{var}");
      lw.emit(format!("store {from_v}, {var_addr}"));
      let head = lw.new_label("for.head");
      let tail = lw.new_label("for.body");
      let end = lw.new_label("for.end");
      lw.emit(format!("jmp {head}"));
      lw.start_block(head.clone());
      let cur = lw.new_temp();
      lw.emit(format!("{cur} = load i64, {var_addr}"));
      let cmp = match dir { ForDir::To => "icmp le", ForDir::DownTo => "icmp ge" };
      let cond_t = lw.new_temp();
      lw.emit(format!("{cond_t} = {cmp} {cur}, {to_v}"));
      lw.emit(format!("br {cond_t}, {tail}, {end}"));
      lw.start_block(tail);
      lower_stmt(lw, body)?;
      let next = lw.new_temp();
      let step = match dir { ForDir::To => "add", ForDir::DownTo => "sub" };
      lw.emit(format!("{next} = {step} {cur}, 1"));
      lw.emit(format!("store {next}, {var_addr}"));
      lw.emit(format!("jmp {head}"));
      lw.start_block(end);
      Ok(())
    }
    StmtKind::Case { selector, arms, otherwise } => {
      let sel = lower_expr(lw, selector)?;
      let end = lw.new_label("case.end");
      for arm in arms.iter_mut() {
        let arm_label = lw.new_label("case.arm");
        let next_label = lw.new_label("case.next");
        let matches = arm.labels.iter().map(|l| match l {
          CaseLabel::Const(v) => format!("{v}"),
          CaseLabel::Range(lo, hi) => format!("{lo}..{hi}"),
        }).collect::<Vec<_>>().join(",");
        lw.emit(format!("casecmp {sel}, [{matches}], {arm_label}, {next_label}"));
        lw.start_block(arm_label);
        lower_stmt(lw, &mut arm.body)?;
        lw.emit(format!("jmp {end}"));
        lw.start_block(next_label);
      }
      if let Some(o) = otherwise { lower_stmt(lw, o)?; }
      lw.emit(format!("jmp {end}"));
      lw.start_block(end);
      Ok(())
    }
    StmtKind::Goto(label) => { lw.emit(format!("jmp {label}")); Ok(()) }
    StmtKind::Labeled { label, stmt } => {
      lw.start_block(label.clone());
      lower_stmt(lw, stmt)
    }
    StmtKind::CallStmt { name, args } => {
      super::call::lower_call(lw, name, args, &s.span)?;
      Ok(())
    }
    StmtKind::With { records, body } => {
      for r in records.iter() { withstmt::install_with_scope(lw, r)?; }
      let result = lower_stmt(lw, body);
      for _ in records.iter() { lw.pop_with_hook(); }
      result
    }
  }
}
