//! The typed AST: a closed sum of node kinds with fixed children and a
//! `Span` attached to every node, grounded in the original `ast.py`'s
//! `Node` base class (`position`/`children`/`replace`) but expressed as
//! ordinary Rust enums rather than a reflective visitor hierarchy,
//! since list-shaped children (`spec.md` §9's "owned ordered vector,
//! not a linked recursion of head/tail") are just `Vec<T>` fields here.

use crate::diag::Span;
use crate::types::ty::TypeId;

/// Wraps a node kind with its span and (once the typer has run) its
/// resolved type, mirroring the teacher's `Spanned<T>` convention.
#[derive(Clone, Debug)]
pub struct Spanned<T> {
  pub span: Span,
  pub ty: Option<TypeId>,
  pub k: T,
}

impl<T> Spanned<T> {
  pub fn new(span: Span, k: T) -> Self { Self { span, ty: None, k } }
}

pub type Expr = Spanned<ExprKind>;
pub type Stmt = Spanned<StmtKind>;

/// An lvalue: something that can be loaded from, stored to, or have
/// its address taken.
#[derive(Clone, Debug)]
pub enum Access {
  Var(String),
  Indexed { base: Box<Access>, index: Box<Expr> },
  Field { base: Box<Access>, field: String },
  PointerDeref { base: Box<Access> },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp { Neg, Pos, Not }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
  Add, Sub, Mul, Slash, Div, Mod,
  And, Or,
  Eq, Ne, Lt, Le, Gt, Ge, In,
}

impl BinOp {
  #[must_use] pub fn is_relational(self) -> bool {
    matches!(self, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::In)
  }
  #[must_use] pub fn is_arithmetic(self) -> bool {
    matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Slash | BinOp::Div | BinOp::Mod)
  }
  #[must_use] pub fn is_conditional(self) -> bool { matches!(self, BinOp::And | BinOp::Or) }

  #[must_use] pub fn symbol(self) -> &'static str {
    match self {
      BinOp::Add => "+", BinOp::Sub => "-", BinOp::Mul => "*", BinOp::Slash => "/",
      BinOp::Div => "div", BinOp::Mod => "mod", BinOp::And => "and", BinOp::Or => "or",
      BinOp::Eq => "=", BinOp::Ne => "<>", BinOp::Lt => "<", BinOp::Le => "<=",
      BinOp::Gt => ">", BinOp::Ge => ">=", BinOp::In => "in",
    }
  }
}

#[derive(Clone, Debug)]
pub struct SetMember { pub lo: Box<Expr>, pub hi: Option<Box<Expr>> }

#[derive(Clone, Debug)]
pub struct Argument { pub expr: Expr }

#[derive(Clone, Debug)]
pub enum ExprKind {
  Integer(i64),
  Real(f64),
  Str(String),
  CharLit(u8),
  VarLoad(Access),
  /// Synthesized only by the call-by-reference fixup pass (spec §4.4);
  /// never produced directly by the typer.
  VarReference(Access),
  UnaryOp { op: UnaryOp, operand: Box<Expr> },
  BinaryOp { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
  FunctionCall { name: String, args: Vec<Argument> },
  /// The only AST shape allowed to assert a type different from its
  /// child's (spec §3.3's type-soundness invariant).
  TypeConvert(Box<Expr>),
  Set(Vec<SetMember>),
  SetEmpty,
  Null,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CaseLabel { Const(i64), Range(i64, i64) }

#[derive(Clone, Debug)]
pub struct CaseArm {
  pub labels: Vec<CaseLabel>,
  pub body: Box<Stmt>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ForDir { To, DownTo }

/// Attached by the mutation pass to a guard `if` so the lowering pass
/// can emit profile-weight metadata biasing the "not selected" branch
/// (SPEC_FULL §4.5.3).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BranchHint { Unlikely }

#[derive(Clone, Debug)]
pub enum StmtKind {
  Assignment { lhs: Access, rhs: Expr },
  If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>>, hint: Option<BranchHint> },
  While { cond: Expr, body: Box<Stmt> },
  Repeat { body: Box<Stmt>, cond: Expr },
  For { var: String, from: Expr, to: Expr, dir: ForDir, body: Box<Stmt> },
  Case { selector: Expr, arms: Vec<CaseArm>, otherwise: Option<Box<Stmt>> },
  Goto(String),
  Labeled { label: String, stmt: Box<Stmt> },
  CallStmt { name: String, args: Vec<Argument> },
  With { records: Vec<Expr>, body: Box<Stmt> },
  /// The only list-shaped statement node; a mutation pass rewrites its
  /// elements one-for-many, so it is an owned `Vec`, never a
  /// head/tail recursion (spec §9 Design Notes).
  Block(Vec<Stmt>),
}

impl Stmt {
  #[must_use] pub fn block(span: Span, stmts: Vec<Stmt>) -> Self { Spanned::new(span, StmtKind::Block(stmts)) }
}

// ---- Declaration-level nodes: not lowered directly but consumed by
// the typer to install symbols/typedefs/functions. ----

#[derive(Clone, Debug)]
pub enum TypeExpr {
  Named(String),
  Range(i64, i64),
  Array { element: Box<TypeExpr>, range: Box<TypeExpr> },
  Set(Box<TypeExpr>),
  Pointer(Box<TypeExpr>),
  Record { fields: Vec<(String, TypeExpr)>, variant: Option<Box<VariantPartExpr>> },
  Enum(Vec<String>),
  File(Box<TypeExpr>),
}

#[derive(Clone, Debug)]
pub struct VariantPartExpr {
  pub selector_name: String,
  pub selector_ty: Box<TypeExpr>,
  pub cases: Vec<(Vec<CaseLabel>, Vec<(String, TypeExpr)>)>,
}

#[derive(Clone, Debug)]
pub struct TypeDecl { pub name: String, pub ty: TypeExpr, pub span: Span }

#[derive(Clone, Debug)]
pub struct ConstDecl { pub name: String, pub value: Expr, pub span: Span }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Linkage { Local, Public, Private }

#[derive(Clone, Debug)]
pub struct VarDecl { pub name: String, pub ty: TypeExpr, pub span: Span, pub linkage: Linkage }

#[derive(Clone, Debug)]
pub struct Param { pub name: String, pub ty: TypeExpr, pub by_ref: bool, pub span: Span }

#[derive(Clone, Debug)]
pub struct FunctionDecl {
  pub name: String,
  pub params: Vec<Param>,
  pub ret: Option<TypeExpr>,
  pub consts: Vec<ConstDecl>,
  pub types: Vec<TypeDecl>,
  pub vars: Vec<VarDecl>,
  pub nested: Vec<FunctionDecl>,
  pub body: Stmt,
  pub public: bool,
  pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ModuleDecl {
  pub name: String,
  pub consts: Vec<ConstDecl>,
  pub types: Vec<TypeDecl>,
  pub vars: Vec<VarDecl>,
  pub functions: Vec<FunctionDecl>,
  pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Program {
  pub name: String,
  pub modules: Vec<ModuleDecl>,
  pub consts: Vec<ConstDecl>,
  pub types: Vec<TypeDecl>,
  pub vars: Vec<VarDecl>,
  pub body: Stmt,
  pub span: Span,
}
