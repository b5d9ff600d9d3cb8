//! Source spans and the crate-wide error/diagnostic types.
//!
//! Every pass returns `Result<T, Error>`; the AST-root boundary in
//! [`crate::Compiler::compile_file`] wraps the first error into a
//! [`Diagnostic`] carrying its resolved span, per the `"<file:line>:
//! <message>"` user-visible format.

use std::fmt;
use std::rc::Rc;

/// A source location: file identity plus a one-based line and a lexer
/// byte span within that line's enclosing token stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
  pub file: Rc<str>,
  pub line: u32,
  pub start: u32,
  pub end: u32,
}

impl Span {
  #[must_use] pub fn new(file: Rc<str>, line: u32, start: u32, end: u32) -> Self {
    Self { file, line, start, end }
  }

  /// A synthetic span for nodes cloned by the mutation pass; callers
  /// should prefer [`Span::clone`] of the displaced node's span instead,
  /// but this exists for built-in scaffolding with no source origin.
  #[must_use] pub fn synthetic() -> Self {
    Self { file: Rc::from("<synthetic>"), line: 0, start: 0, end: 0 }
  }
}

impl fmt::Display for Span {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.file, self.line)
  }
}

/// Errors raised while walking and mutating the symbol-table stack.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SymtabError {
  #[error("unknown symbol '{0}'")]
  UnknownSymbol(String),
  #[error("unknown typedef '{0}'")]
  UnknownTypedef(String),
  #[error("unknown function '{0}'")]
  UnknownFunction(String),
  #[error("unknown goto label '{0}'")]
  UnknownGoto(String),
  #[error("exit_scope called with no matching enter_scope")]
  ScopeUnderflow,
}

/// Errors raised by the type system and the typer pass.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
  #[error("cannot cast {source} to {target}")]
  IllegalCast { source: String, target: String },
  #[error("invalid binary expression: {0}")]
  InvalidBinaryExpr(String),
  #[error("unknown field '{0}'")]
  UnknownField(String),
  #[error("unknown function '{0}'")]
  UnknownFunction(String),
  #[error("unknown symbol '{0}'")]
  UnknownSymbol(String),
  #[error("wrong argument count: expected {expected}, got {got}")]
  WrongArgumentCount { expected: usize, got: usize },
  #[error("argument is not referenceable")]
  ArgumentNotReferenceable,
  #[error("not a constant expression")]
  IllegalConstantExpression,
  #[error("illegal range type: {0}")]
  IllegalRangeType(String),
  #[error("invalid set range: {0}")]
  InvalidSetRange(String),
  #[error("type is not indexable: {0}")]
  NonIndexedType(String),
  #[error("type is not a pointer: {0}")]
  NonPointerType(String),
  #[error("unknown loop direction, expected 'to' or 'downto'")]
  UnknownLoopDirection,
}

/// Errors raised while lowering the typed AST to LLIR.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
  #[error("unsupported conversion from {source} to {target}")]
  UnsupportedConversion { source: String, target: String },
  #[error("unknown built-in '{0}'")]
  UnknownBuiltin(String),
  #[error("set range endpoints must be constant")]
  UnsupportedSetRange,
}

/// The union of every pass's error kind, per the taxonomy in the
/// error-handling design.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error(transparent)]
  Symtab(#[from] SymtabError),
  #[error(transparent)]
  Type(#[from] TypeError),
  #[error(transparent)]
  Lower(#[from] LowerError),
}

/// An [`Error`] paired with the span at which it was raised, formatted
/// as `"<file:line>: <message>"` for stderr.
#[derive(Debug, Clone)]
pub struct Diagnostic {
  pub span: Span,
  pub error: Error,
}

impl Diagnostic {
  #[must_use] pub fn new(span: Span, error: impl Into<Error>) -> Self {
    Self { span, error: error.into() }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.span, self.error)
  }
}

impl std::error::Error for Diagnostic {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { Some(&self.error) }
}

pub type Result<T> = std::result::Result<T, Diagnostic>;
