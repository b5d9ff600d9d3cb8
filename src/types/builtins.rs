//! The built-in function/typedef/constant roster the typer installs
//! before walking a program (spec §4.3's "Installs built-in typedefs...
//! Registers all ~40 built-in function signatures"), grounded in the
//! original `typesys.py`'s `TypeSetVisitor.__init__` and in the
//! teacher's `make_prims!` macro from `types/entity.rs`, which builds a
//! closed enum plus `scan`/`from_str`/`as_str` lookups from a
//! `Name: "spelling"` table. This crate's version drops the upstream
//! symbol-interner (`mm0_util::Symbol`) in favor of plain `&'static
//! str` matching, since built-in names are looked up once per call
//! site rather than on every AST node.

macro_rules! make_builtin_enum {
  ($(#[$attr0:meta])* enum $name:ident { $($(#[$attr:meta])* $x:ident: $e:expr,)* }) => {
    $(#[$attr0])*
    #[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
    pub enum $name { $($(#[$attr])* $x),* }

    impl $name {
      /// Evaluate `f` on every variant together with its Pascal-86 spelling.
      pub fn scan(mut f: impl FnMut(Self, &'static str)) { $(f($name::$x, $e);)* }

      #[must_use] pub fn from_str(s: &str) -> Option<Self> {
        match s { $($e => Some(Self::$x),)* _ => None }
      }

      #[must_use] pub fn as_str(self) -> &'static str {
        match self { $(Self::$x => $e,)* }
      }
    }
  }
}

make_builtin_enum! {
  /// Every built-in routine the typer registers signatures for
  /// (spec §4.3) and the lowering pass dispatches by name
  /// (spec §4.6.4).
  enum Builtin {
    /// `new(p)`: allocate `sizeof(p^)` bytes and store the pointer into `p`.
    New: "new",
    /// `dispose(p)`: free the pointee and set `p` to NIL.
    Dispose: "dispose",
    /// `ord(x)`: the ordinal position of an enum/char value.
    Ord: "ord",
    /// `lord(x)`: widened `ord`, used where the result must be `longint`.
    Lord: "lord",
    /// `wrd(x)`: cast an ordinal to `word`.
    Wrd: "wrd",
    /// `chr(x)`: cast an ordinal to `char`.
    Chr: "chr",
    /// `pred(x)`: the predecessor of an ordinal value.
    Pred: "pred",
    /// `succ(x)`: the successor of an ordinal value.
    Succ: "succ",
    /// `odd(x)`: parity of the low bit (spec §9 Open Question 2).
    Odd: "odd",
    /// `abs(x)`: absolute value, `Int` or `Real`.
    Abs: "abs",
    /// `sqr(x)`: `x * x`, lowered as `pow(x, 2)`.
    Sqr: "sqr",
    Sqrt: "sqrt",
    Exp: "exp",
    Ln: "ln",
    Sin: "sin",
    Cos: "cos",
    Tan: "tan",
    Arcsin: "arcsin",
    Arccos: "arccos",
    Arctan: "arctan",
    /// `trunc(x)`: truncate `Real` towards zero to `Int`.
    Trunc: "trunc",
    Ltrunc: "ltrunc",
    /// `round(x)`: round `Real` to nearest `Int`.
    Round: "round",
    Lround: "lround",
    /// `size(T)`: `sizeof` in bytes.
    Size: "size",
    Paramstr: "paramstr",
    Paramcount: "paramcount",
    /// Variadic: formats its arguments with a synthesized `printf` format string.
    Write: "write",
    Writeln: "writeln",
    /// Variadic: scans its arguments with a synthesized `scanf` format string; all arguments passed by reference.
    Read: "read",
    Readln: "readln",
    /// `halt(code?)`: `exit(code)`, default code 0.
    Halt: "halt",
    Inbyt: "inbyt",
    Inwrd: "inwrd",
    Outbyt: "outbyt",
    Outwrd: "outwrd",
    Setinterrupt: "setinterrupt",
    Enableinterrupts: "enableinterrupts",
    Disableinterrupts: "disableinterrupts",
    Causeinterrupt: "causeinterrupt",
    /// `setmutation(n)`: select the nth-registered mutant; 0 disables all.
    Setmutation: "setmutation",
    /// `setmutationid(id)`: select by deterministic id rather than index.
    Setmutationid: "setmutationid",
    Getmutationid: "getmutationid",
    Getmutationmod: "getmutationmod",
    Getmutationcount: "getmutationcount",
  }
}

impl Builtin {
  /// True for the handful of built-ins whose parameters are always
  /// passed by reference regardless of how the call-by-ref fixup pass
  /// would otherwise treat a `VarLoad` argument (spec §4.4: "Variadic
  /// built-ins `read`/`readln` unconditionally pass arguments by
  /// reference").
  #[must_use] pub fn always_by_ref(self) -> bool { matches!(self, Builtin::Read | Builtin::Readln) }

  /// True for the built-ins whose argument count is not fixed
  /// (`write`/`writeln`/`read`/`readln`).
  #[must_use] pub fn is_variadic(self) -> bool {
    matches!(self, Builtin::Write | Builtin::Writeln | Builtin::Read | Builtin::Readln)
  }
}

/// The built-in typedef names the typer installs, per spec §4.3:
/// `(name, signed, width)`; `bytes` is handled separately since it
/// resolves to `Any` rather than an `Int`.
pub const BUILTIN_INT_TYPEDEFS: &[(&str, bool, u8)] = &[
  ("integer", true, 16),
  ("longint", true, 32),
  ("word", false, 16),
];

pub const BUILTIN_REAL_TYPEDEFS: &[(&str, u8)] = &[
  ("real", 32),
  ("longreal", 64),
  ("tempreal", 80),
];

/// Built-in constants and their values, per spec §4.3.
pub const BUILTIN_INT_CONSTS: &[(&str, i64)] = &[
  ("maxint", i16::MAX as i64),
  ("maxlongint", i32::MAX as i64),
  ("maxword", u16::MAX as i64),
  ("cr", 13),
  ("lf", 10),
];

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_through_scan() {
    let mut seen = Vec::new();
    Builtin::scan(|b, s| seen.push((b, s)));
    assert_eq!(seen.len(), 45);
    for (b, s) in seen {
      assert_eq!(Builtin::from_str(s), Some(b));
      assert_eq!(b.as_str(), s);
    }
  }

  #[test]
  fn read_and_readln_are_always_by_ref() {
    assert!(Builtin::Read.always_by_ref());
    assert!(Builtin::Readln.always_by_ref());
    assert!(!Builtin::Write.always_by_ref());
  }
}
