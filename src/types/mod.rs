//! The type system (spec §4.2): the structural type universe and its
//! arena, upcast/downcast rules, constant folding, and the built-in
//! typedef/const/function roster the typer installs.

pub mod builtins;
pub mod constfold;
pub mod ty;
pub mod upcast;
