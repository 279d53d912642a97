//! Core library for the Oleander scripting language: lexing, parsing,
//! tree-walking evaluation, the builtin function set, and the interactive
//! REPL used by the `oleander` binary.

pub mod ast;
pub mod builtins;
pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, OleanderError, Position, Result, RuntimeErrorKind};
pub use repl::Repl;
pub use runtime::Interpreter;
pub use value::Value;
