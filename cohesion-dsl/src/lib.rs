//! Lexing and parsing for a restricted scripting subset. This crate owns
//! source text and produces an AST; it knows nothing about coloring,
//! lifting, or workflow compilation (that's `cohesion-ast`).

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod location;
pub mod parser;

pub use ast::{ExceptHandler, Expr, Literal, Module, Stmt, UnaryOperator};
pub use errors::ParseError;
pub use location::{TextPos, TextRange};
pub use parser::parse;
