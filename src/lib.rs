//! A tree-walking interpreter for the Lox language.
//!
//! Source text flows through [`scanner`], [`parser`] and [`resolver`] before
//! [`interpreter`] evaluates it; [`runner::run`] wires the stages together.

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod runner;
pub mod scanner;
pub mod stack;
pub mod token;
pub mod value;

pub use error::LoxError;
pub use runner::{run, Outcome};
