//! The scan → parse → resolve → evaluate pipeline.
//!
//! No global "had error" flags: every run reports what happened through the
//! returned [`Outcome`], so runs are independent of each other.

use std::io::Write;

use log::info;

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Exit code for programs rejected before evaluation.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit code for programs aborted by a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// Everything ran.
    Success,

    /// Scanning, parsing or resolving failed; nothing was evaluated.
    StaticErrors(Vec<LoxError>),

    /// Evaluation started and was aborted by this error.
    RuntimeError(LoxError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Conventional process exit code: 0, 65 or 70.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::StaticErrors(_) => EXIT_STATIC_ERROR,
            Outcome::RuntimeError(_) => EXIT_RUNTIME_ERROR,
        }
    }

    /// Every diagnostic, in the order it was found.
    pub fn diagnostics(&self) -> Vec<&LoxError> {
        match self {
            Outcome::Success => Vec::new(),
            Outcome::StaticErrors(errors) => errors.iter().collect(),
            Outcome::RuntimeError(error) => vec![error],
        }
    }
}

/// Run `source` as a program, writing `print` output to `out`.
///
/// Scanner and parser diagnostics are gathered together; the resolver only
/// runs on a syntactically valid program, and evaluation only on a fully
/// valid one.
pub fn run<W: Write>(source: &str, out: &mut W) -> Outcome {
    info!("Running {} byte(s) of source", source.len());

    let (tokens, mut errors) = Scanner::new(source).scan_tokens();

    let mut parser = Parser::new(&tokens);
    let statements = match parser.parse() {
        Ok(statements) => statements,
        Err(parse_errors) => {
            errors.extend(parse_errors);
            return Outcome::StaticErrors(errors);
        }
    };

    if !errors.is_empty() {
        return Outcome::StaticErrors(errors);
    }

    let mut interpreter = Interpreter::with_output(out);

    let mut resolver = Resolver::new(&mut interpreter);
    if let Err(resolve_errors) = resolver.resolve(&statements) {
        return Outcome::StaticErrors(resolve_errors);
    }

    match interpreter.interpret(&statements) {
        Ok(()) => Outcome::Success,
        Err(error) => {
            info!("Run aborted: {}", error);
            Outcome::RuntimeError(error)
        }
    }
}
