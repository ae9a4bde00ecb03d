//! Pipeline driver: scan → parse → resolve → interpret.
//!
//! Each stage reports into the same [`ErrorReporter`].  Any syntax error stops
//! the run before resolution, any resolution error stops it before execution,
//! and the first runtime error ends execution.

use std::rc::Rc;

use log::{debug, info};

use crate::ast::Stmt;
use crate::console::{LineSource, Output};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::reporter::ErrorReporter;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};

/// Outcome of one [`Lox::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// Lexical, syntax or resolution error; nothing was executed.
    SyntaxError,
    /// Execution started and was stopped by a runtime error.
    RuntimeError,
}

impl RunStatus {
    /// Conventional process exit code (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::SyntaxError => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

/// One interpreter session.  Globals and resolved bindings persist across
/// calls to [`Lox::run`], which is what the REPL relies on.
pub struct Lox {
    interpreter: Interpreter,
}

impl Lox {
    pub fn new(output: Rc<dyn Output>) -> Self {
        Self {
            interpreter: Interpreter::new(output),
        }
    }

    pub fn with_input(output: Rc<dyn Output>, input: Rc<dyn LineSource>) -> Self {
        Self {
            interpreter: Interpreter::with_input(output, input),
        }
    }

    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.interpreter.set_max_call_depth(depth);
    }

    pub fn run(&mut self, source: &str, reporter: &mut dyn ErrorReporter) -> RunStatus {
        info!("Running {} bytes of source", source.len());

        let statements: Vec<Stmt> = parse(source, reporter);

        if reporter.had_error() {
            info!("Stopping before resolution: syntax errors");
            return RunStatus::SyntaxError;
        }

        Resolver::new(&mut self.interpreter, reporter).resolve(&statements);

        if reporter.had_error() {
            info!("Stopping before execution: resolution errors");
            return RunStatus::SyntaxError;
        }

        self.interpreter.interpret(&statements, reporter);

        if reporter.had_runtime_error() {
            RunStatus::RuntimeError
        } else {
            RunStatus::Ok
        }
    }
}

/// Scan and parse `source`, reporting every lexical and syntax error.
pub fn parse(source: &str, reporter: &mut dyn ErrorReporter) -> Vec<Stmt> {
    let tokens: Vec<Token> = Scanner::new(source).scan_tokens(reporter);

    Parser::new(&tokens, reporter).parse()
}

/// REPL heuristic: is the buffered input ready to run?
///
/// With any `{` present the braces must balance; otherwise the input must end
/// with `;`.
pub fn is_complete_unit(tokens: &[Token]) -> bool {
    let count = |wanted: TokenType| tokens.iter().filter(|t| t.is(&wanted)).count();

    let left_braces: usize = count(TokenType::LEFT_BRACE);

    let complete: bool = if left_braces > 0 {
        left_braces == count(TokenType::RIGHT_BRACE)
    } else {
        tokens
            .iter()
            .rev()
            .find(|t| !t.is(&TokenType::EOF))
            .is_some_and(|t| t.is(&TokenType::SEMICOLON))
    };

    debug!("Input complete: {}", complete);

    complete
}
