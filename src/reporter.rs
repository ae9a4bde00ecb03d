//! Diagnostic sink shared by every pipeline stage.
//!
//! Reporting never unwinds the caller: the scanner, parser and resolver keep
//! going after a report so one pass can surface several independent errors.

use log::info;

use crate::error::{LoxError, RuntimeError};
use crate::token::Token;

pub trait ErrorReporter {
    /// Report an error that only has a line, e.g. from the scanner.
    fn at_line(&mut self, line: usize, message: &str);

    /// Report a syntax error located at `token`.
    fn at_token(&mut self, token: &Token, message: &str);

    /// Report a static-analysis error located at `token`.
    fn resolve_error(&mut self, token: &Token, message: &str);

    /// Report an uncaught runtime error.
    fn runtime_error(&mut self, error: RuntimeError);

    /// Any syntax or resolution error so far?
    fn had_error(&self) -> bool;

    fn had_runtime_error(&self) -> bool;
}

/// Keeps every diagnostic, in report order, until it is flushed.
#[derive(Debug, Default)]
pub struct BufferedErrorReporter {
    errors: Vec<LoxError>,
    had_error: bool,
    had_runtime_error: bool,
}

impl BufferedErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered diagnostics, one entry per report.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Forget everything reported so far.
    pub fn clear(&mut self) {
        self.errors.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }

    fn push(&mut self, error: LoxError) {
        info!("Reported: {}", error);

        self.errors.push(error);
    }
}

impl ErrorReporter for BufferedErrorReporter {
    fn at_line(&mut self, line: usize, message: &str) {
        self.push(LoxError::lex(line, message));
        self.had_error = true;
    }

    fn at_token(&mut self, token: &Token, message: &str) {
        self.push(LoxError::parse(token, message));
        self.had_error = true;
    }

    fn resolve_error(&mut self, token: &Token, message: &str) {
        self.push(LoxError::resolve(token, message));
        self.had_error = true;
    }

    fn runtime_error(&mut self, error: RuntimeError) {
        self.push(LoxError::Runtime(error));
        self.had_runtime_error = true;
    }

    fn had_error(&self) -> bool {
        self.had_error
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }
}
