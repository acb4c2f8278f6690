use std::cell::Cell;

use crate::error::{AssertionError, RuntimeError};

/// The explicit, non-singleton home for the pipeline's error flags.
///
/// A single `Runtime` is created once per `Lox` session and threaded by
/// reference into the scanner, parser, resolver and interpreter. Static
/// globals were deliberately avoided here: passing `&Runtime` keeps the
/// error-flag state visible at every call site instead of hidden behind
/// `unsafe` statics.
#[derive(Debug, Default)]
pub struct Runtime {
    had_error: Cell<bool>,
    had_runtime_error: Cell<bool>,
}

impl Runtime {
    pub fn new() -> Runtime {
        Runtime::default()
    }

    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    /// Clears both flags. Used by the REPL between lines.
    pub fn reset(&self) {
        self.had_error.set(false);
        self.had_runtime_error.set(false);
    }

    /// Reports a static error with no further context (`where = ""`).
    pub fn error(&self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    pub fn report(&self, line: usize, location: &str, message: &str) {
        eprintln!("[line {line}] Error{location}: {message}");
        self.had_error.set(true);
    }

    pub fn runtime_error(&self, error: &RuntimeError) {
        eprintln!("{}\n[line {}]", error.message, error.token.line);
        self.had_runtime_error.set(true);
    }

    pub fn assertion_error(&self, error: &AssertionError) {
        eprintln!("Assertion Error on line {}: {}", error.line, error.message);
        self.had_runtime_error.set(true);
    }
}
