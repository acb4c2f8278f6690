use crate::runtime::Runtime;
use crate::token::{Kind, Token};
use crate::value::Value;

/// Every diagnostic knows how to render and record itself against an
/// explicit [`Runtime`], rather than mutating a process-global singleton.
pub trait Diagnostic {
    fn report(&self, runtime: &Runtime);
}

/// A scanning error: only a line is available, there is no token yet.
#[derive(Debug)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Diagnostic for ScanError {
    fn report(&self, runtime: &Runtime) {
        runtime.error(self.line, &self.message);
    }
}

/// A parse error: token-aware, triggers panic-mode `synchronize`.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for ParseError {
    fn report(&self, runtime: &Runtime) {
        if self.token.kind == Kind::Eof {
            runtime.report(self.token.line, " at end", &self.message);
        } else {
            runtime.report(self.token.line, &format!(" at '{}'", self.token.lexeme), &self.message);
        }
    }
}

/// A static resolver error: syntactically valid, semantically invalid.
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for ResolveError {
    fn report(&self, runtime: &Runtime) {
        runtime.report(self.token.line, &format!(" at '{}'", self.token.lexeme), &self.message);
    }
}

/// A runtime error: aborts the current top-level statement.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for RuntimeError {
    fn report(&self, runtime: &Runtime) {
        runtime.runtime_error(self);
    }
}

/// An assertion failure: `assert` evaluated its expression as falsy.
#[derive(Debug, Clone)]
pub struct AssertionError {
    pub line: usize,
    pub message: String,
}

impl Diagnostic for AssertionError {
    fn report(&self, runtime: &Runtime) {
        runtime.assertion_error(self);
    }
}

/// Non-local control flow produced while executing a statement list: either
/// an in-flight `return`, or one of the two error kinds that unwind the call
/// stack. Statement execution returns `Result<(), Signal>` and `Ok` always
/// means "ran off the end of the block normally" -- there is no third state.
#[derive(Debug, Clone)]
pub enum Signal {
    Return(Value),
    Error(RuntimeError),
    Assertion(AssertionError),
}

impl From<RuntimeError> for Signal {
    fn from(error: RuntimeError) -> Self {
        Signal::Error(error)
    }
}

impl From<AssertionError> for Signal {
    fn from(error: AssertionError) -> Self {
        Signal::Assertion(error)
    }
}
