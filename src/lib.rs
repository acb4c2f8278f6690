//! Lox is a dynamically typed language with lexical scoping and first-class
//! functions, implemented here as a tree-walk interpreter with a
//! hand-written recursive descent parser.
//!
//! ## Scanning
//! The first step in the interpreter is scanning: converting a string of
//! characters into a list of tokens. The scanner is implemented in the
//! [`scanner`] module as a consuming iterator over the source's characters.
//! It reports lexical errors as a [`ScanError`](error::ScanError) -- problems
//! like an unterminated string or an unexpected character -- and keeps
//! scanning past them so multiple mistakes surface in one pass.
//!
//! ## Parsing
//! The second step converts the token list into an abstract syntax tree. The
//! parser is implemented in the [`parser`] module as a recursive descent
//! parser over [`Expr`](expr::Expr) and [`Stmt`](stmt::Stmt) nodes. It reports
//! syntax errors as a [`ParseError`](error::ParseError) and resynchronizes at
//! statement boundaries so it can keep parsing after one.
//!
//! ## Resolving
//! The third step is a static pre-pass over the AST, implemented in the
//! [`resolver`] module, that determines how many enclosing scopes away each
//! variable reference's binding lives. This is what lets closures and
//! shadowed locals resolve correctly regardless of when a later assignment
//! might redefine a same-named global. The resolver reports semantic
//! mistakes that are syntactically valid but meaningless, such as reading a
//! local in its own initializer, as a [`ResolveError`](error::ResolveError).
//!
//! ## Interpreting
//! The final step walks the resolved AST and evaluates it. The interpreter
//! is implemented in the [`interpreter`] module and manages the environment
//! chain ([`environment`]), built in the [`environment`] module as a linked
//! chain of scopes. Most runtime mistakes, such as adding a string to a
//! number, can only be caught here, and are reported as a
//! [`RuntimeError`](error::RuntimeError).

use std::fs;
use std::process;

pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod parser;
pub mod resolver;
pub mod runtime;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use runtime::Runtime;
use scanner::Scanner;

/// Ties the pipeline together and owns the state that has to survive across
/// runs: the interpreter's globals (so a REPL session can build on previous
/// lines) and the per-run error flags.
pub struct Lox {
    interpreter: Interpreter,
    runtime: Runtime,
}

impl Lox {
    pub fn new() -> Self {
        Lox { interpreter: Interpreter::new(), runtime: Runtime::new() }
    }

    pub fn run_file(&mut self, path: &str) {
        let contents = fs::read_to_string(path).unwrap_or_else(|err| {
            eprintln!("Could not read file '{path}': {err}");
            process::exit(66);
        });

        self.run(&contents);

        if self.runtime.had_error() {
            process::exit(65);
        }
        if self.runtime.had_runtime_error() {
            process::exit(70);
        }
    }

    /// Runs a single line of a REPL session, resetting the error flags
    /// before the next line so one mistake doesn't end the session.
    pub fn run_line(&mut self, source: &str) {
        self.run(source);
        self.runtime.reset();
    }

    fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source).scan_tokens(&self.runtime);

        if self.runtime.had_error() {
            return;
        }

        let statements = Parser::new(tokens, &self.runtime).parse();

        if self.runtime.had_error() {
            return;
        }

        let mut resolver = Resolver::new(&self.runtime);
        resolver.resolve(&statements);

        if self.runtime.had_error() {
            return;
        }

        self.interpreter.set_locals(resolver.into_locals());
        self.interpreter.interpret(&statements, &self.runtime);
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
