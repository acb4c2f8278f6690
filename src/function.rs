use std::fmt;
use std::rc::Rc;

use crate::callable::Callable;
use crate::environment::{self, Env};
use crate::error::Signal;
use crate::interpreter::Interpreter;
use crate::stmt::FunctionStmtData;
use crate::value::Value;

/// A user-declared function or method, closing over the environment active
/// where it was declared.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionStmtData>,
    closure: Env,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionStmtData>, closure: Env, is_initializer: bool) -> LoxFunction {
        LoxFunction { declaration, closure, is_initializer }
    }

    /// Produces a copy of this method bound to `instance`, by wrapping the
    /// closure in a fresh scope that defines `this`. Called once per
    /// `instance.method` lookup so each bound method gets its own tiny scope.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let env = environment::new_enclosed(&self.closure);
        env.borrow_mut().define("this", instance);
        LoxFunction::new(Rc::clone(&self.declaration), env, self.is_initializer)
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

impl Callable for LoxFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, Signal> {
        let env = environment::new_enclosed(&self.closure);

        for (param, arg) in self.declaration.params.iter().zip(arguments.into_iter()) {
            env.borrow_mut().define(&param.lexeme, arg);
        }

        match interpreter.execute_block(&self.declaration.body, env) {
            Ok(()) => {
                if self.is_initializer {
                    Ok(self.closure.borrow().get_at(0, "this"))
                } else {
                    Ok(Value::Nil)
                }
            }
            Err(Signal::Return(value)) => {
                if self.is_initializer {
                    Ok(self.closure.borrow().get_at(0, "this"))
                } else {
                    Ok(value)
                }
            }
            Err(other) => Err(other),
        }
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "< fn {} >", self.name())
    }
}

/// A builtin implemented in Rust rather than declared in Lox source.
pub struct NativeFunction {
    pub name: &'static str,
    arity: usize,
    function: fn(Vec<Value>) -> Value,
}

impl NativeFunction {
    pub fn globals() -> Vec<NativeFunction> {
        vec![NativeFunction {
            name: "clock",
            arity: 0,
            function: |_args| {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .expect("system clock before unix epoch")
                    .as_secs_f64();
                Value::Number(now)
            },
        }]
    }
}

impl Callable for NativeFunction {
    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, Signal> {
        Ok((self.function)(arguments))
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "< native fn >")
    }
}
