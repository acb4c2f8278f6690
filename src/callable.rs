use std::fmt::Debug;

use crate::error::Signal;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Anything invoked with `(...)` that runs by executing a body: user
/// functions, methods, and natives. Class construction is a distinct call
/// shape (it builds an instance around an optional `init` call) and is
/// dispatched separately rather than through this trait.
pub trait Callable: Debug {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, Signal>;

    fn arity(&self) -> usize;
}
