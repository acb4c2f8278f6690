use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::callable::Callable;
use crate::error::{RuntimeError, Signal};
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> LoxClass {
        LoxClass { name, superclass, methods }
    }

    /// Looks up a method on this class, falling back to the superclass
    /// chain. Bound methods are produced by the caller, not here.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass.as_ref().and_then(|s| s.find_method(name))
    }

    /// A class's arity as a constructor is its `init` method's, or 0 if it
    /// declares none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

/// Constructs a new instance and, if the class defines `init`, runs it.
/// A free function rather than `Callable::call` because it needs the `Rc`
/// that owns the class to build the bound `this` closures methods capture.
pub fn instantiate(
    class: &Rc<LoxClass>,
    interpreter: &mut Interpreter,
    arguments: Vec<Value>,
) -> Result<Value, Signal> {
    let instance = Rc::new(RefCell::new(LoxInstance {
        class: Rc::clone(class),
        fields: HashMap::new(),
    }));
    let instance_value = Value::Instance(Rc::clone(&instance));

    if let Some(initializer) = class.find_method("init") {
        initializer.bind(instance_value.clone()).call(interpreter, arguments)?;
    }

    Ok(instance_value)
}

#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    /// `self_value` is the `Value::Instance` that owns this instance, needed
    /// so a found method can be bound to it.
    pub fn get(&self, name: &Token, self_value: &Value) -> Result<Value, RuntimeError> {
        if let Some(field) = self.fields.get(&name.lexeme) {
            return Ok(field.clone());
        }

        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(self_value.clone()))));
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined property '{}'.", name.lexeme),
        })
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}
