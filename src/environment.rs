use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// A lexically nested name -> value mapping with a parent link. Environments
/// are shared (`Rc<RefCell<_>>`) because closures, classes and active call
/// frames may all reference the same one; it lives as long as any of them
/// does.
#[derive(Debug)]
pub struct EnvironmentData {
    bindings: HashMap<String, Value>,
    parent: Option<Env>,
}

pub type Env = Rc<RefCell<EnvironmentData>>;

pub fn new_global() -> Env {
    Rc::new(RefCell::new(EnvironmentData {
        bindings: HashMap::new(),
        parent: None,
    }))
}

pub fn new_enclosed(parent: &Env) -> Env {
    Rc::new(RefCell::new(EnvironmentData {
        bindings: HashMap::new(),
        parent: Some(Rc::clone(parent)),
    }))
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError {
        token: name.clone(),
        message: format!("Undefined variable '{}'.", name.lexeme),
    }
}

impl EnvironmentData {
    /// Unconditional insert/overwrite in this scope.
    pub fn define(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    fn ancestor(&self, distance: usize) -> Env {
        let mut env = self.parent.clone().expect("ancestor: environment chain shorter than distance");
        for _ in 1..distance {
            let next = env.borrow().parent.clone().expect("ancestor: environment chain shorter than distance");
            env = next;
        }
        env
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.bindings.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(parent) = &self.parent {
            return parent.borrow().get(name);
        }

        Err(undefined(name))
    }

    /// Assigns in the nearest scope that already contains `name`; never
    /// auto-declares. Returns as soon as a successful assignment is found
    /// instead of falling through to the "undefined" error afterward.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.bindings.contains_key(&name.lexeme) {
            self.bindings.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(parent) = &self.parent {
            return parent.borrow_mut().assign(name, value);
        }

        Err(undefined(name))
    }

    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        if distance == 0 {
            self.bindings.get(name).cloned().unwrap_or(Value::Nil)
        } else {
            self.ancestor(distance).borrow().bindings.get(name).cloned().unwrap_or(Value::Nil)
        }
    }

    pub fn assign_at(&mut self, distance: usize, name: &Token, value: Value) {
        if distance == 0 {
            self.bindings.insert(name.lexeme.clone(), value);
        } else {
            self.ancestor(distance).borrow_mut().bindings.insert(name.lexeme.clone(), value);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::Kind;

    fn token(name: &str) -> Token {
        Token::new(Kind::Identifier, name.to_string(), None, 1)
    }

    #[test]
    fn define_and_get() {
        let global = new_global();
        global.borrow_mut().define("a", Value::Number(1.0));
        assert_eq!(global.borrow().get(&token("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn get_falls_back_to_parent() {
        let global = new_global();
        global.borrow_mut().define("a", Value::Number(1.0));
        let child = new_enclosed(&global);
        assert_eq!(child.borrow().get(&token("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_never_auto_declares() {
        let global = new_global();
        let err = global.borrow_mut().assign(&token("missing"), Value::Nil);
        assert!(err.is_err());
    }

    #[test]
    fn assign_reaches_enclosing_scope_and_stops() {
        let global = new_global();
        global.borrow_mut().define("a", Value::Number(1.0));
        let child = new_enclosed(&global);
        child.borrow_mut().assign(&token("a"), Value::Number(2.0)).unwrap();
        assert_eq!(global.borrow().get(&token("a")).unwrap(), Value::Number(2.0));
        assert!(!child.borrow().bindings.contains_key("a"));
    }

    #[test]
    fn get_at_and_assign_at_hop_directly() {
        let global = new_global();
        global.borrow_mut().define("a", Value::Number(1.0));
        let child = new_enclosed(&global);
        let grandchild = new_enclosed(&child);

        assert_eq!(grandchild.borrow().get_at(2, "a"), Value::Number(1.0));
        grandchild.borrow_mut().assign_at(2, &token("a"), Value::Number(9.0));
        assert_eq!(global.borrow().get(&token("a")).unwrap(), Value::Number(9.0));
    }
}
