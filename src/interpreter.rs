use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::callable::Callable;
use crate::class::{self, LoxClass};
use crate::environment::{self, Env};
use crate::error::{AssertionError, RuntimeError, Signal};
use crate::expr::{Expr, NodeId};
use crate::function::{LoxFunction, NativeFunction};
use crate::runtime::Runtime;
use crate::stmt::Stmt;
use crate::token::{Kind, Token};
use crate::value::Value;

/// Walks the AST and evaluates it. Owns the global environment and the
/// current call-frame environment; variable lookups that the resolver
/// tagged with a scope distance skip straight to that ancestor instead of
/// walking the chain searching for a name.
pub struct Interpreter {
    pub globals: Env,
    environment: Env,
    locals: HashMap<NodeId, usize>,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Builds an interpreter that writes `print` output to `output` instead
    /// of stdout, so tests can capture it without spawning a subprocess.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = environment::new_global();
        for native in NativeFunction::globals() {
            globals.borrow_mut().define(native.name, Value::Native(Rc::new(native)));
        }

        Interpreter { environment: Rc::clone(&globals), globals, locals: HashMap::new(), output }
    }

    pub fn set_locals(&mut self, locals: HashMap<NodeId, usize>) {
        self.locals = locals;
    }

    pub fn interpret(&mut self, statements: &[Stmt], runtime: &Runtime) {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                Err(Signal::Error(error)) => {
                    runtime.runtime_error(&error);
                    return;
                }
                Err(Signal::Assertion(error)) => {
                    runtime.assertion_error(&error);
                    return;
                }
                Err(Signal::Return(_)) => {
                    unreachable!("return outside a function is rejected by the resolver")
                }
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Signal> {
        match stmt {
            Stmt::Expression(data) => {
                self.evaluate(&data.expr)?;
                Ok(())
            }
            Stmt::Print(data) => {
                let value = self.evaluate(&data.expr)?;
                writeln!(self.output, "{value}").expect("write to print sink");
                Ok(())
            }
            Stmt::Var(data) => {
                let value = match &data.initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(&data.name.lexeme, value);
                Ok(())
            }
            Stmt::Block(data) => {
                let scope = environment::new_enclosed(&self.environment);
                self.execute_block(&data.statements, scope)
            }
            Stmt::If(data) => {
                if self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.then_branch)
                } else if let Some(else_branch) = &data.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(data) => {
                while self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.body)?;
                }
                Ok(())
            }
            Stmt::Function(declaration) => {
                let function = LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Return(data) => {
                let value = match &data.value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Signal::Return(value))
            }
            Stmt::Assert(data) => {
                let value = self.evaluate(&data.expr)?;
                if !value.is_truthy() {
                    return Err(Signal::Assertion(AssertionError {
                        line: data.token.line,
                        message: "Assertion failed.".to_string(),
                    }));
                }
                Ok(())
            }
            Stmt::Class(data) => self.execute_class(data),
        }
    }

    /// Runs `statements` in `scope`, restoring the previous environment on
    /// every exit path -- including an early `return` or error unwind.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: Env) -> Result<(), Signal> {
        let previous = std::mem::replace(&mut self.environment, scope);

        let result = (|| {
            for statement in statements {
                self.execute(statement)?;
            }
            Ok(())
        })();

        self.environment = previous;
        result
    }

    fn execute_class(&mut self, data: &crate::stmt::ClassData) -> Result<(), Signal> {
        let superclass = match &data.superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        let Expr::Variable(variable) = expr else { unreachable!() };
                        return Err(RuntimeError {
                            token: variable.name.clone(),
                            message: "Superclass must be a class.".to_string(),
                        }
                        .into());
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, Value::Nil);

        let method_scope = match &superclass {
            Some(superclass) => {
                let scope = environment::new_enclosed(&self.environment);
                scope.borrow_mut().define("super", Value::Class(Rc::clone(superclass)));
                scope
            }
            None => Rc::clone(&self.environment),
        };

        let mut methods = HashMap::new();
        for method in &data.methods {
            let is_initializer = method.name.lexeme == "init";
            let function = LoxFunction::new(Rc::clone(method), Rc::clone(&method_scope), is_initializer);
            methods.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class = LoxClass::new(data.name.lexeme.clone(), superclass, methods);
        self.environment.borrow_mut().assign(&data.name, Value::Class(Rc::new(class)))
            .map_err(Signal::Error)?;

        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Signal> {
        match expr {
            Expr::Literal(data) => Ok(data.value.clone()),
            Expr::Grouping(data) => self.evaluate(&data.inner),
            Expr::Logical(data) => self.evaluate_logical(data),
            Expr::Unary(data) => self.evaluate_unary(data),
            Expr::Binary(data) => self.evaluate_binary(data),
            Expr::Variable(data) => self.look_up_variable(data.id, &data.name).map_err(Signal::Error),
            Expr::Assign(data) => self.evaluate_assign(data),
            Expr::Call(data) => self.evaluate_call(data),
            Expr::Get(data) => self.evaluate_get(data),
            Expr::Set(data) => self.evaluate_set(data),
            Expr::This(data) => self.look_up_variable(data.id, &data.keyword).map_err(Signal::Error),
            Expr::Super(data) => self.evaluate_super(data),
        }
    }

    fn evaluate_logical(&mut self, data: &crate::expr::LogicalData) -> Result<Value, Signal> {
        let left = self.evaluate(&data.left)?;

        if data.operator.kind == Kind::Or {
            if left.is_truthy() {
                return Ok(left);
            }
        } else if !left.is_truthy() {
            return Ok(left);
        }

        self.evaluate(&data.right)
    }

    fn evaluate_unary(&mut self, data: &crate::expr::UnaryData) -> Result<Value, Signal> {
        let right = self.evaluate(&data.right)?;

        match data.operator.kind {
            Kind::Minus => {
                let n = number_operand(&data.operator, &right)?;
                Ok(Value::Number(-n))
            }
            Kind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser only produces ! and - as unary operators"),
        }
    }

    fn evaluate_binary(&mut self, data: &crate::expr::BinaryData) -> Result<Value, Signal> {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;
        let op = &data.operator;

        let value = match op.kind {
            Kind::Greater => {
                let (l, r) = number_operands(op, &left, &right)?;
                Value::Bool(l > r)
            }
            Kind::GreaterEqual => {
                let (l, r) = number_operands(op, &left, &right)?;
                Value::Bool(l >= r)
            }
            Kind::Less => {
                let (l, r) = number_operands(op, &left, &right)?;
                Value::Bool(l < r)
            }
            Kind::LessEqual => {
                let (l, r) = number_operands(op, &left, &right)?;
                Value::Bool(l <= r)
            }
            Kind::BangEqual => Value::Bool(left != right),
            Kind::EqualEqual => Value::Bool(left == right),
            Kind::Minus => {
                let (l, r) = number_operands(op, &left, &right)?;
                Value::Number(l - r)
            }
            Kind::Slash => {
                let (l, r) = number_operands(op, &left, &right)?;
                if r == 0.0 {
                    return Err(RuntimeError { token: op.clone(), message: "Cannot divide by zero.".to_string() }.into());
                }
                Value::Number(l / r)
            }
            Kind::Star => {
                let (l, r) = number_operands(op, &left, &right)?;
                Value::Number(l * r)
            }
            Kind::Plus => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Value::Number(l + r),
                (Value::String(l), Value::String(r)) => Value::string(format!("{l}{r}")),
                _ => {
                    return Err(RuntimeError {
                        token: op.clone(),
                        message: "Operands must be two numbers or two strings.".to_string(),
                    }
                    .into());
                }
            },
            _ => unreachable!("parser only produces comparison/arithmetic operators as binary operators"),
        };

        Ok(value)
    }

    fn evaluate_assign(&mut self, data: &crate::expr::AssignData) -> Result<Value, Signal> {
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&data.id) {
            Some(&distance) => self.environment.borrow_mut().assign_at(distance, &data.name, value.clone()),
            None => self.globals.borrow_mut().assign(&data.name, value.clone()).map_err(Signal::Error)?,
        }

        Ok(value)
    }

    fn look_up_variable(&self, id: NodeId, name: &Token) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(self.environment.borrow().get_at(distance, &name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_call(&mut self, data: &crate::expr::CallData) -> Result<Value, Signal> {
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        match callee {
            Value::Function(function) => call_with_arity(function.as_ref(), self, &data.paren, arguments),
            Value::Native(native) => call_with_arity(native.as_ref(), self, &data.paren, arguments),
            Value::Class(class) => {
                if arguments.len() != class.arity() {
                    return Err(RuntimeError {
                        token: data.paren.clone(),
                        message: format!("Expected {} arguments but got {}.", class.arity(), arguments.len()),
                    }
                    .into());
                }
                class::instantiate(&class, self, arguments)
            }
            _ => Err(RuntimeError {
                token: data.paren.clone(),
                message: "Can only call functions and classes.".to_string(),
            }
            .into()),
        }
    }

    fn evaluate_get(&mut self, data: &crate::expr::GetData) -> Result<Value, Signal> {
        let object = self.evaluate(&data.object)?;

        match &object {
            Value::Instance(instance) => instance.borrow().get(&data.name, &object).map_err(Signal::Error),
            _ => Err(RuntimeError {
                token: data.name.clone(),
                message: "Only instances have properties.".to_string(),
            }
            .into()),
        }
    }

    fn evaluate_set(&mut self, data: &crate::expr::SetData) -> Result<Value, Signal> {
        let object = self.evaluate(&data.object)?;

        let Value::Instance(instance) = object else {
            return Err(RuntimeError { token: data.name.clone(), message: "Only instances have fields.".to_string() }.into());
        };

        let value = self.evaluate(&data.value)?;
        instance.borrow_mut().set(&data.name, value.clone());
        Ok(value)
    }

    fn evaluate_super(&mut self, data: &crate::expr::SuperData) -> Result<Value, Signal> {
        let distance = *self.locals.get(&data.id).expect("resolver always resolves 'super'");
        let superclass = self.environment.borrow().get_at(distance, "super");
        let Value::Class(superclass) = superclass else { unreachable!("'super' always binds to a class") };

        let instance = self.environment.borrow().get_at(distance - 1, "this");

        let method = superclass.find_method(&data.method.lexeme).ok_or_else(|| RuntimeError {
            token: data.method.clone(),
            message: format!("Undefined property '{}'.", data.method.lexeme),
        })?;

        Ok(Value::Function(Rc::new(method.bind(instance))))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn call_with_arity(
    callable: &dyn Callable,
    interpreter: &mut Interpreter,
    paren: &Token,
    arguments: Vec<Value>,
) -> Result<Value, Signal> {
    if arguments.len() != callable.arity() {
        return Err(RuntimeError {
            token: paren.clone(),
            message: format!("Expected {} arguments but got {}.", callable.arity(), arguments.len()),
        }
        .into());
    }
    callable.call(interpreter, arguments)
}

fn number_operand(operator: &Token, value: &Value) -> Result<f64, Signal> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError { token: operator.clone(), message: "Operand must be a number.".to_string() }.into()),
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64), Signal> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(RuntimeError { token: operator.clone(), message: "Operands must be numbers.".to_string() }.into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;
    use std::cell::RefCell;

    /// A `Write` sink backed by a shared buffer, so the test can read the
    /// captured output after the interpreter (and its `Box<dyn Write>`) is
    /// dropped.
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(source: &str) -> String {
        let runtime = Runtime::new();
        let tokens = Scanner::new(source).scan_tokens(&runtime);
        let statements = Parser::new(tokens, &runtime).parse();

        let mut resolver = Resolver::new(&runtime);
        resolver.resolve(&statements);
        let locals = resolver.into_locals();

        let buffer = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::with_output(Box::new(SharedBuffer(Rc::clone(&buffer))));
        interpreter.set_locals(locals);
        interpreter.interpret(&statements, &runtime);
        drop(interpreter);

        let bytes = Rc::try_unwrap(buffer).expect("interpreter dropped its output sink").into_inner();
        String::from_utf8(bytes).expect("interpreter output is valid utf8")
    }

    #[test]
    fn arithmetic_and_print() {
        assert_eq!(run("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run(r#"print "a" + "b";"#), "ab\n");
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        assert_eq!(run("print 1 / 0;"), "");
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let source = r#"
            fun makeCounter() {
                var count = 0;
                fun counter() {
                    count = count + 1;
                    return count;
                }
                return counter;
            }
            var counter = makeCounter();
            print counter();
            print counter();
        "#;
        assert_eq!(run(source), "1\n2\n");
    }

    #[test]
    fn classes_support_inheritance_and_super() {
        let source = r#"
            class Animal {
                speak() {
                    print "...";
                }
            }
            class Dog < Animal {
                speak() {
                    super.speak();
                    print "Woof";
                }
            }
            Dog().speak();
        "#;
        assert_eq!(run(source), "...\nWoof\n");
    }

    #[test]
    fn assert_failure_halts_execution() {
        assert_eq!(run("assert false; print \"unreachable\";"), "");
    }
}
