use std::collections::HashMap;
use std::mem;

use crate::error::{Diagnostic, ResolveError};
use crate::expr::{Expr, NodeId};
use crate::runtime::Runtime;
use crate::stmt::Stmt;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// A static pre-pass over the AST that computes, for every variable
/// reference, how many enclosing scopes out its binding lives. Keyed on
/// [`NodeId`] rather than [`Token`] -- two unrelated uses of the same name
/// produce equal tokens but must resolve to different scope distances.
pub struct Resolver<'r> {
    runtime: &'r Runtime,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    locals: HashMap<NodeId, usize>,
}

impl<'r> Resolver<'r> {
    pub fn new(runtime: &'r Runtime) -> Self {
        Resolver {
            runtime,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            locals: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    /// Consumes the resolver, handing back the `NodeId -> scope distance`
    /// table the interpreter uses to look up locals without a name search.
    pub fn into_locals(self) -> HashMap<NodeId, usize> {
        self.locals
    }

    fn resolve_function(&mut self, declaration: &crate::stmt::FunctionStmtData, kind: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&declaration.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                ResolveError {
                    token: name.clone(),
                    message: format!("A variable named '{}' is already declared in this scope.", name.lexeme),
                }
                .report(self.runtime);
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(id, distance);
                return;
            }
        }
        // Not found in any tracked scope: assumed global, resolved by name at runtime.
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(data) => self.resolve_expr(&data.inner),
            Expr::Unary(data) => self.resolve_expr(&data.right),
            Expr::Binary(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Logical(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Variable(data) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&data.name.lexeme) == Some(&false) {
                        ResolveError {
                            token: data.name.clone(),
                            message: "Cannot read a local variable in its own initializer.".to_string(),
                        }
                        .report(self.runtime);
                    }
                }
                self.resolve_local(data.id, &data.name);
            }
            Expr::Assign(data) => {
                self.resolve_expr(&data.value);
                self.resolve_local(data.id, &data.name);
            }
            Expr::Call(data) => {
                self.resolve_expr(&data.callee);
                for argument in &data.arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get(data) => self.resolve_expr(&data.object),
            Expr::Set(data) => {
                self.resolve_expr(&data.value);
                self.resolve_expr(&data.object);
            }
            Expr::This(data) => {
                if self.current_class == ClassType::None {
                    ResolveError {
                        token: data.keyword.clone(),
                        message: "Cannot use 'this' outside of a class.".to_string(),
                    }
                    .report(self.runtime);
                    return;
                }
                self.resolve_local(data.id, &data.keyword);
            }
            Expr::Super(data) => {
                match self.current_class {
                    ClassType::Subclass => {}
                    ClassType::None => ResolveError {
                        token: data.keyword.clone(),
                        message: "Cannot use 'super' outside of a class.".to_string(),
                    }
                    .report(self.runtime),
                    ClassType::Class => ResolveError {
                        token: data.keyword.clone(),
                        message: "Cannot use 'super' in a class with no superclass.".to_string(),
                    }
                    .report(self.runtime),
                }
                self.resolve_local(data.id, &data.keyword);
            }
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(data) => {
                self.begin_scope();
                self.resolve(&data.statements);
                self.end_scope();
            }
            Stmt::Var(data) => {
                self.declare(&data.name);
                if let Some(initializer) = &data.initializer {
                    self.resolve_expr(initializer);
                }
                self.define(&data.name);
            }
            Stmt::Function(declaration) => {
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }
            Stmt::Expression(data) => self.resolve_expr(&data.expr),
            Stmt::If(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.then_branch);
                if let Some(else_branch) = &data.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::Print(data) => self.resolve_expr(&data.expr),
            Stmt::Assert(data) => self.resolve_expr(&data.expr),
            Stmt::Return(data) => {
                if self.current_function == FunctionType::None {
                    ResolveError {
                        token: data.keyword.clone(),
                        message: "Cannot return from top-level code.".to_string(),
                    }
                    .report(self.runtime);
                }

                if let Some(value) = &data.value {
                    if self.current_function == FunctionType::Initializer {
                        ResolveError {
                            token: data.keyword.clone(),
                            message: "Cannot return a value from an initializer.".to_string(),
                        }
                        .report(self.runtime);
                        return;
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::While(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.body);
            }
            Stmt::Class(data) => {
                let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

                self.declare(&data.name);
                self.define(&data.name);

                if let Some(superclass) = &data.superclass {
                    let Expr::Variable(variable) = superclass else { unreachable!("parser only emits Expr::Variable as superclass") };

                    if data.name.lexeme == variable.name.lexeme {
                        ResolveError {
                            token: variable.name.clone(),
                            message: "A class cannot inherit from itself.".to_string(),
                        }
                        .report(self.runtime);
                    }

                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass);

                    self.begin_scope();
                    self.scopes.last_mut().expect("scope just pushed").insert("super".to_string(), true);
                }

                self.begin_scope();
                self.scopes.last_mut().expect("scope just pushed").insert("this".to_string(), true);

                for method in &data.methods {
                    let kind = if method.name.lexeme == "init" { FunctionType::Initializer } else { FunctionType::Method };
                    self.resolve_function(method, kind);
                }

                self.end_scope();

                if data.superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }
        }
    }
}
