use std::rc::Rc;

use crate::expr::{Expr, NodeId};
use crate::token::Token;

/// Shared data for a function declaration. Wrapped in `Rc` so a
/// [`LoxFunction`](crate::function::LoxFunction) value can cheaply hold a
/// reference to it instead of cloning the parameter list and body every
/// time a closure is created.
#[derive(Debug)]
pub struct FunctionStmtData {
    pub id: NodeId,
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub struct ExpressionData {
    pub expr: Expr,
}

#[derive(Debug)]
pub struct PrintData {
    pub expr: Expr,
}

#[derive(Debug)]
pub struct VarData {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug)]
pub struct BlockData {
    pub statements: Vec<Stmt>,
}

#[derive(Debug)]
pub struct IfData {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug)]
pub struct WhileData {
    pub condition: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug)]
pub struct ReturnData {
    pub keyword: Token,
    pub value: Option<Expr>,
}

#[derive(Debug)]
pub struct ClassData {
    pub name: Token,
    pub superclass: Option<Expr>,
    pub methods: Vec<Rc<FunctionStmtData>>,
}

#[derive(Debug)]
pub struct AssertData {
    pub token: Token,
    pub expr: Expr,
}

/// The statement AST: a tagged union, mirroring [`Expr`](crate::expr::Expr).
#[derive(Debug)]
pub enum Stmt {
    Expression(ExpressionData),
    Print(PrintData),
    Var(VarData),
    Block(BlockData),
    If(IfData),
    While(WhileData),
    Function(Rc<FunctionStmtData>),
    Return(ReturnData),
    Class(ClassData),
    Assert(AssertData),
}
