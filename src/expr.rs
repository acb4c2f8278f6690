use crate::token::Token;
use crate::value::Value;

/// Identity key for an AST node, stamped sequentially at parse time. The
/// resolver's `locals` side table keys on this rather than on a `Token`,
/// since two distinct uses of the same name produce equal-looking tokens
/// but must resolve independently.
pub type NodeId = u32;

#[derive(Debug, Clone)]
pub struct LiteralData {
    pub id: NodeId,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct GroupingData {
    pub id: NodeId,
    pub inner: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct UnaryData {
    pub id: NodeId,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct BinaryData {
    pub id: NodeId,
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct LogicalData {
    pub id: NodeId,
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct VariableData {
    pub id: NodeId,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct AssignData {
    pub id: NodeId,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct CallData {
    pub id: NodeId,
    pub callee: Box<Expr>,
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct GetData {
    pub id: NodeId,
    pub object: Box<Expr>,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct SetData {
    pub id: NodeId,
    pub object: Box<Expr>,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct ThisData {
    pub id: NodeId,
    pub keyword: Token,
}

#[derive(Debug, Clone)]
pub struct SuperData {
    pub id: NodeId,
    pub keyword: Token,
    pub method: Token,
}

/// The expression AST: a tagged union rather than `dyn Expr` trait objects,
/// so the resolver and evaluator match on variant instead of double
/// dispatching through a visitor trait object per node.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(LiteralData),
    Grouping(GroupingData),
    Unary(UnaryData),
    Binary(BinaryData),
    Logical(LogicalData),
    Variable(VariableData),
    Assign(AssignData),
    Call(CallData),
    Get(GetData),
    Set(SetData),
    This(ThisData),
    Super(SuperData),
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Literal(d) => d.id,
            Expr::Grouping(d) => d.id,
            Expr::Unary(d) => d.id,
            Expr::Binary(d) => d.id,
            Expr::Logical(d) => d.id,
            Expr::Variable(d) => d.id,
            Expr::Assign(d) => d.id,
            Expr::Call(d) => d.id,
            Expr::Get(d) => d.id,
            Expr::Set(d) => d.id,
            Expr::This(d) => d.id,
            Expr::Super(d) => d.id,
        }
    }
}
