use std::rc::Rc;

use crate::error::ParseError;
use crate::expr::*;
use crate::runtime::Runtime;
use crate::stmt::*;
use crate::token::{Kind, Token};
use crate::value::Value;

type ParseResult<T> = Result<T, ParseError>;

/// Returns if the next token is any of the given kinds, consuming it.
macro_rules! matches {
    ( $self:ident, $( $kind:expr ),+ ) => {
        {
            if $( $self.check($kind) )||* {
                $self.advance();
                true
            } else {
                false
            }
        }
    }
}

/// - Program     -> Declaration* EOF ;
/// - Block       -> "{" Declaration* "}" ;
/// - Declaration -> ClassDecl | FunDecl | VarDecl | Statement ;
/// - ClassDecl   -> "class" IDENTIFIER ( "<" IDENTIFIER )? "{" Function* "}" ;
/// - FunDecl     -> "fun" Function ;
/// - VarDecl     -> "var" IDENTIFIER ( "=" Expression )? ";" ;
/// - Function    -> IDENTIFIER "(" Parameters? ")" Block ;
/// - Parameters  -> IDENTIFIER ( "," IDENTIFIER )* ;
/// - Statement   -> ExprStmt | ForStmt | IfStmt | PrintStmt | ReturnStmt | AssertStmt | WhileStmt | Block ;
/// - ExprStmt    -> Expression ";" ;
/// - ForStmt     -> "for" "(" ( Declaration | ExprStmt | ";" ) Expression? ";" Expression? ")" Statement ;
/// - IfStmt      -> "if" "(" Expression ")" Statement ( "else" Statement )? ;
/// - PrintStmt   -> "print" Expression ";" ;
/// - ReturnStmt  -> "return" Expression? ";" ;
/// - AssertStmt  -> "assert" Expression ";" ;
/// - WhileStmt   -> "while" "(" Expression ")" Statement ;
/// - Expression  -> Assignment ;
/// - Assignment  -> ( Call "." )? IDENTIFIER "=" Assignment | LogicOr ;
/// - LogicOr     -> LogicAnd ( "or" LogicAnd )* ;
/// - LogicAnd    -> Equality ( "and" Equality )* ;
/// - Equality    -> Comparison ( ( "!=" | "==" ) Comparison )* ;
/// - Comparison  -> Term ( ( ">" | ">=" | "<" | "<=" ) Term )* ;
/// - Term        -> Factor ( ( "+" | "-" ) Factor )* ;
/// - Factor      -> Unary ( ( "*" | "/" ) Unary )* ;
/// - Unary       -> ( "!" | "-" ) Unary | Call ;
/// - Arguments   -> Expression ( "," Expression )* ;
/// - Call        -> Primary ( "(" Arguments? ")" | "." IDENTIFIER )* ;
/// - Primary     -> NUMBER | STRING | "false" | "true" | "nil" | "this" | "(" Expression ")" | IDENTIFIER | "super" "." IDENTIFIER ;
pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,
    next_id: NodeId,
    runtime: &'r Runtime,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, runtime: &'r Runtime) -> Self {
        Parser { tokens, current: 0, next_id: 0, runtime }
    }

    fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        statements
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == Kind::Eof
    }

    fn check(&self, kind: Kind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn consume(&mut self, kind: Kind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }

        Err(ParseError { token: self.peek().clone(), message: message.to_string() })
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let statement = if matches!(self, Kind::Class) {
            self.class_declaration()
        } else if matches!(self, Kind::Fun) {
            self.function("function").map(Stmt::Function)
        } else if matches!(self, Kind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match statement {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                error.report(self.runtime);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, "Expect class name.")?.clone();

        let superclass = if matches!(self, Kind::Less) {
            self.consume(Kind::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable(VariableData { id: self.next_id(), name: self.previous().clone() }))
        } else {
            None
        };

        self.consume(Kind::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(Kind::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(Kind::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, "Expect variable name.")?.clone();

        let initializer = if matches!(self, Kind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(Kind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Kind::RightParen, "Expect ')' after condition.")?;
        let body = self.statement()?;

        Ok(Stmt::While(WhileData { condition, body: Box::new(body) }))
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if matches!(self, Kind::For) {
            return self.for_statement();
        }
        if matches!(self, Kind::If) {
            return self.if_statement();
        }
        if matches!(self, Kind::Print) {
            return self.print_statement();
        }
        if matches!(self, Kind::Return) {
            return self.return_statement();
        }
        if matches!(self, Kind::Assert) {
            return self.assert_statement();
        }
        if matches!(self, Kind::While) {
            return self.while_statement();
        }
        if matches!(self, Kind::LeftBrace) {
            return Ok(Stmt::Block(BlockData { statements: self.block()? }));
        }

        self.expression_statement()
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if matches!(self, Kind::Semicolon) {
            None
        } else if matches!(self, Kind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(Kind::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(Kind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Kind::RightParen) { Some(self.expression()?) } else { None };
        self.consume(Kind::RightParen, "Expect ')' after loop clauses.")?;

        let mut body = self.statement()?;

        // Execute the increment after the body, every iteration.
        if let Some(increment) = increment {
            body = Stmt::Block(BlockData {
                statements: vec![body, Stmt::Expression(ExpressionData { expr: increment })],
            });
        }

        // Desugar into a while loop; missing condition means infinite loop.
        let condition = condition
            .unwrap_or_else(|| Expr::Literal(LiteralData { id: self.next_id(), value: Value::Bool(true) }));
        body = Stmt::While(WhileData { condition, body: Box::new(body) });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Kind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if matches!(self, Kind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Kind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(PrintData { expr }))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = if !self.check(Kind::Semicolon) { Some(self.expression()?) } else { None };

        self.consume(Kind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn assert_statement(&mut self) -> ParseResult<Stmt> {
        let token = self.previous().clone();
        let expr = self.expression()?;
        self.consume(Kind::Semicolon, "Expect ';' after assertion.")?;
        Ok(Stmt::Assert(AssertData { token, expr }))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Kind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    /// Parses a function (or method) declaration body. `kind` is only used
    /// to word the error messages ("function" vs "method").
    fn function(&mut self, kind: &str) -> ParseResult<Rc<FunctionStmtData>> {
        let name = self.consume(Kind::Identifier, &format!("Expect {kind} name."))?.clone();

        self.consume(Kind::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(Kind::RightParen) {
            loop {
                if params.len() >= 255 {
                    return Err(ParseError {
                        token: self.peek().clone(),
                        message: "Cannot have more than 255 parameters.".to_string(),
                    });
                }

                params.push(self.consume(Kind::Identifier, "Expect parameter name.")?.clone());

                if !matches!(self, Kind::Comma) {
                    break;
                }
            }
        }

        self.consume(Kind::RightParen, "Expect ')' after parameters.")?;
        self.consume(Kind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;

        let body = self.block()?;

        Ok(Rc::new(FunctionStmtData { id: self.next_id(), name, params, body }))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(Kind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(Kind::RightBrace, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if matches!(self, Kind::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(data) => {
                    Ok(Expr::Assign(AssignData { id: self.next_id(), name: data.name, value: Box::new(value) }))
                }
                Expr::Get(data) => Ok(Expr::Set(SetData {
                    id: self.next_id(),
                    object: data.object,
                    name: data.name,
                    value: Box::new(value),
                })),
                _ => {
                    self.runtime.report(equals.line, "", "Invalid assignment target.");
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while matches!(self, Kind::Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(LogicalData {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while matches!(self, Kind::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(LogicalData {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while matches!(self, Kind::BangEqual, Kind::EqualEqual) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(BinaryData {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while matches!(self, Kind::Greater, Kind::GreaterEqual, Kind::Less, Kind::LessEqual) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(BinaryData {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while matches!(self, Kind::Minus, Kind::Plus) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(BinaryData {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while matches!(self, Kind::Slash, Kind::Star) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(BinaryData {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if matches!(self, Kind::Bang, Kind::Minus) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(UnaryData { id: self.next_id(), operator, right: Box::new(right) }));
        }

        self.call()
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(Kind::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    self.runtime.report(self.peek().line, "", "Cannot have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !matches!(self, Kind::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(Kind::RightParen, "Expect ')' after arguments.")?.clone();

        Ok(Expr::Call(CallData { id: self.next_id(), callee: Box::new(callee), paren, arguments }))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if matches!(self, Kind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if matches!(self, Kind::Dot) {
                let name = self.consume(Kind::Identifier, "Expect property name after '.'.")?.clone();
                expr = Expr::Get(GetData { id: self.next_id(), object: Box::new(expr), name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if matches!(self, Kind::False) {
            return Ok(Expr::Literal(LiteralData { id: self.next_id(), value: Value::Bool(false) }));
        }

        if matches!(self, Kind::True) {
            return Ok(Expr::Literal(LiteralData { id: self.next_id(), value: Value::Bool(true) }));
        }

        if matches!(self, Kind::Nil) {
            return Ok(Expr::Literal(LiteralData { id: self.next_id(), value: Value::Nil }));
        }

        if matches!(self, Kind::Number, Kind::String) {
            let literal = self.previous().literal.clone().expect("number or string token to carry a literal");
            let value = match literal {
                crate::literal::Literal::Number(n) => Value::Number(n),
                crate::literal::Literal::String(s) => Value::string(s),
            };
            return Ok(Expr::Literal(LiteralData { id: self.next_id(), value }));
        }

        if matches!(self, Kind::Super) {
            let keyword = self.previous().clone();
            self.consume(Kind::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(Kind::Identifier, "Expect superclass method name.")?.clone();

            return Ok(Expr::Super(SuperData { id: self.next_id(), keyword, method }));
        }

        if matches!(self, Kind::This) {
            return Ok(Expr::This(ThisData { id: self.next_id(), keyword: self.previous().clone() }));
        }

        if matches!(self, Kind::Identifier) {
            return Ok(Expr::Variable(VariableData { id: self.next_id(), name: self.previous().clone() }));
        }

        if matches!(self, Kind::LeftParen) {
            let expr = self.expression()?;
            self.consume(Kind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(GroupingData { id: self.next_id(), inner: Box::new(expr) }));
        }

        Err(ParseError { token: self.peek().clone(), message: "Expect expression.".to_string() })
    }

    /// Discards tokens until it's plausible the next one begins a new
    /// statement, so one syntax error doesn't cascade into bogus ones.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == Kind::Semicolon {
                return;
            }

            match self.peek().kind {
                Kind::Class | Kind::Fun | Kind::Var | Kind::For | Kind::If | Kind::While | Kind::Print | Kind::Return => {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}
