//! Recursive-descent parser producing the expression AST.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! conditional := or ('?' conditional ':' conditional)?
//! or          := and (('||' | 'or') and)*
//! and         := equality (('&&' | 'and') equality)*
//! equality    := relational (('===' | '==' | '=' | '!==' | '!=') relational)*
//! relational  := additive (('<' | '>' | '<=' | '>=' | '≤' | '≥') additive)*
//! additive    := term (('+' | '-') term)*
//! term        := unary (('*' | '/' | '%') unary)*
//! unary       := ('!' | 'not' | '-' | '+') unary | postfix
//! postfix     := primary ('.' ident args? | '[' conditional ']')*
//! primary     := number | string | literal | 'row' | function args
//!              | 'JSON' '.' 'parse' args | 'Array' '.' 'isArray' args
//!              | '(' conditional ')' | '[' (conditional (',' conditional)*)? ']'
//! ```

use crate::error::ExpressionError;

use super::eval::Val;
use super::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Whitelisted free functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Number,
    ParseInt,
    ParseFloat,
    String,
    Boolean,
    JsonParse,
    IsArray,
}

/// Whitelisted methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Includes,
    StartsWith,
    EndsWith,
    ToLowerCase,
    ToUpperCase,
    Trim,
    Split,
    IndexOf,
    Substring,
    Slice,
    ToString,
}

impl Method {
    pub(crate) const NAMES: &'static [&'static str] = &[
        "includes",
        "startsWith",
        "endsWith",
        "toLowerCase",
        "toUpperCase",
        "trim",
        "split",
        "indexOf",
        "substring",
        "slice",
        "toString",
    ];

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "includes" => Method::Includes,
            "startsWith" => Method::StartsWith,
            "endsWith" => Method::EndsWith,
            "toLowerCase" => Method::ToLowerCase,
            "toUpperCase" => Method::ToUpperCase,
            "trim" => Method::Trim,
            "split" => Method::Split,
            "indexOf" => Method::IndexOf,
            "substring" => Method::Substring,
            "slice" => Method::Slice,
            "toString" => Method::ToString,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Val),
    /// The row object itself
    Row,
    /// `row.Name` or `row['Name']`
    Field(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Array(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
    Method(Box<Expr>, Method, Vec<Expr>),
}

pub(crate) fn parse(tokens: &[Token], max_depth: usize) -> Result<Expr, ExpressionError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let expr = parser.conditional()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error_at(token, "unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Punct(p), .. }) if *p == punct)
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Ident(w), .. }) if w == word)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        let found = self.peek_punct(punct);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_word(&mut self, word: &str) -> bool {
        let found = self.peek_word(word);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), ExpressionError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", punct)))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ExpressionError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => {
                self.pos += 1;
                Ok(name.clone())
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    fn error(&self, message: &str) -> ExpressionError {
        ExpressionError::Parse {
            message: message.to_string(),
            pos: self.peek().map_or(self.tokens.len(), |t| t.pos),
        }
    }

    fn error_at(&self, token: &Token, message: &str) -> ExpressionError {
        ExpressionError::Parse {
            message: message.to_string(),
            pos: token.pos,
        }
    }

    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ExpressionError::TooDeep(self.max_depth));
        }
        Ok(())
    }

    fn conditional(&mut self) -> Result<Expr, ExpressionError> {
        self.enter()?;
        let test = self.or()?;
        let expr = if self.eat_punct("?") {
            let then = self.conditional()?;
            self.expect_punct(":")?;
            let otherwise = self.conditional()?;
            Expr::Conditional(Box::new(test), Box::new(then), Box::new(otherwise))
        } else {
            test
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.and()?;
        while self.eat_punct("||") || self.eat_word("or") {
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.equality()?;
        while self.eat_punct("&&") || self.eat_word("and") {
            let right = self.equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.relational()?;
        loop {
            let op = if self.eat_punct("===") || self.eat_punct("==") || self.eat_punct("=") {
                BinaryOp::Eq
            } else if self.eat_punct("!==") || self.eat_punct("!=") {
                BinaryOp::Ne
            } else {
                return Ok(left);
            };
            let right = self.relational()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn relational(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.additive()?;
        loop {
            let op = if self.eat_punct("<=") || self.eat_punct("≤") {
                BinaryOp::Le
            } else if self.eat_punct(">=") || self.eat_punct("≥") {
                BinaryOp::Ge
            } else if self.eat_punct("<") {
                BinaryOp::Lt
            } else if self.eat_punct(">") {
                BinaryOp::Gt
            } else {
                return Ok(left);
            };
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.term()?;
        loop {
            let op = if self.eat_punct("+") {
                BinaryOp::Add
            } else if self.eat_punct("-") {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.unary()?;
        loop {
            let op = if self.eat_punct("*") {
                BinaryOp::Mul
            } else if self.eat_punct("/") {
                BinaryOp::Div
            } else if self.eat_punct("%") {
                BinaryOp::Rem
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        let op = if self.eat_punct("!") || self.eat_word("not") {
            UnaryOp::Not
        } else if self.eat_punct("-") {
            UnaryOp::Neg
        } else if self.eat_punct("+") {
            UnaryOp::Plus
        } else {
            return self.postfix();
        };
        self.enter()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat_punct(".") {
                let name = self.expect_ident()?;
                if self.peek_punct("(") {
                    let method = Method::from_name(&name)
                        .ok_or_else(|| ExpressionError::UnsupportedCall(name.clone()))?;
                    let args = self.arguments()?;
                    expr = Expr::Method(Box::new(expr), method, args);
                } else if expr == Expr::Row {
                    expr = Expr::Field(name);
                } else {
                    expr = Expr::Member(Box::new(expr), name);
                }
            } else if self.eat_punct("[") {
                let index = self.conditional()?;
                self.expect_punct("]")?;
                expr = match (expr, index) {
                    (Expr::Row, Expr::Literal(Val::Str(name))) => Expr::Field(name),
                    (base, index) => Expr::Index(Box::new(base), Box::new(index)),
                };
            } else if self.peek_punct("(") {
                return Err(self.error("only whitelisted functions and methods can be called"));
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ExpressionError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        if self.eat_punct(")") {
            return Ok(args);
        }
        loop {
            args.push(self.conditional()?);
            if self.eat_punct(")") {
                return Ok(args);
            }
            self.expect_punct(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let Some(token) = self.peek() else {
            return Err(self.error("unexpected end of expression"));
        };
        self.pos += 1;
        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(Val::Num(*n))),
            TokenKind::Str(s) => Ok(Expr::Literal(Val::Str(s.clone()))),
            TokenKind::Punct("(") => {
                let inner = self.conditional()?;
                self.expect_punct(")")?;
                Ok(inner)
            }
            TokenKind::Punct("[") => {
                let mut items = Vec::new();
                if !self.eat_punct("]") {
                    loop {
                        items.push(self.conditional()?);
                        if self.eat_punct("]") {
                            break;
                        }
                        self.expect_punct(",")?;
                    }
                }
                Ok(Expr::Array(items))
            }
            TokenKind::Ident(name) => self.identifier(token, name),
            TokenKind::Punct(_) => Err(self.error_at(token, "unexpected token")),
        }
    }

    fn identifier(&mut self, token: &Token, name: &str) -> Result<Expr, ExpressionError> {
        let function = match name {
            "row" => return Ok(Expr::Row),
            "true" => return Ok(Expr::Literal(Val::Bool(true))),
            "false" => return Ok(Expr::Literal(Val::Bool(false))),
            "null" => return Ok(Expr::Literal(Val::Null)),
            "undefined" => return Ok(Expr::Literal(Val::Undefined)),
            "NaN" => return Ok(Expr::Literal(Val::Num(f64::NAN))),
            "Number" => Function::Number,
            "parseInt" => Function::ParseInt,
            "parseFloat" => Function::ParseFloat,
            "String" => Function::String,
            "Boolean" => Function::Boolean,
            "JSON" => {
                self.expect_punct(".")?;
                self.qualified("parse", "JSON")?;
                Function::JsonParse
            }
            "Array" => {
                self.expect_punct(".")?;
                self.qualified("isArray", "Array")?;
                Function::IsArray
            }
            other => {
                return Err(self.error_at(token, &format!("unknown identifier '{}'", other)))
            }
        };
        if !self.peek_punct("(") {
            return Err(self.error(&format!("'{}' must be called", name)));
        }
        Ok(Expr::Call(function, self.arguments()?))
    }

    fn qualified(&mut self, expected: &str, owner: &str) -> Result<(), ExpressionError> {
        let member = self.expect_ident()?;
        if member == expected {
            Ok(())
        } else {
            Err(ExpressionError::UnsupportedCall(format!("{}.{}", owner, member)))
        }
    }
}
