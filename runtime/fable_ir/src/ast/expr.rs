//! Expression nodes.

use std::fmt;

use super::operators::{BinaryOp, UnaryOp};
use crate::{Span, Spanned};

/// Expression node.
#[derive(Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

impl Spanned for Expr {
    fn span(&self) -> Span {
        self.span
    }
}

/// Expression kinds.
#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    /// `left op right`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `op operand`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// `callee(args...)`
    ///
    /// The callee is always a plain name; there are no computed callees.
    Call { callee: String, args: Vec<Expr> },

    /// `target.member`
    Member { target: Box<Expr>, member: String },

    /// `target[index]`
    Index { target: Box<Expr>, index: Box<Expr> },

    /// `name = value`
    Assign { name: String, value: Box<Expr> },

    /// Variable reference.
    Identifier(String),

    /// Constant value.
    Literal(Literal),

    /// `[a, b, c]`
    List(Vec<Expr>),

    /// `{ key: value, ... }` in source order.
    Map(Vec<(String, Expr)>),
}

/// Literal constants.
#[derive(Clone, PartialEq, Debug)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::Str(s) => write!(f, "{s:?}"),
        }
    }
}
