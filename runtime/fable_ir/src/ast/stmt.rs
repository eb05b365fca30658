//! Statement nodes and declaration payloads.

use std::fmt;
use std::rc::Rc;

use super::expr::Expr;
use crate::{Span, Spanned};

/// Statement node.
#[derive(Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

impl Spanned for Stmt {
    fn span(&self) -> Span {
        self.span
    }
}

/// A braced statement sequence with its own scope.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Block { statements }
    }
}

/// Statement kinds.
#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    /// Nested `{ ... }`.
    Block(Block),

    /// `let name = init` (no initializer binds `null`).
    VariableDeclaration { name: String, init: Option<Expr> },

    /// `fn name(params) { body }`
    FunctionDeclaration(Rc<FunctionDecl>),

    /// `if condition { ... } else { ... }`
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },

    /// `while condition { ... }`
    While { condition: Expr, body: Block },

    /// `for variable in iterable { ... }`
    ForIn {
        variable: String,
        iterable: Expr,
        body: Block,
    },

    /// `for (init; condition; update) { ... }`
    ForCStyle {
        init: Option<ForInit>,
        condition: Option<Expr>,
        update: Option<ForUpdate>,
        body: Block,
    },

    /// `return value?`
    Return(Option<Expr>),

    /// Expression evaluated for its effect.
    Expression(Expr),

    /// `name: value` inside a declaration body.
    Property { name: String, value: Expr },

    /// Generic host-typed declaration (NPCs, locations, items...).
    Node(Rc<NodeDecl>),

    /// `dialogue name { ... }`
    Dialogue(Rc<DialogueDecl>),

    /// `quest name { ... }`
    Quest(Rc<QuestDecl>),

    /// `on event(params) { ... }`
    EventHandler(Rc<EventHandlerDecl>),

    /// Raw host-language snippet passed through to the host untouched.
    HostCode { code: String },
}

/// Initializer clause of a C-style `for`.
#[derive(Clone, PartialEq, Debug)]
pub struct ForInit {
    pub name: String,
    pub value: Expr,
    /// `true` for `let i = 0` (new binding in the loop scope),
    /// `false` for `i = 0` (assign an existing binding).
    pub declare: bool,
}

/// Update clause of a C-style `for`; always an assignment.
#[derive(Clone, PartialEq, Debug)]
pub struct ForUpdate {
    pub name: String,
    pub value: Expr,
}

/// Function declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

/// Dialogue tree declaration, interpreted by the host dialogue system.
#[derive(Clone, PartialEq, Debug)]
pub struct DialogueDecl {
    pub name: String,
    pub body: Block,
    pub span: Span,
}

/// Quest declaration, interpreted by the host quest system.
#[derive(Clone, PartialEq, Debug)]
pub struct QuestDecl {
    pub name: String,
    pub body: Block,
    pub span: Span,
}

/// Host-typed declaration such as `npc guard { ... }`.
#[derive(Clone, PartialEq, Debug)]
pub struct NodeDecl {
    /// Declaration keyword (`npc`, `location`, ...).
    pub kind: String,
    pub name: String,
    pub body: Block,
    pub span: Span,
}

/// Event handler declaration: `on event(params) { body }`.
#[derive(Clone, PartialEq, Debug)]
pub struct EventHandlerDecl {
    pub event: String,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}
