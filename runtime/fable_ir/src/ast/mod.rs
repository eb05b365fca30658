//! AST node types.
//!
//! Two disjoint families: statements (`Stmt`) and expressions (`Expr`).
//! Evaluation dispatches with one exhaustive `match` per family.

mod expr;
mod operators;
mod stmt;

pub use expr::{Expr, ExprKind, Literal};
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{
    Block, DialogueDecl, EventHandlerDecl, ForInit, ForUpdate, FunctionDecl, NodeDecl, QuestDecl,
    Stmt, StmtKind,
};

/// Root of a parsed script.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }

    /// Iterate over function declarations at the top level.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.statements.iter().filter_map(|stmt| match &stmt.kind {
            StmtKind::FunctionDeclaration(decl) => Some(&**decl),
            _ => None,
        })
    }

    /// Whether the program contains no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
