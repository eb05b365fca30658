//! Fable IR - AST node model for the Fable scripting runtime.
//!
//! Script source is lexed and parsed by the host toolchain; this crate only
//! defines the tree that parser hands over to the interpreter:
//! - Spans for source locations
//! - Statement and expression nodes (`Stmt`, `Expr`)
//! - Declaration payloads handed off to host registries
//! - Binary and unary operators
//!
//! # Design Philosophy
//!
//! - **Owned tree**: parents own their children (`Box<Expr>`, `Vec<Stmt>`).
//! - **Closed node set**: `StmtKind` and `ExprKind` are exhaustive enums; the
//!   interpreter matches on them directly.
//! - **Shared declarations**: nodes that outlive a single run (function bodies
//!   captured by closures, declarations kept by host registries) sit behind
//!   `Rc` so holders never borrow from the program tree.
//! - **No parent links**: diagnostics use spans instead of upward traversal.

pub mod ast;
pub mod build;
mod span;

pub use ast::{
    BinaryOp, Block, DialogueDecl, EventHandlerDecl, Expr, ExprKind, ForInit, ForUpdate,
    FunctionDecl, Literal, NodeDecl, Program, QuestDecl, Stmt, StmtKind, UnaryOp,
};
pub use span::Span;

/// Trait for types that carry a source span.
pub trait Spanned {
    fn span(&self) -> Span;
}
