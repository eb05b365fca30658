//! Constructor helpers for hand-built trees.
//!
//! Hosts that generate scripts programmatically, and tests, build nodes
//! through these functions instead of spelling out every struct. All nodes
//! get `Span::DUMMY`.
//!
//! ```text
//! use fable_ir::build::*;
//! let prog = program(vec![
//!     let_("x", int(2)),
//!     expr_stmt(binary(BinaryOp::Add, ident("x"), int(3))),
//! ]);
//! ```

use std::rc::Rc;

use crate::ast::{
    BinaryOp, Block, DialogueDecl, EventHandlerDecl, Expr, ExprKind, ForInit, ForUpdate,
    FunctionDecl, Literal, NodeDecl, Program, QuestDecl, Stmt, StmtKind, UnaryOp,
};
use crate::Span;

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::DUMMY)
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, Span::DUMMY)
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// Expressions

pub fn null() -> Expr {
    expr(ExprKind::Literal(Literal::Null))
}

pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::Literal(Literal::Bool(value)))
}

pub fn int(value: i64) -> Expr {
    expr(ExprKind::Literal(Literal::Int(value)))
}

pub fn float(value: f64) -> Expr {
    expr(ExprKind::Literal(Literal::Float(value)))
}

pub fn string(value: &str) -> Expr {
    expr(ExprKind::Literal(Literal::Str(value.to_string())))
}

pub fn ident(name: &str) -> Expr {
    expr(ExprKind::Identifier(name.to_string()))
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    expr(ExprKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    expr(ExprKind::Unary {
        op,
        operand: Box::new(operand),
    })
}

pub fn not(operand: Expr) -> Expr {
    unary(UnaryOp::Not, operand)
}

pub fn neg(operand: Expr) -> Expr {
    unary(UnaryOp::Neg, operand)
}

pub fn call(callee: &str, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Call {
        callee: callee.to_string(),
        args,
    })
}

pub fn member(target: Expr, name: &str) -> Expr {
    expr(ExprKind::Member {
        target: Box::new(target),
        member: name.to_string(),
    })
}

pub fn index(target: Expr, idx: Expr) -> Expr {
    expr(ExprKind::Index {
        target: Box::new(target),
        index: Box::new(idx),
    })
}

pub fn assign(name: &str, value: Expr) -> Expr {
    expr(ExprKind::Assign {
        name: name.to_string(),
        value: Box::new(value),
    })
}

pub fn list(items: Vec<Expr>) -> Expr {
    expr(ExprKind::List(items))
}

pub fn map(entries: Vec<(&str, Expr)>) -> Expr {
    expr(ExprKind::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    ))
}

// Statements

pub fn expr_stmt(e: Expr) -> Stmt {
    stmt(StmtKind::Expression(e))
}

/// `name = value;` as a statement.
pub fn set(name: &str, value: Expr) -> Stmt {
    expr_stmt(assign(name, value))
}

pub fn let_(name: &str, init: Expr) -> Stmt {
    stmt(StmtKind::VariableDeclaration {
        name: name.to_string(),
        init: Some(init),
    })
}

pub fn let_uninit(name: &str) -> Stmt {
    stmt(StmtKind::VariableDeclaration {
        name: name.to_string(),
        init: None,
    })
}

pub fn func(name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::FunctionDeclaration(Rc::new(FunctionDecl {
        name: name.to_string(),
        params: names(params),
        body: Block::new(body),
        span: Span::DUMMY,
    })))
}

pub fn if_(condition: Expr, then_body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::If {
        condition,
        then_block: Block::new(then_body),
        else_block: None,
    })
}

pub fn if_else(condition: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::If {
        condition,
        then_block: Block::new(then_body),
        else_block: Some(Block::new(else_body)),
    })
}

pub fn while_(condition: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::While {
        condition,
        body: Block::new(body),
    })
}

pub fn for_in(variable: &str, iterable: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::ForIn {
        variable: variable.to_string(),
        iterable,
        body: Block::new(body),
    })
}

pub fn for_c(
    init: Option<ForInit>,
    condition: Option<Expr>,
    update: Option<ForUpdate>,
    body: Vec<Stmt>,
) -> Stmt {
    stmt(StmtKind::ForCStyle {
        init,
        condition,
        update,
        body: Block::new(body),
    })
}

/// `let name = value` in a C-style `for` header.
pub fn for_let(name: &str, value: Expr) -> ForInit {
    ForInit {
        name: name.to_string(),
        value,
        declare: true,
    }
}

/// `name = value` (existing binding) in a C-style `for` header.
pub fn for_assign(name: &str, value: Expr) -> ForInit {
    ForInit {
        name: name.to_string(),
        value,
        declare: false,
    }
}

pub fn for_update(name: &str, value: Expr) -> ForUpdate {
    ForUpdate {
        name: name.to_string(),
        value,
    }
}

pub fn ret(value: Expr) -> Stmt {
    stmt(StmtKind::Return(Some(value)))
}

pub fn ret_void() -> Stmt {
    stmt(StmtKind::Return(None))
}

pub fn block(body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Block(Block::new(body)))
}

pub fn property(name: &str, value: Expr) -> Stmt {
    stmt(StmtKind::Property {
        name: name.to_string(),
        value,
    })
}

pub fn dialogue(name: &str, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Dialogue(Rc::new(DialogueDecl {
        name: name.to_string(),
        body: Block::new(body),
        span: Span::DUMMY,
    })))
}

pub fn quest(name: &str, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Quest(Rc::new(QuestDecl {
        name: name.to_string(),
        body: Block::new(body),
        span: Span::DUMMY,
    })))
}

pub fn node(kind: &str, name: &str, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Node(Rc::new(NodeDecl {
        kind: kind.to_string(),
        name: name.to_string(),
        body: Block::new(body),
        span: Span::DUMMY,
    })))
}

pub fn on(event: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::EventHandler(Rc::new(EventHandlerDecl {
        event: event.to_string(),
        params: names(params),
        body: Block::new(body),
        span: Span::DUMMY,
    })))
}

pub fn host_code(code: &str) -> Stmt {
    stmt(StmtKind::HostCode {
        code: code.to_string(),
    })
}

pub fn program(statements: Vec<Stmt>) -> Program {
    Program::new(statements)
}
