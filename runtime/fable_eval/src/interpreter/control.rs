//! Statement evaluation: declarations, conditionals, loops and hand-off.

use std::rc::Rc;

use fable_ir::{Block, Expr, ForInit, ForUpdate, FunctionDecl, Stmt, StmtKind};

use super::{Flow, Interpreter};
use crate::errors::{type_mismatch, EvalResult};
use crate::value::{Callable, UserFunction, Value};

/// Only expression statements carry a value out; compound statements
/// complete with `Null` unless they are returning.
fn settle(flow: Flow) -> Flow {
    match flow {
        Flow::Normal(_) => Flow::normal(),
        ret @ Flow::Return(_) => ret,
    }
}

impl Interpreter<'_> {
    pub(super) fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match &stmt.kind {
            StmtKind::Block(block) => self.eval_block(block).map(settle),
            StmtKind::VariableDeclaration { name, init } => {
                let value = match init {
                    Some(init) => self.eval_expr(init)?,
                    None => Value::Null,
                };
                self.ctx.define_variable(name, value);
                Ok(Flow::normal())
            }
            StmtKind::FunctionDeclaration(decl) => {
                self.define_function(decl);
                Ok(Flow::normal())
            }
            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let flow = if self.eval_expr(condition)?.is_truthy() {
                    self.eval_block(then_block)?
                } else if let Some(else_block) = else_block {
                    self.eval_block(else_block)?
                } else {
                    Flow::normal()
                };
                Ok(settle(flow))
            }
            StmtKind::While { condition, body } => self.eval_while(condition, body),
            StmtKind::ForIn {
                variable,
                iterable,
                body,
            } => self.eval_for_in(variable, iterable, body),
            StmtKind::ForCStyle {
                init,
                condition,
                update,
                body,
            } => self.eval_for_c(init.as_ref(), condition.as_ref(), update.as_ref(), body),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            StmtKind::Expression(expr) => self.eval_expr(expr).map(Flow::Normal),
            StmtKind::Property { name, value } => {
                let value = self.eval_expr(value)?;
                self.ctx.define_variable(name, value);
                Ok(Flow::normal())
            }
            StmtKind::Node(decl) => {
                tracing::debug!(kind = %decl.kind, name = %decl.name, "hand off node");
                self.declarations.register_node(decl, self.ctx.script_id());
                Ok(Flow::normal())
            }
            StmtKind::Dialogue(decl) => {
                tracing::debug!(name = %decl.name, "hand off dialogue");
                self.declarations.register_dialogue(decl, self.ctx.script_id());
                Ok(Flow::normal())
            }
            StmtKind::Quest(decl) => {
                tracing::debug!(name = %decl.name, "hand off quest");
                self.declarations.register_quest(decl, self.ctx.script_id());
                Ok(Flow::normal())
            }
            StmtKind::EventHandler(decl) => {
                tracing::debug!(event = %decl.event, "hand off event handler");
                self.declarations.register_event_handler(decl, self.ctx.script_id());
                Ok(Flow::normal())
            }
            StmtKind::HostCode { code } => {
                self.declarations
                    .run_host_code(code, self.ctx.script_id())
                    .map_err(|e| e.into_eval("host_code"))?;
                Ok(Flow::normal())
            }
        }
    }

    /// Bind a closure over the current scope under the function's name.
    fn define_function(&mut self, decl: &Rc<FunctionDecl>) {
        let env = self.ctx.env();
        let func = UserFunction::new(Rc::clone(decl), env.current_scope(), env.global());
        self.ctx
            .define_variable(&decl.name, Value::Callable(Callable::User(func)));
    }

    fn eval_while(&mut self, condition: &Expr, body: &Block) -> EvalResult<Flow> {
        while self.eval_expr(condition)?.is_truthy() {
            self.tick()?;
            if let ret @ Flow::Return(_) = self.eval_block(body)? {
                return Ok(ret);
            }
        }
        Ok(Flow::normal())
    }

    /// Each element runs the body in its own scope holding the loop variable.
    fn eval_for_in(&mut self, variable: &str, iterable: &Expr, body: &Block) -> EvalResult<Flow> {
        let items = match self.eval_expr(iterable)? {
            Value::List(items) => items,
            other => {
                return Err(type_mismatch(format!(
                    "for-in requires a list, got `{}`",
                    other.type_name()
                ))
                .or_span(iterable.span))
            }
        };
        for item in items.iter() {
            self.tick()?;
            let flow = self.with_binding(variable, item.clone(), |scoped| {
                scoped.eval_statements(&body.statements)
            })?;
            if flow.is_return() {
                return Ok(flow);
            }
        }
        Ok(Flow::normal())
    }

    /// One scope spans the whole loop and holds the induction variable. With
    /// no condition the loop only ends through `return`, an error, or a
    /// limit.
    fn eval_for_c(
        &mut self,
        init: Option<&ForInit>,
        condition: Option<&Expr>,
        update: Option<&ForUpdate>,
        body: &Block,
    ) -> EvalResult<Flow> {
        self.with_env_scope(|scoped| {
            if let Some(init) = init {
                let value = scoped.eval_expr(&init.value)?;
                if init.declare {
                    scoped.ctx.define_variable(&init.name, value);
                } else {
                    scoped.ctx.set_variable(&init.name, value)?;
                }
            }
            loop {
                if let Some(condition) = condition {
                    if !scoped.eval_expr(condition)?.is_truthy() {
                        break;
                    }
                }
                scoped.tick()?;
                if let ret @ Flow::Return(_) = scoped.eval_block(body)? {
                    return Ok(ret);
                }
                if let Some(update) = update {
                    let value = scoped.eval_expr(&update.value)?;
                    scoped.ctx.set_variable(&update.name, value)?;
                }
            }
            Ok(Flow::normal())
        })
    }
}
