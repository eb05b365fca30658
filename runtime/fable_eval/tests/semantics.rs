//! End-to-end language semantics through the script executor.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use fable_eval::{
    buffer_handler, BuiltinRegistry, EvalErrorKind, ExecutionContext, ExecutionResult, NullSink,
    ScriptExecutor, SharedPrintHandler, Value,
};
use fable_ir::build::{
    binary, block, call, expr_stmt, float, for_in, func, ident, if_, index, int, let_, list, map,
    neg, program, ret, set, string, while_,
};
use fable_ir::{BinaryOp, Expr, Stmt};
use pretty_assertions::assert_eq;

struct Harness {
    executor: ScriptExecutor,
    out: SharedPrintHandler,
}

impl Harness {
    fn new() -> Self {
        fable_eval::init_tracing();
        let out = buffer_handler();
        let executor =
            ScriptExecutor::new(BuiltinRegistry::with_stdlib(out.clone()), Rc::new(NullSink));
        Harness { executor, out }
    }

    fn run(&self, stmts: Vec<Stmt>) -> ExecutionResult {
        let mut ctx = ExecutionContext::new("semantics");
        self.executor.execute(&program(stmts), &mut ctx)
    }

    fn value(&self, stmts: Vec<Stmt>) -> Value {
        let result = self.run(stmts);
        if let Some(err) = result.error() {
            panic!("script failed: {err}");
        }
        result.value.expect("successful run has a value")
    }

    fn error(&self, stmts: Vec<Stmt>) -> EvalErrorKind {
        let result = self.run(stmts);
        assert!(!result.is_success(), "expected failure, got {:?}", result.value);
        result.error.expect("failed run has an error").kind
    }
}

fn print(args: Vec<Expr>) -> Stmt {
    expr_stmt(call("print", args))
}

fn add(l: Expr, r: Expr) -> Expr {
    binary(BinaryOp::Add, l, r)
}

#[test]
fn block_bindings_are_unreachable_after_the_block() {
    let err = Harness::new().error(vec![
        block(vec![let_("torch", int(1))]),
        ret(ident("torch")),
    ]);
    assert!(matches!(err, EvalErrorKind::UndefinedVariable { ref name } if name == "torch"));
}

#[test]
fn shadowing_leaves_outer_binding_intact() {
    let h = Harness::new();
    let value = h.value(vec![
        let_("hp", int(10)),
        block(vec![let_("hp", int(1)), print(vec![ident("hp")])]),
        ret(ident("hp")),
    ]);
    assert_eq!(value, Value::Int(10));
    assert_eq!(h.out.output(), "1\n");
}

#[test]
fn return_in_loop_ends_block_but_not_caller() {
    let h = Harness::new();
    let value = h.value(vec![
        func(
            "first_even",
            &["items"],
            vec![
                for_in(
                    "x",
                    ident("items"),
                    vec![if_(
                        binary(
                            BinaryOp::Eq,
                            binary(BinaryOp::Mod, ident("x"), int(2)),
                            int(0),
                        ),
                        vec![ret(ident("x"))],
                    )],
                ),
                ret(int(-1)),
            ],
        ),
        let_("found", call("first_even", vec![list(vec![int(3), int(4), int(6)])])),
        print(vec![string("after call")]),
        ret(ident("found")),
    ]);
    assert_eq!(value, Value::Int(4));
    assert_eq!(h.out.output(), "after call\n");
}

#[test]
fn arithmetic_typing() {
    let h = Harness::new();
    assert_eq!(h.value(vec![ret(add(int(2), int(3)))]), Value::Int(5));
    assert_eq!(h.value(vec![ret(add(int(2), float(3.0)))]), Value::Float(5.0));
    assert_eq!(h.value(vec![ret(add(string("a"), int(1)))]), Value::string("a1"));
}

#[test]
fn division_is_float_and_checks_zero() {
    let h = Harness::new();
    assert_eq!(
        h.value(vec![ret(binary(BinaryOp::Div, int(10), int(2)))]),
        Value::Float(5.0)
    );
    assert!(matches!(
        h.error(vec![ret(binary(BinaryOp::Div, int(5), int(0)))]),
        EvalErrorKind::DivisionByZero
    ));
}

#[test]
fn list_truthiness_depends_on_length_only() {
    let h = Harness::new();
    h.value(vec![
        if_(list(vec![]), vec![print(vec![string("empty")])]),
        if_(list(vec![int(0)]), vec![print(vec![string("non-empty")])]),
    ]);
    assert_eq!(h.out.output(), "non-empty\n");
}

#[test]
fn for_in_iterates_lists_only() {
    let h = Harness::new();
    h.value(vec![for_in(
        "x",
        list(vec![int(1), int(2), int(3)]),
        vec![let_("copy", ident("x")), print(vec![ident("copy")])],
    )]);
    assert_eq!(h.out.output(), "1\n2\n3\n");

    for iterable in [map(vec![("a", int(1))]), int(3)] {
        assert!(matches!(
            h.error(vec![for_in("x", iterable, vec![])]),
            EvalErrorKind::TypeMismatch { .. }
        ));
    }
}

#[test]
fn functions_resolve_free_variables_lexically() {
    let value = Harness::new().value(vec![
        let_("name", string("top")),
        func("who", &[], vec![ret(ident("name"))]),
        func(
            "caller",
            &[],
            vec![block(vec![
                let_("name", string("local")),
                block(vec![ret(call("who", vec![]))]),
            ])],
        ),
        ret(call("caller", vec![])),
    ]);
    assert_eq!(value, Value::string("top"));
}

#[test]
fn index_bounds() {
    let h = Harness::new();
    let items = || list(vec![int(1), int(2), int(3)]);
    assert_eq!(h.value(vec![ret(index(items(), int(1)))]), Value::Int(2));
    for bad in [int(3), neg(int(1))] {
        assert!(matches!(
            h.error(vec![ret(index(items(), bad))]),
            EvalErrorKind::IndexOutOfRange { len: 3, .. }
        ));
    }
}

#[test]
fn unregistered_call_is_a_failure_result() {
    let result = Harness::new().run(vec![expr_stmt(call("summon_dragon", vec![]))]);
    assert!(!result.success);
    assert!(result.value.is_none());
    assert!(matches!(
        result.error.unwrap().kind,
        EvalErrorKind::UndefinedFunction { ref name } if name == "summon_dragon"
    ));
}

#[test]
fn and_or_evaluate_both_sides() {
    let h = Harness::new();
    let value = h.value(vec![
        let_("hits", int(0)),
        func(
            "touch",
            &["v"],
            vec![set("hits", add(ident("hits"), int(1))), ret(ident("v"))],
        ),
        expr_stmt(binary(
            BinaryOp::And,
            call("touch", vec![int(0)]),
            call("touch", vec![int(1)]),
        )),
        expr_stmt(binary(
            BinaryOp::Or,
            call("touch", vec![int(1)]),
            call("touch", vec![int(0)]),
        )),
        ret(ident("hits")),
    ]);
    assert_eq!(value, Value::Int(4));
}

#[test]
fn while_loop_counts_down() {
    let h = Harness::new();
    h.value(vec![
        let_("n", int(3)),
        while_(
            binary(BinaryOp::Gt, ident("n"), int(0)),
            vec![
                print(vec![ident("n")]),
                set("n", binary(BinaryOp::Sub, ident("n"), int(1))),
            ],
        ),
    ]);
    assert_eq!(h.out.output(), "3\n2\n1\n");
}

#[test]
fn integer_overflow_is_an_error() {
    assert!(matches!(
        Harness::new().error(vec![ret(add(int(i64::MAX), int(1)))]),
        EvalErrorKind::IntegerOverflow { .. }
    ));
}

#[test]
fn failure_result_carries_backtrace() {
    let result = Harness::new().run(vec![
        func("inner", &[], vec![ret(index(list(vec![]), int(0)))]),
        func("outer", &[], vec![ret(call("inner", vec![]))]),
        expr_stmt(call("outer", vec![])),
    ]);
    let err = result.error().unwrap();
    let names: Vec<_> = err
        .backtrace
        .as_ref()
        .unwrap()
        .frames()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["inner", "outer"]);
}
