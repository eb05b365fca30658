//! Host integration: events, timers, declarations, host built-ins and stop
//! requests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;
use std::sync::Arc;

use fable_eval::{
    buffer_handler, expect_arity, expect_str, forward_handler, register_timer_builtins,
    BuiltinError, BuiltinRegistry, Callback, DeclarationRegistry, EvalErrorKind, ExecutionContext,
    NullSink, ScriptExecutor, ScriptId, SharedPrintHandler, TimerQueue, Value,
};
use fable_ir::build::{
    binary, call, expr_stmt, func, host_code, ident, int, let_, node, on, program, property, ret,
    set, string,
};
use fable_ir::BinaryOp;
use pretty_assertions::assert_eq;

#[derive(Debug, thiserror::Error)]
#[error("quest journal is locked")]
struct JournalLocked;

struct World {
    executor: ScriptExecutor,
    declarations: Rc<DeclarationRegistry>,
    timers: fable_eval::SharedTimerQueue,
    out: SharedPrintHandler,
}

impl World {
    fn new() -> Self {
        let out = buffer_handler();
        let timers = TimerQueue::shared();
        let mut builtins = BuiltinRegistry::with_stdlib(out.clone());
        register_timer_builtins(&mut builtins, &timers);
        builtins.register("journal", |args, _| {
            expect_arity(args, 1)?;
            match expect_str(args, 0)? {
                "locked" => Err(BuiltinError::host(JournalLocked)),
                entry => Ok(Value::string(format!("noted: {entry}"))),
            }
        });
        let declarations = Rc::new(DeclarationRegistry::new());
        let executor = ScriptExecutor::new(builtins, declarations.clone());
        World {
            executor,
            declarations,
            timers,
            out,
        }
    }

    /// Run every timer due at `now_ms` on `ctx`.
    fn advance(&self, now_ms: u64, ctx: &mut ExecutionContext) -> usize {
        let due = self.timers.borrow_mut().take_due(now_ms);
        for scheduled in &due {
            assert_eq!(&scheduled.script_id, ctx.script_id());
            let result = self.executor.run_deferred(&scheduled.call, ctx);
            assert!(result.is_success(), "{:?}", result.error);
        }
        due.len()
    }
}

#[test]
fn event_handlers_run_later_against_script_globals() {
    let world = World::new();
    let mut ctx = ExecutionContext::new("inn");
    let script = program(vec![
        let_("visits", int(0)),
        on(
            "enter",
            &["who"],
            vec![
                set("visits", binary(BinaryOp::Add, ident("visits"), int(1))),
                expr_stmt(call("print", vec![ident("who"), ident("visits")])),
            ],
        ),
    ]);
    assert!(world.executor.execute(&script, &mut ctx).is_success());

    let handlers = world.declarations.event_handlers(ctx.script_id(), "enter");
    for who in ["ana", "bo"] {
        let result = world
            .executor
            .fire_event(&handlers[0], vec![Value::string(who)], &mut ctx);
        assert!(result.is_success());
    }
    assert_eq!(world.out.output(), "ana 1\nbo 2\n");
    assert_eq!(ctx.get_variable("visits"), Some(Value::Int(2)));
}

#[test]
fn timers_fire_in_order_with_bound_arguments() {
    let world = World::new();
    let mut ctx = ExecutionContext::new("bells");
    let script = program(vec![
        func("ring", &["n"], vec![expr_stmt(call("print", vec![string("ring"), ident("n")]))]),
        expr_stmt(call("after", vec![int(200), ident("ring"), int(2)])),
        expr_stmt(call("after", vec![int(100), ident("ring"), int(1)])),
        let_("t", call("after", vec![int(150), ident("print"), string("never")])),
        expr_stmt(call("cancel_timer", vec![ident("t")])),
    ]);
    assert!(world.executor.execute(&script, &mut ctx).is_success());
    assert_eq!(world.out.output(), "");

    assert_eq!(world.advance(50, &mut ctx), 0);
    assert_eq!(world.advance(250, &mut ctx), 2);
    assert_eq!(world.out.output(), "ring 1\nring 2\n");
    assert_eq!(world.timers.borrow().pending_len(), 0);
}

#[test]
fn native_callbacks_run_through_the_executor() {
    let world = World::new();
    let mut ctx = ExecutionContext::new("host");
    let call = Callback::native("double", |args| match args {
        [Value::Int(n)] => Ok(Value::Int(n * 2)),
        _ => Err(BuiltinError::invalid("expected one int")),
    })
    .bind(vec![Value::Int(21)]);
    let result = world.executor.run_deferred(&call, &mut ctx);
    assert_eq!(result.value(), Some(&Value::Int(42)));
}

#[test]
fn host_failure_keeps_cause_and_builtin_name() {
    let world = World::new();
    let mut ctx = ExecutionContext::new("journal");
    let ok = world.executor.execute(
        &program(vec![ret(call("journal", vec![string("rats cleared")]))]),
        &mut ctx,
    );
    assert_eq!(ok.value(), Some(&Value::string("noted: rats cleared")));

    let failed = world.executor.execute(
        &program(vec![ret(call("journal", vec![string("locked")]))]),
        &mut ctx,
    );
    let err = failed.error().unwrap();
    match &err.kind {
        EvalErrorKind::HostInteropFailure { builtin, source } => {
            assert_eq!(builtin, "journal");
            assert_eq!(source.to_string(), "quest journal is locked");
        }
        other => panic!("expected host failure, got {other:?}"),
    }
    assert!(std::error::Error::source(err).is_some());

    let bad_args = world
        .executor
        .execute(&program(vec![ret(call("journal", vec![]))]), &mut ctx);
    assert!(matches!(
        bad_args.error().unwrap().kind,
        EvalErrorKind::ArgumentError { .. }
    ));
}

#[test]
fn declarations_are_recorded_per_script() {
    let world = World::new();
    let mut ctx = ExecutionContext::new("village");
    let script = program(vec![
        node("npc", "smith", vec![property("level", int(4))]),
        host_code("play_music(\"forge\")"),
    ]);
    assert!(world.executor.execute(&script, &mut ctx).is_success());

    let id = ScriptId::new("village");
    let nodes = world.declarations.nodes(&id);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "smith");
    assert_eq!(world.declarations.host_code(&id).len(), 1);
    // The node body belongs to the host; nothing was bound by the run.
    assert!(!ctx.has_variable("level"));
}

#[test]
fn stop_handle_works_from_another_thread() {
    let world = World::new();
    let handle = world.executor.stop_handle();
    let script = ScriptId::new("watchdog");
    let barrier = Arc::new(std::sync::Barrier::new(2));

    let watcher = {
        let handle = handle.clone();
        let barrier = Arc::clone(&barrier);
        let script = script.clone();
        std::thread::spawn(move || {
            barrier.wait();
            while !handle.stop(&script) {
                std::thread::yield_now();
            }
        })
    };

    let mut executor = world.executor;
    let wait = Arc::clone(&barrier);
    executor.builtins_mut().register("ready", move |_, _| {
        wait.wait();
        Ok(Value::Null)
    });

    let mut ctx = ExecutionContext::new("watchdog");
    let spin = program(vec![
        expr_stmt(call("ready", vec![])),
        fable_ir::build::while_(fable_ir::build::boolean(true), vec![]),
    ]);
    let result = executor.execute(&spin, &mut ctx);
    watcher.join().unwrap();

    let err = result.error().unwrap();
    assert!(err.is_interrupt());
    assert!(!handle.is_running(&script));
}

#[test]
fn print_output_can_be_forwarded_to_a_console() {
    let console = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&console);
    let handler = forward_handler(move |line| sink.lock().push(line.to_string()));
    let executor = ScriptExecutor::new(BuiltinRegistry::with_stdlib(handler), Rc::new(NullSink));

    let mut ctx = ExecutionContext::new("console");
    let script = program(vec![
        expr_stmt(call("print", vec![string("gate"), string("opens")])),
        expr_stmt(call("print", vec![int(3)])),
    ]);
    assert!(executor.execute(&script, &mut ctx).is_success());
    assert_eq!(*console.lock(), vec!["gate opens".to_string(), "3".to_string()]);
}
