use super::*;
use crate::errors::EvalErrorKind;
use pretty_assertions::assert_eq;

#[test]
fn scope_define_lookup() {
    let mut scope = Scope::new();
    scope.define("x", Value::Int(42));
    assert_eq!(scope.lookup("x"), Some(Value::Int(42)));
    assert_eq!(scope.lookup("y"), None);
}

#[test]
fn scope_shadowing() {
    let parent = LocalScope::new(Scope::new());
    parent.borrow_mut().define("x", Value::Int(1));

    let mut child = Scope::with_parent(parent.clone());
    child.define("x", Value::Int(2));

    assert_eq!(child.lookup("x"), Some(Value::Int(2)));
    assert_eq!(parent.borrow().lookup("x"), Some(Value::Int(1)));
}

#[test]
fn scope_assign_reaches_parent() {
    let parent = LocalScope::new(Scope::new());
    parent.borrow_mut().define("hp", Value::Int(10));

    let mut child = Scope::with_parent(parent.clone());
    assert!(child.assign("hp", Value::Int(7)));
    assert_eq!(parent.borrow().lookup("hp"), Some(Value::Int(7)));
    assert!(!child.assign("mana", Value::Int(1)));
}

#[test]
fn environment_push_pop() {
    let mut env = Environment::new();
    env.define("x", Value::Int(1));

    env.push_scope();
    env.define("x", Value::Int(2));
    assert_eq!(env.depth(), 2);
    assert_eq!(env.lookup("x"), Some(Value::Int(2)));

    env.pop_scope();
    assert_eq!(env.lookup("x"), Some(Value::Int(1)));
}

#[test]
fn environment_never_pops_global() {
    let mut env = Environment::new();
    env.define("keep", Value::Bool(true));
    env.pop_scope();
    env.pop_scope();
    assert_eq!(env.depth(), 1);
    assert_eq!(env.lookup("keep"), Some(Value::Bool(true)));
}

#[test]
fn captured_environment_sees_later_bindings() {
    let mut env = Environment::new();
    env.push_scope();
    let captured = env.current_scope();
    env.define("late", Value::Int(3));

    let mut call_env = Environment::from_captured(captured, env.global());
    call_env.push_scope();
    assert_eq!(call_env.lookup("late"), Some(Value::Int(3)));

    call_env.define("local", Value::Int(1));
    assert_eq!(env.lookup("local"), None);
}

#[test]
fn local_scope_clone_shares_allocation() {
    let a = LocalScope::new(Scope::new());
    let b = a.clone();
    a.borrow_mut().define("x", Value::Null);
    assert!(b.borrow().contains("x"));
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&LocalScope::new(Scope::new())));
}

#[test]
fn context_set_variable_requires_binding() {
    let mut ctx = ExecutionContext::new("guard");
    let err = ctx.set_variable("ghost", Value::Int(1)).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::UndefinedVariable { ref name } if name == "ghost"
    ));

    ctx.define_variable("gold", Value::Int(5));
    ctx.push_scope();
    ctx.set_variable("gold", Value::Int(6)).unwrap();
    ctx.pop_scope();
    assert_eq!(ctx.get_variable("gold"), Some(Value::Int(6)));
}

#[test]
fn context_globals_survive_scope_churn() {
    let mut ctx = ExecutionContext::with_globals("inn", [("player", Value::string("Ayla"))]);
    ctx.push_scope();
    ctx.define_variable("tmp", Value::Int(1));
    assert!(ctx.has_variable("player"));
    ctx.pop_scope();
    assert!(!ctx.has_variable("tmp"));
    assert_eq!(ctx.depth(), 1);
    assert_eq!(ctx.script_id().as_str(), "inn");
}

#[test]
fn call_stack_depth_limit() {
    let mut stack = CallStack::new(Some(2));
    stack.push(CallFrame::new("a", None)).unwrap();
    stack.push(CallFrame::new("b", None)).unwrap();
    let err = stack.push(CallFrame::new("c", None)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::StackOverflow { depth: 2 }));
    assert_eq!(stack.depth(), 2);
}

#[test]
fn call_stack_capture_is_most_recent_first() {
    let mut stack = CallStack::new(None);
    stack.push(CallFrame::new("outer", None)).unwrap();
    stack.push(CallFrame::new("inner", None)).unwrap();
    let names: Vec<String> = stack
        .capture()
        .frames()
        .iter()
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(names, vec!["inner".to_string(), "outer".to_string()]);
}

#[test]
fn script_id_display() {
    let id = ScriptId::from("quest_giver");
    assert_eq!(id.to_string(), "quest_giver");
    assert_eq!(id, ScriptId::new(String::from("quest_giver")));
}
