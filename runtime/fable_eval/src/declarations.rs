//! Hand-off of host-interpreted declarations.
//!
//! Dialogue, quest, node and event-handler declarations are not evaluated by
//! the interpreter; it passes them to a [`DeclarationSink`] tagged with the
//! script that declared them. The host decides what they mean.

use std::cell::RefCell;
use std::rc::Rc;

use fable_ir::{DialogueDecl, EventHandlerDecl, NodeDecl, QuestDecl};
use rustc_hash::FxHashMap;

use crate::context::ScriptId;
use crate::errors::BuiltinError;

/// Receiver for declarations met during evaluation.
///
/// Every method defaults to ignoring its input, so an implementor only
/// overrides what it handles.
pub trait DeclarationSink {
    fn register_dialogue(&self, _decl: &Rc<DialogueDecl>, _script: &ScriptId) {}

    fn register_quest(&self, _decl: &Rc<QuestDecl>, _script: &ScriptId) {}

    fn register_node(&self, _decl: &Rc<NodeDecl>, _script: &ScriptId) {}

    fn register_event_handler(&self, _decl: &Rc<EventHandlerDecl>, _script: &ScriptId) {}

    /// Run a raw host-code snippet. An error fails the script with
    /// `HostInteropFailure` named `host_code`.
    fn run_host_code(&self, code: &str, script: &ScriptId) -> Result<(), BuiltinError> {
        tracing::warn!(%script, len = code.len(), "host code ignored: no handler installed");
        Ok(())
    }
}

/// Sink that drops every declaration.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DeclarationSink for NullSink {}

/// Everything one script has declared, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct ScriptDeclarations {
    pub dialogues: Vec<Rc<DialogueDecl>>,
    pub quests: Vec<Rc<QuestDecl>>,
    pub nodes: Vec<Rc<NodeDecl>>,
    pub event_handlers: Vec<Rc<EventHandlerDecl>>,
    pub host_code: Vec<String>,
}

/// In-memory sink keeping declarations per script.
///
/// Re-running a script appends; call [`DeclarationRegistry::clear_script`]
/// first to replace its declarations.
#[derive(Debug, Default)]
pub struct DeclarationRegistry {
    scripts: RefCell<FxHashMap<ScriptId, ScriptDeclarations>>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, script: &ScriptId, f: impl FnOnce(&mut ScriptDeclarations)) {
        let mut scripts = self.scripts.borrow_mut();
        f(scripts.entry(script.clone()).or_default());
    }

    fn query<T>(&self, script: &ScriptId, f: impl FnOnce(&ScriptDeclarations) -> T) -> Option<T> {
        self.scripts.borrow().get(script).map(f)
    }

    pub fn dialogues(&self, script: &ScriptId) -> Vec<Rc<DialogueDecl>> {
        self.query(script, |d| d.dialogues.clone()).unwrap_or_default()
    }

    pub fn quests(&self, script: &ScriptId) -> Vec<Rc<QuestDecl>> {
        self.query(script, |d| d.quests.clone()).unwrap_or_default()
    }

    pub fn nodes(&self, script: &ScriptId) -> Vec<Rc<NodeDecl>> {
        self.query(script, |d| d.nodes.clone()).unwrap_or_default()
    }

    /// Handlers of `script` for `event`, in declaration order.
    pub fn event_handlers(&self, script: &ScriptId, event: &str) -> Vec<Rc<EventHandlerDecl>> {
        self.query(script, |d| {
            d.event_handlers
                .iter()
                .filter(|h| h.event == event)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn host_code(&self, script: &ScriptId) -> Vec<String> {
        self.query(script, |d| d.host_code.clone()).unwrap_or_default()
    }

    /// Snapshot of everything `script` has declared.
    pub fn declarations(&self, script: &ScriptId) -> Option<ScriptDeclarations> {
        self.query(script, Clone::clone)
    }

    /// Forget a script's declarations. Returns whether it had any.
    pub fn clear_script(&self, script: &ScriptId) -> bool {
        self.scripts.borrow_mut().remove(script).is_some()
    }
}

impl DeclarationSink for DeclarationRegistry {
    fn register_dialogue(&self, decl: &Rc<DialogueDecl>, script: &ScriptId) {
        self.record(script, |d| d.dialogues.push(Rc::clone(decl)));
    }

    fn register_quest(&self, decl: &Rc<QuestDecl>, script: &ScriptId) {
        self.record(script, |d| d.quests.push(Rc::clone(decl)));
    }

    fn register_node(&self, decl: &Rc<NodeDecl>, script: &ScriptId) {
        self.record(script, |d| d.nodes.push(Rc::clone(decl)));
    }

    fn register_event_handler(&self, decl: &Rc<EventHandlerDecl>, script: &ScriptId) {
        self.record(script, |d| d.event_handlers.push(Rc::clone(decl)));
    }

    /// Host code is recorded, not run.
    fn run_host_code(&self, code: &str, script: &ScriptId) -> Result<(), BuiltinError> {
        self.record(script, |d| d.host_code.push(code.to_string()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use fable_ir::build::{dialogue, node, on};
    use fable_ir::StmtKind;
    use pretty_assertions::assert_eq;

    fn handler(event: &str) -> Rc<EventHandlerDecl> {
        match on(event, &["who"], vec![]).kind {
            StmtKind::EventHandler(decl) => decl,
            other => panic!("expected event handler, got {other:?}"),
        }
    }

    #[test]
    fn registry_groups_by_script_and_event() {
        let registry = DeclarationRegistry::new();
        let tavern = ScriptId::new("tavern");
        let forge = ScriptId::new("forge");

        registry.register_event_handler(&handler("enter"), &tavern);
        registry.register_event_handler(&handler("leave"), &tavern);
        registry.register_event_handler(&handler("enter"), &tavern);
        registry.register_event_handler(&handler("enter"), &forge);

        assert_eq!(registry.event_handlers(&tavern, "enter").len(), 2);
        assert_eq!(registry.event_handlers(&tavern, "leave").len(), 1);
        assert_eq!(registry.event_handlers(&forge, "enter").len(), 1);
        assert!(registry.event_handlers(&forge, "leave").is_empty());
    }

    #[test]
    fn registry_keeps_declaration_order() {
        let registry = DeclarationRegistry::new();
        let script = ScriptId::new("village");
        for stmt in [node("npc", "guard", vec![]), node("location", "gate", vec![])] {
            if let StmtKind::Node(decl) = stmt.kind {
                registry.register_node(&decl, &script);
            }
        }
        let names: Vec<_> = registry
            .nodes(&script)
            .iter()
            .map(|n| format!("{} {}", n.kind, n.name))
            .collect();
        assert_eq!(names, vec!["npc guard", "location gate"]);
    }

    #[test]
    fn clear_script_forgets_everything() {
        let registry = DeclarationRegistry::new();
        let script = ScriptId::new("intro");
        if let StmtKind::Dialogue(decl) = dialogue("greeting", vec![]).kind {
            registry.register_dialogue(&decl, &script);
        }
        registry.run_host_code("spawn()", &script).unwrap();

        let snapshot = registry.declarations(&script).unwrap();
        assert_eq!(snapshot.dialogues.len(), 1);
        assert_eq!(snapshot.host_code, vec!["spawn()".to_string()]);

        assert!(registry.clear_script(&script));
        assert!(registry.dialogues(&script).is_empty());
        assert!(!registry.clear_script(&script));
    }

    #[test]
    fn null_sink_accepts_host_code() {
        assert!(NullSink
            .run_host_code("anything", &ScriptId::new("s"))
            .is_ok());
    }
}
