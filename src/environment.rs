use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, Position, RuntimeErrorKind},
    value::Value,
};

pub type EnvironmentRef = Rc<RefCell<Environment>>;

/// One frame of the binding chain. The chain links block and call frames up
/// to the global frame; closures keep their defining frame alive through the
/// `parent` reference.
#[derive(Default)]
pub struct Environment {
    parent: Option<EnvironmentRef>,
    bindings: IndexMap<String, Value>,
}

impl Environment {
    pub fn new() -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: None,
            bindings: IndexMap::new(),
        }))
    }

    pub fn with_parent(parent: EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            bindings: IndexMap::new(),
        }))
    }

    /// Declare a name in this frame, shadowing any outer binding of the same
    /// name. Re-declaring in the same frame simply replaces the value.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn lookup(env: &EnvironmentRef, name: &str, position: &Position) -> Result<Value, Diagnostic> {
        if let Some(value) = env.borrow().bindings.get(name) {
            return Ok(value.clone());
        }
        if let Some(parent) = env.borrow().parent.clone() {
            return Environment::lookup(&parent, name, position);
        }
        Err(
            Diagnostic::runtime(RuntimeErrorKind::Undefined, format!("`{name}` is undefined"))
                .at(position.clone()),
        )
    }

    /// Rebind the nearest existing binding of `name`. When no frame binds it,
    /// the assignment falls through to the global frame and creates the
    /// binding there.
    pub fn assign(env: &EnvironmentRef, name: &str, value: Value) {
        if env.borrow().bindings.contains_key(name) {
            env.borrow_mut().bindings.insert(name.to_string(), value);
            return;
        }
        let parent = env.borrow().parent.clone();
        match parent {
            Some(parent) => Environment::assign(&parent, name, value),
            None => {
                env.borrow_mut().bindings.insert(name.to_string(), value);
            }
        }
    }
}
