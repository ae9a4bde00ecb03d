use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an environment.  Every closure created in a scope holds
/// one, so assignments made through any handle are seen by all of them.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: its bindings plus the scope it is nested in.
#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this scope, silently replacing an existing binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Is `name` bound in this scope itself?
    pub fn is_defined(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Dynamic lookup through the whole chain.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeError::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Dynamic assignment through the whole chain; the name must exist.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// The environment `distance` hops up the chain from `env`.
    ///
    /// # Panics
    ///
    /// If the chain is shorter than `distance`: the resolver computed a
    /// distance for a different scope layout than the one being executed.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current: EnvRef = Rc::clone(env);

        for hop in 0..distance {
            let next: Option<EnvRef> = current.borrow().enclosing.clone();

            current = match next {
                Some(next) => next,
                None => panic!(
                    "scope chain ended after {} of {} hops for a resolved local",
                    hop, distance
                ),
            };
        }

        current
    }

    /// Read a resolved local.
    ///
    /// # Panics
    ///
    /// If `name` is not bound at exactly `distance`; see [`Environment::ancestor`].
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Value {
        debug!("get_at distance={} name={}", distance, name);

        let target: EnvRef = Self::ancestor(env, distance);
        let found: Option<Value> = target.borrow().values.get(name).cloned();

        match found {
            Some(value) => value,
            None => panic!("resolved local '{}' missing at distance {}", name, distance),
        }
    }

    /// Write a resolved local.
    ///
    /// # Panics
    ///
    /// If `name` is not bound at exactly `distance`, as for [`Environment::get_at`].
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) {
        debug!("assign_at distance={} name={}", distance, name.lexeme);

        let target: EnvRef = Self::ancestor(env, distance);
        let mut scope = target.borrow_mut();

        match scope.values.get_mut(&name.lexeme) {
            Some(slot) => *slot = value,
            None => panic!(
                "resolved local '{}' missing at distance {}",
                name.lexeme, distance
            ),
        };
    }
}

impl fmt::Debug for Environment {
    /// Names only: values may point back at this environment through closures.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_enclosing", &self.enclosing.is_some())
            .finish()
    }
}
