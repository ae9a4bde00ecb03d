//! Classes and their instances.
//!
//! Methods are stored unbound and bound afresh on every lookup, so nothing
//! in a class points at an instance.  Two lookups of the same method on the
//! same instance give two distinct function values.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::error::RuntimeError;
use crate::function::{LoxCallable, LoxFunction, NativeFunction};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Name of the method run by `ClassName(...)`.
pub const INITIALIZER: &str = "init";

/// An entry in a class's method table.
#[derive(Clone)]
pub enum Method {
    Declared(Rc<LoxFunction>),
    Native(NativeFunction),
}

impl Method {
    pub fn arity(&self) -> usize {
        match self {
            Method::Declared(function) => function.arity(),
            Method::Native(native) => native.arity(),
        }
    }

    /// A callable value with `this` bound to `instance`.
    pub fn bind(&self, instance: &Rc<LoxInstance>) -> Value {
        match self {
            Method::Declared(function) => Value::Function(Rc::new(function.bind(instance))),
            Method::Native(native) => Value::NativeFunction(Rc::new(native.bind(instance))),
        }
    }
}

pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Method>,
}

impl LoxClass {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Method>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unbound method `name`, searching this class then its ancestors.
    pub fn lookup(&self, name: &str) -> Option<&Method> {
        match self.methods.get(name) {
            Some(method) => Some(method),
            None => self.superclass.as_ref().and_then(|s| s.lookup(name)),
        }
    }

    /// Method `name` bound to `instance`, or `None` once the chain is exhausted.
    pub fn find_method(&self, instance: &Rc<LoxInstance>, name: &str) -> Option<Value> {
        self.lookup(name).map(|method| method.bind(instance))
    }
}

impl LoxCallable for Rc<LoxClass> {
    fn arity(&self) -> usize {
        self.lookup(INITIALIZER).map_or(0, Method::arity)
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, RuntimeError> {
        debug!("Instantiating class {}", self.name);

        let instance: Rc<LoxInstance> = LoxInstance::new(Rc::clone(self));

        if let Some(initializer) = self.find_method(&instance, INITIALIZER) {
            if let Some(callable) = initializer.as_callable() {
                callable.call(interpreter, arguments, paren)?;
            }
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        f.debug_struct("LoxClass")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name()))
            .field("methods", &methods)
            .finish()
    }
}

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: RefCell<HashMap<String, Value>>,
    /// Backing store for native classes such as `Array`.
    elements: RefCell<Vec<Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Rc<Self> {
        Rc::new(Self {
            class,
            fields: RefCell::new(HashMap::new()),
            elements: RefCell::new(Vec::new()),
        })
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Property access: fields shadow methods.
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        self.class.find_method(self, &name.lexeme).ok_or_else(|| {
            RuntimeError::new(name, format!("Undefined property '{}'.", name.lexeme))
        })
    }

    /// Fields are created on first assignment.
    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }

    pub fn elements(&self) -> Ref<'_, Vec<Value>> {
        self.elements.borrow()
    }

    pub fn elements_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.elements.borrow_mut()
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
