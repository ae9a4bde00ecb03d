//! Callable values: user functions (closures) and native functions.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear before `(...)`.
///
/// Callers check `arguments.len() == arity()` before calling; `paren` is the
/// call site, used to attribute errors raised by the callee.
pub trait LoxCallable {
    fn arity(&self) -> usize;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, RuntimeError>;
}

/// A `fun` declaration or method closed over the scope it was declared in.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure binds `this` to `instance`.
    /// The original is left untouched.
    pub fn bind(&self, instance: &Rc<LoxInstance>) -> LoxFunction {
        let environment: EnvRef = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(Rc::clone(instance)));

        LoxFunction::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }
}

impl LoxCallable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _paren: &Token,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling <fn {}> with {} args", self.name(), arguments.len());

        let environment: EnvRef = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, environment)?;

        // An initializer always hands back the instance it was bound to.
        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this"));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// Signature of a builtin.  `this` is the receiver when the builtin is a
/// native class method bound to an instance.  Failures are plain messages;
/// the interpreter attaches the call-site token.
pub type NativeFn =
    fn(&mut Interpreter, Option<&Rc<LoxInstance>>, &[Value]) -> Result<Value, String>;

/// A function implemented in Rust.
#[derive(Clone)]
pub struct NativeFunction {
    name: &'static str,
    arity: usize,
    func: NativeFn,
    receiver: Option<Rc<LoxInstance>>,
}

impl NativeFunction {
    pub fn new(name: &'static str, arity: usize, func: NativeFn) -> Self {
        Self {
            name,
            arity,
            func,
            receiver: None,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn bind(&self, instance: &Rc<LoxInstance>) -> NativeFunction {
        NativeFunction {
            receiver: Some(Rc::clone(instance)),
            ..self.clone()
        }
    }
}

impl LoxCallable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling <native fn {}>", self.name);

        (self.func)(interpreter, self.receiver.as_ref(), &arguments)
            .map_err(|message| RuntimeError::new(paren, message))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
