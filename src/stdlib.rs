//! Builtins installed into the global environment before any user code runs:
//!
//! | Name    | Kind     | Members                                        |
//! |---------|----------|------------------------------------------------|
//! | `clock` | function | `clock()` → seconds since the Unix epoch       |
//! | `Array` | class    | `get(i)`, `push(v)`, `length()`, `pop()`       |
//! | `Input` | class    | `string(prompt)`, `number(prompt)`             |

use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::class::{LoxClass, LoxInstance, Method};
use crate::environment::Environment;
use crate::function::{NativeFn, NativeFunction};
use crate::interpreter::Interpreter;
use crate::value::Value;

pub fn install(globals: &mut Environment) {
    info!("Installing native builtins");

    globals.define(
        "clock",
        Value::NativeFunction(Rc::new(NativeFunction::new("clock", 0, clock))),
    );

    globals.define("Array", Value::Class(Rc::new(array_class())));
    globals.define("Input", Value::Class(Rc::new(input_class())));
}

fn native_class(name: &'static str, members: &[(&'static str, usize, NativeFn)]) -> LoxClass {
    let methods: HashMap<String, Method> = members
        .iter()
        .map(|&(method, arity, func)| {
            (
                method.to_string(),
                Method::Native(NativeFunction::new(method, arity, func)),
            )
        })
        .collect();

    LoxClass::new(name, None, methods)
}

fn receiver<'a>(this: Option<&'a Rc<LoxInstance>>) -> Result<&'a Rc<LoxInstance>, String> {
    this.ok_or_else(|| "Method called without an instance.".to_string())
}

// ─────────────────────────────── clock ───────────────────────────────────

fn clock(_: &mut Interpreter, _: Option<&Rc<LoxInstance>>, _: &[Value]) -> Result<Value, String> {
    let seconds: f64 = Utc::now().timestamp_millis() as f64 / 1000.0;

    debug!("clock() -> {}", seconds);

    Ok(Value::Number(seconds))
}

// ─────────────────────────────── Array ───────────────────────────────────

fn array_class() -> LoxClass {
    native_class(
        "Array",
        &[
            ("get", 1, array_get),
            ("push", 1, array_push),
            ("length", 0, array_length),
            ("pop", 0, array_pop),
        ],
    )
}

fn array_get(
    _: &mut Interpreter,
    this: Option<&Rc<LoxInstance>>,
    args: &[Value],
) -> Result<Value, String> {
    let this: &Rc<LoxInstance> = receiver(this)?;

    let index: f64 = match args.first() {
        Some(Value::Number(n)) => *n,
        _ => return Err("Array index must be a number.".to_string()),
    };

    let elements = this.elements();

    if index < 0.0 || index.fract() != 0.0 || index >= elements.len() as f64 {
        return Err(format!("Array index {} out of bounds.", index));
    }

    Ok(elements[index as usize].clone())
}

fn array_push(
    _: &mut Interpreter,
    this: Option<&Rc<LoxInstance>>,
    args: &[Value],
) -> Result<Value, String> {
    let this: &Rc<LoxInstance> = receiver(this)?;

    this.elements_mut()
        .push(args.first().cloned().unwrap_or(Value::Nil));

    Ok(Value::Nil)
}

fn array_length(
    _: &mut Interpreter,
    this: Option<&Rc<LoxInstance>>,
    _: &[Value],
) -> Result<Value, String> {
    let this: &Rc<LoxInstance> = receiver(this)?;
    let length: usize = this.elements().len();

    Ok(Value::Number(length as f64))
}

/// Removes and returns the last element; `nil` when empty.
fn array_pop(
    _: &mut Interpreter,
    this: Option<&Rc<LoxInstance>>,
    _: &[Value],
) -> Result<Value, String> {
    let this: &Rc<LoxInstance> = receiver(this)?;
    let last: Option<Value> = this.elements_mut().pop();

    Ok(last.unwrap_or(Value::Nil))
}

// ─────────────────────────────── Input ───────────────────────────────────

fn input_class() -> LoxClass {
    native_class(
        "Input",
        &[("string", 1, input_string), ("number", 1, input_number)],
    )
}

fn read_with_prompt(interpreter: &mut Interpreter, prompt: Option<&Value>) -> Result<String, String> {
    let prompt: String = prompt.map(|p| p.to_string()).unwrap_or_default();

    interpreter.output().prompt(&prompt);

    match interpreter.input().read_line() {
        Ok(Some(line)) => Ok(line),
        Ok(None) => Err("Unexpected end of input.".to_string()),
        Err(e) => Err(format!("Could not read input: {}", e)),
    }
}

fn input_string(
    interpreter: &mut Interpreter,
    _: Option<&Rc<LoxInstance>>,
    args: &[Value],
) -> Result<Value, String> {
    read_with_prompt(interpreter, args.first()).map(Value::String)
}

fn input_number(
    interpreter: &mut Interpreter,
    _: Option<&Rc<LoxInstance>>,
    args: &[Value],
) -> Result<Value, String> {
    let line: String = read_with_prompt(interpreter, args.first())?;
    let text: &str = line.trim();

    // `f64::from_str` also accepts "inf" and "NaN".
    match text.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Value::Number(number)),
        _ => Err(format!("Input '{}' is not a number.", text)),
    }
}
