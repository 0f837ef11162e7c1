//! Function and closure constructors.
//!
//! `fn` receives its formals and body unevaluated and packs the arity
//! descriptor once, here. Formals grammar:
//!
//! - `()`: no parameters;
//! - `SYM`: evaluated rest collected into SYM;
//! - `(eval SYM)`: unevaluated rest collected into SYM;
//! - a list of `SYM` (evaluated position) and `(eval SYM)` (unevaluated
//!   position) entries, optionally closed by `. SYM` (evaluated rest) or
//!   `eval SYM` (unevaluated rest).

use super::native;
use crate::error::Error;
use crate::interp::Interp;
use crate::value::{Closure, Function, Signature, Value};
use std::rc::Rc;

/// Positions a 32-bit eval pattern can describe.
const MAX_FORMALS: usize = 23;

fn invalid() -> Error {
    Error::eval("invalid syntax in subr \"fn\".")
}

fn make_function(sig: Signature, formals: Value, body: Value) -> Value {
    Value::Function(Rc::new(Function { sig, formals, body }))
}

/// The `(eval SYM)` sub-form, if `form` is one.
fn quoted_param(form: &Value, eval_sym: &Value) -> Option<Value> {
    if !form.is_pair() || !form.car().identical(eval_sym) {
        return None;
    }
    match form.cdr().car() {
        sym @ Value::Symbol(_) => Some(sym),
        _ => None,
    }
}

pub fn subr_fn(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let formals = args[0].clone();
    let body = args[1].clone();
    let eval_sym = interp.intern("eval");

    match &formals {
        Value::Nil => return Ok(make_function(Signature::exact(0, 0), Value::Nil, body)),
        Value::Symbol(_) => {
            return Ok(make_function(Signature::open(0, 0, true), formals, body));
        }
        Value::Pair(_) => {}
        _ => return Err(invalid()),
    }

    let mut names: Vec<Value> = Vec::new();
    let mut pattern: u32 = 0;
    // rest symbol and whether rest arguments are evaluated
    let mut rest: Option<(Value, bool)> = None;
    let mut cursor = formals;

    loop {
        match cursor {
            Value::Nil => break,
            sym @ Value::Symbol(_) => {
                rest = Some((sym, true));
                break;
            }
            Value::Pair(_) => {
                let head = cursor.car();
                if head.identical(&eval_sym) {
                    // trailing `eval SYM`: unevaluated rest
                    match cursor.cdr().car() {
                        sym @ Value::Symbol(_) => {
                            rest = Some((sym, false));
                            break;
                        }
                        _ => return Err(invalid()),
                    }
                }
                if names.len() == MAX_FORMALS {
                    return Err(invalid());
                }
                if let Value::Symbol(_) = head {
                    pattern |= 1 << names.len();
                    names.push(head);
                } else if let Some(sym) = quoted_param(&head, &eval_sym) {
                    names.push(sym);
                } else {
                    return Err(invalid());
                }
                cursor = cursor.cdr();
            }
            _ => return Err(invalid()),
        }
    }

    let min = names.len() as u8;
    let (tail, sig) = match rest {
        None => (Value::Nil, Signature::exact(min, pattern)),
        Some((sym, eval_rest)) => (sym, Signature::open(min, pattern, eval_rest)),
    };
    let mut built = tail;
    for name in names.into_iter().rev() {
        built = Value::cons(name, built);
    }
    Ok(make_function(sig, built, body))
}

/// `(closure FN)` pairs FN with the current lexical chain and a fork of the
/// global head.
pub fn subr_closure(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    if !matches!(args[0], Value::Function(_)) {
        return Err(Error::type_error("closure", 0, "function"));
    }
    Ok(Value::Closure(Rc::new(Closure {
        function: args[0].clone(),
        locals: interp.locals.clone(),
        globals: interp.globals.fork(),
    })))
}

pub fn register(interp: &mut Interp) {
    interp.bind_global("fn", native("fn", Signature::exact(2, 0b00), subr_fn));
    interp.bind_global(
        "closure",
        native("closure", Signature::exact(1, 0b1), subr_closure),
    );
}
