//! Pair construction and mutation: `cons car cdr setcar! setcdr!`.

use super::native;
use crate::error::Error;
use crate::interp::Interp;
use crate::value::{Signature, Value};

pub fn subr_cons(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::cons(args[0].clone(), args[1].clone()))
}

/// Car of a pair; `()` for `()`.
pub fn subr_car(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Pair(_) => Ok(args[0].car()),
        _ => Err(Error::type_error("car", 0, "cons nor ()")),
    }
}

/// Cdr of a pair; `()` for `()`.
pub fn subr_cdr(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Pair(_) => Ok(args[0].cdr()),
        _ => Err(Error::type_error("cdr", 0, "cons nor ()")),
    }
}

pub fn subr_setcar(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    if !args[0].is_pair() {
        return Err(Error::type_error("setcar!", 0, "cons"));
    }
    args[0].set_car(args[1].clone());
    Ok(args[1].clone())
}

pub fn subr_setcdr(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    if !args[0].is_pair() {
        return Err(Error::type_error("setcdr!", 0, "cons"));
    }
    args[0].set_cdr(args[1].clone());
    Ok(args[1].clone())
}

pub fn register(interp: &mut Interp) {
    interp.bind_global("cons", native("cons", Signature::exact(2, 0b11), subr_cons));
    interp.bind_global("car", native("car", Signature::exact(1, 0b1), subr_car));
    interp.bind_global("cdr", native("cdr", Signature::exact(1, 0b1), subr_cdr));
    interp.bind_global(
        "setcar!",
        native("setcar!", Signature::exact(2, 0b11), subr_setcar),
    );
    interp.bind_global(
        "setcdr!",
        native("setcdr!", Signature::exact(2, 0b11), subr_setcdr),
    );
}
