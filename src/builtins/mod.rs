//! # Built-in Operations
//!
//! Leaf primitives seeded into the standard environment, organized by
//! category. Each sub-module exposes a `register` function binding its
//! primitives; [`install`] runs them all and seeds the seven special
//! primitives the evaluator intercepts by identity.

pub mod arithmetic;
pub mod arrays;
pub mod comparison;
pub mod functions;
pub mod lists;
pub mod streams;
pub mod system;
pub mod types;

use crate::error::Error;
use crate::interp::Interp;
use crate::value::{NativeFn, Signature, Special, Subr, SubrKind, Value};
use std::rc::Rc;

pub(crate) fn native(name: &'static str, sig: Signature, f: NativeFn) -> Value {
    Value::Subr(Rc::new(Subr {
        name,
        sig,
        kind: SubrKind::Native(f),
    }))
}

/// A handle on one of the seven evaluator-intercepted primitives. Dispatch
/// is by the `Special` discriminant, so every handle behaves identically.
pub fn special_subr(which: Special) -> Value {
    let (name, sig) = match which {
        Special::Quote => ("quote", Signature::exact(1, 0b0)),
        Special::If => ("if", Signature::open(2, 0b01, false)),
        Special::Eval => ("eval", Signature::open(1, 0b1, true)),
        Special::Apply => ("apply", Signature::exact(2, 0b11)),
        Special::Evlis => ("evlis", Signature::exact(2, 0b11)),
        Special::UnwindProtect => ("unwind-protect", Signature::exact(2, 0b00)),
        Special::CallCc => ("call-cc", Signature::exact(1, 0b1)),
    };
    Value::Subr(Rc::new(Subr {
        name,
        sig,
        kind: SubrKind::Special(which),
    }))
}

/// Seed the standard environment: `nil`, every category's primitives, and
/// the special primitives.
pub fn install(interp: &mut Interp) {
    interp.bind_global("nil", Value::Nil);

    types::register(interp);
    arithmetic::register(interp);
    comparison::register(interp);
    lists::register(interp);
    arrays::register(interp);
    streams::register(interp);
    functions::register(interp);
    system::register(interp);

    for which in [
        Special::Quote,
        Special::If,
        Special::Eval,
        Special::Apply,
        Special::Evlis,
        Special::UnwindProtect,
        Special::CallCc,
    ] {
        let subr = special_subr(which);
        let name = match &subr {
            Value::Subr(s) => s.name,
            _ => unreachable!(),
        };
        interp.bind_global(name, subr);
    }
}

// ===== shared argument helpers =====

pub(crate) fn expect_int(name: &str, args: &[Value], ix: usize) -> Result<i32, Error> {
    match args[ix] {
        Value::Int(n) => Ok(n),
        _ => Err(Error::type_error(name, ix, "integer")),
    }
}

pub(crate) fn expect_char(name: &str, args: &[Value], ix: usize) -> Result<u8, Error> {
    match args[ix] {
        Value::Char(c) => Ok(c),
        _ => Err(Error::type_error(name, ix, "character")),
    }
}

pub(crate) fn expect_number(name: &str, args: &[Value], ix: usize) -> Result<f64, Error> {
    match args[ix] {
        Value::Int(n) => Ok(f64::from(n)),
        Value::Float(x) => Ok(x),
        _ => Err(Error::type_error(name, ix, "number")),
    }
}

pub(crate) fn expect_string(name: &str, args: &[Value], ix: usize) -> Result<Vec<u8>, Error> {
    args[ix]
        .string_bytes()
        .ok_or_else(|| Error::type_error(name, ix, "string"))
}

pub(crate) fn expect_index(name: &str, args: &[Value], ix: usize) -> Result<usize, Error> {
    match args[ix] {
        Value::Int(n) if n >= 0 => Ok(n as usize),
        _ => Err(Error::type_error(name, ix, "positive integer")),
    }
}

pub(crate) fn all_integers(args: &[Value]) -> bool {
    args.iter().all(|v| matches!(v, Value::Int(_)))
}
