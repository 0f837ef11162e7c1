//! Comparison chains: `< <= > >= = char= eq?`.
//!
//! Chains answer with their last operand when the whole sequence satisfies
//! the relation, `()` otherwise. With no operands the answer is an
//! unspecified non-`()` value.

use super::{expect_char, expect_number, native};
use crate::error::Error;
use crate::interp::Interp;
use crate::value::{Signature, Value};

const CHAIN: Signature = Signature::open(0, 0, true);

fn ord_chain(
    name: &str,
    args: &[Value],
    holds: fn(f64, f64) -> bool,
) -> Result<Value, Error> {
    if args.is_empty() {
        return Ok(Value::gensym());
    }
    let mut prev = expect_number(name, args, 0)?;
    for ix in 1..args.len() {
        let cur = expect_number(name, args, ix)?;
        if !holds(prev, cur) {
            return Ok(Value::Nil);
        }
        prev = cur;
    }
    Ok(args[args.len() - 1].clone())
}

pub fn subr_le(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    ord_chain("<=", args, |a, b| a <= b)
}

pub fn subr_lt(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    ord_chain("<", args, |a, b| a < b)
}

pub fn subr_ge(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    ord_chain(">=", args, |a, b| a >= b)
}

pub fn subr_gt(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    ord_chain(">", args, |a, b| a > b)
}

pub fn subr_num_eq(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    ord_chain("=", args, |a, b| a == b)
}

pub fn subr_char_eq(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    if args.is_empty() {
        return Ok(Value::gensym());
    }
    let mut prev = expect_char("char=", args, 0)?;
    for ix in 1..args.len() {
        let cur = expect_char("char=", args, ix)?;
        if prev != cur {
            return Ok(Value::Nil);
        }
        prev = cur;
    }
    Ok(args[args.len() - 1].clone())
}

/// Object identity across the whole argument list.
pub fn subr_eq(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    for pair in args.windows(2) {
        if !pair[0].identical(&pair[1]) {
            return Ok(Value::Nil);
        }
    }
    Ok(Value::gensym())
}

pub fn register(interp: &mut Interp) {
    interp.bind_global("<=", native("<=", CHAIN, subr_le));
    interp.bind_global("<", native("<", CHAIN, subr_lt));
    interp.bind_global(">=", native(">=", CHAIN, subr_ge));
    interp.bind_global(">", native(">", CHAIN, subr_gt));
    interp.bind_global("=", native("=", CHAIN, subr_num_eq));
    interp.bind_global("char=", native("char=", CHAIN, subr_char_eq));
    interp.bind_global("eq?", native("eq?", CHAIN, subr_eq));
}
