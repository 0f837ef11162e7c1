//! Arithmetic: `+ - * / div mod round`.
//!
//! Mixed int/float input yields a float, all-int input an int. `div` always
//! yields a float and `/` always an integer. Integer arithmetic wraps.

use super::{all_integers, expect_int, expect_number, native};
use crate::error::Error;
use crate::interp::Interp;
use crate::value::{Signature, Value};

pub fn subr_add(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    if all_integers(args) {
        let mut sum: i32 = 0;
        for arg in args {
            if let Value::Int(n) = arg {
                sum = sum.wrapping_add(*n);
            }
        }
        Ok(Value::Int(sum))
    } else {
        let mut sum = 0.0;
        for ix in 0..args.len() {
            sum += expect_number("+", args, ix)?;
        }
        Ok(Value::Float(sum))
    }
}

pub fn subr_mult(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    if all_integers(args) {
        let mut prod: i32 = 1;
        for arg in args {
            if let Value::Int(n) = arg {
                prod = prod.wrapping_mul(*n);
            }
        }
        Ok(Value::Int(prod))
    } else {
        let mut prod = 1.0;
        for ix in 0..args.len() {
            prod *= expect_number("*", args, ix)?;
        }
        Ok(Value::Float(prod))
    }
}

/// Negate a single argument, otherwise subtract the rest from the first.
pub fn subr_sub(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    if args.len() == 1 {
        return match args[0] {
            Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
            Value::Float(x) => Ok(Value::Float(-x)),
            _ => Err(Error::type_error("-", 0, "number")),
        };
    }

    if all_integers(args) {
        let mut res = expect_int("-", args, 0)?;
        for arg in &args[1..] {
            if let Value::Int(n) = arg {
                res = res.wrapping_sub(*n);
            }
        }
        Ok(Value::Int(res))
    } else {
        let mut res = expect_number("-", args, 0)?;
        for ix in 1..args.len() {
            res -= expect_number("-", args, ix)?;
        }
        Ok(Value::Float(res))
    }
}

/// Float division; reciprocal for a single argument.
pub fn subr_div(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    if args.len() == 1 {
        return Ok(Value::Float(1.0 / expect_number("div", args, 0)?));
    }
    let mut res = expect_number("div", args, 0)?;
    for ix in 1..args.len() {
        res /= expect_number("div", args, ix)?;
    }
    Ok(Value::Float(res))
}

/// Integer division, folding left.
pub fn subr_quot(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let mut val = expect_int("/", args, 0)?;
    for ix in 1..args.len() {
        let divisor = expect_int("/", args, ix)?;
        val = val
            .checked_div(divisor)
            .ok_or_else(|| Error::eval("division by zero."))?;
    }
    Ok(Value::Int(val))
}

pub fn subr_mod(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let a = expect_int("mod", args, 0)?;
    let b = expect_int("mod", args, 1)?;
    a.checked_rem(b)
        .map(Value::Int)
        .ok_or_else(|| Error::eval("division by zero."))
}

/// Truncate a float toward zero; integers pass through.
pub fn subr_round(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    match args[0] {
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Float(x) => Ok(Value::Int(x as i32)),
        _ => Err(Error::type_error("round", 0, "number")),
    }
}

pub fn register(interp: &mut Interp) {
    interp.bind_global("+", native("+", Signature::open(0, 0, true), subr_add));
    interp.bind_global("*", native("*", Signature::open(0, 0, true), subr_mult));
    interp.bind_global("-", native("-", Signature::open(1, 0b1, true), subr_sub));
    interp.bind_global("div", native("div", Signature::open(1, 0b1, true), subr_div));
    interp.bind_global("/", native("/", Signature::open(1, 0b1, true), subr_quot));
    interp.bind_global("mod", native("mod", Signature::exact(2, 0b11), subr_mod));
    interp.bind_global("round", native("round", Signature::exact(1, 0b1), subr_round));
}

#[cfg(test)]
mod tests {
    use crate::interp::Interp;
    use crate::value::Value;

    fn eval_one(interp: &mut Interp, source: &str) -> Value {
        interp.eval_source(source).unwrap().pop().unwrap()
    }

    #[test]
    fn test_add_integer_and_mixed() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(+ 1 2 3)"), Value::Int(6)));
        assert!(matches!(eval_one(&mut interp, "(+)"), Value::Int(0)));
        let v = eval_one(&mut interp, "(+ 1 2.0)");
        assert!(matches!(v, Value::Float(x) if (x - 3.0).abs() < 1e-9));
        assert_eq!(format!("{}", v), "3.000000");
    }

    #[test]
    fn test_sub_negates_single_argument() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(- 5)"), Value::Int(-5)));
        assert!(matches!(eval_one(&mut interp, "(- 10 3 2)"), Value::Int(5)));
        let v = eval_one(&mut interp, "(- 1.5)");
        assert!(matches!(v, Value::Float(x) if (x + 1.5).abs() < 1e-9));
    }

    #[test]
    fn test_mult() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(* 2 3 4)"), Value::Int(24)));
        assert!(matches!(eval_one(&mut interp, "(*)"), Value::Int(1)));
    }

    #[test]
    fn test_div_always_float() {
        let mut interp = Interp::new();
        let v = eval_one(&mut interp, "(div 1 2)");
        assert!(matches!(v, Value::Float(x) if (x - 0.5).abs() < 1e-9));
        let v = eval_one(&mut interp, "(div 4)");
        assert!(matches!(v, Value::Float(x) if (x - 0.25).abs() < 1e-9));
    }

    #[test]
    fn test_quot_always_integer() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(/ 7 2)"), Value::Int(3)));
        assert!(matches!(eval_one(&mut interp, "(/ 100 2 5)"), Value::Int(10)));
        assert!(interp.eval_source("(/ 1 0)").is_err());
    }

    #[test]
    fn test_mod() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(mod 17 5)"), Value::Int(2)));
        assert!(interp.eval_source("(mod 1 0)").is_err());
    }

    #[test]
    fn test_round_truncates_toward_zero() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(round 2.7)"), Value::Int(2)));
        assert!(matches!(eval_one(&mut interp, "(round -2.7)"), Value::Int(-2)));
        assert!(matches!(eval_one(&mut interp, "(round 3)"), Value::Int(3)));
    }

    #[test]
    fn test_type_error_carries_position() {
        let mut interp = Interp::new();
        let err = interp.eval_source("(+ 1 'a 2.0)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TYPE ERROR: 1-th arg for subr \"+\" is not a number"
        );
    }
}
