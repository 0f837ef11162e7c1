//! Type predicates and character conversions.
//!
//! Predicates answer with their argument on success and `()` on failure;
//! `nil?` answers with a fresh non-`()` value since its argument is `()`.

use super::{expect_char, expect_int, native};
use crate::error::Error;
use crate::interp::Interp;
use crate::value::{Signature, Value};

const ONE_ARG: Signature = Signature::exact(1, 0b1);

pub fn subr_nilp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    Ok(if args[0].is_nil() {
        Value::gensym()
    } else {
        Value::Nil
    })
}

fn answer(hit: bool, arg: &Value) -> Result<Value, Error> {
    Ok(if hit { arg.clone() } else { Value::Nil })
}

pub fn subr_symbolp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Symbol(_)), &args[0])
}

pub fn subr_charp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Char(_)), &args[0])
}

pub fn subr_integerp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Int(_)), &args[0])
}

pub fn subr_floatp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Float(_)), &args[0])
}

pub fn subr_streamp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Stream(_)), &args[0])
}

pub fn subr_consp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(args[0].is_pair(), &args[0])
}

/// Strings count as arrays; the reverse does not hold.
pub fn subr_arrayp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(args[0].is_array(), &args[0])
}

pub fn subr_stringp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(args[0].is_string(), &args[0])
}

pub fn subr_functionp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Function(_)), &args[0])
}

pub fn subr_closurep(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Closure(_)), &args[0])
}

pub fn subr_subrp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Subr(_)), &args[0])
}

pub fn subr_continuationp(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    answer(matches!(args[0], Value::Continuation(_)), &args[0])
}

pub fn subr_char_to_int(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let c = expect_char("char->int", args, 0)?;
    Ok(Value::Int(i32::from(c)))
}

pub fn subr_int_to_char(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let n = expect_int("int->char", args, 0)?;
    Ok(Value::Char(n as u8))
}

pub fn register(interp: &mut Interp) {
    interp.bind_global("nil?", native("nil?", ONE_ARG, subr_nilp));
    interp.bind_global("symbol?", native("symbol?", ONE_ARG, subr_symbolp));
    interp.bind_global("char?", native("char?", ONE_ARG, subr_charp));
    interp.bind_global("integer?", native("integer?", ONE_ARG, subr_integerp));
    interp.bind_global("float?", native("float?", ONE_ARG, subr_floatp));
    interp.bind_global("stream?", native("stream?", ONE_ARG, subr_streamp));
    interp.bind_global("cons?", native("cons?", ONE_ARG, subr_consp));
    interp.bind_global("array?", native("array?", ONE_ARG, subr_arrayp));
    interp.bind_global("string?", native("string?", ONE_ARG, subr_stringp));
    interp.bind_global("function?", native("function?", ONE_ARG, subr_functionp));
    interp.bind_global("closure?", native("closure?", ONE_ARG, subr_closurep));
    interp.bind_global("subr?", native("subr?", ONE_ARG, subr_subrp));
    interp.bind_global(
        "continuation?",
        native("continuation?", ONE_ARG, subr_continuationp),
    );
    interp.bind_global("char->int", native("char->int", ONE_ARG, subr_char_to_int));
    interp.bind_global("int->char", native("int->char", ONE_ARG, subr_int_to_char));
}

#[cfg(test)]
mod tests {
    use crate::interp::Interp;
    use crate::value::Value;

    fn eval_one(interp: &mut Interp, source: &str) -> Value {
        interp.eval_source(source).unwrap().pop().unwrap()
    }

    #[test]
    fn test_predicates_return_argument_or_nil() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(integer? 5)"), Value::Int(5)));
        assert!(eval_one(&mut interp, "(integer? 5.0)").is_nil());
        assert!(matches!(eval_one(&mut interp, "(char? ?x)"), Value::Char(b'x')));
        assert!(eval_one(&mut interp, "(symbol? 5)").is_nil());
        assert_eq!(format!("{}", eval_one(&mut interp, "(symbol? 'a)")), "a");
    }

    #[test]
    fn test_nilp_answers_non_nil_for_nil() {
        let mut interp = Interp::new();
        assert!(eval_one(&mut interp, "(nil? ())").is_truthy());
        assert!(eval_one(&mut interp, "(nil? 1)").is_nil());
    }

    #[test]
    fn test_string_counts_as_array() {
        let mut interp = Interp::new();
        assert!(eval_one(&mut interp, "(array? \"abc\")").is_truthy());
        assert!(eval_one(&mut interp, "(string? \"abc\")").is_truthy());
        assert!(eval_one(&mut interp, "(string? [1 2])").is_nil());
        assert!(eval_one(&mut interp, "(array? [1 2])").is_truthy());
    }

    #[test]
    fn test_char_int_conversions() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(char->int ?A)"), Value::Int(65)));
        assert!(matches!(eval_one(&mut interp, "(int->char 66)"), Value::Char(b'B')));
    }

    #[test]
    fn test_conversion_type_errors() {
        let mut interp = Interp::new();
        let err = interp.eval_source("(char->int 65)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TYPE ERROR: 0-th arg for subr \"char->int\" is not a character"
        );
    }
}
