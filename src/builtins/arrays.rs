//! Array and string slots: `make-array aref aset!`.

use super::{expect_index, native};
use crate::error::Error;
use crate::interp::Interp;
use crate::value::{Signature, Value, Vector};

/// `(make-array LENGTH [INIT])`. A character initializer builds a string,
/// anything else a general array filled with INIT (default `()`).
pub fn subr_make_array(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let len = expect_index("make-array", args, 0)?;
    let init = args.get(1).cloned().unwrap_or(Value::Nil);
    match init {
        Value::Char(c) => Ok(Value::string(vec![c; len])),
        other => Ok(Value::array(vec![other; len])),
    }
}

pub fn subr_aref(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let ix = expect_index("aref", args, 1)?;
    match &args[0] {
        Value::Vector(v) => match &*v.borrow() {
            Vector::String(bytes) => bytes
                .get(ix)
                .map(|&b| Value::Char(b))
                .ok_or_else(|| Error::eval("array boundary error")),
            Vector::Array(slots) => slots
                .get(ix)
                .cloned()
                .ok_or_else(|| Error::eval("array boundary error")),
        },
        _ => Err(Error::type_error("aref", 0, "array")),
    }
}

/// `(aset! ARRAY N O)`. Storing a non-character into a string upgrades it
/// to a general array first.
pub fn subr_aset(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let ix = expect_index("aset!", args, 1)?;
    let stored = args[2].clone();
    match &args[0] {
        Value::Vector(v) => {
            let mut vec = v.borrow_mut();
            if matches!(&*vec, Vector::String(_)) && !matches!(stored, Value::Char(_)) {
                vec.upgrade();
            }
            match &mut *vec {
                Vector::String(bytes) => {
                    let slot = bytes
                        .get_mut(ix)
                        .ok_or_else(|| Error::eval("array boundary error"))?;
                    if let Value::Char(c) = stored {
                        *slot = c;
                    }
                    Ok(stored)
                }
                Vector::Array(slots) => {
                    let slot = slots
                        .get_mut(ix)
                        .ok_or_else(|| Error::eval("array boundary error"))?;
                    *slot = stored.clone();
                    Ok(stored)
                }
            }
        }
        _ => Err(Error::type_error("aset!", 0, "array")),
    }
}

pub fn register(interp: &mut Interp) {
    interp.bind_global(
        "make-array",
        native("make-array", Signature::open(1, 0b1, true), subr_make_array),
    );
    interp.bind_global("aref", native("aref", Signature::exact(2, 0b11), subr_aref));
    interp.bind_global(
        "aset!",
        native("aset!", Signature::exact(3, 0b111), subr_aset),
    );
}

#[cfg(test)]
mod tests {
    use crate::interp::Interp;
    use crate::value::Value;

    fn eval_one(interp: &mut Interp, source: &str) -> Value {
        interp.eval_source(source).unwrap().pop().unwrap()
    }

    #[test]
    fn test_make_array_defaults_to_nil_slots() {
        let mut interp = Interp::new();
        assert_eq!(format!("{}", eval_one(&mut interp, "(make-array 3)")), "[() () ()]");
        assert_eq!(format!("{}", eval_one(&mut interp, "(make-array 2 1)")), "[1 1]");
        assert_eq!(format!("{}", eval_one(&mut interp, "(make-array 0)")), "[]");
    }

    #[test]
    fn test_make_array_with_char_builds_string() {
        let mut interp = Interp::new();
        assert_eq!(format!("{}", eval_one(&mut interp, "(make-array 3 ?x)")), "\"xxx\"");
    }

    #[test]
    fn test_aref_on_string_yields_char() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(aref \"abc\" 1)"), Value::Char(b'b')));
        assert!(matches!(eval_one(&mut interp, "(aref [4 5 6] 2)"), Value::Int(6)));
    }

    #[test]
    fn test_bounds_and_type_checks() {
        let mut interp = Interp::new();
        assert!(interp.eval_source("(aref \"ab\" 2)").is_err());
        assert!(interp.eval_source("(aref [1] -1)").is_err());
        assert!(interp.eval_source("(aref 9 0)").is_err());
        assert!(interp.eval_source("(aset! [1] 5 0)").is_err());
    }

    #[test]
    fn test_aset_on_array() {
        let mut interp = Interp::new();
        interp.eval_source("(bind! 'a [1 2 3])").unwrap();
        assert!(matches!(eval_one(&mut interp, "(aset! a 1 9)"), Value::Int(9)));
        assert_eq!(format!("{}", eval_one(&mut interp, "a")), "[1 9 3]");
    }

    #[test]
    fn test_aset_char_into_string_stays_string() {
        let mut interp = Interp::new();
        interp.eval_source("(bind! 's \"abc\")").unwrap();
        eval_one(&mut interp, "(aset! s 0 ?z)");
        assert_eq!(format!("{}", eval_one(&mut interp, "s")), "\"zbc\"");
        assert!(eval_one(&mut interp, "(string? s)").is_truthy());
    }

    #[test]
    fn test_aset_non_char_upgrades_string() {
        let mut interp = Interp::new();
        interp.eval_source("(bind! 's \"abc\")").unwrap();
        eval_one(&mut interp, "(aset! s 1 42)");
        assert_eq!(format!("{}", eval_one(&mut interp, "s")), "[?a 42 ?c]");
        assert!(eval_one(&mut interp, "(string? s)").is_nil());
        assert!(eval_one(&mut interp, "(array? s)").is_truthy());
    }
}
