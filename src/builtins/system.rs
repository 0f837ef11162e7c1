//! Symbols, top-level binding, fatal errors, and the dynamic-loading stub.

use super::{expect_string, native};
use crate::env;
use crate::error::Error;
use crate::interp::Interp;
use crate::value::{Signature, Value};

pub fn subr_gensym(_interp: &mut Interp, _args: &[Value]) -> Result<Value, Error> {
    Ok(Value::gensym())
}

pub fn subr_intern(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let bytes = expect_string("intern", args, 0)?;
    let name = String::from_utf8_lossy(&bytes).into_owned();
    Ok(interp.intern(&name))
}

/// `(bind! O1 O2)` binds O1 to O2 at top level and returns O2.
pub fn subr_bind(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    env::bind(
        &mut interp.locals,
        &interp.globals,
        &args[0],
        args[1].clone(),
        false,
    );
    Ok(args[1].clone())
}

/// `(bound-value O [ERRORBACK])` answers the value O is bound to.
pub fn subr_bound_value(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    match env::lookup(&interp.locals, &interp.globals, &args[0], false) {
        Some(cell) => Ok(cell.get()),
        None => interp.recover(args.get(1), "reference to unbound symbol."),
    }
}

/// `(error MSG)` is fatal, with MSG as the diagnostic.
pub fn subr_error(_interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let bytes = expect_string("error", args, 0)?;
    Err(Error::eval(String::from_utf8_lossy(&bytes).into_owned()))
}

/// `(dlsubr FILENAME SUBRNAME [ERRORBACK])`. Dynamic loading is not
/// available in this runtime, so resolution always fails, recoverably when
/// a callback is supplied.
pub fn subr_dlsubr(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    expect_string("dlsubr", args, 0)?;
    expect_string("dlsubr", args, 1)?;
    interp.recover(args.get(2), "failed to load shared object.")
}

pub fn register(interp: &mut Interp) {
    interp.bind_global("gensym", native("gensym", Signature::exact(0, 0), subr_gensym));
    interp.bind_global("intern", native("intern", Signature::exact(1, 0b1), subr_intern));
    interp.bind_global(
        "bind!",
        native("bind!", Signature::open(2, 0b11, true), subr_bind),
    );
    interp.bind_global(
        "bound-value",
        native("bound-value", Signature::open(1, 0b1, true), subr_bound_value),
    );
    interp.bind_global("error", native("error", Signature::exact(1, 0b1), subr_error));
    interp.bind_global(
        "dlsubr",
        native("dlsubr", Signature::open(2, 0b11, true), subr_dlsubr),
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
    fn test_intern_matches_read_symbols() {
        let mut interp = Interp::new();
        assert!(eval_one(&mut interp, "(eq? (intern \"foo\") 'foo)").is_truthy());
        assert!(eval_one(&mut interp, "(eq? (intern \"a\") (intern \"b\"))").is_nil());
    }

    #[test]
    fn test_gensym_is_fresh() {
        let mut interp = Interp::new();
        assert!(eval_one(&mut interp, "(eq? (gensym) (gensym))").is_nil());
        assert!(eval_one(&mut interp, "(symbol? (gensym))").is_truthy());
    }

    #[test]
    fn test_bind_returns_value_and_persists() {
        let mut interp = Interp::new();
        assert!(matches!(eval_one(&mut interp, "(bind! 'x 7)"), Value::Int(7)));
        assert!(matches!(eval_one(&mut interp, "x"), Value::Int(7)));
        eval_one(&mut interp, "(bind! 'x 8)");
        assert!(matches!(eval_one(&mut interp, "x"), Value::Int(8)));
    }

    #[test]
    fn test_bound_value_and_errorback() {
        let mut interp = Interp::new();
        eval_one(&mut interp, "(bind! 'x 7)");
        assert!(matches!(eval_one(&mut interp, "(bound-value 'x)"), Value::Int(7)));
        assert!(interp.eval_source("(bound-value 'missing)").is_err());
        let v = eval_one(&mut interp, "(bound-value 'missing (fn (m) m))");
        assert_eq!(v.string_bytes().unwrap(), b"reference to unbound symbol.");
    }

    #[test]
    fn test_error_is_fatal() {
        let mut interp = Interp::new();
        let err = interp.eval_source("(error \"boom\")").unwrap_err();
        assert_eq!(err.to_string(), "ERROR: boom");
    }

    #[test]
    fn test_dlsubr_always_fails() {
        let mut interp = Interp::new();
        assert!(interp.eval_source("(dlsubr \"libm.so\" \"cos\")").is_err());
        let v = eval_one(&mut interp, "(dlsubr \"libm.so\" \"cos\" (fn (m) 'no-dl))");
        assert_eq!(format!("{}", v), "no-dl");
    }
}
