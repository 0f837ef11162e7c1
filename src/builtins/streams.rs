//! Stream primitives and the reader/printer entry points.

use super::{expect_char, expect_string, native};
use crate::error::Error;
use crate::interp::Interp;
use crate::port::Port;
use crate::value::{Signature, Value};

pub fn subr_input_port(interp: &mut Interp, _args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Stream(interp.input.clone()))
}

pub fn subr_output_port(interp: &mut Interp, _args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Stream(interp.output.clone()))
}

pub fn subr_error_port(interp: &mut Interp, _args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Stream(interp.errout.clone()))
}

/// `(set-ports [ISTREAM OSTREAM ESTREAM])`. A `()` in a position means
/// no change.
pub fn subr_set_ports(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    for (ix, arg) in args.iter().take(3).enumerate() {
        if arg.is_nil() {
            continue;
        }
        let handle = match arg {
            Value::Stream(p) => p.clone(),
            _ => return Err(Error::type_error("set-ports", ix, "stream")),
        };
        match ix {
            0 => interp.input = handle,
            1 => interp.output = handle,
            _ => interp.errout = handle,
        }
    }
    Ok(Value::Nil)
}

pub fn subr_getc(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let port = interp.input.clone();
    let result = port.borrow_mut().getc();
    match result {
        Ok(Some(byte)) => Ok(Value::Char(byte)),
        _ => interp.recover(args.first(), "failed to get character."),
    }
}

pub fn subr_putc(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let byte = expect_char("putc", args, 0)?;
    let port = interp.output.clone();
    let result = port.borrow_mut().putc(byte);
    match result {
        Ok(()) => Ok(args[0].clone()),
        Err(_) => interp.recover(args.get(1), "failed to put character."),
    }
}

pub fn subr_puts(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let bytes = expect_string("puts", args, 0)?;
    let port = interp.output.clone();
    let result = port.borrow_mut().write_all(&bytes);
    match result {
        Ok(()) => Ok(args[0].clone()),
        Err(_) => interp.recover(args.get(1), "failed to put string."),
    }
}

pub fn subr_ungetc(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let byte = expect_char("ungetc", args, 0)?;
    interp.input.borrow_mut().ungetc(byte);
    Ok(args[0].clone())
}

/// `(open FILE [WRITABLE APPEND BINARY ERRORBACK])`.
pub fn subr_open(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let bytes = expect_string("open", args, 0)?;
    let path = String::from_utf8_lossy(&bytes).into_owned();
    let writable = args.get(1).is_some_and(Value::is_truthy);
    let append = args.get(2).is_some_and(Value::is_truthy);
    let binary = args.get(3).is_some_and(Value::is_truthy);
    match Port::open(&path, writable, append, binary) {
        Ok(port) => Ok(Value::stream(port)),
        Err(_) => interp.recover(args.get(4), "failed to open file."),
    }
}

pub fn subr_close(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    let handle = match &args[0] {
        Value::Stream(p) => p.clone(),
        _ => return Err(Error::type_error("close", 0, "stream")),
    };
    let result = handle.borrow_mut().close();
    match result {
        Ok(()) => Ok(Value::Nil),
        Err(_) => interp.recover(args.get(1), "failed to close stream."),
    }
}

/// `(read [ERRORBACK])` reads one expression from the current input port.
pub fn subr_read(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    match interp.read() {
        Ok(Some(value)) => Ok(value),
        Ok(None) => interp.recover(
            args.first(),
            "unexpected EOF where an expression is expected.",
        ),
        Err(Error::Parse(message)) => interp.recover(args.first(), &message),
        Err(other) => Err(other),
    }
}

/// `(print O)` writes the printed form of O to the current output port and
/// returns O.
pub fn subr_print(interp: &mut Interp, args: &[Value]) -> Result<Value, Error> {
    interp.print(&args[0])?;
    Ok(args[0].clone())
}

pub fn register(interp: &mut Interp) {
    let none = Signature::exact(0, 0);
    interp.bind_global(
        "current-input-port",
        native("current-input-port", none, subr_input_port),
    );
    interp.bind_global(
        "current-output-port",
        native("current-output-port", none, subr_output_port),
    );
    interp.bind_global(
        "current-error-port",
        native("current-error-port", none, subr_error_port),
    );
    interp.bind_global(
        "set-ports",
        native("set-ports", Signature::open(0, 0, true), subr_set_ports),
    );
    interp.bind_global("getc", native("getc", Signature::open(0, 0, true), subr_getc));
    interp.bind_global("putc", native("putc", Signature::open(1, 0b1, true), subr_putc));
    interp.bind_global("puts", native("puts", Signature::open(1, 0b1, true), subr_puts));
    interp.bind_global(
        "ungetc",
        native("ungetc", Signature::open(1, 0b1, true), subr_ungetc),
    );
    interp.bind_global("open", native("open", Signature::open(1, 0b1, true), subr_open));
    interp.bind_global(
        "close",
        native("close", Signature::open(1, 0b1, true), subr_close),
    );
    interp.bind_global("read", native("read", Signature::open(0, 0, true), subr_read));
    interp.bind_global("print", native("print", Signature::exact(1, 0b1), subr_print));
}
