// ABOUTME: Interp runtime context owning symbols, environments, call stack, and ports

use crate::builtins;
use crate::env::{self, EnvChain, GlobalEnv};
use crate::error::Error;
use crate::eval::{self, Frame};
use crate::port::Port;
use crate::reader;
use crate::value::{SymbolTable, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// The runtime context. All process-wide state (current ports, interned
/// symbols, environments, the evaluator call stack) lives here; a host
/// instantiates one and threads it through the entry points.
#[derive(Debug)]
pub struct Interp {
    pub symbols: SymbolTable,
    pub globals: GlobalEnv,
    pub locals: EnvChain,
    pub stack: Vec<Frame>,
    pub input: Rc<RefCell<Port>>,
    pub output: Rc<RefCell<Port>>,
    pub errout: Rc<RefCell<Port>>,
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

impl Interp {
    /// A context with the standard environment seeded.
    pub fn new() -> Self {
        let mut interp = Interp {
            symbols: SymbolTable::new(),
            globals: GlobalEnv::new(),
            locals: EnvChain::new(),
            stack: Vec::new(),
            input: Rc::new(RefCell::new(Port::stdin())),
            output: Rc::new(RefCell::new(Port::stdout())),
            errout: Rc::new(RefCell::new(Port::stderr())),
        };
        builtins::install(&mut interp);
        interp
    }

    pub fn intern(&mut self, name: &str) -> Value {
        self.symbols.intern(name)
    }

    /// Bind `name` at top level.
    pub fn bind_global(&mut self, name: &str, value: Value) {
        let sym = self.intern(name);
        env::bind(&mut self.locals, &self.globals, &sym, value, false);
    }

    /// Evaluate one expression to completion. The lexical chain is restored
    /// afterwards so tail-position formal bindings cannot leak between
    /// top-level forms; global bindings persist.
    pub fn eval(&mut self, expr: Value) -> Result<Value, Error> {
        self.stack.clear();
        let saved_locals = self.locals.clone();
        let result = eval::run(self, expr, None);
        self.locals = saved_locals;
        if result.is_err() {
            self.stack.clear();
        }
        result
    }

    /// Nested evaluation from inside a primitive. The active call stack and
    /// environments are saved around the run and restored afterwards.
    pub(crate) fn eval_protected(&mut self, expr: Value) -> Result<Value, Error> {
        let saved_stack = std::mem::take(&mut self.stack);
        let saved_locals = self.locals.clone();
        let saved_globals = self.globals.clone();
        let result = eval::run(self, expr, None);
        self.stack = saved_stack;
        self.locals = saved_locals;
        self.globals = saved_globals;
        result
    }

    /// Recoverable-failure policy shared by the primitives: with a callback,
    /// evaluate `(callback "message")` and return its value; without one the
    /// failure is fatal.
    pub(crate) fn recover(
        &mut self,
        callback: Option<&Value>,
        message: &str,
    ) -> Result<Value, Error> {
        match callback {
            Some(cb) => {
                let call = Value::list(vec![cb.clone(), Value::string_from(message)]);
                self.eval_protected(call)
            }
            None => Err(Error::eval(message)),
        }
    }

    /// Read one expression from the current input port; `Ok(None)` at clean
    /// end of input.
    pub fn read(&mut self) -> Result<Option<Value>, Error> {
        let port = self.input.clone();
        reader::read(&port, &mut self.symbols)
    }

    /// Write the printed form of `value` to the current output port.
    pub fn print(&mut self, value: &Value) -> Result<(), Error> {
        let text = format!("{}", value);
        self.output.borrow_mut().write_all(text.as_bytes())?;
        Ok(())
    }

    /// Parse and evaluate every form in `source`, returning the values in
    /// order.
    pub fn eval_source(&mut self, source: &str) -> Result<Vec<Value>, Error> {
        let port = Rc::new(RefCell::new(Port::from_str(source)));
        let mut values = Vec::new();
        while let Some(expr) = reader::read(&port, &mut self.symbols)? {
            values.push(self.eval(expr)?);
        }
        Ok(values)
    }

    pub fn set_input(&mut self, port: Port) {
        self.input = Rc::new(RefCell::new(port));
    }

    pub fn set_output(&mut self, port: Port) {
        self.output = Rc::new(RefCell::new(port));
    }

    /// Bytes accumulated in the current output port, when it is a sink.
    pub fn drain_output(&mut self) -> String {
        let bytes = self.output.borrow_mut().take_buffer();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
