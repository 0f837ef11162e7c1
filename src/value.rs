// ABOUTME: Value types representing runtime data, callables, and expressions

use crate::env::{EnvChain, GlobalEnv};
use crate::error::Error;
use crate::eval::Frame;
use crate::interp::Interp;
use crate::port::Port;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Longest accepted symbol name, in bytes.
pub const SYMBOL_NAME_MAX: usize = 255;

/// A symbol record. Interned symbols carry their name; gensyms are nameless
/// and identified only by their allocation.
#[derive(Debug)]
pub struct SymbolData {
    pub name: Option<String>,
}

/// Canonicalizing symbol table: equal names yield the identical symbol value.
#[derive(Debug, Default)]
pub struct SymbolTable {
    map: HashMap<String, Value>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Value {
        if let Some(sym) = self.map.get(name) {
            return sym.clone();
        }
        let sym = Value::Symbol(Rc::new(SymbolData {
            name: Some(name.to_string()),
        }));
        self.map.insert(name.to_string(), sym.clone());
        sym
    }
}

/// A mutable cons cell.
#[derive(Debug)]
pub struct Pair {
    pub car: RefCell<Value>,
    pub cdr: RefCell<Value>,
}

/// One heap object with two states so a string can upgrade into a general
/// array in place, visibly through every alias.
#[derive(Debug)]
pub enum Vector {
    String(Vec<u8>),
    Array(Vec<Value>),
}

impl Vector {
    pub fn len(&self) -> usize {
        match self {
            Vector::String(b) => b.len(),
            Vector::Array(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Turn a string into a general array, each byte slot becoming a
    /// character value.
    pub fn upgrade(&mut self) {
        if let Vector::String(bytes) = self {
            let slots = bytes.iter().map(|&b| Value::Char(b)).collect();
            *self = Vector::Array(slots);
        }
    }
}

/// Packed arity descriptor: minimum argument count, variadic flag, and a
/// per-position eval bitmask (bit set = evaluate the argument form before
/// applying). For variadic callables the bits at and above `min` replicate
/// the rest-pattern bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub min: u8,
    pub variadic: bool,
    pub pattern: u32,
}

impl Signature {
    pub const fn exact(min: u8, pattern: u32) -> Self {
        Signature {
            min,
            variadic: false,
            pattern,
        }
    }

    pub const fn open(min: u8, pattern: u32, eval_rest: bool) -> Self {
        let rest = if eval_rest { !0u32 << min } else { 0 };
        Signature {
            min,
            variadic: true,
            pattern: pattern | rest,
        }
    }
}

/// A user function: quoted formals, body expression, arity descriptor.
#[derive(Debug)]
pub struct Function {
    pub sig: Signature,
    pub formals: Value,
    pub body: Value,
}

/// A function paired with captured lexical and global environments.
#[derive(Debug)]
pub struct Closure {
    pub function: Value,
    pub locals: EnvChain,
    pub globals: GlobalEnv,
}

pub type NativeFn = fn(&mut Interp, &[Value]) -> Result<Value, Error>;

/// The seven primitives the evaluator intercepts by identity rather than
/// calling through a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    Quote,
    If,
    Eval,
    Apply,
    Evlis,
    UnwindProtect,
    CallCc,
}

#[derive(Debug)]
pub enum SubrKind {
    Native(NativeFn),
    Special(Special),
}

/// A built-in operation.
#[derive(Debug)]
pub struct Subr {
    pub name: &'static str,
    pub sig: Signature,
    pub kind: SubrKind,
}

/// A partial application: a callable, the values accumulated so far, and the
/// eval pattern for the argument positions still pending.
#[derive(Debug, Clone)]
pub struct PaData {
    pub func: Value,
    pub args: Vec<Value>,
    pub pattern: u32,
}

impl PaData {
    pub fn new(pattern: u32, func: Value) -> Self {
        PaData {
            func,
            args: Vec::new(),
            pattern,
        }
    }

    /// Append one argument value, consuming the low pattern bit.
    pub fn push(&mut self, value: Value) {
        self.args.push(value);
        self.pattern >>= 1;
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Symbol(Rc<SymbolData>),
    Char(u8),
    Int(i32),
    Float(f64),
    Stream(Rc<RefCell<Port>>),
    Pair(Rc<Pair>),
    Vector(Rc<RefCell<Vector>>),
    Function(Rc<Function>),
    Closure(Rc<Closure>),
    Subr(Rc<Subr>),
    Continuation(Rc<Vec<Frame>>),
    Pa(Rc<RefCell<PaData>>),
}

impl Value {
    // ===== constructors =====

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Rc::new(Pair {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
        }))
    }

    /// Proper list from items.
    pub fn list(items: Vec<Value>) -> Value {
        let mut out = Value::Nil;
        for item in items.into_iter().rev() {
            out = Value::cons(item, out);
        }
        out
    }

    pub fn string(bytes: Vec<u8>) -> Value {
        Value::Vector(Rc::new(RefCell::new(Vector::String(bytes))))
    }

    pub fn string_from(s: &str) -> Value {
        Value::string(s.as_bytes().to_vec())
    }

    pub fn array(slots: Vec<Value>) -> Value {
        Value::Vector(Rc::new(RefCell::new(Vector::Array(slots))))
    }

    /// A fresh uninterned symbol, unequal to every other value.
    pub fn gensym() -> Value {
        Value::Symbol(Rc::new(SymbolData { name: None }))
    }

    pub fn stream(port: Port) -> Value {
        Value::Stream(Rc::new(RefCell::new(port)))
    }

    pub fn pa(pattern: u32, func: Value) -> Value {
        Value::Pa(Rc::new(RefCell::new(PaData::new(pattern, func))))
    }

    // ===== predicates =====

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_truthy(&self) -> bool {
        !self.is_nil()
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    /// True for strings as well as general arrays, matching `array?`.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Vector(_))
    }

    pub fn is_string(&self) -> bool {
        match self {
            Value::Vector(v) => matches!(*v.borrow(), Vector::String(_)),
            _ => false,
        }
    }

    // ===== accessors =====

    /// Car of a pair; nil for nil and non-pairs. Primitives that must reject
    /// non-pairs check the variant themselves.
    pub fn car(&self) -> Value {
        match self {
            Value::Pair(p) => p.car.borrow().clone(),
            _ => Value::Nil,
        }
    }

    /// Cdr of a pair; nil for nil and non-pairs.
    pub fn cdr(&self) -> Value {
        match self {
            Value::Pair(p) => p.cdr.borrow().clone(),
            _ => Value::Nil,
        }
    }

    pub fn set_car(&self, value: Value) {
        if let Value::Pair(p) = self {
            *p.car.borrow_mut() = value;
        }
    }

    pub fn set_cdr(&self, value: Value) {
        if let Value::Pair(p) = self {
            *p.cdr.borrow_mut() = value;
        }
    }

    /// Collect a proper list into a vector; `None` for dotted tails.
    /// Diverges on cyclic lists, as the reference behavior does.
    pub fn list_to_vec(&self) -> Option<Vec<Value>> {
        let mut out = Vec::new();
        let mut cursor = self.clone();
        loop {
            match cursor {
                Value::Nil => return Some(out),
                Value::Pair(ref p) => {
                    out.push(p.car.borrow().clone());
                    let next = p.cdr.borrow().clone();
                    cursor = next;
                }
                _ => return None,
            }
        }
    }

    /// Bytes of a string vector, if this is one.
    pub fn string_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Vector(v) => match &*v.borrow() {
                Vector::String(b) => Some(b.clone()),
                Vector::Array(_) => None,
            },
            _ => None,
        }
    }

    /// Arity descriptor of a callable, if this is one.
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Value::Function(f) => Some(f.sig),
            Value::Closure(c) => c.function.signature(),
            Value::Subr(s) => Some(s.sig),
            _ => None,
        }
    }

    /// Object identity: value equality for immediates, allocation identity
    /// for heap objects.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Symbol(a), Value::Symbol(b)) => Rc::ptr_eq(a, b),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Stream(a), Value::Stream(b)) => Rc::ptr_eq(a, b),
            (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
            (Value::Vector(a), Value::Vector(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Subr(a), Value::Subr(b)) => Rc::ptr_eq(a, b),
            (Value::Continuation(a), Value::Continuation(b)) => Rc::ptr_eq(a, b),
            (Value::Pa(a), Value::Pa(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ===== printer =====

/// Render one string/character byte in literal form: named escapes, then
/// printable ASCII verbatim, then `\xHH`.
fn fmt_literal_char(f: &mut fmt::Formatter<'_>, ch: u8) -> fmt::Result {
    match ch {
        0x07 => write!(f, "\\a"),
        0x08 => write!(f, "\\b"),
        0x0c => write!(f, "\\f"),
        b'\n' => write!(f, "\\n"),
        b'\r' => write!(f, "\\r"),
        b'\t' => write!(f, "\\t"),
        0x0b => write!(f, "\\v"),
        b'\\' => write!(f, "\\\\"),
        b'"' => write!(f, "\\\""),
        0x20..=0x7e => write!(f, "{}", ch as char),
        _ => write!(f, "\\x{:02x}", ch),
    }
}

fn fmt_arity(f: &mut fmt::Formatter<'_>, sig: Signature) -> fmt::Result {
    write!(f, "{}{}", sig.min, if sig.variadic { "+" } else { "" })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "()"),
            Value::Symbol(s) => match &s.name {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "#<symbol {:p}>", Rc::as_ptr(s)),
            },
            Value::Char(ch) => {
                write!(f, "?")?;
                fmt_literal_char(f, *ch)
            }
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:.6}", x),
            Value::Stream(p) => write!(f, "#<stream {:p}>", Rc::as_ptr(p)),
            Value::Pair(_) => {
                write!(f, "(")?;
                let mut cursor = self.clone();
                loop {
                    let (car, cdr) = match &cursor {
                        Value::Pair(p) => (p.car.borrow().clone(), p.cdr.borrow().clone()),
                        _ => unreachable!(),
                    };
                    match cdr {
                        Value::Nil => {
                            write!(f, "{}", car)?;
                            return write!(f, ")");
                        }
                        Value::Pair(_) => {
                            write!(f, "{} ", car)?;
                            cursor = cdr;
                        }
                        tail => {
                            write!(f, "{} . {}", car, tail)?;
                            return write!(f, ")");
                        }
                    }
                }
            }
            Value::Vector(v) => match &*v.borrow() {
                Vector::String(bytes) => {
                    write!(f, "\"")?;
                    for &b in bytes {
                        fmt_literal_char(f, b)?;
                    }
                    write!(f, "\"")
                }
                Vector::Array(slots) => {
                    write!(f, "[")?;
                    for (i, slot) in slots.iter().enumerate() {
                        if i > 0 {
                            write!(f, " ")?;
                        }
                        write!(f, "{}", slot)?;
                    }
                    write!(f, "]")
                }
            },
            Value::Function(func) => {
                write!(f, "#<func:")?;
                fmt_arity(f, func.sig)?;
                write!(f, " ")?;
                // show the head of the body when it reads as a call form
                match &func.body {
                    Value::Pair(p) => {
                        let head = p.car.borrow().clone();
                        if head.is_pair() || head.is_array() {
                            write!(f, "{:p}", Rc::as_ptr(func))?;
                        } else {
                            write!(f, "({} ...)", head)?;
                        }
                    }
                    _ => write!(f, "{:p}", Rc::as_ptr(func))?,
                }
                write!(f, ">")
            }
            Value::Closure(c) => {
                write!(f, "#<closure:")?;
                if let Some(sig) = c.function.signature() {
                    fmt_arity(f, sig)?;
                }
                write!(f, " {:p}>", Rc::as_ptr(c))
            }
            Value::Subr(s) => {
                write!(f, "#<subr:")?;
                fmt_arity(f, s.sig)?;
                write!(f, " {}>", s.name)
            }
            Value::Continuation(k) => write!(f, "#<cont:1 {:p}>", Rc::as_ptr(k)),
            Value::Pa(pa) => write!(f, "#<func:(pa/{})>", pa.borrow().func),
        }
    }
}
