// ABOUTME: Trampolined EVAL/RET/APPLY evaluator over a heap call stack

use crate::builtins;
use crate::env::{self, EnvChain, GlobalEnv};
use crate::error::Error;
use crate::interp::Interp;
use crate::value::{Special, SubrKind, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// One call-stack record: the partial application being assembled, the
/// argument forms still to process, and the environments to restore.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pa: Option<Value>,
    pub pending: Value,
    pub saved_locals: EnvChain,
    pub saved_globals: GlobalEnv,
}

impl Frame {
    /// Copy deep enough for a continuation: the pa cell is duplicated so the
    /// live frame's later mutation cannot reach the capture. Environments and
    /// argument values stay shared.
    pub fn snapshot(&self) -> Frame {
        Frame {
            pa: self.pa.as_ref().map(|pa| match pa {
                Value::Pa(p) => Value::Pa(Rc::new(RefCell::new(p.borrow().clone()))),
                other => other.clone(),
            }),
            pending: self.pending.clone(),
            saved_locals: self.saved_locals.clone(),
            saved_globals: self.saved_globals.clone(),
        }
    }
}

/// Eval pattern projected from a callable: which pending argument positions
/// get evaluated. Non-callables take every argument evaluated.
pub fn eval_pattern(o: &Value) -> u32 {
    match o {
        Value::Function(f) => f.sig.pattern,
        Value::Closure(c) => c.function.signature().map_or(!0, |sig| sig.pattern),
        Value::Subr(s) => s.sig.pattern,
        Value::Continuation(_) => 1,
        Value::Pa(p) => p.borrow().pattern,
        _ => !0,
    }
}

enum Step {
    Eval(Value),
    Ret(Value),
    Apply(Value),
}

/// An evaluation error either aborts (no errorback) or abandons the stack in
/// favor of `(callback "message")`, whose value becomes the session result.
fn recover_step(
    interp: &mut Interp,
    errorback: &mut Option<Value>,
    message: &str,
) -> Result<Step, Error> {
    match errorback.take() {
        None => Err(Error::eval(message)),
        Some(callback) => {
            interp.stack.clear();
            Ok(Step::Eval(Value::list(vec![
                callback,
                Value::string_from(message),
            ])))
        }
    }
}

fn pa_parts(o: &Value) -> Result<(Value, Vec<Value>), Error> {
    match o {
        Value::Pa(p) => {
            let data = p.borrow();
            Ok((data.func.clone(), data.args.clone()))
        }
        _ => Err(Error::internal("apply on a non-pa object.")),
    }
}

fn pa_push(o: &Value, value: Value) {
    if let Value::Pa(p) = o {
        p.borrow_mut().push(value);
    }
}

/// Run one evaluation session to completion.
pub fn run(interp: &mut Interp, expr: Value, mut errorback: Option<Value>) -> Result<Value, Error> {
    let mut step = Step::Eval(expr);
    loop {
        step = match step {
            // O is an expression to be evaluated
            Step::Eval(o) => match o {
                Value::Symbol(_) => {
                    match env::lookup(&interp.locals, &interp.globals, &o, false) {
                        Some(cell) => Step::Ret(cell.get()),
                        None => {
                            recover_step(interp, &mut errorback, "reference to unbound symbol.")?
                        }
                    }
                }
                Value::Pair(ref p) => {
                    let head = p.car.borrow().clone();
                    let pending = p.cdr.borrow().clone();
                    interp.stack.push(Frame {
                        pa: None,
                        pending,
                        saved_locals: interp.locals.clone(),
                        saved_globals: interp.globals.clone(),
                    });
                    // wall off local binds made while evaluating the head
                    interp.locals.push_boundary();
                    Step::Eval(head)
                }
                other => Step::Ret(other),
            },

            // O is a value produced just now
            Step::Ret(o) => {
                let Some(frame) = interp.stack.last_mut() else {
                    return Ok(o);
                };
                match &frame.pa {
                    None => frame.pa = Some(Value::pa(eval_pattern(&o), o)),
                    Some(pa) => pa_push(pa, o),
                }
                interp.locals = frame.saved_locals.clone();
                interp.globals = frame.saved_globals.clone();

                if frame.pending.is_truthy() {
                    let form = frame.pending.car();
                    frame.pending = frame.pending.cdr();
                    let evaluates = match &frame.pa {
                        Some(Value::Pa(p)) => p.borrow().pattern & 1 != 0,
                        _ => true,
                    };
                    if evaluates {
                        interp.locals.push_boundary();
                        Step::Eval(form)
                    } else {
                        Step::Ret(form)
                    }
                } else {
                    let Some(pa) = frame.pa.take() else {
                        return Err(Error::internal("call frame lost its partial application."));
                    };
                    interp.stack.pop();
                    Step::Apply(pa)
                }
            }

            // O is a partial application to be consumed
            Step::Apply(o) => apply(interp, o, &mut errorback)?,
        };
    }
}

fn apply(interp: &mut Interp, o: Value, errorback: &mut Option<Value>) -> Result<Step, Error> {
    let (func, vals) = pa_parts(&o)?;

    match &func {
        Value::Function(f) => {
            let sig = f.sig;
            if vals.len() > sig.min as usize && !sig.variadic {
                return recover_step(interp, errorback, "too many arguments applied to a function.");
            }
            if vals.len() < sig.min as usize {
                return Ok(Step::Ret(o));
            }

            let mut formals = f.formals.clone();
            let mut index = 0;
            loop {
                match formals {
                    Value::Nil => break,
                    Value::Pair(_) => {
                        let name = formals.car();
                        env::bind(
                            &mut interp.locals,
                            &interp.globals,
                            &name,
                            vals[index].clone(),
                            true,
                        );
                        index += 1;
                        formals = formals.cdr();
                    }
                    rest_name => {
                        let rest = Value::list(vals[index..].to_vec());
                        env::bind(&mut interp.locals, &interp.globals, &rest_name, rest, true);
                        break;
                    }
                }
            }
            Ok(Step::Eval(f.body.clone()))
        }

        Value::Closure(c) => {
            let sig = c
                .function
                .signature()
                .ok_or_else(|| Error::internal("closure over a non-function."))?;
            if vals.len() > sig.min as usize && !sig.variadic {
                return recover_step(interp, errorback, "too many arguments applied to a closure.");
            }
            if vals.len() < sig.min as usize {
                return Ok(Step::Ret(o));
            }

            interp.locals = c.locals.clone();
            interp.globals = c.globals.clone();
            if let Value::Pa(p) = &o {
                p.borrow_mut().func = c.function.clone();
            }
            Ok(Step::Apply(o))
        }

        Value::Subr(s) => {
            let sig = s.sig;
            if vals.len() > sig.min as usize && !sig.variadic {
                return recover_step(interp, errorback, "too many arguments applied to a subr.");
            }
            if vals.len() < sig.min as usize {
                return Ok(Step::Ret(o));
            }

            match &s.kind {
                SubrKind::Special(Special::Quote) => Ok(Step::Ret(vals[0].clone())),

                SubrKind::Special(Special::If) => {
                    if vals[0].is_truthy() {
                        Ok(Step::Eval(vals[1].clone()))
                    } else {
                        Ok(Step::Eval(vals.get(2).cloned().unwrap_or(Value::Nil)))
                    }
                }

                SubrKind::Special(Special::Eval) => {
                    if let Some(callback) = vals.get(1) {
                        *errorback = Some(callback.clone());
                    }
                    Ok(Step::Eval(vals[0].clone()))
                }

                SubrKind::Special(Special::Apply) => {
                    let items = vals[1]
                        .list_to_vec()
                        .ok_or_else(|| Error::type_error("apply", 1, "list"))?;
                    let pa = Value::pa(eval_pattern(&vals[0]), vals[0].clone());
                    for item in items {
                        pa_push(&pa, item);
                    }
                    Ok(Step::Apply(pa))
                }

                SubrKind::Special(Special::CallCc) => {
                    let pa = Value::pa(eval_pattern(&vals[0]), vals[0].clone());
                    let frames: Vec<Frame> = interp.stack.iter().map(Frame::snapshot).collect();
                    pa_push(&pa, Value::Continuation(Rc::new(frames)));
                    Ok(Step::Apply(pa))
                }

                SubrKind::Special(Special::Evlis) => {
                    Err(Error::internal("NOT IMPLEMENTED subr \"evlis\"."))
                }

                SubrKind::Special(Special::UnwindProtect) => {
                    Err(Error::internal("NOT IMPLEMENTED subr \"unwind-protect\"."))
                }

                SubrKind::Native(native) => {
                    let result = native(interp, &vals)?;
                    Ok(Step::Ret(result))
                }
            }
        }

        Value::Continuation(k) => {
            if vals.len() > 1 {
                return recover_step(
                    interp,
                    errorback,
                    "too many arguments applied to a continuation.",
                );
            }
            if vals.is_empty() {
                return Ok(Step::Ret(o));
            }
            interp.stack = k.iter().map(Frame::snapshot).collect();
            Ok(Step::Ret(vals[0].clone()))
        }

        Value::Pa(inner) => {
            let (inner_func, inner_vals) = {
                let data = inner.borrow();
                (data.func.clone(), data.args.clone())
            };
            let pa = Value::pa(eval_pattern(&inner_func), inner_func);
            for v in inner_vals {
                pa_push(&pa, v);
            }
            for v in vals {
                pa_push(&pa, v);
            }
            Ok(Step::Apply(pa))
        }

        Value::Int(_) | Value::Float(_) => {
            if vals.is_empty() {
                // (1) = 1
                Ok(Step::Ret(func.clone()))
            } else if vals.len() == 1 {
                // (1 f) = partial application of f with 1
                let pa = Value::pa(eval_pattern(&vals[0]), vals[0].clone());
                pa_push(&pa, func.clone());
                Ok(Step::Ret(pa))
            } else {
                // (1 f 2 ...) = ((f 1 2) ...)
                let rest = Value::list(vals[2..].to_vec());
                interp.stack.push(Frame {
                    pa: Some(Value::pa(0, builtins::special_subr(Special::Apply))),
                    pending: Value::cons(rest, Value::Nil),
                    saved_locals: interp.locals.clone(),
                    saved_globals: interp.globals.clone(),
                });
                let pa = Value::pa(0, vals[0].clone());
                pa_push(&pa, func.clone());
                pa_push(&pa, vals[1].clone());
                Ok(Step::Apply(pa))
            }
        }

        _ => {
            if vals.is_empty() {
                // ('a) = 'a
                Ok(Step::Ret(func.clone()))
            } else {
                // ('a f ...) = ((f a) ...)
                let rest = Value::list(vals[1..].to_vec());
                interp.stack.push(Frame {
                    pa: Some(Value::pa(0, builtins::special_subr(Special::Apply))),
                    pending: Value::cons(rest, Value::Nil),
                    saved_locals: interp.locals.clone(),
                    saved_globals: interp.globals.clone(),
                });
                let pa = Value::pa(0, vals[0].clone());
                pa_push(&pa, func.clone());
                Ok(Step::Apply(pa))
            }
        }
    }
}
