// ABOUTME: Environment stores: lexical chain with boundaries, global list

use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// A name/value cell. Lookup hands the cell back so callers mutate in place;
/// every environment that reached the cell observes the mutation.
#[derive(Debug)]
pub struct Binding {
    pub name: Value,
    value: RefCell<Value>,
}

impl Binding {
    fn new(name: Value, value: Value) -> Rc<Self> {
        Rc::new(Binding {
            name,
            value: RefCell::new(value),
        })
    }

    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: Value) {
        *self.value.borrow_mut() = value;
    }
}

#[derive(Debug)]
struct Node {
    /// `None` marks a scope boundary.
    entry: Option<Rc<Binding>>,
    next: EnvChain,
}

/// Singly linked chain of bindings and boundary sentinels, most recent first.
/// Clones share structure, so a saved chain is a cheap snapshot.
#[derive(Debug, Clone, Default)]
pub struct EnvChain(Option<Rc<Node>>);

impl EnvChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a boundary marker walling off local binds made beyond it.
    pub fn push_boundary(&mut self) {
        self.0 = Some(Rc::new(Node {
            entry: None,
            next: self.clone(),
        }));
    }

    pub fn push_binding(&mut self, name: Value, value: Value) {
        self.0 = Some(Rc::new(Node {
            entry: Some(Binding::new(name, value)),
            next: self.clone(),
        }));
    }

    /// Scan from the most recent end. Under `local_only` a boundary ends the
    /// search as unbound; otherwise boundaries are skipped.
    pub fn find(&self, name: &Value, local_only: bool) -> Option<Rc<Binding>> {
        let mut cursor = self.0.clone();
        while let Some(node) = cursor {
            match &node.entry {
                None if local_only => return None,
                None => {}
                Some(binding) => {
                    if binding.name.identical(name) {
                        return Some(binding.clone());
                    }
                }
            }
            cursor = node.next.0.clone();
        }
        None
    }
}

/// Global bindings behind a shared head cell: prepends through any handle
/// sharing the head are visible to all of them, while `fork` takes a new head
/// over the current entries (existing cells stay shared, later prepends to
/// the original do not appear in the fork).
#[derive(Debug, Clone)]
pub struct GlobalEnv(Rc<RefCell<EnvChain>>);

impl Default for GlobalEnv {
    fn default() -> Self {
        GlobalEnv(Rc::new(RefCell::new(EnvChain::new())))
    }
}

impl GlobalEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fork(&self) -> GlobalEnv {
        GlobalEnv(Rc::new(RefCell::new(self.0.borrow().clone())))
    }

    pub fn find(&self, name: &Value) -> Option<Rc<Binding>> {
        self.0.borrow().find(name, false)
    }

    pub fn prepend(&self, name: Value, value: Value) {
        self.0.borrow_mut().push_binding(name, value);
    }
}

/// Search the lexical chain, then the global list. Returns the binding cell.
pub fn lookup(
    locals: &EnvChain,
    globals: &GlobalEnv,
    name: &Value,
    local_only: bool,
) -> Option<Rc<Binding>> {
    if let Some(binding) = locals.find(name, local_only) {
        return Some(binding);
    }
    if local_only {
        return None;
    }
    globals.find(name)
}

/// Mutate an existing binding under the given visibility rule, or create a
/// new one at the head of the lexical chain (`local`) or the global list.
/// Fail-soft: always succeeds.
pub fn bind(locals: &mut EnvChain, globals: &GlobalEnv, name: &Value, value: Value, local: bool) {
    if local {
        match locals.find(name, true) {
            Some(binding) => binding.set(value),
            None => locals.push_binding(name.clone(), value),
        }
    } else {
        match lookup(locals, globals, name, false) {
            Some(binding) => binding.set(value),
            None => globals.prepend(name.clone(), value),
        }
    }
}
