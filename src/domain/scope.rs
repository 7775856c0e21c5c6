use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A lexical scope with a parent chain, shared by the analyzer (types) and the
/// interpreter (values). Functions are keyed by name and arity.
#[derive(Debug)]
pub struct Scope<V, F> {
    inner: Rc<RefCell<Inner<V, F>>>,
}

#[derive(Debug)]
struct Inner<V, F> {
    parent: Option<Scope<V, F>>,
    variables: HashMap<String, V>,
    functions: HashMap<(String, usize), F>,
}

impl<V, F> Clone for Scope<V, F> {
    fn clone(&self) -> Self {
        Scope {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V, F> Default for Scope<V, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, F> Scope<V, F> {
    pub fn new() -> Self {
        Scope {
            inner: Rc::new(RefCell::new(Inner {
                parent: None,
                variables: HashMap::new(),
                functions: HashMap::new(),
            })),
        }
    }

    /// Opens a child scope; lookups fall through to `self`.
    pub fn child(&self) -> Self {
        Scope {
            inner: Rc::new(RefCell::new(Inner {
                parent: Some(self.clone()),
                variables: HashMap::new(),
                functions: HashMap::new(),
            })),
        }
    }

    pub fn parent(&self) -> Option<Self> {
        self.inner.borrow().parent.clone()
    }

    pub fn define_variable(&self, name: impl Into<String>, value: V) {
        self.inner.borrow_mut().variables.insert(name.into(), value);
    }

    pub fn define_function(&self, name: impl Into<String>, arity: usize, function: F) {
        self.inner
            .borrow_mut()
            .functions
            .insert((name.into(), arity), function);
    }
}

impl<V: Clone, F> Scope<V, F> {
    pub fn lookup_variable(&self, name: &str) -> Option<V> {
        let inner = self.inner.borrow();
        if let Some(value) = inner.variables.get(name) {
            return Some(value.clone());
        }
        inner.parent.as_ref().and_then(|p| p.lookup_variable(name))
    }

    /// Rebinds `name` in the scope where it was defined. Returns false when
    /// the variable does not exist anywhere up the chain.
    pub fn assign_variable(&self, name: &str, value: V) -> bool {
        let mut inner = self.inner.borrow_mut();
        if let Some(slot) = inner.variables.get_mut(name) {
            *slot = value;
            return true;
        }
        match &inner.parent {
            Some(parent) => parent.assign_variable(name, value),
            None => false,
        }
    }
}

impl<V, F: Clone> Scope<V, F> {
    pub fn lookup_function(&self, name: &str, arity: usize) -> Option<F> {
        let inner = self.inner.borrow();
        if let Some(function) = inner.functions.get(&(name.to_string(), arity)) {
            return Some(function.clone());
        }
        inner
            .parent
            .as_ref()
            .and_then(|p| p.lookup_function(name, arity))
    }
}
