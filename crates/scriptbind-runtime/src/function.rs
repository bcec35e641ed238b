//! Native function values.

use std::fmt;
use std::rc::Rc;

use scriptbind_core::ScriptResult;

use crate::{Value, Vm};

/// Trait for callable native functions.
///
/// Arguments arrive as an ordered sequence and results leave as one; the
/// runtime never looks inside either.
pub trait NativeCallable {
    /// Call this function.
    fn call(&self, vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut Vm, Vec<Value>) -> ScriptResult<Vec<Value>>,
{
    fn call(&self, vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
        (self)(vm, args)
    }
}

/// A function value.
///
/// Cloning shares the underlying callable, so clones compare equal.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    inner: Rc<dyn NativeCallable>,
}

impl Function {
    /// Wrap a closure under a name used in tracebacks.
    pub fn new<F>(name: impl AsRef<str>, f: F) -> Self
    where
        F: Fn(&mut Vm, Vec<Value>) -> ScriptResult<Vec<Value>> + 'static,
    {
        Self::from_callable(name, f)
    }

    /// Wrap any [`NativeCallable`].
    pub fn from_callable<C>(name: impl AsRef<str>, callable: C) -> Self
    where
        C: NativeCallable + 'static,
    {
        Self {
            name: Rc::from(name.as_ref()),
            inner: Rc::new(callable),
        }
    }

    /// Name shown in tracebacks and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke directly, without pushing a call frame.
    ///
    /// Prefer [`Vm::call`], which records the frame for tracebacks.
    pub fn call_raw(&self, vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
        self.inner.call(vm, args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address used as identity.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
