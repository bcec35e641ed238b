//! Bindings: type-erased host callables with scoring.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use scriptbind_core::{ConversionError, Cost, ScriptResult};
use scriptbind_runtime::{Value, Vm};

use crate::context::ContextState;
use crate::convert::FromScript;

bitflags! {
    /// Binding traits used for rendering and bookkeeping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindingFlags: u8 {
        /// Takes the receiver as its first argument.
        const METHOD      = 0b0000_0001;
        /// Receiver is borrowed immutably.
        const CONST       = 0b0000_0010;
        /// Class-level function without a receiver.
        const STATIC      = 0b0000_0100;
        /// Creates a new instance.
        const CONSTRUCTOR = 0b0000_1000;
        /// Attribute read accessor.
        const GETTER      = 0b0001_0000;
        /// Attribute write accessor.
        const SETTER      = 0b0010_0000;
    }
}

/// A callable overload candidate.
pub trait Binding {
    /// Number of declared parameters, receiver included.
    fn arity(&self) -> usize;

    /// Labels of the declared parameters.
    fn params(&self) -> &[Cow<'static, str>];

    /// Traits of this binding.
    fn flags(&self) -> BindingFlags {
        BindingFlags::empty()
    }

    /// Cost of accepting `args`; the slice already has defaults backfilled.
    fn score(&self, state: &ContextState, args: &[Value]) -> Cost;

    /// Run the host function.
    fn invoke(&self, vm: &mut Vm, args: CallArgs) -> ScriptResult<Vec<Value>>;

    /// Render the signature, e.g. `f(int, uint)`.
    fn describe(&self, name: &str) -> String {
        format!("{}({})", name, self.params().join(", "))
    }
}

type Scorer = Box<dyn Fn(&ContextState, &[Value]) -> Cost>;
type Invoker = Box<dyn Fn(&mut Vm, CallArgs) -> ScriptResult<Vec<Value>>>;

/// A [`Binding`] made of closures.
pub struct NativeBinding {
    params: Vec<Cow<'static, str>>,
    flags: BindingFlags,
    scorer: Scorer,
    invoker: Invoker,
}

impl NativeBinding {
    pub fn new<S, I>(params: Vec<Cow<'static, str>>, scorer: S, invoker: I) -> Self
    where
        S: Fn(&ContextState, &[Value]) -> Cost + 'static,
        I: Fn(&mut Vm, CallArgs) -> ScriptResult<Vec<Value>> + 'static,
    {
        Self {
            params,
            flags: BindingFlags::empty(),
            scorer: Box::new(scorer),
            invoker: Box::new(invoker),
        }
    }

    /// A binding that accepts any arguments at exact cost and reads them itself.
    pub fn raw<I>(invoker: I) -> Self
    where
        I: Fn(&mut Vm, CallArgs) -> ScriptResult<Vec<Value>> + 'static,
    {
        Self::new(vec![Cow::Borrowed("...")], |_, _| Cost::EXACT, invoker)
    }

    /// Add flags to this binding.
    pub fn with_flags(mut self, flags: BindingFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Share as a trait object.
    pub fn into_rc(self) -> Rc<dyn Binding> {
        Rc::new(self)
    }
}

impl Binding for NativeBinding {
    fn arity(&self) -> usize {
        if self.is_variadic() {
            usize::MAX
        } else {
            self.params.len()
        }
    }

    fn params(&self) -> &[Cow<'static, str>] {
        &self.params
    }

    fn flags(&self) -> BindingFlags {
        self.flags
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn score(&self, state: &ContextState, args: &[Value]) -> Cost {
        (self.scorer)(state, args)
    }

    fn invoke(&self, vm: &mut Vm, args: CallArgs) -> ScriptResult<Vec<Value>> {
        (self.invoker)(vm, args)
    }
}

impl NativeBinding {
    fn is_variadic(&self) -> bool {
        self.params.len() == 1 && self.params[0] == "..."
    }
}

impl fmt::Debug for NativeBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBinding")
            .field("params", &self.params)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Arguments of a resolved call.
///
/// Values arrive in call order with defaults already appended.
pub struct CallArgs {
    values: Vec<Value>,
    state: Rc<ContextState>,
}

impl CallArgs {
    pub fn new(values: Vec<Value>, state: Rc<ContextState>) -> Self {
        Self { values, state }
    }

    /// Convert argument `index`; missing arguments read as nil.
    pub fn arg<T: FromScript>(&self, index: usize) -> Result<T, ConversionError> {
        T::from_script(self.value(index), &self.state)
    }

    /// Raw argument `index`.
    pub fn value(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Nil)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// The context the call runs in.
    pub fn state(&self) -> &Rc<ContextState> {
        &self.state
    }
}

impl fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}
