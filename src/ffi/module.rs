//! Modules: a namespace of classes, functions and values installed together.
//!
//! ```ignore
//! let module = Module::new(&["game", "physics"])
//!     .class(ClassBuilder::<Body>::new().constructor(Body::default))
//!     .function("gravity", || 9.81)
//!     .function("gravity", |planet: String| gravity_of(&planet))
//!     .value("VERSION", "1.4")
//!     .enumeration("Shape", &[("Box", 0), ("Sphere", 1)]);
//! ctx.install(module)?;
//! // script: game.physics.gravity("mars")
//! ```
//!
//! Functions registered under the same qualified name share one overload set,
//! across modules and across installs.

use scriptbind_core::{ConfigurationError, ScriptResult};
use scriptbind_registry::OverloadEntry;
use scriptbind_runtime::{Function, Table, Value, Vm};

use super::class_builder::{ClassBuilder, ClassRegistration, with_defaults};
use super::function::IntoFunction;
use crate::context::{ContextState, context_state};
use crate::convert::{IntoScript, IntoScriptMulti, NativeClass};
use crate::overload::{self, Binding, CallArgs, NativeBinding};

type DeferredValue = Box<dyn FnOnce(&ContextState) -> ScriptResult<Value>>;

/// A set of registrations installed under one namespace path.
pub struct Module {
    namespace: Vec<String>,
    classes: Vec<Box<dyn ClassRegistration>>,
    functions: Vec<(String, OverloadEntry<dyn Binding>)>,
    values: Vec<(String, DeferredValue)>,
}

impl Module {
    /// A module installed under `namespace`, e.g. `&["game", "ui"]`.
    pub fn new(namespace: &[&str]) -> Self {
        Self {
            namespace: namespace.iter().map(|s| s.to_string()).collect(),
            classes: Vec::new(),
            functions: Vec::new(),
            values: Vec::new(),
        }
    }

    /// A module installed directly into the globals table.
    pub fn root() -> Self {
        Self::new(&[])
    }

    /// The namespace path.
    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    /// Add a class.
    pub fn class<T: NativeClass>(mut self, builder: ClassBuilder<T>) -> Self {
        self.classes.push(Box::new(builder));
        self
    }

    /// Add a function overload.
    pub fn function<F, M>(mut self, name: &str, f: F) -> Self
    where
        F: IntoFunction<M>,
    {
        self.functions
            .push((name.to_string(), OverloadEntry::new(f.into_binding().into_rc())));
        self
    }

    /// Add a function overload whose trailing parameters have defaults.
    pub fn function_with_defaults<F, M>(
        mut self,
        name: &str,
        f: F,
        defaults: Vec<Value>,
    ) -> Result<Self, ConfigurationError>
    where
        F: IntoFunction<M>,
    {
        let entry = with_defaults(&qualify(&self.namespace, name), f.into_binding(), defaults)?;
        self.functions.push((name.to_string(), entry));
        Ok(self)
    }

    /// Add a function that reads its arguments itself.
    pub fn raw_function<F, R>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut Vm, CallArgs) -> ScriptResult<R> + 'static,
        R: IntoScriptMulti,
    {
        let binding = NativeBinding::raw(move |vm, args| {
            let state = args.state().clone();
            f(vm, args)?.into_script_multi(&state)
        });
        self.functions
            .push((name.to_string(), OverloadEntry::new(binding.into_rc())));
        self
    }

    /// Add a constant value.
    pub fn value<V: IntoScript + 'static>(mut self, name: &str, value: V) -> Self {
        self.values
            .push((name.to_string(), Box::new(move |state: &ContextState| value.into_script(state))));
        self
    }

    /// Add a table of named integer constants.
    pub fn enumeration(mut self, name: &str, entries: &[(&str, i64)]) -> Self {
        let table = Table::new();
        for (key, value) in entries {
            table.set(key, Value::Integer(*value));
        }
        self.values
            .push((name.to_string(), Box::new(move |_: &ContextState| Ok(Value::Table(table)))));
        self
    }

    /// Install everything into the runtime.
    pub(crate) fn install(self, vm: &mut Vm, state: &ContextState) -> ScriptResult<Table> {
        let Module {
            namespace,
            classes,
            functions,
            values,
        } = self;
        let target = namespace_table(vm, &namespace)?;

        for class in classes {
            let name = class.name();
            let table = class.register(vm, state)?;
            target.set(name, table);
        }

        for (name, entry) in functions {
            let qualified = qualify(&namespace, &name);
            state.add_function(&qualified, entry);
            target.set(&name, function_thunk(qualified));
        }

        for (name, make) in values {
            target.set(&name, make(state)?);
        }

        tracing::debug!(
            "installed module '{}'",
            if namespace.is_empty() {
                "<root>".to_string()
            } else {
                namespace.join(".")
            }
        );
        Ok(target)
    }
}

/// `game.ui.name` for namespace `["game", "ui"]`.
fn qualify(namespace: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = namespace.iter().map(String::as_str).collect();
    parts.push(name);
    parts.join(".")
}

/// Walk or create nested tables under the globals.
fn namespace_table(vm: &Vm, path: &[String]) -> ScriptResult<Table> {
    let mut current = vm.globals().clone();
    for segment in path {
        current = match current.get(segment) {
            Value::Table(t) => t,
            Value::Nil => {
                let t = Table::new();
                current.set(segment, t.clone());
                t
            }
            other => {
                return Err(vm.error(format!(
                    "cannot create namespace '{}': field is a {} value",
                    segment,
                    other.type_name()
                )));
            }
        };
    }
    Ok(current)
}

/// A global function resolving against the context's overload set at call time,
/// so overloads added later are visible to existing references.
fn function_thunk(qualified: String) -> Function {
    Function::new(qualified.clone(), move |vm, args| {
        let state = context_state(vm)?;
        let Some(set) = state.function(&qualified) else {
            return Err(vm.error(format!("function '{}' is not registered", qualified)));
        };
        overload::dispatch(vm, &state, &qualified, &set, args)
    })
}
