//! Host-side entry point: one [`Context`] per runtime.
//!
//! A `Context` owns a [`Vm`] and the [`ContextState`] the bridge works
//! against: the type registry, the identity table, global overload sets and
//! the retained default-argument packs. The state is attached to the `Vm` as
//! app data, so dispatch thunks fetch it at call time with [`context_state`]
//! and nothing in the runtime holds a strong reference back into it.
//!
//! # Example
//!
//! ```ignore
//! use scriptbind::{ClassBuilder, Context, Module, NativeClass};
//!
//! #[derive(Clone, Default)]
//! struct Vec2 { x: f64, y: f64 }
//!
//! impl NativeClass for Vec2 {
//!     const NAME: &'static str = "Vec2";
//! }
//!
//! let mut ctx = Context::new();
//! ctx.register_class(
//!     ClassBuilder::<Vec2>::new()
//!         .constructor(|x: f64, y: f64| Vec2 { x, y })
//!         .method("length", |v: &Vec2| v.x.hypot(v.y)),
//! )?;
//! let v: Vec2 = ctx.call("Vec2.new", (3.0, 4.0))?;
//! ```
//!
//! Independent contexts share nothing.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use scriptbind_core::{Cost, ScriptResult, TypeHash};
use scriptbind_registry::{OverloadEntry, OverloadSet, TypeDescriptor, TypeRegistry};
use scriptbind_runtime::{AnyUserData, Table, Value, Vm};

use crate::bridge::{IdentityTable, handle_of};
use crate::config::ContextProperty;
use crate::convert::{
    FromScript, FromScriptMulti, IntoScript, IntoScriptMulti, NativeClass, Obj, Unowned,
    handle_type,
};
use crate::ffi::{ClassBuilder, IntoFunction, Module};
use crate::overload::Binding;
use crate::script_class;

/// Per-runtime bridge state.
pub struct ContextState {
    types: RefCell<TypeRegistry<dyn Binding>>,
    identity: Rc<IdentityTable>,
    functions: RefCell<FxHashMap<String, OverloadSet<dyn Binding>>>,
    defaults: RefCell<Vec<Rc<[Value]>>>,
    properties: RefCell<FxHashMap<ContextProperty, usize>>,
}

impl ContextState {
    pub fn new() -> Self {
        Self {
            types: RefCell::new(TypeRegistry::new()),
            identity: Rc::new(IdentityTable::new()),
            functions: RefCell::new(FxHashMap::default()),
            defaults: RefCell::new(Vec::new()),
            properties: RefCell::new(FxHashMap::default()),
        }
    }

    // ==========================================================================
    // Registry
    // ==========================================================================

    /// The type registry.
    pub fn types(&self) -> Ref<'_, TypeRegistry<dyn Binding>> {
        self.types.borrow()
    }

    pub(crate) fn types_mut(&self) -> RefMut<'_, TypeRegistry<dyn Binding>> {
        self.types.borrow_mut()
    }

    /// The weak identity table of owned handles.
    pub fn identity(&self) -> &IdentityTable {
        &self.identity
    }

    pub(crate) fn identity_rc(&self) -> &Rc<IdentityTable> {
        &self.identity
    }

    // ==========================================================================
    // Global functions
    // ==========================================================================

    /// The overload set registered under a qualified name.
    pub fn function(&self, name: &str) -> Option<OverloadSet<dyn Binding>> {
        self.functions.borrow().get(name).cloned()
    }

    /// Append an overload to the set under `name`, creating it if needed.
    pub(crate) fn add_function(&self, name: &str, entry: OverloadEntry<dyn Binding>) {
        if let Some(defaults) = &entry.defaults {
            self.defaults.borrow_mut().push(Rc::clone(defaults));
        }
        self.functions
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| OverloadSet::new(name))
            .push(entry);
    }

    /// Keep every default-argument pack of a descriptor alive with the state.
    pub(crate) fn retain_defaults(&self, descriptor: &TypeDescriptor<dyn Binding>) {
        let mut packs = self.defaults.borrow_mut();
        let sets = std::iter::once(descriptor.constructors())
            .chain(descriptor.members().iter())
            .chain(descriptor.statics().iter());
        for set in sets {
            packs.extend(set.iter().filter_map(|e| e.defaults.clone()));
        }
    }

    /// Number of retained default-argument packs.
    pub fn default_packs(&self) -> usize {
        self.defaults.borrow().len()
    }

    // ==========================================================================
    // Properties
    // ==========================================================================

    /// Current value of a property.
    pub fn property(&self, property: ContextProperty) -> usize {
        self.properties
            .borrow()
            .get(&property)
            .copied()
            .unwrap_or_else(|| property.default_value())
    }

    fn record_property(&self, property: ContextProperty, value: usize) {
        self.properties.borrow_mut().insert(property, value);
    }

    // ==========================================================================
    // Casts
    // ==========================================================================

    /// Whether `value` is a handle of type `target`, or (non-strict) of a type
    /// that converts to it.
    pub fn is_of_type(&self, value: &Value, target: TypeHash, strict: bool) -> bool {
        handle_type(value).is_some_and(|recorded| self.types().is_of_type(recorded, target, strict))
    }

    /// View a handle as `U`, with the cost of the conversion.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn convert<U: NativeClass>(&self, value: &Value) -> Option<(Obj<U>, Cost)> {
        let handle = handle_of(value)?;
        let path = self
            .types()
            .find_cast(handle.type_hash(), TypeHash::of::<U>())?;
        let cell = handle.cell().ok()?;
        let view = path.apply_to(handle.view());
        Some((Obj::from_parts(cell, view), path.cost()))
    }
}

impl Default for ContextState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextState")
            .field("types", &self.types.borrow().len())
            .field("identity", &self.identity)
            .field("functions", &self.functions.borrow().len())
            .field("defaults", &self.default_packs())
            .finish()
    }
}

/// Fetch the state attached to a runtime by [`Context::new`].
pub fn context_state(vm: &Vm) -> ScriptResult<Rc<ContextState>> {
    vm.app_data::<ContextState>()
        .ok_or_else(|| vm.error("runtime has no scriptbind context attached"))
}

/// A runtime together with its bridge state.
///
/// The `Vm` field is declared first so it is dropped before the state.
pub struct Context {
    vm: Vm,
    state: Rc<ContextState>,
}

impl Context {
    /// Create a runtime with the `scriptbind` helper table installed.
    pub fn new() -> Self {
        let mut vm = Vm::new();
        let state = Rc::new(ContextState::new());
        vm.set_app_data(Rc::clone(&state));
        script_class::install(&vm);
        tracing::debug!("created scriptbind context");
        Self { vm, state }
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    pub fn state(&self) -> &Rc<ContextState> {
        &self.state
    }

    /// The runtime's global table.
    pub fn globals(&self) -> &Table {
        self.vm.globals()
    }

    /// The runtime's registry table.
    pub fn registry(&self) -> &Table {
        self.vm.registry()
    }

    // ==========================================================================
    // Configuration
    // ==========================================================================

    pub fn set_property(&mut self, property: ContextProperty, value: usize) {
        match property {
            ContextProperty::MaxCastDepth => self.state.types_mut().set_max_cast_depth(value),
            ContextProperty::MaxMetaChain => self.vm.set_max_meta_chain(value),
            ContextProperty::MaxCallDepth => self.vm.set_max_call_depth(value),
        }
        self.state.record_property(property, value);
    }

    pub fn property(&self, property: ContextProperty) -> usize {
        self.state.property(property)
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Install a module, returning its namespace table.
    pub fn install(&mut self, module: Module) -> ScriptResult<Table> {
        module.install(&mut self.vm, &self.state)
    }

    /// Register a class and expose it as a global under its name.
    pub fn register_class<T: NativeClass>(&mut self, builder: ClassBuilder<T>) -> ScriptResult<Table> {
        let table = builder.register(&mut self.vm, &self.state)?;
        self.vm.globals().set(T::NAME, table.clone());
        Ok(table)
    }

    /// Add a global function overload.
    pub fn register_function<F, M>(&mut self, name: &str, f: F) -> ScriptResult<()>
    where
        F: IntoFunction<M>,
    {
        self.install(Module::root().function(name, f))?;
        Ok(())
    }

    /// Add a global function overload whose trailing parameters have defaults.
    pub fn register_function_with_defaults<F, M>(
        &mut self,
        name: &str,
        f: F,
        defaults: Vec<Value>,
    ) -> ScriptResult<()>
    where
        F: IntoFunction<M>,
    {
        let module = Module::root().function_with_defaults(name, f, defaults)?;
        self.install(module)?;
        Ok(())
    }

    // ==========================================================================
    // Globals and calls
    // ==========================================================================

    pub fn set_global<V: IntoScript>(&mut self, name: &str, value: V) -> ScriptResult<()> {
        let value = value.into_script(&self.state)?;
        self.vm.globals().set(name, value);
        self.run_deferred_finalizers();
        Ok(())
    }

    /// Read a global by dotted path, e.g. `"game.ui.TITLE"`.
    pub fn get_global<T: FromScript>(&mut self, path: &str) -> ScriptResult<T> {
        let value = self.lookup(path)?;
        Ok(T::from_script(&value, &self.state)?)
    }

    /// Call the function at a dotted path.
    pub fn call<R: FromScriptMulti>(
        &mut self,
        path: &str,
        args: impl IntoScriptMulti,
    ) -> ScriptResult<R> {
        let callee = self.lookup(path)?;
        let args = args.into_script_multi(&self.state)?;
        let results = self.vm.call(&callee, args);
        self.run_deferred_finalizers();
        R::from_script_multi(results?, &self.state)
    }

    /// Call `object:name(args...)`.
    pub fn call_method<R: FromScriptMulti>(
        &mut self,
        object: &Value,
        name: &str,
        args: impl IntoScriptMulti,
    ) -> ScriptResult<R> {
        let args = args.into_script_multi(&self.state)?;
        let results = self.vm.call_method(object, name, args);
        self.run_deferred_finalizers();
        R::from_script_multi(results?, &self.state)
    }

    fn lookup(&mut self, path: &str) -> ScriptResult<Value> {
        let mut current = Value::Table(self.vm.globals().clone());
        for segment in path.split('.') {
            current = self.vm.get_field(&current, segment)?;
        }
        Ok(current)
    }

    // ==========================================================================
    // Pushing objects
    // ==========================================================================

    /// Push an object the runtime shares ownership of.
    pub fn push_owned<T: NativeClass>(&self, object: Obj<T>) -> ScriptResult<Value> {
        object.into_script(&self.state)
    }

    /// Push a handle that does not keep `object` alive.
    pub fn push_unowned<T: NativeClass>(&self, object: &Obj<T>) -> ScriptResult<Value> {
        Unowned(object.clone()).into_script(&self.state)
    }

    /// Wrap a host value in userdata with no class table.
    pub fn push_unregistered<T: Any>(&self, value: T) -> Value {
        Value::UserData(AnyUserData::new(value))
    }

    /// Run finalizers that were held back because the host was borrowing
    /// their object when the runtime released it. Returns how many ran.
    ///
    /// Dispatch and the host calls on this type do this on their own.
    pub fn run_deferred_finalizers(&self) -> usize {
        self.state.identity().run_deferred()
    }

    /// Check a handle's type without converting it.
    pub fn is_of_type<T: NativeClass>(&self, value: &Value, strict: bool) -> bool {
        self.state.is_of_type(value, TypeHash::of::<T>(), strict)
    }

    // ==========================================================================
    // Host utilities
    // ==========================================================================

    /// Append `;path` to `package.path`, creating `package` when missing.
    pub fn add_package_path(&mut self, path: &str) -> ScriptResult<()> {
        let package = match self.vm.globals().get("package") {
            Value::Table(t) => t,
            Value::Nil => {
                let t = Table::new();
                t.set("path", "");
                self.vm.globals().set("package", t.clone());
                t
            }
            other => {
                return Err(self.vm.error(format!(
                    "global 'package' is a {} value, not a table",
                    other.type_name()
                )));
            }
        };
        let current = package.get("path");
        let current = current.as_str().unwrap_or_default();
        package.set("path", format!("{};{}", current, path));
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.state.types_mut().release(&mut self.vm);
        self.vm.remove_app_data::<ContextState>();
        tracing::debug!("dropped scriptbind context");
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
