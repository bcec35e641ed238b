//! Generated class table entries: dispatch thunks and instance hooks.
//!
//! Each overload set becomes one native function that resolves the call at
//! run time. Instance reads go through `__index`:
//!
//! 1. the handle's instance storage
//! 2. the class table (members, statics and inherited entries)
//! 3. the attribute getter registered under the key
//!
//! Instance writes go to the attribute setter when the key names an
//! attribute, otherwise to instance storage.

use std::rc::Rc;

use scriptbind_core::ScriptResult;
use scriptbind_registry::reserved::{ATTRIBUTES, INDEX, NEW_INDEX};
use scriptbind_registry::{OverloadEntry, OverloadSet, TypeDescriptor};
use scriptbind_runtime::{Function, MetaMethod, Table, Value, Vm};

use super::ObjectHandle;
use crate::context::context_state;
use crate::overload::{self, Binding};

/// Name of the default constructor entry.
pub const CONSTRUCTOR_KEY: &str = "new";

/// Write the type's own entries into its fresh class table.
pub(crate) fn populate(
    descriptor: &Rc<TypeDescriptor<dyn Binding>>,
    table: &Table,
) -> ScriptResult<()> {
    let class = descriptor.name();

    for set in descriptor.members().iter().chain(descriptor.statics().iter()) {
        let qualified = format!("{}.{}", class, set.name());
        table.set(set.name(), dispatch_thunk(qualified, set.clone()));
    }

    let has_custom_new = descriptor.member(CONSTRUCTOR_KEY).is_some()
        || descriptor.static_fn(CONSTRUCTOR_KEY).is_some();
    if !has_custom_new {
        table.set(CONSTRUCTOR_KEY, constructor_thunk(descriptor, false));
    }

    let attributes = match table.get(ATTRIBUTES) {
        Value::Table(t) => t,
        _ => {
            let t = Table::new();
            table.set(ATTRIBUTES, t.clone());
            t
        }
    };
    for attr in descriptor.attributes() {
        let qualified = format!("{}.{}", class, attr.name);
        let accessor = Table::new();
        accessor.set(
            "get",
            dispatch_thunk(qualified.clone(), single(&qualified, &attr.getter)),
        );
        if let Some(setter) = &attr.setter {
            accessor.set(
                "set",
                dispatch_thunk(qualified.clone(), single(&qualified, setter)),
            );
        }
        attributes.set(&attr.name, accessor);
    }

    table.set(INDEX, Function::new(format!("{}.__index", class), index_hook));
    table.set(
        NEW_INDEX,
        Function::new(format!("{}.__newindex", class), new_index_hook),
    );

    let meta = Table::new();
    meta.set(MetaMethod::Call.name(), constructor_thunk(descriptor, true));
    table.set_metatable(Some(meta));
    Ok(())
}

fn single(name: &str, binding: &Rc<dyn Binding>) -> OverloadSet<dyn Binding> {
    let mut set = OverloadSet::new(name);
    set.push(OverloadEntry::new(Rc::clone(binding)));
    set
}

/// A function resolving `set` against its arguments on every call.
pub(crate) fn dispatch_thunk(name: String, set: OverloadSet<dyn Binding>) -> Function {
    Function::new(name.clone(), move |vm, args| {
        let state = context_state(vm)?;
        overload::dispatch(vm, &state, &name, &set, args)
    })
}

fn constructor_thunk(descriptor: &TypeDescriptor<dyn Binding>, strip_callee: bool) -> Function {
    let set = descriptor.constructors().clone();
    let name = descriptor.name().to_string();
    Function::new(name.clone(), move |vm, mut args| {
        if strip_callee && !args.is_empty() {
            args.remove(0);
        }
        if set.is_empty() {
            return Err(vm.error(format!("'{}' has no registered constructor", name)));
        }
        let state = context_state(vm)?;
        overload::dispatch(vm, &state, &name, &set, args)
    })
}

/// The accessor table `__attributes[key]` of a class, if `key` names an attribute.
fn attribute(class: &Table, key: &Value) -> Option<Table> {
    let attributes = class.get(ATTRIBUTES);
    attributes.as_table()?.raw_get(key).as_table().cloned()
}

fn index_hook(vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let mut args = args.into_iter();
    let object = args.next().unwrap_or_default();
    let key = args.next().unwrap_or_default();
    let Some(userdata) = object.as_userdata() else {
        return Ok(vec![Value::Nil]);
    };

    let storage = userdata
        .borrow::<ObjectHandle>()
        .and_then(|h| h.storage().cloned());
    if let Some(storage) = storage {
        let v = storage.raw_get(&key);
        if !v.is_nil() {
            return Ok(vec![v]);
        }
    }

    let Some(class) = userdata.metatable() else {
        return Ok(vec![Value::Nil]);
    };
    let v = class.raw_get(&key);
    if !v.is_nil() {
        return Ok(vec![v]);
    }

    if let Some(accessor) = attribute(&class, &key) {
        let getter = accessor.get("get");
        let out = vm.call(&getter, vec![object.clone()])?;
        return Ok(vec![out.into_iter().next().unwrap_or_default()]);
    }
    Ok(vec![Value::Nil])
}

fn new_index_hook(vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let mut args = args.into_iter();
    let object = args.next().unwrap_or_default();
    let key = args.next().unwrap_or_default();
    let value = args.next().unwrap_or_default();
    let Some(userdata) = object.as_userdata() else {
        return Err(vm.error(format!(
            "attempt to index a {} value (field '{}')",
            object.type_name(),
            key
        )));
    };

    if let Some(accessor) = userdata.metatable().and_then(|c| attribute(&c, &key)) {
        let setter = accessor.get("set");
        if setter.is_nil() {
            let class = userdata
                .borrow::<ObjectHandle>()
                .map(|h| h.type_name().to_string())
                .unwrap_or_default();
            return Err(vm.error(format!("attribute '{}' of '{}' is read-only", key, class)));
        }
        vm.call(&setter, vec![object.clone(), value])?;
        return Ok(Vec::new());
    }

    let storage = userdata
        .borrow_mut::<ObjectHandle>()
        .map(|mut h| h.storage_or_create());
    match storage {
        Some(storage) => storage.raw_set(key, value)?,
        None => return Err(vm.error("cannot write to an object that is in use")),
    }
    Ok(Vec::new())
}
