//! Script-side class helpers, installed as the `scriptbind` global table.
//!
//! - `scriptbind.class(Base1, Base2, ...)` creates a class table. Entries of
//!   the bases are merged into it (first base wins, host hooks excluded).
//!   `__bases` lists the bases. Calling the class creates an instance and
//!   runs `__init(self, ...)` when present.
//! - `scriptbind.isBaseOf(base, class)` walks `__bases` recursively.
//! - `scriptbind.isInstanceOf(object, class)` checks the object's metatable.
//!
//! Registered host classes carry `__bases` too, so both helpers also work on
//! them and on handles.

use rustc_hash::FxHashSet;
use scriptbind_core::ScriptResult;
use scriptbind_registry::reserved::{BASES, INDEX, INIT, NOT_INHERITED};
use scriptbind_runtime::{Function, MetaMethod, Table, Value, Vm};

/// Name of the helper table in the globals.
pub const HELPER_TABLE: &str = "scriptbind";

/// Install the helper table into the globals.
pub(crate) fn install(vm: &Vm) {
    let helpers = Table::new();
    helpers.set("class", Function::new("scriptbind.class", class));
    helpers.set("isBaseOf", Function::new("scriptbind.isBaseOf", is_base_of_fn));
    helpers.set(
        "isInstanceOf",
        Function::new("scriptbind.isInstanceOf", is_instance_of_fn),
    );
    vm.globals().set(HELPER_TABLE, helpers);
}

fn class(vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let mut bases = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Table(t) => bases.push(t.clone()),
            other => {
                return Err(vm.error(format!(
                    "bad argument #{} to 'class' (table expected, got {})",
                    i + 1,
                    other.type_name()
                )));
            }
        }
    }

    let class = Table::new();
    class.set(BASES, Table::from_sequence(bases.iter().cloned().map(Value::Table)));
    class.set(INDEX, Function::new("class.__index", instance_index));

    let meta = Table::new();
    meta.set(MetaMethod::Call.name(), Function::new("class", construct));
    class.set_metatable(Some(meta));

    for base in &bases {
        for (key, value) in base.pairs() {
            if key.as_str().is_some_and(|k| NOT_INHERITED.contains(&k)) {
                continue;
            }
            if class.raw_get(&key).is_nil() {
                class.raw_set(key, value)?;
            }
        }
    }
    Ok(vec![Value::Table(class)])
}

/// `__index` of script classes: a raw lookup in the instance's class.
///
/// The class is read from the metatable at call time rather than captured,
/// so the class table does not keep itself alive.
fn instance_index(vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let object = args.first().cloned().unwrap_or_default();
    let key = args.get(1).cloned().unwrap_or_default();
    let value = vm
        .metatable_of(&object)
        .map(|class| class.raw_get(&key))
        .unwrap_or_default();
    Ok(vec![value])
}

/// `__call` of script classes: `Class(...)` with the class as first argument.
fn construct(vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let mut args = args.into_iter();
    let Some(Value::Table(class)) = args.next() else {
        return Err(vm.error("class constructor called without a class"));
    };
    let instance = Table::new();
    instance.set_metatable(Some(class.clone()));
    let instance = Value::Table(instance);

    let init = class.get(INIT);
    if !init.is_nil() {
        let mut init_args = vec![instance.clone()];
        init_args.extend(args);
        vm.call(&init, init_args)?;
    }
    Ok(vec![instance])
}

/// Whether `base` is `class` or one of its transitive bases.
pub fn is_base_of(base: &Table, class: &Table) -> bool {
    let mut visited = FxHashSet::default();
    search_bases(base, class, &mut visited)
}

fn search_bases(base: &Table, class: &Table, visited: &mut FxHashSet<usize>) -> bool {
    if base.ptr_eq(class) {
        return true;
    }
    if !visited.insert(class.addr()) {
        return false;
    }
    let Value::Table(bases) = class.raw_get(&Value::string(BASES)) else {
        return false;
    };
    bases
        .sequence_values()
        .iter()
        .filter_map(Value::as_table)
        .any(|b| search_bases(base, b, visited))
}

/// Whether `object`'s class is `class` or derives from it.
pub fn is_instance_of(vm: &Vm, object: &Value, class: &Table) -> bool {
    vm.metatable_of(object)
        .is_some_and(|meta| is_base_of(class, &meta))
}

fn is_base_of_fn(_: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let result = match (args.first(), args.get(1)) {
        (Some(Value::Table(base)), Some(Value::Table(class))) => is_base_of(base, class),
        _ => false,
    };
    Ok(vec![Value::Boolean(result)])
}

fn is_instance_of_fn(vm: &mut Vm, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
    let result = match (args.first(), args.get(1)) {
        (Some(object), Some(Value::Table(class))) => is_instance_of(vm, object, class),
        _ => false,
    };
    Ok(vec![Value::Boolean(result)])
}
