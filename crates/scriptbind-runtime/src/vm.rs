//! The runtime state and its primitive operations.
//!
//! `Vm` implements exactly the operations the bridge consumes: indexing with
//! `__index`/`__newindex` chains, calls with `__call`, metamethod-driven
//! arithmetic and comparison, persistent registry references and
//! tracebacks. There is no parser and no bytecode; script behavior is
//! expressed as native closures stored in tables.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use scriptbind_core::{ScriptError, ScriptResult};

use crate::refs::{RegistryKey, RegistryRefs};
use crate::value::float_to_integer;
use crate::{Function, Table, Value};

/// Default bound on `__index`/`__newindex` chains.
pub const DEFAULT_MAX_META_CHAIN: usize = 100;

/// Default bound on nested native calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Metamethod keys understood by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaMethod {
    Index,
    NewIndex,
    Call,
    Gc,
    Eq,
    Lt,
    Le,
    Add,
    Sub,
    Mul,
    Div,
    Unm,
    Concat,
    Len,
    ToString,
}

impl MetaMethod {
    /// The metatable key, e.g. `"__add"`.
    pub fn name(self) -> &'static str {
        match self {
            MetaMethod::Index => "__index",
            MetaMethod::NewIndex => "__newindex",
            MetaMethod::Call => "__call",
            MetaMethod::Gc => "__gc",
            MetaMethod::Eq => "__eq",
            MetaMethod::Lt => "__lt",
            MetaMethod::Le => "__le",
            MetaMethod::Add => "__add",
            MetaMethod::Sub => "__sub",
            MetaMethod::Mul => "__mul",
            MetaMethod::Div => "__div",
            MetaMethod::Unm => "__unm",
            MetaMethod::Concat => "__concat",
            MetaMethod::Len => "__len",
            MetaMethod::ToString => "__tostring",
        }
    }

    /// Look up a metamethod by key.
    pub fn from_name(name: &str) -> Option<MetaMethod> {
        Some(match name {
            "__index" => MetaMethod::Index,
            "__newindex" => MetaMethod::NewIndex,
            "__call" => MetaMethod::Call,
            "__gc" => MetaMethod::Gc,
            "__eq" => MetaMethod::Eq,
            "__lt" => MetaMethod::Lt,
            "__le" => MetaMethod::Le,
            "__add" => MetaMethod::Add,
            "__sub" => MetaMethod::Sub,
            "__mul" => MetaMethod::Mul,
            "__div" => MetaMethod::Div,
            "__unm" => MetaMethod::Unm,
            "__concat" => MetaMethod::Concat,
            "__len" => MetaMethod::Len,
            "__tostring" => MetaMethod::ToString,
            _ => return None,
        })
    }

    /// Whether this is one of the binary or unary arithmetic events.
    pub fn is_arith(self) -> bool {
        matches!(
            self,
            MetaMethod::Add
                | MetaMethod::Sub
                | MetaMethod::Mul
                | MetaMethod::Div
                | MetaMethod::Unm
                | MetaMethod::Concat
        )
    }
}

/// Runtime state.
pub struct Vm {
    globals: Table,
    registry: Table,
    refs: RegistryRefs,
    frames: Vec<Rc<str>>,
    app_data: FxHashMap<TypeId, Rc<dyn Any>>,
    max_meta_chain: usize,
    max_call_depth: usize,
}

impl Vm {
    /// Create a runtime with empty globals.
    pub fn new() -> Self {
        let globals = Table::new();
        globals.set("_G", globals.clone());
        Self {
            globals,
            registry: Table::new(),
            refs: RegistryRefs::new(),
            frames: Vec::new(),
            app_data: FxHashMap::default(),
            max_meta_chain: DEFAULT_MAX_META_CHAIN,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// The global table.
    pub fn globals(&self) -> &Table {
        &self.globals
    }

    /// The registry table, private to host code.
    pub fn registry(&self) -> &Table {
        &self.registry
    }

    /// Bound the length of `__index`/`__newindex` chains.
    pub fn set_max_meta_chain(&mut self, limit: usize) {
        self.max_meta_chain = limit.max(1);
    }

    /// Bound the depth of nested calls.
    pub fn set_max_call_depth(&mut self, limit: usize) {
        self.max_call_depth = limit.max(1);
    }

    // ========================================================================
    // App data
    // ========================================================================

    /// Attach host state, one value per type.
    pub fn set_app_data<T: Any>(&mut self, data: Rc<T>) -> Option<Rc<dyn Any>> {
        self.app_data.insert(TypeId::of::<T>(), data)
    }

    /// Fetch host state attached with [`Vm::set_app_data`].
    pub fn app_data<T: Any>(&self) -> Option<Rc<T>> {
        self.app_data
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|rc| rc.downcast::<T>().ok())
    }

    /// Detach host state.
    pub fn remove_app_data<T: Any>(&mut self) -> Option<Rc<dyn Any>> {
        self.app_data.remove(&TypeId::of::<T>())
    }

    // ========================================================================
    // Registry references
    // ========================================================================

    /// Pin a value so it survives independently of script references.
    pub fn create_ref(&mut self, value: Value) -> RegistryKey {
        self.refs.insert(value)
    }

    /// Read a pinned value. Stale keys read as nil.
    pub fn get_ref(&self, key: RegistryKey) -> Value {
        self.refs.get(key).cloned().unwrap_or_default()
    }

    /// Unpin a value.
    pub fn release_ref(&mut self, key: RegistryKey) -> bool {
        self.refs.remove(key).is_some()
    }

    /// Number of pinned values.
    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    // ========================================================================
    // Metatables
    // ========================================================================

    /// The metatable of a table or userdata.
    pub fn metatable_of(&self, value: &Value) -> Option<Table> {
        match value {
            Value::Table(t) => t.metatable(),
            Value::UserData(u) => u.metatable(),
            _ => None,
        }
    }

    /// A raw metatable field, nil when absent.
    pub fn metafield(&self, value: &Value, event: MetaMethod) -> Value {
        self.metatable_of(value)
            .map(|mt| mt.get(event.name()))
            .unwrap_or_default()
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    /// `obj[key]` with `__index` handling.
    pub fn index(&mut self, obj: &Value, key: &Value) -> ScriptResult<Value> {
        let mut current = obj.clone();
        for _ in 0..self.max_meta_chain {
            let handler = match &current {
                Value::Table(t) => {
                    let raw = t.raw_get(key);
                    if !raw.is_nil() {
                        return Ok(raw);
                    }
                    let handler = self.metafield(&current, MetaMethod::Index);
                    if handler.is_nil() {
                        return Ok(Value::Nil);
                    }
                    handler
                }
                other => {
                    let handler = self.metafield(other, MetaMethod::Index);
                    if handler.is_nil() {
                        return Err(self.error(format!(
                            "attempt to index a {} value (field '{}')",
                            other.type_name(),
                            key
                        )));
                    }
                    handler
                }
            };
            if let Value::Function(_) = handler {
                let out = self.call(&handler, vec![current, key.clone()])?;
                return Ok(out.into_iter().next().unwrap_or_default());
            }
            current = handler;
        }
        Err(self.error(format!("'__index' chain too long; possible loop (field '{}')", key)))
    }

    /// Shorthand for string-keyed [`Vm::index`].
    pub fn get_field(&mut self, obj: &Value, name: &str) -> ScriptResult<Value> {
        self.index(obj, &Value::string(name))
    }

    /// `obj[key] = value` with `__newindex` handling.
    pub fn new_index(&mut self, obj: &Value, key: &Value, value: Value) -> ScriptResult<()> {
        let mut current = obj.clone();
        for _ in 0..self.max_meta_chain {
            let handler = match &current {
                Value::Table(t) => {
                    if !t.raw_get(key).is_nil() {
                        return t.raw_set(key.clone(), value);
                    }
                    let handler = self.metafield(&current, MetaMethod::NewIndex);
                    if handler.is_nil() {
                        return t.raw_set(key.clone(), value);
                    }
                    handler
                }
                other => {
                    let handler = self.metafield(other, MetaMethod::NewIndex);
                    if handler.is_nil() {
                        return Err(self.error(format!(
                            "attempt to index a {} value (field '{}')",
                            other.type_name(),
                            key
                        )));
                    }
                    handler
                }
            };
            if let Value::Function(_) = handler {
                self.call(&handler, vec![current, key.clone(), value])?;
                return Ok(());
            }
            current = handler;
        }
        Err(self.error(format!(
            "'__newindex' chain too long; possible loop (field '{}')",
            key
        )))
    }

    /// Shorthand for string-keyed [`Vm::new_index`].
    pub fn set_field(&mut self, obj: &Value, name: &str, value: Value) -> ScriptResult<()> {
        self.new_index(obj, &Value::string(name), value)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Call a function, or a value with a `__call` metamethod.
    ///
    /// Errors leaving a native frame carry the traceback captured at that frame.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
        match callee {
            Value::Function(f) => self.call_function(f, args),
            other => {
                let handler = self.metafield(other, MetaMethod::Call);
                match handler {
                    Value::Function(f) => {
                        let mut full = Vec::with_capacity(args.len() + 1);
                        full.push(other.clone());
                        full.extend(args);
                        self.call_function(&f, full)
                    }
                    _ => Err(self.error(format!("attempt to call a {} value", other.type_name()))),
                }
            }
        }
    }

    /// Call a function value.
    pub fn call_function(&mut self, f: &Function, args: Vec<Value>) -> ScriptResult<Vec<Value>> {
        if self.frames.len() >= self.max_call_depth {
            return Err(self.error("stack overflow"));
        }
        self.frames.push(Rc::from(f.name()));
        let result = f.call_raw(self, args);
        let result = result.map_err(|e| e.with_traceback(self.traceback()));
        self.frames.pop();
        result
    }

    /// Call a method: `obj:name(args...)`.
    pub fn call_method(
        &mut self,
        obj: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> ScriptResult<Vec<Value>> {
        let method = self.get_field(obj, name)?;
        if method.is_nil() {
            return Err(self.error(format!(
                "attempt to call a nil value (method '{}')",
                name
            )));
        }
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(obj.clone());
        full.extend(args);
        self.call(&method, full)
    }

    /// Current call depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Render the active frames, innermost first.
    pub fn traceback(&self) -> String {
        let mut out = String::from("stack traceback:");
        for name in self.frames.iter().rev() {
            out.push_str("\n\t[native]: in function '");
            out.push_str(name);
            out.push('\'');
        }
        out
    }

    /// Build a runtime error carrying the current traceback.
    pub fn error(&self, message: impl Into<String>) -> ScriptError {
        let err = ScriptError::runtime(message);
        if self.frames.is_empty() {
            err
        } else {
            err.with_traceback(self.traceback())
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// Arithmetic and concatenation. `__unm` handlers receive only `a`.
    pub fn arith(&mut self, op: MetaMethod, a: &Value, b: &Value) -> ScriptResult<Value> {
        if let Some(v) = raw_arith(op, a, b) {
            return Ok(v);
        }
        let mut handler = self.metafield(a, op);
        if handler.is_nil() {
            handler = self.metafield(b, op);
        }
        if handler.is_nil() {
            let culprit = if raw_arith_operand(op, a) { b } else { a };
            let verb = if op == MetaMethod::Concat {
                "concatenate"
            } else {
                "perform arithmetic on"
            };
            return Err(self.error(format!("attempt to {} a {} value", verb, culprit.type_name())));
        }
        let args = if op == MetaMethod::Unm {
            vec![a.clone()]
        } else {
            vec![a.clone(), b.clone()]
        };
        let out = self.call(&handler, args)?;
        Ok(out.into_iter().next().unwrap_or_default())
    }

    /// Comparison through `__eq`, `__lt`, `__le`.
    pub fn compare(&mut self, op: MetaMethod, a: &Value, b: &Value) -> ScriptResult<bool> {
        match op {
            MetaMethod::Eq => {
                if a.raw_equal(b) {
                    return Ok(true);
                }
                let comparable = matches!(
                    (a, b),
                    (Value::Table(_), Value::Table(_)) | (Value::UserData(_), Value::UserData(_))
                );
                if !comparable {
                    return Ok(false);
                }
                self.compare_meta(op, a, b).map(|r| r.unwrap_or(false))
            }
            MetaMethod::Lt | MetaMethod::Le => {
                if let Some(ord) = raw_order(a, b) {
                    return Ok(match op {
                        MetaMethod::Lt => ord.is_lt(),
                        _ => ord.is_le(),
                    });
                }
                match self.compare_meta(op, a, b)? {
                    Some(r) => Ok(r),
                    None => Err(self.error(format!(
                        "attempt to compare {} with {}",
                        a.type_name(),
                        b.type_name()
                    ))),
                }
            }
            other => Err(self.error(format!("'{}' is not a comparison", other.name()))),
        }
    }

    fn compare_meta(&mut self, op: MetaMethod, a: &Value, b: &Value) -> ScriptResult<Option<bool>> {
        let mut handler = self.metafield(a, op);
        if handler.is_nil() {
            handler = self.metafield(b, op);
        }
        if handler.is_nil() {
            return Ok(None);
        }
        let out = self.call(&handler, vec![a.clone(), b.clone()])?;
        Ok(Some(out.first().is_some_and(Value::is_truthy)))
    }

    /// Length operator with `__len`.
    pub fn len(&mut self, value: &Value) -> ScriptResult<Value> {
        let handler = self.metafield(value, MetaMethod::Len);
        if !handler.is_nil() {
            let out = self.call(&handler, vec![value.clone()])?;
            return Ok(out.into_iter().next().unwrap_or_default());
        }
        match value {
            Value::String(s) => Ok(Value::Integer(s.len() as i64)),
            Value::Table(t) => Ok(Value::Integer(t.len() as i64)),
            other => Err(self.error(format!(
                "attempt to get length of a {} value",
                other.type_name()
            ))),
        }
    }

    /// String conversion with `__tostring`.
    pub fn to_string(&mut self, value: &Value) -> ScriptResult<String> {
        let handler = self.metafield(value, MetaMethod::ToString);
        if handler.is_nil() {
            return Ok(value.to_string());
        }
        let out = self.call(&handler, vec![value.clone()])?;
        match out.into_iter().next() {
            Some(Value::String(s)) => Ok(s.to_string()),
            _ => Err(self.error("'__tostring' must return a string")),
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        // Break the `_G._G` cycle and release pinned values so finalizers run.
        self.refs.clear();
        self.globals.set("_G", Value::Nil);
        tracing::trace!("runtime closed with {} app data entries", self.app_data.len());
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("refs", &self.refs)
            .field("depth", &self.frames.len())
            .finish_non_exhaustive()
    }
}

fn raw_arith_operand(op: MetaMethod, v: &Value) -> bool {
    match op {
        MetaMethod::Concat => matches!(v, Value::String(_) | Value::Integer(_) | Value::Number(_)),
        _ => v.to_number().is_some(),
    }
}

fn raw_arith(op: MetaMethod, a: &Value, b: &Value) -> Option<Value> {
    match op {
        MetaMethod::Concat => {
            if raw_arith_operand(op, a) && raw_arith_operand(op, b) {
                Some(Value::string(format!("{}{}", a, b)))
            } else {
                None
            }
        }
        MetaMethod::Unm => match a {
            Value::Integer(i) => Some(Value::Integer(i.wrapping_neg())),
            other => other.to_number().map(|n| Value::Number(-n)),
        },
        MetaMethod::Add | MetaMethod::Sub | MetaMethod::Mul => {
            if let (Value::Integer(x), Value::Integer(y)) = (a, b) {
                return Some(Value::Integer(match op {
                    MetaMethod::Add => x.wrapping_add(*y),
                    MetaMethod::Sub => x.wrapping_sub(*y),
                    _ => x.wrapping_mul(*y),
                }));
            }
            let (x, y) = (a.to_number()?, b.to_number()?);
            Some(Value::Number(match op {
                MetaMethod::Add => x + y,
                MetaMethod::Sub => x - y,
                _ => x * y,
            }))
        }
        MetaMethod::Div => Some(Value::Number(a.to_number()? / b.to_number()?)),
        _ => None,
    }
}

fn raw_order(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::Integer(_) | Value::Number(_), Value::Integer(_) | Value::Number(_)) => {
            let (x, y) = (a.to_number()?, b.to_number()?);
            if let (Some(_), Some(_)) = (float_to_integer(x), float_to_integer(y)) {
                return a.to_integer()?.partial_cmp(&b.to_integer()?);
            }
            x.partial_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
