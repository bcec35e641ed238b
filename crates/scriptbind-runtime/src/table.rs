//! Tables: the runtime's only structured value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use scriptbind_core::{ScriptError, ScriptResult};

use crate::value::{Key, Value};

/// Shared reference to a table.
///
/// Entries keep insertion order so iteration is deterministic.
#[derive(Clone, Default)]
pub struct Table(Rc<RefCell<TableData>>);

#[derive(Default)]
struct TableData {
    entries: Vec<(Key, Value)>,
    index: FxHashMap<Key, usize>,
    metatable: Option<Table>,
}

impl TableData {
    fn get(&self, key: &Key) -> Value {
        self.index
            .get(key)
            .map(|&i| self.entries[i].1.clone())
            .unwrap_or_default()
    }

    fn set(&mut self, key: Key, value: Value) {
        if value.is_nil() {
            self.remove(&key);
            return;
        }
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    fn remove(&mut self, key: &Key) {
        let Some(i) = self.index.remove(key) else {
            return;
        };
        self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
    }
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequence table `{v1, v2, ...}`.
    pub fn from_sequence(values: impl IntoIterator<Item = Value>) -> Self {
        let table = Table::new();
        for (i, value) in values.into_iter().enumerate() {
            table.0.borrow_mut().set(Key::Integer(i as i64 + 1), value);
        }
        table
    }

    /// Read without metamethods.
    pub fn raw_get(&self, key: &Value) -> Value {
        match Key::from_value(key) {
            Some(k) => self.0.borrow().get(&k),
            None => Value::Nil,
        }
    }

    /// Write without metamethods. Setting `nil` removes the entry.
    pub fn raw_set(&self, key: impl Into<Value>, value: impl Into<Value>) -> ScriptResult<()> {
        let key = key.into();
        let Some(k) = Key::from_value(&key) else {
            return Err(ScriptError::runtime(format!(
                "table index is {}",
                if key.is_nil() { "nil" } else { "NaN" }
            )));
        };
        self.0.borrow_mut().set(k, value.into());
        Ok(())
    }

    /// Read a string-keyed field without metamethods.
    pub fn get(&self, name: &str) -> Value {
        self.0.borrow().get(&Key::from(name))
    }

    /// Write a string-keyed field without metamethods.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.0.borrow_mut().set(Key::from(name), value.into());
    }

    /// Read an integer-keyed field without metamethods.
    pub fn get_index(&self, index: i64) -> Value {
        self.0.borrow().get(&Key::Integer(index))
    }

    /// Write an integer-keyed field without metamethods.
    pub fn set_index(&self, index: i64, value: impl Into<Value>) {
        self.0.borrow_mut().set(Key::Integer(index), value.into());
    }

    /// Whether the raw field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().index.contains_key(&Key::from(name))
    }

    /// Append at `len() + 1`.
    pub fn push(&self, value: impl Into<Value>) {
        let next = self.len() as i64 + 1;
        self.set_index(next, value);
    }

    /// Sequence length: the largest `n` such that `1..=n` are all present.
    pub fn len(&self) -> usize {
        let data = self.0.borrow();
        let mut n = 0usize;
        while data.index.contains_key(&Key::Integer(n as i64 + 1)) {
            n += 1;
        }
        n
    }

    /// Whether the table has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    /// Number of entries, sequence and hash part combined.
    pub fn entry_count(&self) -> usize {
        self.0.borrow().entries.len()
    }

    /// Snapshot of all entries in insertion order.
    pub fn pairs(&self) -> Vec<(Value, Value)> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.to_value(), v.clone()))
            .collect()
    }

    /// Snapshot of the sequence part `t[1..=len]`.
    pub fn sequence_values(&self) -> Vec<Value> {
        (1..=self.len() as i64).map(|i| self.get_index(i)).collect()
    }

    /// The metatable, if any.
    pub fn metatable(&self) -> Option<Table> {
        self.0.borrow().metatable.clone()
    }

    /// Replace the metatable.
    pub fn set_metatable(&self, metatable: Option<Table>) {
        self.0.borrow_mut().metatable = metatable;
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address used as identity.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Table")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("entries", &data.entries.len())
            .field("has_metatable", &data.metatable.is_some())
            .finish()
    }
}
