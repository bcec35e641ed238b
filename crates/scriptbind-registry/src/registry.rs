//! TypeRegistry - per-context storage of registered host types.
//!
//! Each registered type owns its immutable [`TypeDescriptor`] and the class
//! table generated for it. The class table is pinned with a registry
//! reference so it stays alive as long as the registry does, independently
//! of whatever global name script code binds it to.
//!
//! # Class table layout
//!
//! ```text
//! __typeID      integer tag of the TypeHash
//! __className   script-visible name
//! __attributes  name -> { get = fn, set = fn? }
//! __bases       sequence of direct base class tables
//! __index       instance read hook   (filled by the bridge)
//! __newindex    instance write hook  (filled by the bridge)
//! <members>     dispatch thunks
//! <statics>     dispatch thunks
//! ```
//!
//! After the type's own entries are written, every base's entries that the
//! type does not define are copied in, so member lookup on an instance is a
//! single table lookup.
//!
//! # Thread Safety
//!
//! Not thread-safe; the registry lives inside one runtime context.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use scriptbind_core::{ConfigurationError, Cost, ScriptResult, TypeHash};
use scriptbind_runtime::{RegistryKey, Table, Value, Vm};

use crate::cast_graph::{CastGraph, CastPath};
use crate::descriptor::TypeDescriptor;
use crate::reserved::{self, ATTRIBUTES, BASES, CLASS_NAME, NOT_INHERITED, TYPE_ID};

/// Default bound on cast chain length.
pub const DEFAULT_MAX_CAST_DEPTH: usize = 16;

/// A registered type: descriptor plus its generated class table.
pub struct RegisteredType<B: ?Sized> {
    descriptor: Rc<TypeDescriptor<B>>,
    class_table: Table,
    class_ref: RegistryKey,
}

impl<B: ?Sized> RegisteredType<B> {
    /// The immutable metadata.
    pub fn descriptor(&self) -> &Rc<TypeDescriptor<B>> {
        &self.descriptor
    }

    /// The generated class table, also the metatable of every instance.
    pub fn class_table(&self) -> &Table {
        &self.class_table
    }

    /// Registry reference pinning the class table.
    pub fn class_ref(&self) -> RegistryKey {
        self.class_ref
    }
}

/// Per-context type registry.
pub struct TypeRegistry<B: ?Sized> {
    types: FxHashMap<TypeHash, RegisteredType<B>>,
    by_name: FxHashMap<String, TypeHash>,
    order: Vec<TypeHash>,
    casts: CastGraph,
    max_cast_depth: usize,
}

impl<B: ?Sized> Default for TypeRegistry<B> {
    fn default() -> Self {
        Self {
            types: FxHashMap::default(),
            by_name: FxHashMap::default(),
            order: Vec::new(),
            casts: CastGraph::new(),
            max_cast_depth: DEFAULT_MAX_CAST_DEPTH,
        }
    }
}

impl<B: ?Sized> TypeRegistry<B> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound cast searches to `depth` edges.
    pub fn set_max_cast_depth(&mut self, depth: usize) {
        self.max_cast_depth = depth;
    }

    /// Current cast depth bound.
    pub fn max_cast_depth(&self) -> usize {
        self.max_cast_depth
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Check a descriptor against the current registry contents.
    pub fn validate(&self, descriptor: &TypeDescriptor<B>) -> Result<(), ConfigurationError> {
        if self.types.contains_key(&descriptor.hash()) || self.by_name.contains_key(descriptor.name())
        {
            return Err(ConfigurationError::DuplicateType {
                name: descriptor.name().to_string(),
            });
        }
        if let Some(&missing) = descriptor
            .bases()
            .iter()
            .find(|b| !self.types.contains_key(*b))
        {
            return Err(ConfigurationError::UnregisteredBase {
                type_name: descriptor.name().to_string(),
                base: missing.to_string(),
            });
        }
        if let Some(member) = descriptor.own_keys().find(|k| reserved::is_reserved(k)) {
            return Err(ConfigurationError::ReservedName {
                type_name: descriptor.name().to_string(),
                member: member.to_string(),
            });
        }
        Ok(())
    }

    /// Register a type and build its class table.
    ///
    /// `populate` writes the type's own entries (dispatch thunks, attribute
    /// accessors, instance hooks) into the fresh table; bookkeeping keys and
    /// base inheritance are handled here.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn register_type<F>(
        &mut self,
        vm: &mut Vm,
        descriptor: TypeDescriptor<B>,
        populate: F,
    ) -> ScriptResult<Table>
    where
        F: FnOnce(&Rc<TypeDescriptor<B>>, &Table) -> ScriptResult<()>,
    {
        self.validate(&descriptor)?;
        let descriptor = Rc::new(descriptor);
        let hash = descriptor.hash();

        let table = Table::new();
        table.set(TYPE_ID, Value::Integer(hash.to_tag()));
        table.set(CLASS_NAME, descriptor.name());
        table.set(ATTRIBUTES, Table::new());

        populate(&descriptor, &table)?;

        let bases = Table::new();
        for base in descriptor.bases() {
            let base_table = self
                .class_table(*base)
                .ok_or_else(|| ConfigurationError::UnregisteredBase {
                    type_name: descriptor.name().to_string(),
                    base: base.to_string(),
                })?
                .clone();
            inherit_members(&table, &base_table, &NOT_INHERITED)?;
            bases.push(base_table);
        }
        table.set(BASES, bases);

        self.casts.add_type(hash);
        for edge in descriptor.casts() {
            self.casts.add_edge(hash, edge.target, edge.projection.clone());
        }

        let class_ref = vm.create_ref(Value::Table(table.clone()));
        tracing::debug!(
            "registered type '{}' ({}) with {} bases, {} members, {} statics, {} attributes",
            descriptor.name(),
            hash,
            descriptor.bases().len(),
            descriptor.members().len(),
            descriptor.statics().len(),
            descriptor.attributes().len()
        );

        self.by_name.insert(descriptor.name().to_string(), hash);
        self.order.push(hash);
        self.types.insert(
            hash,
            RegisteredType {
                descriptor,
                class_table: table.clone(),
                class_ref,
            },
        );
        Ok(table)
    }

    /// Release every pinned class table.
    pub fn release(&mut self, vm: &mut Vm) {
        for registered in self.types.values() {
            vm.release_ref(registered.class_ref);
        }
        self.types.clear();
        self.by_name.clear();
        self.order.clear();
        self.casts = CastGraph::new();
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Full registration record.
    pub fn get(&self, hash: TypeHash) -> Option<&RegisteredType<B>> {
        self.types.get(&hash)
    }

    /// Metadata by type identity.
    pub fn lookup(&self, hash: TypeHash) -> Option<&TypeDescriptor<B>> {
        self.types.get(&hash).map(|t| &*t.descriptor)
    }

    /// Shared handle to the metadata, usable after the registry borrow ends.
    pub fn descriptor(&self, hash: TypeHash) -> Option<Rc<TypeDescriptor<B>>> {
        self.types.get(&hash).map(|t| Rc::clone(&t.descriptor))
    }

    /// Metadata by script-visible name.
    pub fn lookup_by_name(&self, name: &str) -> Option<&TypeDescriptor<B>> {
        self.by_name.get(name).and_then(|h| self.lookup(*h))
    }

    /// Type identity by script-visible name.
    pub fn hash_of(&self, name: &str) -> Option<TypeHash> {
        self.by_name.get(name).copied()
    }

    /// Script-visible name, or the hash rendered as text for unknown types.
    pub fn type_name(&self, hash: TypeHash) -> String {
        self.lookup(hash)
            .map(|d| d.name().to_string())
            .unwrap_or_else(|| hash.to_string())
    }

    /// The class table of a registered type.
    pub fn class_table(&self, hash: TypeHash) -> Option<&Table> {
        self.types.get(&hash).map(|t| &t.class_table)
    }

    /// Identify a class table generated by this registry.
    pub fn hash_of_class(&self, table: &Table) -> Option<TypeHash> {
        let tag = match table.get(TYPE_ID) {
            Value::Integer(tag) => tag,
            _ => return None,
        };
        let hash = TypeHash::from_tag(tag);
        self.class_table(hash)
            .filter(|t| t.ptr_eq(table))
            .map(|_| hash)
    }

    /// Whether a type is registered.
    pub fn contains(&self, hash: TypeHash) -> bool {
        self.types.contains_key(&hash)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredType<B>> {
        self.order.iter().filter_map(|h| self.types.get(h))
    }

    // ==========================================================================
    // Casts
    // ==========================================================================

    /// Shortest cast from `from` to `to` within the depth bound.
    pub fn find_cast(&self, from: TypeHash, to: TypeHash) -> Option<CastPath> {
        self.casts.find_path(from, to, self.max_cast_depth)
    }

    /// Scoring cost of viewing a `from` object as `to`.
    pub fn cast_cost(&self, from: TypeHash, to: TypeHash) -> Cost {
        self.find_cast(from, to)
            .map(|p| p.cost())
            .unwrap_or(Cost::IMPOSSIBLE)
    }

    /// Whether a `recorded` object can be used as `target`.
    ///
    /// Strict mode accepts only the exact type.
    pub fn is_of_type(&self, recorded: TypeHash, target: TypeHash, strict: bool) -> bool {
        if recorded == target {
            return true;
        }
        !strict && self.find_cast(recorded, target).is_some()
    }
}

impl<B: ?Sized> std::fmt::Debug for TypeRegistry<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("casts", &self.casts)
            .field("max_cast_depth", &self.max_cast_depth)
            .finish()
    }
}

/// Copy entries of `base` into `derived` that `derived` does not define.
///
/// Keys listed in `skip` are never copied. `__attributes` tables are merged
/// key by key, again keeping the derived entries.
pub fn inherit_members(derived: &Table, base: &Table, skip: &[&str]) -> ScriptResult<()> {
    for (key, value) in base.pairs() {
        if let Some(name) = key.as_str() {
            if skip.contains(&name) {
                continue;
            }
            if name == ATTRIBUTES {
                merge_attributes(derived, &value)?;
                continue;
            }
        }
        if derived.raw_get(&key).is_nil() {
            derived.raw_set(key, value)?;
        }
    }
    Ok(())
}

fn merge_attributes(derived: &Table, base_attributes: &Value) -> ScriptResult<()> {
    let Some(base_attributes) = base_attributes.as_table() else {
        return Ok(());
    };
    let own = match derived.get(ATTRIBUTES) {
        Value::Table(t) => t,
        _ => {
            let t = Table::new();
            derived.set(ATTRIBUTES, t.clone());
            t
        }
    };
    for (key, value) in base_attributes.pairs() {
        if own.raw_get(&key).is_nil() {
            own.raw_set(key, value)?;
        }
    }
    Ok(())
}
