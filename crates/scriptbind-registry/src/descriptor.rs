//! Per-type metadata.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use scriptbind_core::{Projection, TypeHash};

use crate::overload_set::{OverloadEntry, OverloadSet};

/// Hook run when a runtime-owned object is finalized, before the native
/// value is released.
pub type Finalizer = Rc<dyn Fn(&mut dyn Any)>;

/// Directed conversion `self -> target`.
#[derive(Clone, Debug)]
pub struct CastEdge {
    /// Type reached by the projection
    pub target: TypeHash,
    /// `&Self -> &Target` and its mutable twin
    pub projection: Projection,
}

/// Script-visible field backed by a getter and an optional setter.
pub struct AttributeDescriptor<B: ?Sized> {
    /// Field name
    pub name: String,
    /// Called with `(object)`, returns the value
    pub getter: Rc<B>,
    /// Called with `(object, value)`
    pub setter: Option<Rc<B>>,
}

impl<B: ?Sized> Clone for AttributeDescriptor<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            getter: Rc::clone(&self.getter),
            setter: self.setter.clone(),
        }
    }
}

/// Named overload sets kept in registration order.
pub struct OverloadTable<B: ?Sized> {
    sets: Vec<OverloadSet<B>>,
    index: FxHashMap<String, usize>,
}

impl<B: ?Sized> Default for OverloadTable<B> {
    fn default() -> Self {
        Self {
            sets: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<B: ?Sized> OverloadTable<B> {
    /// Append a candidate under `name`, creating the set on first use.
    pub fn push(&mut self, name: &str, entry: OverloadEntry<B>) {
        match self.index.get(name) {
            Some(&i) => self.sets[i].push(entry),
            None => {
                let mut set = OverloadSet::new(name);
                set.push(entry);
                self.index.insert(name.to_string(), self.sets.len());
                self.sets.push(set);
            }
        }
    }

    /// The set registered under `name`.
    pub fn get(&self, name: &str) -> Option<&OverloadSet<B>> {
        self.index.get(name).map(|&i| &self.sets[i])
    }

    /// Sets in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OverloadSet<B>> {
        self.sets.iter()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|s| s.name())
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Metadata for one registered host type.
///
/// Built once by the class builder, then owned by the registry and never
/// mutated.
pub struct TypeDescriptor<B: ?Sized> {
    hash: TypeHash,
    name: String,
    bases: Vec<TypeHash>,
    casts: Vec<CastEdge>,
    constructors: OverloadSet<B>,
    members: OverloadTable<B>,
    statics: OverloadTable<B>,
    attributes: Vec<AttributeDescriptor<B>>,
    finalizer: Option<Finalizer>,
}

impl<B: ?Sized> TypeDescriptor<B> {
    /// Empty descriptor for a type.
    pub fn new(hash: TypeHash, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash,
            constructors: OverloadSet::new(name.clone()),
            name,
            bases: Vec::new(),
            casts: Vec::new(),
            members: OverloadTable::default(),
            statics: OverloadTable::default(),
            attributes: Vec::new(),
            finalizer: None,
        }
    }

    // ==========================================================================
    // Construction
    // ==========================================================================

    /// Declare a direct base. The projection also becomes a cast edge.
    pub fn add_base(&mut self, base: TypeHash, projection: Projection) {
        self.bases.push(base);
        self.casts.push(CastEdge {
            target: base,
            projection,
        });
    }

    /// Declare a conversion that is not a base relationship.
    pub fn add_cast(&mut self, target: TypeHash, projection: Projection) {
        self.casts.push(CastEdge { target, projection });
    }

    /// Append an unnamed constructor (`Class(...)`).
    pub fn add_constructor(&mut self, entry: OverloadEntry<B>) {
        self.constructors.push(entry);
    }

    /// Append a method candidate.
    pub fn add_member(&mut self, name: &str, entry: OverloadEntry<B>) {
        self.members.push(name, entry);
    }

    /// Append a static function candidate, stored in the class table.
    pub fn add_static(&mut self, name: &str, entry: OverloadEntry<B>) {
        self.statics.push(name, entry);
    }

    /// Add or replace an attribute.
    pub fn add_attribute(&mut self, attribute: AttributeDescriptor<B>) {
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.name == attribute.name)
        {
            *existing = attribute;
        } else {
            self.attributes.push(attribute);
        }
    }

    /// Install the finalization hook.
    pub fn set_finalizer(&mut self, finalizer: Finalizer) {
        self.finalizer = Some(finalizer);
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// Stable identity.
    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    /// Script-visible name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct bases in declaration order.
    pub fn bases(&self) -> &[TypeHash] {
        &self.bases
    }

    /// Outgoing cast edges: bases first, then custom casts, in declaration order.
    pub fn casts(&self) -> &[CastEdge] {
        &self.casts
    }

    /// Unnamed constructors.
    pub fn constructors(&self) -> &OverloadSet<B> {
        &self.constructors
    }

    /// Methods by name.
    pub fn members(&self) -> &OverloadTable<B> {
        &self.members
    }

    /// Look up one method set.
    pub fn member(&self, name: &str) -> Option<&OverloadSet<B>> {
        self.members.get(name)
    }

    /// Statics and named constructors by name.
    pub fn statics(&self) -> &OverloadTable<B> {
        &self.statics
    }

    /// Look up one static set.
    pub fn static_fn(&self, name: &str) -> Option<&OverloadSet<B>> {
        self.statics.get(name)
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[AttributeDescriptor<B>] {
        &self.attributes
    }

    /// Look up one attribute.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor<B>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The finalization hook.
    pub fn finalizer(&self) -> Option<&Finalizer> {
        self.finalizer.as_ref()
    }

    /// Whether a finalization hook is installed.
    pub fn has_finalizer(&self) -> bool {
        self.finalizer.is_some()
    }

    /// Every script-visible key this type defines itself.
    pub fn own_keys(&self) -> impl Iterator<Item = &str> {
        self.members
            .names()
            .chain(self.statics.names())
            .chain(self.attributes.iter().map(|a| a.name.as_str()))
    }
}

impl<B: ?Sized> fmt::Debug for TypeDescriptor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("hash", &self.hash)
            .field("name", &self.name)
            .field("bases", &self.bases)
            .field("constructors", &self.constructors.len())
            .field("members", &self.members.len())
            .field("statics", &self.statics.len())
            .field("attributes", &self.attributes.len())
            .field("has_finalizer", &self.has_finalizer())
            .finish()
    }
}
