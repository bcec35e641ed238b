//! Type registry and cast graph for scriptbind.
//!
//! The registry is generic over the binding type `B` so it can store
//! overload candidates without knowing how they are invoked; the bridge
//! instantiates it with its `dyn Binding` trait object.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use scriptbind_core::TypeHash;
//! use scriptbind_registry::{OverloadEntry, TypeDescriptor, TypeRegistry};
//! use scriptbind_runtime::Vm;
//!
//! struct Point;
//!
//! let mut vm = Vm::new();
//! let mut registry: TypeRegistry<str> = TypeRegistry::new();
//! let mut desc = TypeDescriptor::new(TypeHash::of::<Point>(), "Point");
//! desc.add_member("length", OverloadEntry::new(Rc::from("Point.length")));
//!
//! let table = registry
//!     .register_type(&mut vm, desc, |_, _| Ok(()))
//!     .unwrap();
//! assert_eq!(table.get("__className").as_str(), Some("Point"));
//! assert!(registry.lookup_by_name("Point").is_some());
//! ```

mod cast_graph;
mod descriptor;
mod overload_set;
mod registry;
pub mod reserved;

pub use cast_graph::{CastGraph, CastPath};
pub use descriptor::{AttributeDescriptor, CastEdge, Finalizer, OverloadTable, TypeDescriptor};
pub use overload_set::{OverloadEntry, OverloadSet};
pub use registry::{DEFAULT_MAX_CAST_DEPTH, RegisteredType, TypeRegistry, inherit_members};
