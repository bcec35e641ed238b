//! Registration API for host functions and types.
//!
//! - [`ClassBuilder`]: one host type with its constructors, methods,
//!   attributes, operators, bases and finalizer
//! - [`Module`]: classes, functions and values installed under a namespace
//! - [`IntoFunction`] / [`IntoMethod`] / [`IntoMethodMut`]: adapters turning
//!   closures into overload candidates
//!
//! ```text
//! ClassBuilder / Module -> Context::install -> TypeRegistry + class tables
//! ```

mod class_builder;
mod function;
mod module;

pub use class_builder::ClassBuilder;
pub use function::{IntoFunction, IntoMethod, IntoMethodMut};
pub use module::Module;
