//! scriptbind: expose host types and functions to a dynamic scripting runtime.
//!
//! - [`ClassBuilder`] registers a host type: constructors, overloaded
//!   methods, attributes, operators, bases, casts and a finalizer
//! - [`Module`] groups classes, functions and values under a namespace
//! - [`Context`] owns the runtime and the bridge state, and is the host's
//!   entry point for calls, globals and pushing objects
//!
//! Calls from script resolve among overloads by scoring every candidate
//! against the dynamic arguments; the unique cheapest candidate wins.
//! Objects pushed to script keep their identity, and owned objects are
//! finalized once when the runtime drops the last handle.
//!
//! ```ignore
//! use scriptbind::prelude::*;
//!
//! let mut ctx = Context::new();
//! ctx.install(
//!     Module::new(&["util"])
//!         .function("clamp", |v: i64, lo: i64, hi: i64| v.clamp(lo, hi))
//!         .function("clamp", |v: f64, lo: f64, hi: f64| v.clamp(lo, hi)),
//! )?;
//! let n: i64 = ctx.call("util.clamp", (12, 0, 10))?;
//! ```

mod bridge;
mod config;
mod context;
mod convert;
mod ffi;
mod overload;
mod script_class;

pub use bridge::{IdentityTable, ObjectHandle, handle_of};
pub use config::ContextProperty;
pub use context::{Context, ContextState, context_state};
pub use convert::{
    Enum, FromScript, FromScriptMulti, HostError, IntoScript, IntoScriptMulti, MultiValue,
    NativeClass, Obj, ObjectWrapper, ScriptIter, Unowned, Variant2, Variant3, Variant4, Wrapped,
};
pub use ffi::{ClassBuilder, IntoFunction, IntoMethod, IntoMethodMut, Module};
pub use overload::{Binding, BindingFlags, CallArgs, NativeBinding, Ranking, Scored};
pub use script_class::{HELPER_TABLE, is_base_of, is_instance_of};

pub use scriptbind_core::{
    CallError, ConfigurationError, ConversionError, Cost, ScriptError, ScriptResult, TypeHash,
};
pub use scriptbind_runtime::{AnyUserData, Function, MetaMethod, Table, Value, Vm};

/// Everything needed to register and call.
pub mod prelude {
    pub use crate::{
        ClassBuilder, Context, ContextProperty, FromScript, HostError, IntoScript, MetaMethod,
        Module, NativeClass, Obj, ScriptError, ScriptIter, ScriptResult, Table, Unowned, Value,
    };
}
