//! Object bridge: handles, identity and class table hooks.
//!
//! Pushing a host object creates an [`ObjectHandle`] wrapped in userdata whose
//! metatable is the class table of the pushed type.
//!
//! - **owned** pushes are deduplicated through the [`IdentityTable`]: pushing
//!   the same object twice yields the same userdata. The handle keeps the
//!   object alive and runs the type's finalizer when the runtime drops it.
//! - **unowned** pushes always create a fresh handle holding a weak
//!   reference; the host keeps ownership and no finalizer runs.

pub(crate) mod class_table;
mod handle;
mod identity;

use std::cell::Ref;

use scriptbind_core::{ConfigurationError, ScriptResult, TypeHash, View};
use scriptbind_runtime::{AnyUserData, Value};

use crate::context::ContextState;

pub use handle::{ObjectCell, ObjectHandle, cell_identity};
pub use identity::IdentityTable;

/// Borrow the handle stored in a value, if it is one.
pub fn handle_of(value: &Value) -> Option<Ref<'_, ObjectHandle>> {
    value.as_userdata()?.borrow::<ObjectHandle>()
}

/// Push a host object as `static_type`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn push_object(
    state: &ContextState,
    cell: ObjectCell,
    view: View,
    static_type: TypeHash,
    type_name: &str,
    owned: bool,
) -> ScriptResult<Value> {
    let registry = state.types();
    let registered =
        registry
            .get(static_type)
            .ok_or_else(|| ConfigurationError::UnregisteredType {
                type_name: type_name.to_string(),
            })?;
    let class = registered.class_table().clone();
    let descriptor = registered.descriptor();

    if !owned {
        let handle = ObjectHandle::unowned(&cell, view, static_type, descriptor.name());
        return Ok(Value::UserData(AnyUserData::with_metatable(
            handle,
            Some(class),
        )));
    }

    let identity = cell_identity(&cell);
    if let Some(existing) = state.identity().get(identity) {
        tracing::trace!(type_name = descriptor.name(), identity, "identity hit");
        let recorded = existing.borrow::<ObjectHandle>().map(|h| h.type_hash());
        let unrelated = recorded.is_some_and(|r| registry.find_cast(r, static_type).is_none());
        if unrelated {
            if let Some(mut handle) = existing.borrow_mut::<ObjectHandle>() {
                handle.retype(
                    static_type,
                    descriptor.name(),
                    view,
                    descriptor.finalizer().cloned(),
                );
            }
            existing.set_metatable(Some(class));
        }
        return Ok(Value::UserData(existing));
    }

    let handle = ObjectHandle::owned(
        cell,
        view,
        static_type,
        descriptor.name(),
        descriptor.finalizer().cloned(),
        state.identity_rc(),
    );
    let userdata = AnyUserData::with_metatable(handle, Some(class));
    state.identity().insert(identity, &userdata);
    Ok(Value::UserData(userdata))
}

/// Script-visible name of a value's type: the class name for handles.
pub(crate) fn value_type_name(value: &Value) -> String {
    match handle_of(value) {
        Some(handle) => handle.type_name().to_string(),
        None => value.type_name().to_string(),
    }
}
