//! The userdata payload representing a host object inside the runtime.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use scriptbind_core::{ConversionError, TypeHash, View};
use scriptbind_registry::Finalizer;
use scriptbind_runtime::Table;

use super::identity::IdentityTable;

/// Shared storage of a host object.
pub type ObjectCell = Rc<RefCell<dyn Any>>;

/// Address identifying the object stored in a cell.
pub fn cell_identity(cell: &ObjectCell) -> usize {
    Rc::as_ptr(cell) as *const () as usize
}

enum ObjectRef {
    /// Runtime-owned: the handle keeps the object alive.
    Strong(ObjectCell),
    /// Host-owned: the host decides when the object dies.
    Weak(Weak<RefCell<dyn Any>>),
}

/// A host object as seen by script code.
///
/// The handle records the type the object was pushed as; its view projects
/// from the concrete object to that type. Both may change when the same
/// object is pushed again as a type unrelated to the recorded one.
pub struct ObjectHandle {
    object: ObjectRef,
    identity: usize,
    view: View,
    type_hash: TypeHash,
    type_name: String,
    storage: Option<Table>,
    finalizer: Option<Finalizer>,
    table: Option<Weak<IdentityTable>>,
}

impl ObjectHandle {
    pub(crate) fn owned(
        cell: ObjectCell,
        view: View,
        type_hash: TypeHash,
        type_name: &str,
        finalizer: Option<Finalizer>,
        table: &Rc<IdentityTable>,
    ) -> Self {
        Self {
            identity: cell_identity(&cell),
            object: ObjectRef::Strong(cell),
            view,
            type_hash,
            type_name: type_name.to_string(),
            storage: None,
            finalizer,
            table: Some(Rc::downgrade(table)),
        }
    }

    pub(crate) fn unowned(cell: &ObjectCell, view: View, type_hash: TypeHash, type_name: &str) -> Self {
        Self {
            identity: cell_identity(cell),
            object: ObjectRef::Weak(Rc::downgrade(cell)),
            view,
            type_hash,
            type_name: type_name.to_string(),
            storage: None,
            finalizer: None,
            table: None,
        }
    }

    /// The recorded type.
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Script-visible name of the recorded type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether the runtime owns the object.
    pub fn is_owned(&self) -> bool {
        matches!(self.object, ObjectRef::Strong(_))
    }

    /// Whether the object still exists.
    pub fn is_alive(&self) -> bool {
        match &self.object {
            ObjectRef::Strong(_) => true,
            ObjectRef::Weak(w) => w.strong_count() > 0,
        }
    }

    /// Address of the native object.
    pub fn identity(&self) -> usize {
        self.identity
    }

    /// Projection from the concrete object to the recorded type.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// The object cell, failing once a host-owned object is gone.
    pub fn cell(&self) -> Result<ObjectCell, ConversionError> {
        match &self.object {
            ObjectRef::Strong(cell) => Ok(Rc::clone(cell)),
            ObjectRef::Weak(w) => w.upgrade().ok_or_else(|| ConversionError::Expired {
                type_name: self.type_name.clone(),
            }),
        }
    }

    /// Per-instance storage for script-assigned fields, if any was written.
    pub fn storage(&self) -> Option<&Table> {
        self.storage.as_ref()
    }

    pub(crate) fn storage_or_create(&mut self) -> Table {
        self.storage.get_or_insert_with(Table::new).clone()
    }

    /// Switch the recorded type of an owned handle.
    pub(crate) fn retype(
        &mut self,
        type_hash: TypeHash,
        type_name: &str,
        view: View,
        finalizer: Option<Finalizer>,
    ) {
        tracing::debug!(
            "retyping handle {:#x} from '{}' to '{}'",
            self.identity,
            self.type_name,
            type_name
        );
        self.type_hash = type_hash;
        self.type_name = type_name.to_string();
        self.view = view;
        self.finalizer = finalizer;
    }
}

impl Drop for ObjectHandle {
    fn drop(&mut self) {
        self.storage = None;
        let table = self.table.take().and_then(|t| t.upgrade());
        if let (ObjectRef::Strong(cell), Some(finalizer)) = (&self.object, self.finalizer.take()) {
            let pending = DeferredFinalizer {
                cell: Rc::clone(cell),
                view: self.view.clone(),
                finalizer,
                type_name: self.type_name.clone(),
            };
            if let Err(pending) = pending.try_run() {
                match &table {
                    Some(table) => {
                        tracing::debug!(
                            type_name = self.type_name.as_str(),
                            "object is borrowed, deferring finalizer"
                        );
                        table.defer(pending);
                    }
                    None => tracing::warn!(
                        "dropping finalizer of '{}': object is borrowed and its context is gone",
                        self.type_name
                    ),
                }
            }
        }
        if let Some(table) = table {
            table.remove_if_dead(self.identity);
        }
        tracing::trace!(
            "finalized {} handle of '{}' at {:#x}",
            if self.is_owned() { "owned" } else { "unowned" },
            self.type_name,
            self.identity
        );
    }
}

/// A finalizer whose object was borrowed when its handle died.
///
/// It keeps the object alive until the finalizer gets to run.
pub(crate) struct DeferredFinalizer {
    cell: ObjectCell,
    view: View,
    finalizer: Finalizer,
    type_name: String,
}

impl DeferredFinalizer {
    /// Run the finalizer, or give it back if the object is still borrowed.
    pub(crate) fn try_run(self) -> Result<(), Self> {
        let ran = match self.cell.try_borrow_mut() {
            Ok(mut object) => {
                if let Some(target) = self.view.project_mut(&mut *object) {
                    (self.finalizer)(target);
                }
                true
            }
            Err(_) => false,
        };
        if ran { Ok(()) } else { Err(self) }
    }

    pub(crate) fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("type", &self.type_name)
            .field("owned", &self.is_owned())
            .field("alive", &self.is_alive())
            .field("identity", &format_args!("{:#x}", self.identity))
            .finish()
    }
}
