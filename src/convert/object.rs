//! Registered host objects.
//!
//! [`Obj<T>`] is a shared reference to a host object together with the view
//! that reaches `T` inside it. Converting a handle to `Obj<Base>` walks the
//! cast graph from the handle's recorded type; the underlying object is never
//! copied.

use std::any::Any;
use std::borrow::Cow;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use scriptbind_core::{ConversionError, Cost, Projection, ScriptResult, TypeHash, View};
use scriptbind_runtime::Value;

use super::{FromScript, IntoScript};
use crate::bridge::{ObjectCell, cell_identity, handle_of, push_object};
use crate::context::ContextState;

/// A host type exposed to script code as a class.
///
/// ```
/// use scriptbind::NativeClass;
///
/// struct Account {
///     balance: i64,
/// }
///
/// impl NativeClass for Account {
///     const NAME: &'static str = "Account";
/// }
/// ```
pub trait NativeClass: Any {
    /// Script-visible class name.
    const NAME: &'static str;
}

/// Shared reference to a registered host object viewed as `T`.
pub struct Obj<T> {
    cell: ObjectCell,
    view: View,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NativeClass> Obj<T> {
    /// Move a value into a new shared cell.
    pub fn new(value: T) -> Self {
        Self::from_parts(Rc::new(RefCell::new(value)), View::identity())
    }

    /// Share an existing cell with the runtime.
    pub fn from_rc(cell: Rc<RefCell<T>>) -> Self {
        Self::from_parts(cell, View::identity())
    }

    /// Move a wrapper into a new shared cell, viewing the object it wraps.
    pub fn wrap<W>(wrapper: W) -> Self
    where
        W: ObjectWrapper<Target = T>,
    {
        let unwrap = Projection::from_fns(|w: &W| w.get(), |w: &mut W| w.get_mut());
        Self::from_parts(
            Rc::new(RefCell::new(wrapper)),
            View::identity().then([&unwrap]),
        )
    }

    pub(crate) fn from_parts(cell: ObjectCell, view: View) -> Self {
        Self {
            cell,
            view,
            _marker: PhantomData,
        }
    }

    /// Borrow the viewed object.
    pub fn borrow(&self) -> Result<Ref<'_, T>, ConversionError> {
        let guard = self.cell.try_borrow().map_err(|_| borrowed::<T>())?;
        Ref::filter_map(guard, |any| {
            self.view.project(any).and_then(|t| t.downcast_ref::<T>())
        })
        .map_err(|_| unreachable_view::<T>())
    }

    /// Mutably borrow the viewed object.
    pub fn borrow_mut(&self) -> Result<RefMut<'_, T>, ConversionError> {
        let guard = self.cell.try_borrow_mut().map_err(|_| borrowed::<T>())?;
        RefMut::filter_map(guard, |any| {
            self.view
                .project_mut(any)
                .and_then(|t| t.downcast_mut::<T>())
        })
        .map_err(|_| unreachable_view::<T>())
    }

    /// Whether both refer to the same native object.
    pub fn ptr_eq(&self, other: &Obj<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Address of the native object.
    pub fn identity(&self) -> usize {
        cell_identity(&self.cell)
    }

    pub(crate) fn cell(&self) -> &ObjectCell {
        &self.cell
    }

    pub(crate) fn view(&self) -> &View {
        &self.view
    }
}

fn borrowed<T: NativeClass>() -> ConversionError {
    ConversionError::Borrowed {
        type_name: T::NAME.to_string(),
    }
}

fn unreachable_view<T: NativeClass>() -> ConversionError {
    ConversionError::failure(T::NAME, "object does not contain the viewed type")
}

impl<T> Clone for Obj<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            view: self.view.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: NativeClass> fmt::Debug for Obj<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obj")
            .field("type", &T::NAME)
            .field("identity", &format_args!("{:#x}", self.identity()))
            .field("view", &self.view)
            .finish()
    }
}

impl<T: NativeClass> FromScript for Obj<T> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn score(value: &Value, state: &ContextState) -> Cost {
        match handle_of(value) {
            Some(handle) => state
                .types()
                .cast_cost(handle.type_hash(), TypeHash::of::<T>()),
            None => Cost::IMPOSSIBLE,
        }
    }

    fn from_script(value: &Value, state: &ContextState) -> Result<Self, ConversionError> {
        let handle =
            handle_of(value).ok_or_else(|| ConversionError::mismatch(T::NAME, value.type_name()))?;
        let path = state
            .types()
            .find_cast(handle.type_hash(), TypeHash::of::<T>())
            .ok_or_else(|| {
                ConversionError::failure(
                    T::NAME,
                    format!("'{}' is not related to '{}'", handle.type_name(), T::NAME),
                )
            })?;
        let cell = handle.cell()?;
        Ok(Obj::from_parts(cell, path.apply_to(handle.view())))
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed(T::NAME)
    }
}

impl<T: NativeClass> IntoScript for Obj<T> {
    fn into_script(self, state: &ContextState) -> ScriptResult<Value> {
        push_object(
            state,
            self.cell,
            self.view,
            TypeHash::of::<T>(),
            T::NAME,
            true,
        )
    }
}

/// An object pushed without transferring ownership.
///
/// The runtime only holds a weak reference; once every host `Obj` is dropped
/// the handle reports [`ConversionError::Expired`].
pub struct Unowned<T>(pub Obj<T>);

impl<T: NativeClass> IntoScript for Unowned<T> {
    fn into_script(self, state: &ContextState) -> ScriptResult<Value> {
        push_object(
            state,
            self.0.cell,
            self.0.view,
            TypeHash::of::<T>(),
            T::NAME,
            false,
        )
    }
}

/// A smart pointer or handle type that owns a registered object.
///
/// The wrapper is what the runtime keeps alive; script code and bound methods
/// see the wrapped [`NativeClass`].
///
/// ```ignore
/// struct Pooled<T> {
///     slot: u32,
///     value: T,
/// }
///
/// impl<T: NativeClass> ObjectWrapper for Pooled<T> {
///     type Target = T;
///
///     fn get(&self) -> &T {
///         &self.value
///     }
///
///     fn get_mut(&mut self) -> &mut T {
///         &mut self.value
///     }
/// }
///
/// module.function("acquire", |pool: &Pool| Wrapped(pool.acquire()));
/// ```
pub trait ObjectWrapper: Any {
    type Target: NativeClass;

    fn get(&self) -> &Self::Target;

    fn get_mut(&mut self) -> &mut Self::Target;
}

impl<T: NativeClass> ObjectWrapper for Box<T> {
    type Target = T;

    fn get(&self) -> &T {
        self
    }

    fn get_mut(&mut self) -> &mut T {
        self
    }
}

/// Push a wrapper as a runtime-owned handle of its target class.
pub struct Wrapped<W>(pub W);

impl<W: ObjectWrapper> IntoScript for Wrapped<W> {
    fn into_script(self, state: &ContextState) -> ScriptResult<Value> {
        Obj::wrap(self.0).into_script(state)
    }
}

/// A shared cell is pushed as is, so pushing it again finds the same handle.
impl<T: NativeClass> IntoScript for Rc<RefCell<T>> {
    fn into_script(self, state: &ContextState) -> ScriptResult<Value> {
        Obj::from_rc(self).into_script(state)
    }
}

/// Returning a class by value moves it into a runtime-owned cell.
impl<T: NativeClass> IntoScript for T {
    fn into_script(self, state: &ContextState) -> ScriptResult<Value> {
        Obj::new(self).into_script(state)
    }
}

/// By-value parameters receive a copy of the referenced object.
impl<T: NativeClass + Clone> FromScript for T {
    fn score(value: &Value, state: &ContextState) -> Cost {
        Obj::<T>::score(value, state)
    }

    fn from_script(value: &Value, state: &ContextState) -> Result<Self, ConversionError> {
        let obj = Obj::<T>::from_script(value, state)?;
        let copy = obj.borrow()?.clone();
        Ok(copy)
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed(T::NAME)
    }
}

/// The recorded type of a handle value.
pub(crate) fn handle_type(value: &Value) -> Option<TypeHash> {
    handle_of(value).map(|h| h.type_hash())
}
