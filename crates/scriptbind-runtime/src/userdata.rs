//! Userdata: opaque host payloads with a metatable.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::Table;

struct UserDataCell {
    data: RefCell<Box<dyn Any>>,
    metatable: RefCell<Option<Table>>,
}

/// Shared reference to a userdata value.
///
/// The payload is dropped when the last reference goes away; that drop is
/// the finalization point for whatever the payload owns.
#[derive(Clone)]
pub struct AnyUserData(Rc<UserDataCell>);

impl AnyUserData {
    /// Wrap a payload.
    pub fn new<T: Any>(data: T) -> Self {
        Self(Rc::new(UserDataCell {
            data: RefCell::new(Box::new(data)),
            metatable: RefCell::new(None),
        }))
    }

    /// Wrap a payload and attach a metatable.
    pub fn with_metatable<T: Any>(data: T, metatable: Option<Table>) -> Self {
        let ud = Self::new(data);
        ud.set_metatable(metatable);
        ud
    }

    /// Whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0
            .data
            .try_borrow()
            .map(|b| b.is::<T>())
            .unwrap_or(false)
    }

    /// Borrow the payload as `T`. `None` on wrong type or a conflicting borrow.
    pub fn borrow<T: Any>(&self) -> Option<Ref<'_, T>> {
        let data = self.0.data.try_borrow().ok()?;
        Ref::filter_map(data, |b| b.downcast_ref::<T>()).ok()
    }

    /// Mutably borrow the payload as `T`. `None` on wrong type or a conflicting borrow.
    pub fn borrow_mut<T: Any>(&self) -> Option<RefMut<'_, T>> {
        let data = self.0.data.try_borrow_mut().ok()?;
        RefMut::filter_map(data, |b| b.downcast_mut::<T>()).ok()
    }

    /// The metatable, if any.
    pub fn metatable(&self) -> Option<Table> {
        self.0.metatable.borrow().clone()
    }

    /// Replace the metatable.
    pub fn set_metatable(&self, metatable: Option<Table>) {
        *self.0.metatable.borrow_mut() = metatable;
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &AnyUserData) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address used as identity.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Non-owning reference.
    pub fn downgrade(&self) -> WeakUserData {
        WeakUserData(Rc::downgrade(&self.0))
    }
}

impl fmt::Debug for AnyUserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyUserData({:#x})", self.addr())
    }
}

/// Weak reference to a userdata value.
#[derive(Clone)]
pub struct WeakUserData(Weak<UserDataCell>);

impl WeakUserData {
    /// Recover the userdata if it is still alive.
    pub fn upgrade(&self) -> Option<AnyUserData> {
        self.0.upgrade().map(AnyUserData)
    }

    /// Whether the userdata has been dropped.
    pub fn is_dead(&self) -> bool {
        self.0.strong_count() == 0
    }
}

impl fmt::Debug for WeakUserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakUserData(alive = {})", !self.is_dead())
    }
}
