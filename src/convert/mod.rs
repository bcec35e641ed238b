//! Value marshaling between dynamic values and host types.
//!
//! Every parameter type implements [`FromScript`], which works in two modes:
//!
//! - **scoring**: [`FromScript::score`] tells overload resolution how well a
//!   value fits without converting it
//! - **conversion**: [`FromScript::from_script`] produces the host value
//!
//! Return types implement [`IntoScript`] (one value) or [`IntoScriptMulti`]
//! (zero or more values). Host code calling into script reads results with
//! [`FromScriptMulti`].

mod containers;
mod enums;
mod error;
mod iter;
mod object;
mod primitives;
mod variant;

use std::borrow::Cow;

use scriptbind_core::{ConversionError, Cost, ScriptResult};
use scriptbind_runtime::Value;

use crate::context::ContextState;

pub use enums::Enum;
pub use error::HostError;
pub use iter::ScriptIter;
pub use object::{NativeClass, Obj, ObjectWrapper, Unowned, Wrapped};
pub use variant::{Variant2, Variant3, Variant4};

pub(crate) use object::handle_type;

/// Convert a dynamic value into a host value.
///
/// # Example
///
/// ```
/// use std::borrow::Cow;
/// use scriptbind::{ContextState, Cost, FromScript, ConversionError, Table, Value};
///
/// // Marshal a 2D point as `{x, y}`.
/// struct Point { x: f64, y: f64 }
///
/// impl FromScript for Point {
///     fn score(value: &Value, _: &ContextState) -> Cost {
///         Cost::exact_if(value.as_table().is_some_and(|t| t.len() == 2))
///     }
///
///     fn from_script(value: &Value, state: &ContextState) -> Result<Self, ConversionError> {
///         let table = value
///             .as_table()
///             .ok_or_else(|| ConversionError::mismatch("Point", value.type_name()))?;
///         Ok(Point {
///             x: f64::from_script(&table.get_index(1), state)?,
///             y: f64::from_script(&table.get_index(2), state)?,
///         })
///     }
///
///     fn type_label() -> Cow<'static, str> {
///         "Point".into()
///     }
/// }
/// ```
pub trait FromScript: Sized {
    /// How well `value` fits this type; [`Cost::IMPOSSIBLE`] if it does not.
    fn score(value: &Value, state: &ContextState) -> Cost;

    /// Perform the conversion.
    fn from_script(value: &Value, state: &ContextState) -> Result<Self, ConversionError>;

    /// Name used when rendering candidate signatures.
    fn type_label() -> Cow<'static, str>;
}

/// Convert a host value into one dynamic value.
pub trait IntoScript {
    /// Perform the conversion. Pushing objects can fail on unregistered types.
    fn into_script(self, state: &ContextState) -> ScriptResult<Value>;
}

/// Convert a host value into a sequence of dynamic values.
///
/// Implemented for every [`IntoScript`] type (one value), `()` (none),
/// tuples, [`MultiValue`], `Result<T, HostError>` (`v` or `nil, err`) and
/// `ScriptResult<T>` (raises on error).
pub trait IntoScriptMulti {
    /// Perform the conversion.
    fn into_script_multi(self, state: &ContextState) -> ScriptResult<Vec<Value>>;
}

/// Read a sequence of dynamic values, e.g. the results of a call.
pub trait FromScriptMulti: Sized {
    /// Perform the conversion; missing values read as nil.
    fn from_script_multi(values: Vec<Value>, state: &ContextState) -> ScriptResult<Self>;
}

/// An explicit list of values, passed or returned as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiValue(pub Vec<Value>);

impl MultiValue {
    /// Wrap values.
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Unwrap values.
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl<T: IntoScript> IntoScriptMulti for T {
    fn into_script_multi(self, state: &ContextState) -> ScriptResult<Vec<Value>> {
        Ok(vec![self.into_script(state)?])
    }
}

impl IntoScriptMulti for () {
    fn into_script_multi(self, _: &ContextState) -> ScriptResult<Vec<Value>> {
        Ok(Vec::new())
    }
}

impl IntoScriptMulti for MultiValue {
    fn into_script_multi(self, _: &ContextState) -> ScriptResult<Vec<Value>> {
        Ok(self.0)
    }
}

impl<T: IntoScriptMulti> IntoScriptMulti for ScriptResult<T> {
    fn into_script_multi(self, state: &ContextState) -> ScriptResult<Vec<Value>> {
        self?.into_script_multi(state)
    }
}

impl<T: FromScript> FromScriptMulti for T {
    fn from_script_multi(values: Vec<Value>, state: &ContextState) -> ScriptResult<Self> {
        let first = values.into_iter().next().unwrap_or_default();
        Ok(T::from_script(&first, state)?)
    }
}

impl FromScriptMulti for () {
    fn from_script_multi(_: Vec<Value>, _: &ContextState) -> ScriptResult<Self> {
        Ok(())
    }
}

impl FromScriptMulti for MultiValue {
    fn from_script_multi(values: Vec<Value>, _: &ContextState) -> ScriptResult<Self> {
        Ok(MultiValue(values))
    }
}

macro_rules! impl_tuple_multi {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: IntoScript),+> IntoScriptMulti for ($($name,)+) {
            fn into_script_multi(self, state: &ContextState) -> ScriptResult<Vec<Value>> {
                Ok(vec![$(self.$idx.into_script(state)?),+])
            }
        }

        impl<$($name: FromScript),+> FromScriptMulti for ($($name,)+) {
            fn from_script_multi(values: Vec<Value>, state: &ContextState) -> ScriptResult<Self> {
                Ok(($(
                    $name::from_script(values.get($idx).unwrap_or(&Value::Nil), state)?,
                )+))
            }
        }
    };
}

impl_tuple_multi!(A: 0, B: 1);
impl_tuple_multi!(A: 0, B: 1, C: 2);
impl_tuple_multi!(A: 0, B: 1, C: 2, D: 3);
