//! C-like enums marshaled as their integer discriminant.

use std::borrow::Cow;

use num_enum::TryFromPrimitive;
use scriptbind_core::{ConversionError, Cost, ScriptResult};
use scriptbind_runtime::{Value, float_to_integer};

use super::{FromScript, IntoScript};
use crate::context::ContextState;

/// Wrapper marshaling `E` as an integer.
///
/// ```
/// use num_enum::{IntoPrimitive, TryFromPrimitive};
/// use scriptbind::Enum;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
/// #[repr(u8)]
/// enum Team {
///     Red = 1,
///     Blue = 2,
/// }
///
/// let team = Enum(Team::Blue);
/// assert_eq!(team.into_inner(), Team::Blue);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Enum<E>(pub E);

impl<E> Enum<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

fn discriminant<E>(i: i64) -> Option<E>
where
    E: TryFromPrimitive,
    E::Primitive: TryFrom<i64>,
{
    let primitive = E::Primitive::try_from(i).ok()?;
    E::try_from_primitive(primitive).ok()
}

impl<E> FromScript for Enum<E>
where
    E: TryFromPrimitive,
    E::Primitive: TryFrom<i64>,
{
    fn score(value: &Value, _: &ContextState) -> Cost {
        match value {
            Value::Integer(i) => Cost::exact_if(discriminant::<E>(*i).is_some()),
            Value::Number(n) => {
                Cost::coerce_if(float_to_integer(*n).and_then(discriminant::<E>).is_some())
            }
            _ => Cost::IMPOSSIBLE,
        }
    }

    fn from_script(value: &Value, _: &ContextState) -> Result<Self, ConversionError> {
        let i = match value {
            Value::Integer(i) => *i,
            Value::Number(n) => float_to_integer(*n).ok_or_else(|| {
                ConversionError::FloatConversion {
                    value: n.to_string(),
                    target_type: E::NAME,
                }
            })?,
            other => return Err(ConversionError::mismatch(E::NAME, other.type_name())),
        };
        discriminant::<E>(i).map(Enum).ok_or_else(|| {
            ConversionError::failure(E::NAME, format!("{} is not a valid discriminant", i))
        })
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed(E::NAME)
    }
}

impl<E> IntoScript for Enum<E>
where
    E: TryFromPrimitive,
    E::Primitive: From<E> + Into<i64>,
{
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        let primitive: E::Primitive = self.0.into();
        Ok(Value::Integer(primitive.into()))
    }
}
