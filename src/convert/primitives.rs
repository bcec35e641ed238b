//! Scalars, strings and raw runtime values.

use std::borrow::Cow;

use scriptbind_core::{ConversionError, Cost, ScriptResult};
use scriptbind_runtime::{AnyUserData, Function, Table, Value, float_to_integer, parse_number};

use super::{FromScript, IntoScript};
use crate::context::ContextState;

// =============================================================================
// Integers
// =============================================================================

/// Integer view of a value and whether reading it needs a coercion.
fn integer_of(value: &Value) -> Option<(i64, bool)> {
    match value {
        Value::Integer(i) => Some((*i, false)),
        Value::Number(n) => float_to_integer(*n).map(|i| (i, true)),
        Value::String(s) => match parse_number(s)? {
            Value::Integer(i) => Some((i, true)),
            Value::Number(n) => float_to_integer(n).map(|i| (i, true)),
            _ => None,
        },
        _ => None,
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $label:literal),* $(,)?) => {
        $(
            impl FromScript for $ty {
                fn score(value: &Value, _: &ContextState) -> Cost {
                    match integer_of(value) {
                        Some((i, coerced)) if <$ty>::try_from(i).is_ok() => {
                            if coerced { Cost::COERCE } else { Cost::EXACT }
                        }
                        _ => Cost::IMPOSSIBLE,
                    }
                }

                fn from_script(value: &Value, _: &ContextState) -> Result<Self, ConversionError> {
                    let i = match value {
                        Value::Number(n) if float_to_integer(*n).is_none() => {
                            return Err(ConversionError::FloatConversion {
                                value: n.to_string(),
                                target_type: $label,
                            });
                        }
                        other => integer_of(other)
                            .map(|(i, _)| i)
                            .ok_or_else(|| ConversionError::mismatch($label, other.type_name()))?,
                    };
                    <$ty>::try_from(i).map_err(|_| ConversionError::IntegerOverflow {
                        value: i,
                        target_type: $label,
                    })
                }

                fn type_label() -> Cow<'static, str> {
                    Cow::Borrowed($label)
                }
            }
        )*
    };
}

impl_integer!(
    i8 => "int8",
    i16 => "int16",
    i32 => "int",
    i64 => "int64",
    isize => "int64",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint",
    u64 => "uint64",
    usize => "uint64",
);

macro_rules! impl_integer_into {
    ($($ty:ty),*) => {
        $(
            impl IntoScript for $ty {
                fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
                    Ok(Value::Integer(i64::from(self)))
                }
            }
        )*
    };
}

impl_integer_into!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_wide_integer_into {
    ($($ty:ty),*) => {
        $(
            impl IntoScript for $ty {
                fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
                    // Values beyond the integer range degrade to numbers.
                    Ok(match i64::try_from(self) {
                        Ok(i) => Value::Integer(i),
                        Err(_) => Value::Number(self as f64),
                    })
                }
            }
        )*
    };
}

impl_wide_integer_into!(isize, u64, usize);

// =============================================================================
// Floats
// =============================================================================

macro_rules! impl_float {
    ($($ty:ty => $label:literal),*) => {
        $(
            impl FromScript for $ty {
                fn score(value: &Value, _: &ContextState) -> Cost {
                    match value {
                        Value::Number(_) => Cost::EXACT,
                        Value::Integer(_) => Cost::COERCE,
                        Value::String(s) => Cost::coerce_if(parse_number(s).is_some()),
                        _ => Cost::IMPOSSIBLE,
                    }
                }

                fn from_script(value: &Value, _: &ContextState) -> Result<Self, ConversionError> {
                    match value {
                        Value::Integer(_) | Value::Number(_) | Value::String(_) => value
                            .to_number()
                            .map(|n| n as $ty)
                            .ok_or_else(|| ConversionError::mismatch($label, value.type_name())),
                        other => Err(ConversionError::mismatch($label, other.type_name())),
                    }
                }

                fn type_label() -> Cow<'static, str> {
                    Cow::Borrowed($label)
                }
            }

            impl IntoScript for $ty {
                fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
                    Ok(Value::Number(f64::from(self)))
                }
            }
        )*
    };
}

impl_float!(f32 => "float", f64 => "double");

// =============================================================================
// Booleans and strings
// =============================================================================

impl FromScript for bool {
    fn score(value: &Value, _: &ContextState) -> Cost {
        match value {
            Value::Boolean(_) => Cost::EXACT,
            Value::Nil => Cost::COERCE,
            _ => Cost::IMPOSSIBLE,
        }
    }

    fn from_script(value: &Value, _: &ContextState) -> Result<Self, ConversionError> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::Nil => Ok(false),
            other => Err(ConversionError::mismatch("bool", other.type_name())),
        }
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("bool")
    }
}

impl IntoScript for bool {
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        Ok(Value::Boolean(self))
    }
}

impl FromScript for String {
    fn score(value: &Value, _: &ContextState) -> Cost {
        match value {
            Value::String(_) => Cost::EXACT,
            Value::Integer(_) | Value::Number(_) => Cost::COERCE,
            _ => Cost::IMPOSSIBLE,
        }
    }

    fn from_script(value: &Value, _: &ContextState) -> Result<Self, ConversionError> {
        match value {
            Value::String(s) => Ok(s.to_string()),
            Value::Integer(_) | Value::Number(_) => Ok(value.to_string()),
            other => Err(ConversionError::mismatch("string", other.type_name())),
        }
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("string")
    }
}

impl IntoScript for String {
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        Ok(Value::string(self))
    }
}

impl IntoScript for &str {
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        Ok(Value::string(self))
    }
}

impl IntoScript for Cow<'_, str> {
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        Ok(Value::string(self))
    }
}

// =============================================================================
// Runtime values
// =============================================================================

impl FromScript for Value {
    fn score(_: &Value, _: &ContextState) -> Cost {
        Cost::EXACT
    }

    fn from_script(value: &Value, _: &ContextState) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("any")
    }
}

impl IntoScript for Value {
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        Ok(self)
    }
}

macro_rules! impl_reference {
    ($ty:ty, $variant:ident, $label:literal) => {
        impl FromScript for $ty {
            fn score(value: &Value, _: &ContextState) -> Cost {
                Cost::exact_if(matches!(value, Value::$variant(_)))
            }

            fn from_script(value: &Value, _: &ContextState) -> Result<Self, ConversionError> {
                match value {
                    Value::$variant(inner) => Ok(inner.clone()),
                    other => Err(ConversionError::mismatch($label, other.type_name())),
                }
            }

            fn type_label() -> Cow<'static, str> {
                Cow::Borrowed($label)
            }
        }

        impl IntoScript for $ty {
            fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
                Ok(Value::$variant(self))
            }
        }
    };
}

impl_reference!(Table, Table, "table");
impl_reference!(Function, Function, "function");
impl_reference!(AnyUserData, UserData, "userdata");
