//! Optional values and sequences.

use std::borrow::Cow;

use scriptbind_core::{ConversionError, Cost, ScriptResult};
use scriptbind_runtime::{Table, Value};

use super::{FromScript, IntoScript};
use crate::context::ContextState;

impl<T: FromScript> FromScript for Option<T> {
    fn score(value: &Value, state: &ContextState) -> Cost {
        match value {
            Value::Nil => Cost::EXACT,
            other => T::score(other, state),
        }
    }

    fn from_script(value: &Value, state: &ContextState) -> Result<Self, ConversionError> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_script(other, state).map(Some),
        }
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Owned(format!("{}?", T::type_label()))
    }
}

impl<T: IntoScript> IntoScript for Option<T> {
    fn into_script(self, state: &ContextState) -> ScriptResult<Value> {
        match self {
            Some(v) => v.into_script(state),
            None => Ok(Value::Nil),
        }
    }
}

/// Sequence tables `{a, b, c}`. Conversion reads `1..=#t`.
impl<T: FromScript> FromScript for Vec<T> {
    fn score(value: &Value, state: &ContextState) -> Cost {
        match value {
            Value::Table(t) => Cost::coerce_if(
                t.sequence_values()
                    .iter()
                    .all(|v| T::score(v, state).is_possible()),
            ),
            _ => Cost::IMPOSSIBLE,
        }
    }

    fn from_script(value: &Value, state: &ContextState) -> Result<Self, ConversionError> {
        let table = value
            .as_table()
            .ok_or_else(|| ConversionError::mismatch(Self::type_label(), value.type_name()))?;
        table
            .sequence_values()
            .iter()
            .map(|v| T::from_script(v, state))
            .collect()
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Owned(format!("array<{}>", T::type_label()))
    }
}

impl<T: IntoScript> IntoScript for Vec<T> {
    fn into_script(self, state: &ContextState) -> ScriptResult<Value> {
        let values = self
            .into_iter()
            .map(|v| v.into_script(state))
            .collect::<ScriptResult<Vec<_>>>()?;
        Ok(Value::Table(Table::from_sequence(values)))
    }
}
