//! Host error values marshaled as plain tables.
//!
//! A host function returning `Result<T, HostError>` produces `v` on success
//! and `nil, err` on failure, where `err` is a table:
//!
//! ```text
//! { message = "...", description = "...", file = "...", line = 12, code = 3, category = "io" }
//! ```
//!
//! Every field except `message` is omitted when unset. Reading a table back
//! treats all fields as optional.

use std::borrow::Cow;
use std::fmt;

use scriptbind_core::{ConversionError, Cost, ScriptResult};
use scriptbind_runtime::{Table, Value};
use thiserror::Error;

use super::{FromScript, IntoScript, IntoScriptMulti};
use crate::context::ContextState;

/// An error reported by host code to script code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct HostError {
    pub message: String,
    pub description: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub code: Option<i64>,
    pub category: Option<String>,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record where the error was raised.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Build the script-side table.
    pub fn to_table(&self) -> Table {
        let t = Table::new();
        t.set("message", self.message.as_str());
        if let Some(d) = &self.description {
            t.set("description", d.as_str());
        }
        if let Some(f) = &self.file {
            t.set("file", f.as_str());
        }
        if let Some(l) = self.line {
            t.set("line", Value::Integer(i64::from(l)));
        }
        if let Some(c) = self.code {
            t.set("code", Value::Integer(c));
        }
        if let Some(c) = &self.category {
            t.set("category", c.as_str());
        }
        t
    }

    /// Read a script-side table; missing or mistyped fields stay unset.
    pub fn from_table(table: &Table) -> Self {
        let text = |key: &str| table.get(key).as_str().map(str::to_string);
        Self {
            message: text("message").unwrap_or_default(),
            description: text("description"),
            file: text("file"),
            line: table
                .get("line")
                .to_integer()
                .and_then(|l| u32::try_from(l).ok()),
            code: table.get("code").to_integer(),
            category: text("category"),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(category) = &self.category {
            write!(f, "[{}] ", category)?;
        }
        f.write_str(&self.message)?;
        if let Some(d) = &self.description {
            write!(f, ": {}", d)?;
        }
        if let Some(file) = &self.file {
            write!(f, " ({}:{})", file, self.line.unwrap_or(0))?;
        }
        Ok(())
    }
}

impl FromScript for HostError {
    fn score(value: &Value, _: &ContextState) -> Cost {
        match value {
            Value::Table(_) => Cost::EXACT,
            Value::String(_) => Cost::COERCE,
            _ => Cost::IMPOSSIBLE,
        }
    }

    fn from_script(value: &Value, _: &ContextState) -> Result<Self, ConversionError> {
        match value {
            Value::Table(t) => Ok(HostError::from_table(t)),
            Value::String(s) => Ok(HostError::new(&**s)),
            other => Err(ConversionError::mismatch("error", other.type_name())),
        }
    }

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("error")
    }
}

impl IntoScript for HostError {
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        Ok(Value::Table(self.to_table()))
    }
}

impl<T: IntoScript> IntoScriptMulti for Result<T, HostError> {
    fn into_script_multi(self, state: &ContextState) -> ScriptResult<Vec<Value>> {
        match self {
            Ok(v) => Ok(vec![v.into_script(state)?]),
            Err(e) => {
                tracing::debug!("host error returned to script: {}", e);
                Ok(vec![Value::Nil, Value::Table(e.to_table())])
            }
        }
    }
}
