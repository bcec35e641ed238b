//! Dynamic values and table keys.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use ordered_float::OrderedFloat;

use crate::{AnyUserData, Function, Table};

/// A dynamic value as seen by script code.
///
/// Scalars are stored inline; tables, functions and userdata are shared
/// references compared by identity.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Nil,
    /// Boolean value
    Boolean(bool),
    /// Integer subtype of number
    Integer(i64),
    /// Floating point subtype of number
    Number(f64),
    /// Immutable string
    String(Rc<str>),
    /// Table reference
    Table(Table),
    /// Function reference
    Function(Function),
    /// Opaque host payload
    UserData(AnyUserData),
}

impl Value {
    /// Get a human-readable name for this value's dynamic type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) => "function",
            Value::UserData(_) => "userdata",
        }
    }

    /// Create a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    /// Check if this value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Script truthiness: everything except `nil` and `false`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Borrow the string contents.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the table reference.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Get the function reference.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Get the userdata reference.
    pub fn as_userdata(&self) -> Option<&AnyUserData> {
        match self {
            Value::UserData(u) => Some(u),
            _ => None,
        }
    }

    /// Numeric value with string coercion, the way arithmetic sees it.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            Value::String(s) => parse_number(s).map(|n| match n {
                Value::Integer(i) => i as f64,
                Value::Number(f) => f,
                _ => f64::NAN,
            }),
            _ => None,
        }
    }

    /// Integer value when the number (or numeric string) has an exact integer representation.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Number(n) => float_to_integer(*n),
            Value::String(s) => match parse_number(s)? {
                Value::Integer(i) => Some(i),
                Value::Number(f) => float_to_integer(f),
                _ => None,
            },
            _ => None,
        }
    }

    /// Identity of reference values; `None` for scalars and strings.
    pub fn ref_addr(&self) -> Option<usize> {
        match self {
            Value::Table(t) => Some(t.addr()),
            Value::Function(f) => Some(f.addr()),
            Value::UserData(u) => Some(u.addr()),
            _ => None,
        }
    }

    /// Primitive equality without metamethods.
    pub fn raw_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(i), Value::Number(n)) | (Value::Number(n), Value::Integer(i)) => {
                (*i as f64) == *n && float_to_integer(*n) == Some(*i)
            }
            (Value::String(a), Value::String(b)) => a == b,
            _ => match (self.ref_addr(), other.ref_addr()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

/// Exact float to integer conversion.
pub fn float_to_integer(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// Parse a numeric string the way the runtime coerces strings in arithmetic.
///
/// Returns `Value::Integer` or `Value::Number`, `None` when not numeric.
pub fn parse_number(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16).ok().map(Value::Integer);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if !trimmed.eq_ignore_ascii_case("inf")
            && !trimmed.eq_ignore_ascii_case("nan")
            && !trimmed.eq_ignore_ascii_case("infinity") =>
        {
            Some(Value::Number(f))
        }
        _ => None,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.raw_equal(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Table(t) => write!(f, "Table({:#x})", t.addr()),
            Value::Function(func) => write!(f, "Function({})", func.name()),
            Value::UserData(u) => write!(f, "UserData({:#x})", u.addr()),
        }
    }
}

impl fmt::Display for Value {
    /// Raw textual form, without `__tostring`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Table(t) => write!(f, "table: {:#x}", t.addr()),
            Value::Function(func) => write!(f, "function: {}", func.name()),
            Value::UserData(u) => write!(f, "userdata: {:#x}", u.addr()),
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Rc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Rc::from(v))
    }
}

impl From<Table> for Value {
    fn from(v: Table) -> Self {
        Value::Table(v)
    }
}

impl From<Function> for Value {
    fn from(v: Function) -> Self {
        Value::Function(v)
    }
}

impl From<AnyUserData> for Value {
    fn from(v: AnyUserData) -> Self {
        Value::UserData(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

// =============================================================================
// Table keys
// =============================================================================

/// A hashable table key.
///
/// Floats with an exact integer value normalize to [`Key::Integer`] so `t[1]`
/// and `t[1.0]` address the same slot. `nil` and NaN are not valid keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Boolean(bool),
    Integer(i64),
    Number(OrderedFloat<f64>),
    String(Rc<str>),
    Ref(RefKey),
}

/// Reference-typed key compared by identity. Holds the value so it stays alive.
#[derive(Clone)]
pub struct RefKey {
    addr: usize,
    value: Value,
}

impl PartialEq for RefKey {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for RefKey {}

impl Hash for RefKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl Key {
    /// Convert a value to a key. `None` for nil and NaN.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Nil => None,
            Value::Boolean(b) => Some(Key::Boolean(*b)),
            Value::Integer(i) => Some(Key::Integer(*i)),
            Value::Number(n) if n.is_nan() => None,
            Value::Number(n) => Some(
                float_to_integer(*n)
                    .map(Key::Integer)
                    .unwrap_or(Key::Number(OrderedFloat(*n))),
            ),
            Value::String(s) => Some(Key::String(s.clone())),
            other => other.ref_addr().map(|addr| {
                Key::Ref(RefKey {
                    addr,
                    value: other.clone(),
                })
            }),
        }
    }

    /// Convert the key back into the value it was created from.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Boolean(b) => Value::Boolean(*b),
            Key::Integer(i) => Value::Integer(*i),
            Key::Number(n) => Value::Number(n.0),
            Key::String(s) => Value::String(s.clone()),
            Key::Ref(r) => r.value.clone(),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(Rc::from(s))
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Integer(i)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.to_value())
    }
}
