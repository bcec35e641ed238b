//! Error types for the bridge.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ScriptError (top-level wrapper)
//! ├── ConfigurationError - registration / push of unregistered types (fatal for setup)
//! ├── CallError          - overload resolution failures at a call site
//! ├── ConversionError    - a dynamic value could not become a host value
//! ├── Runtime            - error raised by script code or the runtime itself
//! └── Traced             - any of the above plus the traceback captured where it left a native frame
//! ```
//!
//! Phase errors convert into [`ScriptError`] with `?`, so host functions can
//! return `Result<T, ConversionError>` or `ScriptResult<T>` interchangeably.

use thiserror::Error;

/// Result alias used across the bridge.
pub type ScriptResult<T> = Result<T, ScriptError>;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while registering types or pushing objects of unknown types.
///
/// These are setup bugs in the host program and are not meant to be recovered
/// from by script code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A class lists a base that has not been registered yet.
    #[error("attempting to extend a type that has not been registered: '{type_name}' extends '{base}'")]
    UnregisteredBase { type_name: String, base: String },

    /// An object of a type with no registered class was pushed.
    #[error("can't push unregistered type '{type_name}'")]
    UnregisteredType { type_name: String },

    /// The type identity or the script name is already taken.
    #[error("type '{name}' is already registered")]
    DuplicateType { name: String },

    /// A member name collides with a bookkeeping key.
    #[error("'{member}' is a reserved name and cannot be registered on '{type_name}'")]
    ReservedName { type_name: String, member: String },

    /// More default values than parameters.
    #[error("'{name}' declares {defaults} default values but only takes {params} parameters")]
    TooManyDefaults {
        name: String,
        defaults: usize,
        params: usize,
    },
}

// ============================================================================
// Call Errors
// ============================================================================

/// Overload resolution failures.
///
/// Signatures are pre-rendered so the diagnostic survives after the candidate
/// bindings go out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// No candidate accepts this many arguments.
    #[error("wrong number of arguments to '{name}': expected {expected}, got {got}")]
    ArgumentCountMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    /// Every candidate scored impossible.
    #[error("no matching overload for '{name}({args})'; candidates are:\n{}", .candidates.join("\n"))]
    NoOverloadMatch {
        name: String,
        args: String,
        candidates: Vec<String>,
    },

    /// Several candidates tied at the minimum cost.
    #[error("ambiguous call to '{name}({args})'; could be:\n{}", .candidates.join("\n"))]
    AmbiguousOverload {
        name: String,
        args: String,
        candidates: Vec<String>,
    },
}

impl CallError {
    /// The script-visible name of the callee.
    pub fn name(&self) -> &str {
        match self {
            CallError::ArgumentCountMismatch { name, .. } => name,
            CallError::NoOverloadMatch { name, .. } => name,
            CallError::AmbiguousOverload { name, .. } => name,
        }
    }
}

// ============================================================================
// Conversion Errors
// ============================================================================

/// A dynamic value could not be converted to the requested host type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Wrong dynamic type for a strict conversion.
    #[error("{expected} expected, got {actual}")]
    TypeMismatch {
        expected: String,
        actual: &'static str,
    },

    /// Integer does not fit the target width.
    #[error("integer {value} out of range for {target_type}")]
    IntegerOverflow {
        value: i64,
        target_type: &'static str,
    },

    /// Number cannot be represented exactly in the target type.
    #[error("number {value} cannot be converted to {target_type}")]
    FloatConversion {
        value: String,
        target_type: &'static str,
    },

    /// A value converter could not interpret the value.
    #[error("cannot convert to {type_name}: {reason}")]
    Failure { type_name: String, reason: String },

    /// The host released an object that script code still referenced.
    #[error("{type_name} object has already been destroyed")]
    Expired { type_name: String },

    /// The object is currently borrowed in a conflicting way.
    #[error("{type_name} object is already borrowed")]
    Borrowed { type_name: String },
}

impl ConversionError {
    /// Shorthand for [`ConversionError::TypeMismatch`].
    pub fn mismatch(expected: impl Into<String>, actual: &'static str) -> Self {
        ConversionError::TypeMismatch {
            expected: expected.into(),
            actual,
        }
    }

    /// Shorthand for [`ConversionError::Failure`].
    pub fn failure(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConversionError::Failure {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Unified error type for everything that crosses the bridge.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// A configuration error.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// An overload resolution error.
    #[error(transparent)]
    Call(#[from] CallError),

    /// A value conversion error.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Error raised by script code or by the runtime.
    #[error("{0}")]
    Runtime(String),

    /// An error together with the traceback captured where it was raised.
    #[error("{error}\n{traceback}")]
    Traced {
        error: Box<ScriptError>,
        traceback: String,
    },
}

impl ScriptError {
    /// Create a runtime error from a message.
    pub fn runtime(message: impl Into<String>) -> Self {
        ScriptError::Runtime(message.into())
    }

    /// Attach a traceback unless one is already present.
    pub fn with_traceback(self, traceback: impl Into<String>) -> Self {
        match self {
            traced @ ScriptError::Traced { .. } => traced,
            error => ScriptError::Traced {
                error: Box::new(error),
                traceback: traceback.into(),
            },
        }
    }

    /// The error without any traceback wrapper.
    pub fn root(&self) -> &ScriptError {
        match self {
            ScriptError::Traced { error, .. } => error.root(),
            other => other,
        }
    }

    /// The captured traceback, if any.
    pub fn traceback(&self) -> Option<&str> {
        match self {
            ScriptError::Traced { traceback, .. } => Some(traceback),
            _ => None,
        }
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self.root(), ScriptError::Configuration(_))
    }

    /// Check if this is an overload resolution error.
    pub fn is_call(&self) -> bool {
        matches!(self.root(), ScriptError::Call(_))
    }

    /// Check if this is a conversion error.
    pub fn is_conversion(&self) -> bool {
        matches!(self.root(), ScriptError::Conversion(_))
    }

    /// Check if this is a script-raised runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self.root(), ScriptError::Runtime(_))
    }

    /// Check for [`CallError::NoOverloadMatch`].
    pub fn is_no_overload_match(&self) -> bool {
        matches!(self.root(), ScriptError::Call(CallError::NoOverloadMatch { .. }))
    }

    /// Check for [`CallError::AmbiguousOverload`].
    pub fn is_ambiguous_overload(&self) -> bool {
        matches!(self.root(), ScriptError::Call(CallError::AmbiguousOverload { .. }))
    }

    /// Check for [`CallError::ArgumentCountMismatch`].
    pub fn is_argument_count_mismatch(&self) -> bool {
        matches!(
            self.root(),
            ScriptError::Call(CallError::ArgumentCountMismatch { .. })
        )
    }
}
