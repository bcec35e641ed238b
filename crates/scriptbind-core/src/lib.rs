//! Core types shared by the scriptbind crates.
//!
//! - [`TypeHash`]: stable identity of host types and binding signatures
//! - [`Cost`]: overload scoring unit
//! - [`Projection`] / [`View`]: type-erased pointer adjustment between related host types
//! - the error hierarchy rooted at [`ScriptError`]

mod cost;
mod error;
mod projection;
mod type_hash;

pub use cost::Cost;
pub use error::{CallError, ConfigurationError, ConversionError, ScriptError, ScriptResult};
pub use projection::{Projection, View};
pub use type_hash::{TypeHash, hash_constants};
