//! Reference dynamic runtime for scriptbind.
//!
//! Provides the primitives the bridge is written against:
//!
//! - [`Value`]: nil, booleans, integers, numbers, strings, tables, functions, userdata
//! - [`Table`]: insertion-ordered table with an optional metatable
//! - [`Function`]: native callables taking and returning value sequences
//! - [`AnyUserData`]: opaque host payloads
//! - [`Vm`]: globals, registry references, `__index`/`__newindex`/`__call` chains,
//!   metamethod operators and tracebacks
//!
//! All values are `Rc`-based; a `Vm` and its values stay on one thread.

mod function;
mod refs;
mod table;
mod userdata;
mod value;
mod vm;

pub use function::{Function, NativeCallable};
pub use refs::{RegistryKey, RegistryRefs};
pub use table::Table;
pub use userdata::{AnyUserData, WeakUserData};
pub use value::{Key, Value, float_to_integer, parse_number};
pub use vm::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_META_CHAIN, MetaMethod, Vm};
