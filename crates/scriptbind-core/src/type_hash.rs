//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is the process-wide stable identity used to key registered
//! host types, overload sets and cast edges. Two constructors exist:
//!
//! - [`TypeHash::of`] derives the identity of a Rust type from its `TypeId`.
//!   This is what the bridge uses for every registered class, so two types
//!   with the same script name still get distinct identities.
//! - [`TypeHash::from_name`] hashes a script-visible name. It is used for
//!   name-keyed lookups and for script-defined classes that have no Rust type.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so that a type name and
//! a function name with the same spelling never collide.
//!
//! # Examples
//!
//! ```
//! use scriptbind_core::TypeHash;
//!
//! struct Player;
//!
//! assert_eq!(TypeHash::of::<Player>(), TypeHash::of::<Player>());
//! assert_ne!(TypeHash::of::<Player>(), TypeHash::of::<u32>());
//!
//! let by_name = TypeHash::from_name("Player");
//! assert_eq!(by_name, TypeHash::from_name("Player"));
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use xxhash_rust::xxh64::{Xxh64, xxh64};

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for path components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for name-derived type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for hashes derived from a Rust `TypeId`.
    pub const NATIVE: u64 = 0x6c8e9cf570932bd5;

    /// Domain marker for function signature hashes.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Parameter position mixing constants.
    /// Each parameter position gets a unique constant so parameter order matters.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a host type or a binding signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Identity of a Rust type.
    ///
    /// Stable for the lifetime of the process; not stable across builds.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::of_type_id(TypeId::of::<T>())
    }

    /// Identity of an already obtained `TypeId`.
    #[inline]
    pub fn of_type_id(type_id: TypeId) -> Self {
        let mut hasher = Xxh64::new(hash_constants::NATIVE);
        type_id.hash(&mut hasher);
        TypeHash(hasher.finish())
    }

    /// Create a type hash from a script-visible name.
    ///
    /// The same name always produces the same hash.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a signature hash from a function name and its parameter types.
    ///
    /// Parameter order matters: `(int, float)` and `(float, int)` differ.
    ///
    /// ```
    /// use scriptbind_core::TypeHash;
    ///
    /// let int = TypeHash::of::<i32>();
    /// let float = TypeHash::of::<f32>();
    /// assert_ne!(
    ///     TypeHash::from_function("f", &[int, float]),
    ///     TypeHash::from_function("f", &[float, int]),
    /// );
    /// ```
    #[inline]
    pub fn from_function(name: &str, param_hashes: &[TypeHash]) -> Self {
        let mut hash = hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0);
        for (i, param) in param_hashes.iter().enumerate() {
            let marker = hash_constants::PARAM_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
            hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ param.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Bit-preserving conversion to the runtime's integer type.
    ///
    /// Used for the `__typeID` tag stored in class tables.
    #[inline]
    pub const fn to_tag(self) -> i64 {
        self.0 as i64
    }

    /// Inverse of [`TypeHash::to_tag`].
    #[inline]
    pub const fn from_tag(tag: i64) -> Self {
        TypeHash(tag as u64)
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
