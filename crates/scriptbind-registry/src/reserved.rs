//! Bookkeeping keys stored in generated class tables.

/// Type identity tag of the class.
pub const TYPE_ID: &str = "__typeID";
/// Script-visible class name.
pub const CLASS_NAME: &str = "__className";
/// Instance read hook.
pub const INDEX: &str = "__index";
/// Instance write hook.
pub const NEW_INDEX: &str = "__newindex";
/// Finalization hook.
pub const GC: &str = "__gc";
/// Attribute accessor table.
pub const ATTRIBUTES: &str = "__attributes";
/// Sequence of direct base class tables.
pub const BASES: &str = "__bases";
/// Script class initializer.
pub const INIT: &str = "__init";

/// Keys no member, static or attribute may use.
pub const RESERVED_KEYS: [&str; 8] = [
    TYPE_ID, CLASS_NAME, INDEX, NEW_INDEX, GC, ATTRIBUTES, BASES, INIT,
];

/// Keys not copied from a base class table into a derived one.
pub const NOT_INHERITED: [&str; 6] = [BASES, TYPE_ID, INDEX, NEW_INDEX, GC, CLASS_NAME];

/// Check whether a name is reserved.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}
