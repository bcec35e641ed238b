//! Context configuration properties.

/// Tunable limits of a [`Context`](crate::Context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextProperty {
    /// Longest cast chain the resolver will walk.
    MaxCastDepth,
    /// Longest `__index`/`__newindex` chain the runtime will follow.
    MaxMetaChain,
    /// Deepest nesting of native calls.
    MaxCallDepth,
}

impl ContextProperty {
    /// Every property, in declaration order.
    pub const ALL: [ContextProperty; 3] = [
        ContextProperty::MaxCastDepth,
        ContextProperty::MaxMetaChain,
        ContextProperty::MaxCallDepth,
    ];

    pub fn default_value(&self) -> usize {
        match self {
            ContextProperty::MaxCastDepth => scriptbind_registry::DEFAULT_MAX_CAST_DEPTH,
            ContextProperty::MaxMetaChain => scriptbind_runtime::DEFAULT_MAX_META_CHAIN,
            ContextProperty::MaxCallDepth => scriptbind_runtime::DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
