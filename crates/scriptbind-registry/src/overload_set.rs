//! Ordered candidate lists sharing one script-visible name.

use std::fmt;
use std::rc::Rc;

use scriptbind_runtime::Value;

/// One candidate: a binding plus the values backfilled for omitted trailing
/// parameters.
pub struct OverloadEntry<B: ?Sized> {
    /// The callable binding
    pub binding: Rc<B>,
    /// Default values for the last `defaults.len()` parameters
    pub defaults: Option<Rc<[Value]>>,
}

impl<B: ?Sized> OverloadEntry<B> {
    /// Entry without defaults.
    pub fn new(binding: Rc<B>) -> Self {
        Self {
            binding,
            defaults: None,
        }
    }

    /// Entry with defaults for the trailing parameters.
    pub fn with_defaults(binding: Rc<B>, defaults: Vec<Value>) -> Self {
        Self {
            binding,
            defaults: if defaults.is_empty() {
                None
            } else {
                Some(defaults.into())
            },
        }
    }

    /// Number of default values.
    pub fn default_count(&self) -> usize {
        self.defaults.as_ref().map_or(0, |d| d.len())
    }
}

impl<B: ?Sized> Clone for OverloadEntry<B> {
    fn clone(&self) -> Self {
        Self {
            binding: Rc::clone(&self.binding),
            defaults: self.defaults.clone(),
        }
    }
}

/// Candidates sharing one name, in registration order.
///
/// Registration appends; a later registration under the same name adds a
/// candidate rather than replacing earlier ones.
pub struct OverloadSet<B: ?Sized> {
    name: String,
    entries: Vec<OverloadEntry<B>>,
}

impl<B: ?Sized> OverloadSet<B> {
    /// Empty set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Script-visible name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a candidate.
    pub fn push(&mut self, entry: OverloadEntry<B>) {
        self.entries.push(entry);
    }

    /// Candidates in registration order.
    pub fn entries(&self) -> &[OverloadEntry<B>] {
        &self.entries
    }

    /// Iterate candidates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OverloadEntry<B>> {
        self.entries.iter()
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no candidates.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B: ?Sized> Clone for OverloadSet<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<B: ?Sized> fmt::Debug for OverloadSet<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverloadSet")
            .field("name", &self.name)
            .field("candidates", &self.entries.len())
            .finish()
    }
}
