//! Conversion cost used by overload scoring.
//!
//! A [`Cost`] is a non-negative integer where lower is better, plus the
//! distinguished [`Cost::IMPOSSIBLE`] value meaning "no conversion exists".
//! Costs add with saturation, so any impossible component makes the whole
//! sum impossible and very long sums never wrap around.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Compatibility cost between a dynamic value and a host parameter type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cost(u32);

impl Cost {
    /// Dynamic type matches the parameter exactly.
    pub const EXACT: Cost = Cost(0);
    /// Value needs a lossless coercion (integer to float, number to string, ...).
    pub const COERCE: Cost = Cost(1);
    /// No conversion exists.
    pub const IMPOSSIBLE: Cost = Cost(u32::MAX);

    /// Create a cost from a raw value. `u32::MAX` is impossible.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Cost(value)
    }

    /// Cost of walking `depth` edges of the cast graph.
    #[inline]
    pub fn cast(depth: usize) -> Self {
        u32::try_from(depth).map(Cost).unwrap_or(Cost::IMPOSSIBLE)
    }

    /// Whether a conversion exists at this cost.
    #[inline]
    pub const fn is_possible(self) -> bool {
        self.0 != u32::MAX
    }

    /// Whether this is an exact match.
    #[inline]
    pub const fn is_exact(self) -> bool {
        self.0 == 0
    }

    /// Raw value, `None` when impossible.
    #[inline]
    pub const fn value(self) -> Option<u32> {
        if self.is_possible() { Some(self.0) } else { None }
    }

    /// Saturating addition; an impossible operand yields [`Cost::IMPOSSIBLE`].
    #[inline]
    pub const fn saturating_add(self, other: Cost) -> Cost {
        Cost(self.0.saturating_add(other.0))
    }

    /// `EXACT` when `ok`, `IMPOSSIBLE` otherwise.
    #[inline]
    pub const fn exact_if(ok: bool) -> Cost {
        if ok { Cost::EXACT } else { Cost::IMPOSSIBLE }
    }

    /// `COERCE` when `ok`, `IMPOSSIBLE` otherwise.
    #[inline]
    pub const fn coerce_if(ok: bool) -> Cost {
        if ok { Cost::COERCE } else { Cost::IMPOSSIBLE }
    }
}

impl Default for Cost {
    fn default() -> Self {
        Cost::EXACT
    }
}

impl Add for Cost {
    type Output = Cost;

    #[inline]
    fn add(self, rhs: Cost) -> Cost {
        self.saturating_add(rhs)
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::EXACT, Cost::saturating_add)
    }
}

impl fmt::Debug for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "Cost({})", v),
            None => write!(f, "Cost(IMPOSSIBLE)"),
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "impossible"),
        }
    }
}
