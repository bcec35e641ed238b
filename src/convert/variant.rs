//! Tagged unions over alternative host types.
//!
//! A variant parameter accepts a value if any alternative does. The
//! alternative with the lowest score is chosen; on ties the one listed first
//! wins, so `Variant2<i32, f64>` reads `3` as `A(3)` and `3.5` as `B(3.5)`.

use std::borrow::Cow;

use scriptbind_core::{ConversionError, Cost, ScriptResult};
use scriptbind_runtime::Value;

use super::{FromScript, IntoScript};
use crate::context::ContextState;

/// Position of the cheapest alternative; first wins ties.
fn cheapest(scores: &[Cost]) -> Option<(usize, Cost)> {
    let mut best: Option<(usize, Cost)> = None;
    for (i, &cost) in scores.iter().enumerate() {
        if !cost.is_possible() {
            continue;
        }
        if best.is_none_or(|(_, b)| cost < b) {
            best = Some((i, cost));
        }
    }
    best
}

macro_rules! define_variant {
    ($name:ident, $($alt:ident : $idx:tt),+) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name<$($alt),+> {
            $($alt($alt)),+
        }

        impl<$($alt: FromScript),+> FromScript for $name<$($alt),+> {
            fn score(value: &Value, state: &ContextState) -> Cost {
                let scores = [$($alt::score(value, state)),+];
                cheapest(&scores).map_or(Cost::IMPOSSIBLE, |(_, c)| c)
            }

            fn from_script(value: &Value, state: &ContextState) -> Result<Self, ConversionError> {
                let scores = [$($alt::score(value, state)),+];
                match cheapest(&scores).map(|(i, _)| i) {
                    $(Some($idx) => $alt::from_script(value, state).map($name::$alt),)+
                    _ => Err(ConversionError::mismatch(Self::type_label(), value.type_name())),
                }
            }

            fn type_label() -> Cow<'static, str> {
                let labels = [$($alt::type_label()),+];
                Cow::Owned(labels.join("|"))
            }
        }

        impl<$($alt: IntoScript),+> IntoScript for $name<$($alt),+> {
            fn into_script(self, state: &ContextState) -> ScriptResult<Value> {
                match self {
                    $($name::$alt(v) => v.into_script(state)),+
                }
            }
        }
    };
}

define_variant!(Variant2, A: 0, B: 1);
define_variant!(Variant3, A: 0, B: 1, C: 2);
define_variant!(Variant4, A: 0, B: 1, C: 2, D: 3);
