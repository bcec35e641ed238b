//! Overload resolution for calls into host code.
//!
//! ## Algorithm
//!
//! 1. Filter candidates by argument count: a binding with N parameters and D
//!    defaults accepts `N - D ..= N` arguments
//! 2. Backfill missing trailing arguments from the candidate's defaults
//! 3. Score every remaining candidate with [`Binding::score`]
//! 4. Rank: the unique minimum finite cost wins
//! 5. Report count mismatches, impossible calls and ties as [`CallError`]s

mod binding;
mod ranking;

pub use binding::{Binding, BindingFlags, CallArgs, NativeBinding};
pub use ranking::{Ranking, Scored, rank};

use std::borrow::Cow;
use std::rc::Rc;

use scriptbind_core::{CallError, ScriptResult};
use scriptbind_registry::{OverloadEntry, OverloadSet};
use scriptbind_runtime::{Value, Vm};

use crate::bridge::value_type_name;
use crate::context::ContextState;

/// Arity reported by bindings that read their own arguments.
const VARIADIC: usize = usize::MAX;

/// Whether `entry` accepts `given` arguments.
fn accepts(entry: &OverloadEntry<dyn Binding>, given: usize) -> bool {
    let arity = entry.binding.arity();
    if arity == VARIADIC {
        return true;
    }
    let required = arity.saturating_sub(entry.default_count());
    (required..=arity).contains(&given)
}

/// `args` extended with the defaults `entry` needs for the missing tail.
fn backfill<'a>(entry: &OverloadEntry<dyn Binding>, args: &'a [Value]) -> Cow<'a, [Value]> {
    let arity = entry.binding.arity();
    let defaults = match &entry.defaults {
        Some(d) if arity != VARIADIC && args.len() < arity => d,
        _ => return Cow::Borrowed(args),
    };
    // Defaults cover the last `defaults.len()` parameters.
    let first_default = arity - defaults.len();
    let skip = args.len() - first_default;
    let mut full = args.to_vec();
    full.extend(defaults[skip..].iter().cloned());
    Cow::Owned(full)
}

/// Resolve a call against an overload set.
///
/// Returns the winning binding and the argument list with defaults appended.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve(
    state: &ContextState,
    name: &str,
    set: &OverloadSet<dyn Binding>,
    args: Vec<Value>,
) -> Result<(Rc<dyn Binding>, Vec<Value>), CallError> {
    let given = args.len();
    let scored: Vec<Scored> = set
        .iter()
        .enumerate()
        .filter(|(_, entry)| accepts(entry, given))
        .map(|(index, entry)| Scored {
            index,
            cost: entry.binding.score(state, &backfill(entry, &args)),
        })
        .collect();

    if scored.is_empty() {
        return Err(CallError::ArgumentCountMismatch {
            name: name.to_string(),
            expected: expected_counts(set),
            got: given,
        });
    }

    match rank(&scored) {
        Ranking::Unique(index) => {
            let entry = &set.entries()[index];
            let full = backfill(entry, &args).into_owned();
            Ok((Rc::clone(&entry.binding), full))
        }
        Ranking::Ambiguous(tied) => Err(CallError::AmbiguousOverload {
            name: name.to_string(),
            args: describe_args(&args),
            candidates: tied
                .into_iter()
                .map(|i| set.entries()[i].binding.describe(name))
                .collect(),
        }),
        Ranking::NoMatch => Err(CallError::NoOverloadMatch {
            name: name.to_string(),
            args: describe_args(&args),
            candidates: set.iter().map(|e| e.binding.describe(name)).collect(),
        }),
    }
}

/// Resolve and invoke.
pub fn dispatch(
    vm: &mut Vm,
    state: &Rc<ContextState>,
    name: &str,
    set: &OverloadSet<dyn Binding>,
    args: Vec<Value>,
) -> ScriptResult<Vec<Value>> {
    let (binding, args) = resolve(state, name, set, args).inspect_err(|e| {
        tracing::debug!(name, error = %e, "overload resolution failed");
    })?;
    let results = binding.invoke(vm, CallArgs::new(args, Rc::clone(state)));
    state.identity().run_deferred();
    results
}

/// Accepted argument counts, e.g. `2`, `1 to 3` or `2 or 3`.
fn expected_counts(set: &OverloadSet<dyn Binding>) -> String {
    let mut ranges: Vec<(usize, usize)> = set
        .iter()
        .map(|e| {
            let arity = e.binding.arity();
            (arity.saturating_sub(e.default_count()), arity)
        })
        .collect();
    if ranges.iter().any(|&(_, hi)| hi == VARIADIC) {
        return "any number".to_string();
    }
    ranges.sort_unstable();
    ranges.dedup();
    ranges
        .into_iter()
        .map(|(lo, hi)| {
            if lo == hi {
                lo.to_string()
            } else {
                format!("{} to {}", lo, hi)
            }
        })
        .collect::<Vec<_>>()
        .join(" or ")
}

fn describe_args(args: &[Value]) -> String {
    args.iter()
        .map(value_type_name)
        .collect::<Vec<_>>()
        .join(", ")
}
