//! Iterators pushed as stateful generator functions.

use std::cell::RefCell;

use scriptbind_core::ScriptResult;
use scriptbind_runtime::{Function, Value};

use super::IntoScript;
use crate::context::{ContextState, context_state};

/// Push an iterator as a function returning the next item on every call,
/// then nil once exhausted.
///
/// Script code drives it like any generic `for` loop source:
///
/// ```text
/// for item in obj:children() do ... end
/// ```
pub struct ScriptIter<I>(pub I);

impl<I> IntoScript for ScriptIter<I>
where
    I: Iterator + 'static,
    I::Item: IntoScript,
{
    fn into_script(self, _: &ContextState) -> ScriptResult<Value> {
        let iter = RefCell::new(self.0.fuse());
        let next = Function::new("iterator", move |vm, _| {
            let item = iter.borrow_mut().next();
            match item {
                Some(item) => {
                    let state = context_state(vm)?;
                    Ok(vec![item.into_script(&state)?])
                }
                None => Ok(vec![Value::Nil]),
            }
        });
        Ok(Value::Function(next))
    }
}
