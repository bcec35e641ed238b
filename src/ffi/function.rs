//! Adapters turning Rust closures into [`NativeBinding`]s.
//!
//! The marker parameter `M` (a `fn(A, B) -> R` pointer type) lets one closure
//! type implement the trait for exactly one parameter list, so callers never
//! spell it out:
//!
//! ```ignore
//! module.function("clamp", |v: f64, lo: f64, hi: f64| v.clamp(lo, hi));
//! class.method("length", |v: &Vec3| v.length());
//! class.method_mut("scale", |v: &mut Vec3, s: f32| v.scale(s));
//! ```
//!
//! Arguments are converted before the receiver is borrowed and the borrow
//! ends before results are pushed, so a method may receive its own receiver
//! as an argument and may return objects that are pushed immediately.

use scriptbind_core::Cost;
use scriptbind_runtime::Value;

use crate::convert::{FromScript, IntoScriptMulti, NativeClass, Obj};
use crate::overload::{BindingFlags, NativeBinding};

/// A free function or constructor.
pub trait IntoFunction<M>: 'static {
    fn into_binding(self) -> NativeBinding;
}

/// A method borrowing its receiver immutably.
pub trait IntoMethod<T, M>: 'static {
    fn into_binding(self) -> NativeBinding;
}

/// A method borrowing its receiver mutably.
pub trait IntoMethodMut<T, M>: 'static {
    fn into_binding(self) -> NativeBinding;
}

#[inline]
fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&Value::Nil)
}

macro_rules! impl_into_function {
    ($($A:ident : $i:tt),*) => {
        impl<F, R, $($A,)*> IntoFunction<fn($($A,)*) -> R> for F
        where
            F: Fn($($A),*) -> R + 'static,
            R: IntoScriptMulti + 'static,
            $($A: FromScript + 'static,)*
        {
            #[allow(unused_variables)]
            fn into_binding(self) -> NativeBinding {
                NativeBinding::new(
                    vec![$($A::type_label()),*],
                    |state, args| Cost::EXACT $(+ $A::score(arg(args, $i), state))*,
                    move |_, args| {
                        let converted = ($(args.arg::<$A>($i)?,)*);
                        let result = (self)($(converted.$i),*);
                        result.into_script_multi(args.state())
                    },
                )
            }
        }

        impl<T, F, R, $($A,)*> IntoMethod<T, fn($($A,)*) -> R> for F
        where
            T: NativeClass,
            F: Fn(&T, $($A),*) -> R + 'static,
            R: IntoScriptMulti + 'static,
            $($A: FromScript + 'static,)*
        {
            #[allow(unused_variables)]
            fn into_binding(self) -> NativeBinding {
                NativeBinding::new(
                    vec![T::NAME.into() $(, $A::type_label())*],
                    |state, args| {
                        Obj::<T>::score(arg(args, 0), state)
                            $(+ $A::score(arg(args, $i + 1), state))*
                    },
                    move |_, args| {
                        let this = args.arg::<Obj<T>>(0)?;
                        let converted = ($(args.arg::<$A>($i + 1)?,)*);
                        let result = {
                            let receiver = this.borrow()?;
                            (self)(&*receiver $(, converted.$i)*)
                        };
                        result.into_script_multi(args.state())
                    },
                )
                .with_flags(BindingFlags::METHOD | BindingFlags::CONST)
            }
        }

        impl<T, F, R, $($A,)*> IntoMethodMut<T, fn($($A,)*) -> R> for F
        where
            T: NativeClass,
            F: Fn(&mut T, $($A),*) -> R + 'static,
            R: IntoScriptMulti + 'static,
            $($A: FromScript + 'static,)*
        {
            #[allow(unused_variables)]
            fn into_binding(self) -> NativeBinding {
                NativeBinding::new(
                    vec![T::NAME.into() $(, $A::type_label())*],
                    |state, args| {
                        Obj::<T>::score(arg(args, 0), state)
                            $(+ $A::score(arg(args, $i + 1), state))*
                    },
                    move |_, args| {
                        let this = args.arg::<Obj<T>>(0)?;
                        let converted = ($(args.arg::<$A>($i + 1)?,)*);
                        let result = {
                            let mut receiver = this.borrow_mut()?;
                            (self)(&mut *receiver $(, converted.$i)*)
                        };
                        result.into_script_multi(args.state())
                    },
                )
                .with_flags(BindingFlags::METHOD)
            }
        }
    };
}

impl_into_function!();
impl_into_function!(A0: 0);
impl_into_function!(A0: 0, A1: 1);
impl_into_function!(A0: 0, A1: 1, A2: 2);
impl_into_function!(A0: 0, A1: 1, A2: 2, A3: 3);
impl_into_function!(A0: 0, A1: 1, A2: 2, A3: 3, A4: 4);
impl_into_function!(A0: 0, A1: 1, A2: 2, A3: 3, A4: 4, A5: 5);
