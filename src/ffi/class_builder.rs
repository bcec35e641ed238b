//! ClassBuilder for exposing host types to script code.
//!
//! A builder collects constructors, methods, statics, attributes, operators,
//! bases and casts for one [`NativeClass`], then registers them as a single
//! immutable type descriptor.
//!
//! # Example
//!
//! ```ignore
//! let vec3 = ClassBuilder::<Vec3>::new()
//!     .constructor(|| Vec3::default())
//!     .constructor(|x: f32, y: f32, z: f32| Vec3::new(x, y, z))
//!     .method("length", |v: &Vec3| v.length())
//!     .method_mut("normalize", |v: &mut Vec3| v.normalize())
//!     .attribute("x", |v: &Vec3| v.x, |v: &mut Vec3, x: f32| v.x = x)
//!     .operator(MetaMethod::Add, |a: &Vec3, b: Vec3| *a + b);
//! ctx.register_class(vec3)?;
//!
//! let sphere = ClassBuilder::<Sphere>::new()
//!     .base::<Shape>(|s| &s.shape, |s| &mut s.shape)
//!     .constructor(|r: f32| Sphere::new(r))
//!     .finalizer(|s: &mut Sphere| s.release_gpu_buffers());
//! ctx.register_class(sphere)?;
//! ```

use std::any::Any;
use std::rc::Rc;

use scriptbind_core::{ConfigurationError, Projection, ScriptResult, TypeHash};
use scriptbind_registry::{AttributeDescriptor, OverloadEntry, TypeDescriptor};
use scriptbind_runtime::{MetaMethod, Table, Value, Vm};

use super::function::{IntoFunction, IntoMethod, IntoMethodMut};
use crate::bridge::class_table;
use crate::context::ContextState;
use crate::convert::{FromScript, IntoScript, NativeClass, Obj, Unowned};
use crate::overload::{Binding, BindingFlags, NativeBinding};

/// Builder for one registered class.
pub struct ClassBuilder<T: NativeClass> {
    descriptor: TypeDescriptor<dyn Binding>,
    base_names: Vec<(TypeHash, &'static str)>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: NativeClass> Default for ClassBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NativeClass> ClassBuilder<T> {
    /// Start a class named [`NativeClass::NAME`].
    pub fn new() -> Self {
        Self {
            descriptor: TypeDescriptor::new(TypeHash::of::<T>(), T::NAME),
            base_names: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    // ==========================================================================
    // Constructors and statics
    // ==========================================================================

    /// Add a constructor overload, reachable as `T.new(...)` and `T(...)`.
    pub fn constructor<F, M>(mut self, f: F) -> Self
    where
        F: IntoFunction<M>,
    {
        let binding = f.into_binding().with_flags(BindingFlags::CONSTRUCTOR);
        self.descriptor
            .add_constructor(OverloadEntry::new(binding.into_rc()));
        self
    }

    /// Add a constructor overload whose trailing parameters have defaults.
    pub fn constructor_with_defaults<F, M>(
        mut self,
        f: F,
        defaults: Vec<Value>,
    ) -> Result<Self, ConfigurationError>
    where
        F: IntoFunction<M>,
    {
        let binding = f.into_binding().with_flags(BindingFlags::CONSTRUCTOR);
        let entry = with_defaults(&format!("{}.new", T::NAME), binding, defaults)?;
        self.descriptor.add_constructor(entry);
        Ok(self)
    }

    /// Add a static factory under `name`, e.g. `T.fromPolar(r, phi)`.
    pub fn named_constructor<F, M>(mut self, name: &str, f: F) -> Self
    where
        F: IntoFunction<M>,
    {
        let binding = f
            .into_binding()
            .with_flags(BindingFlags::STATIC | BindingFlags::CONSTRUCTOR);
        self.descriptor
            .add_static(name, OverloadEntry::new(binding.into_rc()));
        self
    }

    /// Add a class-level function without a receiver.
    pub fn static_fn<F, M>(mut self, name: &str, f: F) -> Self
    where
        F: IntoFunction<M>,
    {
        let binding = f.into_binding().with_flags(BindingFlags::STATIC);
        self.descriptor
            .add_static(name, OverloadEntry::new(binding.into_rc()));
        self
    }

    // ==========================================================================
    // Methods
    // ==========================================================================

    /// Add a method overload borrowing the receiver immutably.
    pub fn method<F, M>(mut self, name: &str, f: F) -> Self
    where
        F: IntoMethod<T, M>,
    {
        self.descriptor
            .add_member(name, OverloadEntry::new(f.into_binding().into_rc()));
        self
    }

    /// Add a method overload borrowing the receiver mutably.
    pub fn method_mut<F, M>(mut self, name: &str, f: F) -> Self
    where
        F: IntoMethodMut<T, M>,
    {
        self.descriptor
            .add_member(name, OverloadEntry::new(f.into_binding().into_rc()));
        self
    }

    /// Add a method overload whose trailing parameters have defaults.
    pub fn method_with_defaults<F, M>(
        mut self,
        name: &str,
        f: F,
        defaults: Vec<Value>,
    ) -> Result<Self, ConfigurationError>
    where
        F: IntoMethod<T, M>,
    {
        let entry = with_defaults(
            &format!("{}.{}", T::NAME, name),
            f.into_binding(),
            defaults,
        )?;
        self.descriptor.add_member(name, entry);
        Ok(self)
    }

    /// Add a method that reads its arguments itself.
    ///
    /// The first argument is the receiver. The binding accepts any argument
    /// list at exact cost.
    pub fn raw_method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut Vm, crate::overload::CallArgs) -> ScriptResult<Vec<Value>> + 'static,
    {
        let binding = NativeBinding::raw(f).with_flags(BindingFlags::METHOD);
        self.descriptor
            .add_member(name, OverloadEntry::new(binding.into_rc()));
        self
    }

    /// Register an operator implemented as a method, e.g. `__add`, `__eq`,
    /// `__tostring`.
    pub fn operator<F, M>(self, op: MetaMethod, f: F) -> Self
    where
        F: IntoMethod<T, M>,
    {
        self.method(op.name(), f)
    }

    /// Register an operator implemented as a free function, for operand
    /// orders where the receiver is not first (`2 * v`).
    pub fn operator_fn<F, M>(mut self, op: MetaMethod, f: F) -> Self
    where
        F: IntoFunction<M>,
    {
        self.descriptor
            .add_member(op.name(), OverloadEntry::new(f.into_binding().into_rc()));
        self
    }

    // ==========================================================================
    // Attributes
    // ==========================================================================

    /// Expose a field by value through a getter and a setter.
    pub fn attribute<V, G, S>(mut self, name: &str, get: G, set: S) -> Self
    where
        V: FromScript + IntoScript + 'static,
        G: Fn(&T) -> V + 'static,
        S: Fn(&mut T, V) + 'static,
    {
        let getter = getter_binding::<T, V, G>(get);
        let setter = IntoMethodMut::<T, fn(V)>::into_binding(move |t: &mut T, v: V| set(t, v))
            .with_flags(BindingFlags::SETTER);
        self.descriptor.add_attribute(AttributeDescriptor {
            name: name.to_string(),
            getter: getter.into_rc(),
            setter: Some(setter.into_rc()),
        });
        self
    }

    /// Expose a field by value without a setter; writes raise an error.
    pub fn readonly_attribute<V, G>(mut self, name: &str, get: G) -> Self
    where
        V: IntoScript + 'static,
        G: Fn(&T) -> V + 'static,
    {
        self.descriptor.add_attribute(AttributeDescriptor {
            name: name.to_string(),
            getter: getter_binding::<T, V, G>(get).into_rc(),
            setter: None,
        });
        self
    }

    /// Expose an object field by reference.
    ///
    /// Reads push a non-owning handle viewing the field inside the parent
    /// object, so mutating it through script code mutates the parent.
    /// Writes replace the field with a copy of the assigned object.
    pub fn attribute_ref<F>(
        mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self
    where
        F: NativeClass + Clone,
    {
        let projection = Projection::new(get, get_mut);
        let getter = NativeBinding::new(
            vec![T::NAME.into()],
            |state, args| Obj::<T>::score(args.first().unwrap_or(&Value::Nil), state),
            move |_, args| {
                let parent = args.arg::<Obj<T>>(0)?;
                let view = parent.view().then([&projection]);
                let field = Obj::<F>::from_parts(parent.cell().clone(), view);
                Ok(vec![Unowned(field).into_script(args.state())?])
            },
        )
        .with_flags(BindingFlags::METHOD | BindingFlags::CONST | BindingFlags::GETTER);
        let setter =
            IntoMethodMut::<T, fn(F)>::into_binding(move |t: &mut T, v: F| *get_mut(t) = v)
                .with_flags(BindingFlags::SETTER);
        self.descriptor.add_attribute(AttributeDescriptor {
            name: name.to_string(),
            getter: getter.into_rc(),
            setter: Some(setter.into_rc()),
        });
        self
    }

    // ==========================================================================
    // Relations
    // ==========================================================================

    /// Declare a direct base class embedded in `T`.
    ///
    /// The base must be registered first. Members the class does not define
    /// are inherited from the base, and `T` objects convert to `B`.
    pub fn base<B: NativeClass>(mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> Self {
        self.descriptor
            .add_base(TypeHash::of::<B>(), Projection::new(get, get_mut));
        self.base_names.push((TypeHash::of::<B>(), B::NAME));
        self
    }

    /// Declare a conversion to a type that is not a base.
    pub fn cast<U: NativeClass>(mut self, get: fn(&T) -> &U, get_mut: fn(&mut T) -> &mut U) -> Self {
        self.descriptor
            .add_cast(TypeHash::of::<U>(), Projection::new(get, get_mut));
        self
    }

    // ==========================================================================
    // Lifetime
    // ==========================================================================

    /// Hook run when the runtime finalizes an object it owns, before the
    /// object is released.
    pub fn finalizer<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) + 'static,
    {
        self.descriptor.set_finalizer(Rc::new(move |any: &mut dyn Any| {
            if let Some(object) = any.downcast_mut::<T>() {
                f(object);
            }
        }));
        self
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register into `state`, returning the generated class table.
    pub(crate) fn register(self, vm: &mut Vm, state: &ContextState) -> ScriptResult<Table> {
        if let Some((_, base)) = self
            .base_names
            .iter()
            .find(|(hash, _)| !state.types().contains(*hash))
        {
            return Err(ConfigurationError::UnregisteredBase {
                type_name: T::NAME.to_string(),
                base: base.to_string(),
            }
            .into());
        }
        let hash = self.descriptor.hash();
        let table = state
            .types_mut()
            .register_type(vm, self.descriptor, class_table::populate)?;
        if let Some(descriptor) = state.types().lookup(hash) {
            state.retain_defaults(descriptor);
        }
        Ok(table)
    }
}

fn getter_binding<T, V, G>(get: G) -> NativeBinding
where
    T: NativeClass,
    V: IntoScript + 'static,
    G: Fn(&T) -> V + 'static,
{
    NativeBinding::new(
        vec![T::NAME.into()],
        |state, args| Obj::<T>::score(args.first().unwrap_or(&Value::Nil), state),
        move |_, args| {
            let this = args.arg::<Obj<T>>(0)?;
            let value = {
                let receiver = this.borrow()?;
                get(&receiver)
            };
            Ok(vec![value.into_script(args.state())?])
        },
    )
    .with_flags(BindingFlags::METHOD | BindingFlags::CONST | BindingFlags::GETTER)
}

/// An overload entry with defaults, rejecting more defaults than parameters.
pub(crate) fn with_defaults(
    name: &str,
    binding: NativeBinding,
    defaults: Vec<Value>,
) -> Result<OverloadEntry<dyn Binding>, ConfigurationError> {
    let params = binding.arity();
    if defaults.len() > params {
        return Err(ConfigurationError::TooManyDefaults {
            name: name.to_string(),
            defaults: defaults.len(),
            params,
        });
    }
    Ok(OverloadEntry::with_defaults(binding.into_rc(), defaults))
}

/// Type-erased class registration, used by modules.
pub(crate) trait ClassRegistration {
    fn name(&self) -> &'static str;

    fn register(self: Box<Self>, vm: &mut Vm, state: &ContextState) -> ScriptResult<Table>;
}

impl<T: NativeClass> ClassRegistration for ClassBuilder<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn register(self: Box<Self>, vm: &mut Vm, state: &ContextState) -> ScriptResult<Table> {
        (*self).register(vm, state)
    }
}
