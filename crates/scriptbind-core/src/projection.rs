//! Type-erased views into host objects.
//!
//! A [`Projection`] turns a reference to one host type into a reference to a
//! related type: a base embedded in a derived struct, a field exposed as an
//! attribute, or any user-supplied cast. A [`View`] is a chain of projections
//! applied from the concrete object outwards. Applying a view never copies
//! the object; it only narrows the borrow.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

type ProjectRef = dyn Fn(&dyn Any) -> Option<&dyn Any>;
type ProjectMut = dyn Fn(&mut dyn Any) -> Option<&mut dyn Any>;

fn erase_ref<F>(f: F) -> Rc<ProjectRef>
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + 'static,
{
    Rc::new(f)
}

fn erase_mut<F>(f: F) -> Rc<ProjectMut>
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + 'static,
{
    Rc::new(f)
}

/// A single typed edge `&Src -> &Dst`, erased to `&dyn Any -> &dyn Any`.
#[derive(Clone)]
pub struct Projection {
    get: Rc<ProjectRef>,
    get_mut: Rc<ProjectMut>,
}

impl Projection {
    /// Build a projection from a pair of typed accessors.
    ///
    /// ```
    /// use scriptbind_core::Projection;
    ///
    /// struct Base { id: u32 }
    /// struct Derived { base: Base }
    ///
    /// let up = Projection::new(|d: &Derived| &d.base, |d: &mut Derived| &mut d.base);
    /// let derived = Derived { base: Base { id: 7 } };
    /// let base = up.apply(&derived).and_then(|b| b.downcast_ref::<Base>());
    /// assert_eq!(base.map(|b| b.id), Some(7));
    /// ```
    pub fn new<Src, Dst>(get: fn(&Src) -> &Dst, get_mut: fn(&mut Src) -> &mut Dst) -> Self
    where
        Src: Any,
        Dst: Any,
    {
        Self {
            get: erase_ref(move |any| any.downcast_ref::<Src>().map(|f| get(f) as &dyn Any)),
            get_mut: erase_mut(move |any| {
                any.downcast_mut::<Src>().map(|f| get_mut(f) as &mut dyn Any)
            }),
        }
    }

    /// Build a projection from closures.
    pub fn from_fns<Src, Dst, G, M>(get: G, get_mut: M) -> Self
    where
        Src: Any,
        Dst: Any,
        G: Fn(&Src) -> &Dst + 'static,
        M: Fn(&mut Src) -> &mut Dst + 'static,
    {
        Self {
            get: erase_ref(move |any| any.downcast_ref::<Src>().map(|f| get(f) as &dyn Any)),
            get_mut: erase_mut(move |any| {
                any.downcast_mut::<Src>().map(|f| get_mut(f) as &mut dyn Any)
            }),
        }
    }

    /// Apply to a shared reference. `None` if the input has the wrong type.
    #[inline]
    pub fn apply<'a>(&self, from: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.get)(from)
    }

    /// Apply to a mutable reference. `None` if the input has the wrong type.
    #[inline]
    pub fn apply_mut<'a>(&self, from: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.get_mut)(from)
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Projection(..)")
    }
}

/// Chain of projections from a concrete object to the type it is viewed as.
///
/// The empty view is the identity.
#[derive(Clone, Default)]
pub struct View {
    steps: Rc<[Projection]>,
}

impl View {
    /// The identity view.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Number of projections in the chain.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// A new view that applies `self` and then `more`.
    pub fn then<'p>(&self, more: impl IntoIterator<Item = &'p Projection>) -> View {
        let steps: Vec<Projection> = self
            .steps
            .iter()
            .cloned()
            .chain(more.into_iter().cloned())
            .collect();
        View {
            steps: steps.into(),
        }
    }

    /// Walk the chain over a shared reference.
    pub fn project<'a>(&self, root: &'a dyn Any) -> Option<&'a dyn Any> {
        let mut current = root;
        for step in self.steps.iter() {
            current = step.apply(current)?;
        }
        Some(current)
    }

    /// Walk the chain over a mutable reference.
    pub fn project_mut<'a>(&self, root: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let mut current = root;
        for step in self.steps.iter() {
            current = step.apply_mut(current)?;
        }
        Some(current)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "View(depth = {})", self.steps.len())
    }
}
