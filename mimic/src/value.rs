// vim: tw=80
//! Type-erased values carried through an [`Invocation`](crate::Invocation).
//!
//! Arguments are stored as [`Arg`]s, which can be compared against each other
//! and rendered for diagnostics.  Return values and stubbed errors only need to
//! be cloned back out, so they are stored as the looser [`Reply`] and
//! [`Fault`].

use downcast::{downcast, Any};
use std::{
    any::{self, Any as StdAny},
    fmt,
    sync::Arc
};

/// A value that may appear as a mocked method's argument.
///
/// Implemented for every `'static` type that is `Debug + PartialEq + Send +
/// Sync`.
pub trait Value: Any + fmt::Debug + Send + Sync {
    /// Compare with another, possibly differently typed, value.  Values of
    /// different types are never equal.
    fn eq_value(&self, other: &dyn Value) -> bool;

    /// Name of the concrete type, for diagnostics.
    fn value_type_name(&self) -> &'static str;
}
downcast!(dyn Value);

impl<T> Value for T
    where T: fmt::Debug + PartialEq + Send + Sync + 'static
{
    fn eq_value(&self, other: &dyn Value) -> bool {
        other.downcast_ref::<T>().map_or(false, |o| self == o)
    }

    fn value_type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// One recorded argument.  Cheap to clone; clones share the same allocation.
#[derive(Clone)]
pub struct Arg(Arc<dyn Value>);

impl Arg {
    pub fn new<T: Value>(value: T) -> Self {
        Arg(Arc::new(value))
    }

    pub fn value(&self) -> &dyn Value {
        &*self.0
    }

    /// Borrow the argument as a `T`, if that is its type.
    pub fn downcast_ref<T: Value>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>().ok()
    }

    /// Is this the very same argument as `other`?
    ///
    /// Two `Arg`s are the same if they are clones of one another, or if they
    /// hold equal values.  Sentinels are expected to be unique values, such as
    /// those produced by [`Session::placeholder`](crate::Session::placeholder).
    pub fn is_same(&self, other: &Arg) -> bool {
        let lhs = Arc::as_ptr(&self.0) as *const ();
        let rhs = Arc::as_ptr(&other.0) as *const ();
        lhs == rhs || self.0.eq_value(&*other.0)
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Arg) -> bool {
        self.0.eq_value(&*other.0)
    }
}

/// A stubbed or computed return value.
#[derive(Clone)]
pub struct Reply {
    value: Arc<dyn StdAny + Send + Sync>,
    type_name: &'static str
}

impl Reply {
    pub fn new<R: Send + Sync + 'static>(value: R) -> Self {
        Reply {
            value: Arc::new(value),
            type_name: any::type_name::<R>()
        }
    }

    /// Clone the value back out as an `R`.
    pub fn get<R: Clone + 'static>(&self) -> Option<R> {
        self.value.downcast_ref::<R>().cloned()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Reply<{}>", self.type_name)
    }
}

/// A stubbed error, raised by the substitute instead of returning.
#[derive(Clone)]
pub struct Fault {
    error: Arc<dyn StdAny + Send + Sync>,
    type_name: &'static str,
    debug: String
}

impl Fault {
    pub fn new<E>(error: E) -> Self
        where E: fmt::Debug + Send + Sync + 'static
    {
        let debug = format!("{error:?}");
        Fault {
            error: Arc::new(error),
            type_name: any::type_name::<E>(),
            debug
        }
    }

    /// Clone the error back out as an `E`.
    pub fn get<E: Clone + 'static>(&self) -> Option<E> {
        self.error.downcast_ref::<E>().cloned()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.debug)
    }
}
