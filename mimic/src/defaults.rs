// vim: tw=80
//! Pluggable providers of default return values and placeholders.
//!
//! Both tables are keyed explicitly by the provided type.  A call with no
//! answer returns the registered default for its return type if there is one,
//! and otherwise falls back to the type's `Default` implementation.

use crate::value::Reply;
use std::{
    any::{self, TypeId},
    collections::HashMap,
    fmt
};

type Provider = Box<dyn Fn() -> Reply + Send + Sync>;
type PlaceholderFn = Box<dyn Fn(u64) -> Reply + Send + Sync>;

pub struct DefaultValues {
    defaults: HashMap<TypeId, Provider>,
    placeholders: HashMap<TypeId, PlaceholderFn>
}

impl DefaultValues {
    /// A table with no defaults and no placeholder generators at all.
    pub fn empty() -> Self {
        DefaultValues {
            defaults: HashMap::new(),
            placeholders: HashMap::new()
        }
    }

    /// Return `f()` from calls returning `T` that have no answer.
    pub fn provide<T, F>(&mut self, f: F) -> &mut Self
        where T: Send + Sync + 'static,
              F: Fn() -> T + Send + Sync + 'static
    {
        self.defaults.insert(TypeId::of::<T>(), Box::new(move || Reply::new(f())));
        self
    }

    /// Generate placeholders of type `T` from a sequence number.
    pub fn placeholder_with<T, F>(&mut self, f: F) -> &mut Self
        where T: Send + Sync + 'static,
              F: Fn(u64) -> T + Send + Sync + 'static
    {
        self.placeholders.insert(TypeId::of::<T>(),
                                 Box::new(move |n| Reply::new(f(n))));
        self
    }

    pub fn default_for<T: Clone + 'static>(&self) -> Option<T> {
        self.defaults.get(&TypeId::of::<T>())
            .and_then(|f| f().get::<T>())
    }

    pub fn placeholder_for<T: Clone + 'static>(&self, n: u64) -> Option<T> {
        self.placeholders.get(&TypeId::of::<T>())
            .and_then(|f| f(n).get::<T>())
    }

    pub fn has_placeholder<T: 'static>(&self) -> bool {
        self.placeholders.contains_key(&TypeId::of::<T>())
    }
}

// Values wrap rather than overflow, and never repeat the zero value.
macro_rules! int_placeholder {
    ($table:expr, $($t:ty),*) => {
        $(
            $table.placeholder_with(|n| {
                let m = <$t>::MAX as u64 - 1;
                (1 + n % m) as $t
            });
        )*
    }
}

fn nonzero(n: u64) -> u64 {
    n.wrapping_add(1).max(1)
}

impl Default for DefaultValues {
    /// Placeholder generators for strings, chars, bools and the integer
    /// types.  No return-value defaults beyond `Default`.
    fn default() -> Self {
        let mut table = DefaultValues::empty();
        table.placeholder_with(|n| format!("placeholder_{n}"));
        table.placeholder_with(|n| {
            char::from_u32(0x4e00 + (n % 0x5000) as u32).unwrap_or('?')
        });
        table.placeholder_with(|n| n % 2 == 0);
        int_placeholder!(table, u8, u16, u32, i8, i16, i32);
        table.placeholder_with(nonzero);
        table.placeholder_with(|n| nonzero(n) as i64);
        table.placeholder_with(|n| (nonzero(n) as usize).max(1));
        table.placeholder_with(|n| match nonzero(n) as isize {
            0 => 1,
            v => v
        });
        table
    }
}

impl fmt::Debug for DefaultValues {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DefaultValues")
            .field("defaults", &self.defaults.len())
            .field("placeholders", &self.placeholders.len())
            .finish()
    }
}

/// Name of `T`, for "no default value" diagnostics.
pub(crate) fn type_name<T>() -> &'static str {
    any::type_name::<T>()
}
