// vim: tw=80
//! The hook between a substitute and the engine.
//!
//! A substitute owns a [`Binding`].  Each of its methods builds an
//! [`Invocation`], hands it to [`Binding::intercept`], and applies the
//! resulting [`Call`]: forwarding to a spied target if nothing answered,
//! writing back output arguments, raising a stubbed error, and finally
//! producing the return value.

use crate::{
    defaults,
    invocation::{Invocation, MethodId, SubstituteId},
    session::Shared,
    state::MockState,
    value::{Arg, Value}
};
use std::sync::{Arc, PoisonError};

/// Implemented by every substitute so the session can find its state.
pub trait Substitute {
    fn binding(&self) -> &Binding;
}

/// Connects one substitute to its [`MockState`] and to the session it was
/// created in.
#[derive(Clone)]
pub struct Binding {
    state: Arc<MockState>,
    shared: Arc<Shared>
}

impl Binding {
    pub(crate) fn new(state: Arc<MockState>, shared: Arc<Shared>) -> Self {
        Binding { state, shared }
    }

    pub fn id(&self) -> SubstituteId {
        self.state.id()
    }

    pub fn name(&self) -> &'static str {
        self.state.name()
    }

    pub(crate) fn state(&self) -> &Arc<MockState> {
        &self.state
    }

    /// Start describing a call to `method` on this substitute.
    pub fn invocation(&self, method: MethodId, args: Vec<Arg>) -> Invocation {
        Invocation::new(self.id(), method, args)
    }

    /// Record `invocation` and resolve it against the expectations.
    pub fn intercept(&self, mut invocation: Invocation) -> Call {
        let answered = self.state.record(&mut invocation, &self.shared.clock);
        Call {
            invocation,
            answered,
            shared: self.shared.clone()
        }
    }

    /// Number of calls recorded on this substitute and not yet verified.
    pub fn unverified(&self) -> usize {
        self.state.unverified()
    }

    /// Snapshot of this substitute's call history.
    pub fn history(&self) -> Vec<Invocation> {
        self.state.history()
    }
}

impl Substitute for Binding {
    fn binding(&self) -> &Binding {
        self
    }
}

/// A resolved call, ready to be applied by the substitute.
pub struct Call {
    invocation: Invocation,
    answered: bool,
    shared: Arc<Shared>
}

impl Call {
    /// Did an expectation supply a terminal answer?  If not, the substitute
    /// should forward to its target, if it has one.
    pub fn is_answered(&self) -> bool {
        self.answered
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Copy a staged replacement for argument `index`, if any, into `slot`.
    ///
    /// # Panics
    ///
    /// If the staged value is not a `T`.
    pub fn write_back<T: Value + Clone>(&self, index: usize, slot: &mut T) {
        if let Some(arg) = self.invocation.replacement(index) {
            match arg.downcast_ref::<T>() {
                Some(v) => *slot = v.clone(),
                None => panic!("{}: argument {} can't be set from a {}",
                               self.invocation.method(), index,
                               arg.value().value_type_name())
            }
        }
    }

    /// Take the stubbed error as an `E`, for methods returning `Result<_, E>`.
    ///
    /// # Panics
    ///
    /// If the stubbed error is not an `E`.
    pub fn error<E: Clone + 'static>(&self) -> Option<E> {
        self.invocation.fault().map(|fault| {
            fault.get::<E>().unwrap_or_else(|| {
                panic!("{}: stubbed error {:?} is a {}, not a {}",
                       self.invocation.method(), fault, fault.type_name(),
                       defaults::type_name::<E>())
            })
        })
    }

    /// Raise the stubbed error, if any, as a panic.  For methods that have no
    /// error channel.
    pub fn raise(&self) {
        if let Some(fault) = self.invocation.fault() {
            panic!("{}: stubbed error: {:?}", self.invocation, fault);
        }
    }

    /// Produce the return value: the stubbed one if there is one, else the
    /// session's registered default for `R`, else `structural()`.
    ///
    /// # Panics
    ///
    /// If the stubbed value is not an `R`, or no default could be found.
    pub fn output<R, F>(&self, structural: F) -> R
        where R: Clone + 'static, F: FnOnce() -> Option<R>
    {
        if let Some(reply) = self.invocation.reply() {
            return reply.get::<R>().unwrap_or_else(|| {
                panic!("{}: stubbed return value is a {}, not a {}",
                       self.invocation.method(), reply.type_name(),
                       defaults::type_name::<R>())
            });
        }
        let provided = self.shared.defaults.read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_for::<R>();
        provided.or_else(structural).unwrap_or_else(|| {
            panic!("{}: no default value for {}.  Stub the call or register \
                   a default with Session::provide_default",
                   self.invocation, defaults::type_name::<R>())
        })
    }
}

/// Used by generated substitutes to fall back to `Default` where the return
/// type implements it.
#[doc(hidden)]
pub mod structural {
    use std::marker::PhantomData;

    pub struct Structural<T>(PhantomData<fn() -> T>);

    impl<T> Structural<T> {
        #[allow(clippy::new_without_default)]
        pub fn new() -> Self {
            Structural(PhantomData)
        }
    }

    // Autoref specialization: `(&&Structural::<T>::new()).structural()`
    // resolves to ViaDefault when T: Default and to ViaNothing otherwise.
    pub trait ViaDefault<T> {
        fn structural(&self) -> Option<T>;
    }

    impl<T: Default> ViaDefault<T> for &Structural<T> {
        fn structural(&self) -> Option<T> {
            Some(T::default())
        }
    }

    pub trait ViaNothing<T> {
        fn structural(&self) -> Option<T>;
    }

    impl<T> ViaNothing<T> for Structural<T> {
        fn structural(&self) -> Option<T> {
            None
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use super::structural::{Structural, ViaDefault, ViaNothing};
    use crate::session::Session;

    const F: MethodId = MethodId::new("Foo", "f");

    #[derive(Clone, Debug)]
    struct NoDefault;

    #[test]
    fn structural_default() {
        assert_eq!(Some(0u32), (&&Structural::<u32>::new()).structural());
        assert_eq!(Some(String::new()),
                   (&&Structural::<String>::new()).structural());
        assert!((&&Structural::<NoDefault>::new()).structural().is_none());
    }

    #[test]
    fn write_back_staged_replacement() {
        let session = Session::new();
        let b = session.bind("Foo");
        let mut inv = b.invocation(F, vec![Arg::new(1u8)]);
        inv.stage_replacement(0, Arg::new(7u8));
        let call = Call {
            invocation: inv,
            answered: true,
            shared: session.shared().clone()
        };
        let mut slot = 1u8;
        call.write_back(0, &mut slot);
        assert_eq!(7, slot);
    }

    #[test]
    fn unanswered_call_uses_structural_default() {
        let session = Session::new();
        let b = session.bind("Foo");
        let call = b.intercept(b.invocation(F, vec![]));
        assert!(!call.is_answered());
        assert_eq!(0i64, call.output(|| Some(0i64)));
    }

    #[test]
    #[should_panic(expected = "no default value for")]
    fn no_default_at_all() {
        let session = Session::new();
        let b = session.bind("Foo");
        let call = b.intercept(b.invocation(F, vec![]));
        call.output::<NoDefault, _>(|| None);
    }

    #[test]
    fn provided_default_beats_structural() {
        let session = Session::new();
        session.provide_default(|| 41u16);
        let b = session.bind("Foo");
        let call = b.intercept(b.invocation(F, vec![]));
        assert_eq!(41u16, call.output(|| Some(0u16)));
    }
}
