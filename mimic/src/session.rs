// vim: tw=80
//! The registry of substitutes for one test session.

use crate::{
    answer::{Answer, ArgTarget, Setter},
    binding::{Binding, Substitute},
    defaults::{self, DefaultValues},
    error::Failure,
    expectation::Expectation,
    invocation::{Invocation, SubstituteId},
    matcher::CallShape,
    order::{Clock, Order, OrderTracker},
    state::MockState,
    times::Times,
    value::{Arg, Value}
};
use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock
    }
};
use tracing::debug;

/// State shared by a session and every binding created from it.
pub(crate) struct Shared {
    /// Tracked substitutes, by identity
    states: Mutex<BTreeMap<SubstituteId, Arc<MockState>>>,
    pub(crate) clock: Clock,
    order: Mutex<OrderTracker>,
    pub(crate) defaults: RwLock<DefaultValues>,
    placeholders: AtomicU64,
    next_id: AtomicU64,
    track_by_default: bool
}

impl Shared {
    fn states(&self) -> MutexGuard<'_, BTreeMap<SubstituteId, Arc<MockState>>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the tracked states, so no registry lock is held while
    /// operating on them.
    fn tracked(&self) -> Vec<Arc<MockState>> {
        self.states().values().cloned().collect()
    }
}

/// Builds a [`Session`] with non-default settings.
#[derive(Debug)]
pub struct SessionBuilder {
    defaults: DefaultValues,
    placeholder_seed: u64,
    track_by_default: bool
}

impl SessionBuilder {
    /// Whether [`Session::bind`] registers substitutes for session-wide
    /// verification.  Defaults to `true`.
    pub fn track_by_default(mut self, track: bool) -> Self {
        self.track_by_default = track;
        self
    }

    /// Replace the table of default return values and placeholders.
    pub fn defaults(mut self, defaults: DefaultValues) -> Self {
        self.defaults = defaults;
        self
    }

    /// First sequence number handed to placeholder generators.
    pub fn placeholder_seed(mut self, seed: u64) -> Self {
        self.placeholder_seed = seed;
        self
    }

    pub fn build(self) -> Session {
        let shared = Shared {
            states: Mutex::default(),
            clock: Clock::default(),
            order: Mutex::default(),
            defaults: RwLock::new(self.defaults),
            placeholders: AtomicU64::new(self.placeholder_seed),
            next_id: AtomicU64::new(1),
            track_by_default: self.track_by_default
        };
        Session { shared: Arc::new(shared) }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        SessionBuilder {
            defaults: DefaultValues::default(),
            placeholder_seed: 1,
            track_by_default: true
        }
    }
}

/// Owns every substitute created for one test, and the session-wide call
/// order they share.
///
/// Sessions are independent: substitutes from different sessions never see
/// each other, so tests may run in parallel.
///
/// # Examples
/// ```
/// # use mimic::*;
/// const GET: MethodId = MethodId::new("Store", "get");
///
/// let session = Session::new();
/// let store = session.bind("Store");
/// session.expect(&store, CallShape::new(GET).arg(1u32)).then_return(10u64);
///
/// let call = store.intercept(store.invocation(GET, vec![Arg::new(1u32)]));
/// assert_eq!(10u64, call.output::<u64, _>(|| None));
///
/// session.verify(&store, Times::once(), Order::DontCare)
///     .called(CallShape::new(GET).arg(1u32));
/// session.verify_no_more_interactions(&store);
/// ```
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>
}

impl Session {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    fn create(&self, name: &'static str, tracked: bool) -> Binding {
        let id = SubstituteId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let state = Arc::new(MockState::new(id, name));
        if tracked {
            self.shared.states().insert(id, state.clone());
        }
        debug!(substitute = %state.label(), tracked, "created substitute");
        Binding::new(state, self.shared.clone())
    }

    /// Create the binding for a new substitute named `name`.  It is tracked
    /// unless the session was built with `track_by_default(false)`.
    pub fn bind(&self, name: &'static str) -> Binding {
        self.create(name, self.shared.track_by_default)
    }

    /// Create a binding that is always tracked.
    pub fn bind_tracked(&self, name: &'static str) -> Binding {
        self.create(name, true)
    }

    /// Create a binding that is never tracked.  Its calls are answered but it
    /// can't be verified and session-wide operations skip it.
    pub fn bind_untracked(&self, name: &'static str) -> Binding {
        self.create(name, false)
    }

    /// Number of tracked substitutes.
    pub fn tracked(&self) -> usize {
        self.shared.states().len()
    }

    fn state_of<S>(&self, substitute: &S) -> Result<Arc<MockState>, Failure>
        where S: Substitute + ?Sized
    {
        let binding = substitute.binding();
        // Ids are only unique within a session
        self.shared.states()
            .get(&binding.id())
            .filter(|state| Arc::ptr_eq(state, binding.state()))
            .cloned()
            .ok_or(Failure::UnknownSubstitute {
                id: binding.id(),
                name: binding.name()
            })
    }

    /// Stub calls of `shape` on `substitute`.
    ///
    /// The expectation is registered immediately; the returned builder adds
    /// answers to it.  Expectations are searched in registration order and the
    /// first match wins, so register specific shapes before general ones.
    pub fn expect<S>(&self, substitute: &S, shape: CallShape)
        -> ExpectationBuilder
        where S: Substitute + ?Sized
    {
        let state = substitute.binding().state().clone();
        let index = state.register(Expectation::new(shape));
        ExpectationBuilder { state, index }
    }

    /// Start a verification of `substitute`'s calls.
    pub fn verify<S>(&self, substitute: &S, times: Times, order: Order)
        -> Verification<'_>
        where S: Substitute + ?Sized
    {
        Verification {
            session: self,
            target: self.state_of(substitute),
            times,
            order
        }
    }

    /// Like [`verify`](#method.verify) with `Times::Any` and
    /// `Order::DontCare`.
    pub fn verify_any<S>(&self, substitute: &S) -> Verification<'_>
        where S: Substitute + ?Sized
    {
        self.verify(substitute, Times::default(), Order::default())
    }

    pub fn try_verify_no_more_interactions<S>(&self, substitute: &S)
        -> Result<(), Failure>
        where S: Substitute + ?Sized
    {
        self.state_of(substitute)?.verify_no_more_interactions()
    }

    /// # Panics
    ///
    /// If `substitute` has any unverified calls.
    pub fn verify_no_more_interactions<S>(&self, substitute: &S)
        where S: Substitute + ?Sized
    {
        report(self.try_verify_no_more_interactions(substitute))
    }

    /// Check every tracked substitute for unverified calls.
    pub fn try_verify_no_more_interactions_all(&self) -> Result<(), Failure> {
        self.shared.tracked()
            .iter()
            .try_for_each(|s| s.verify_no_more_interactions())
    }

    pub fn verify_no_more_interactions_all(&self) {
        report(self.try_verify_no_more_interactions_all())
    }

    /// Check that every expectation of every tracked substitute was used.
    pub fn try_verify_expectations(&self) -> Result<(), Failure> {
        self.shared.tracked()
            .iter()
            .try_for_each(|s| s.verify_expectations())
    }

    pub fn verify_expectations(&self) {
        report(self.try_verify_expectations())
    }

    /// Check that every expectation was used and every call verified.
    pub fn verify_expectations_and_no_more_interactions(&self) {
        report(self.try_verify_expectations()
               .and_then(|_| self.try_verify_no_more_interactions_all()))
    }

    /// Forget `substitute`'s calls, tracked or not.  Its expectations stay.
    pub fn clear_interactions<S>(&self, substitute: &S)
        where S: Substitute + ?Sized
    {
        substitute.binding().state().clear_interactions()
    }

    pub fn try_clear_interactions_expecting<S>(&self, substitute: &S,
                                               expected: usize)
        -> Result<(), Failure>
        where S: Substitute + ?Sized
    {
        self.state_of(substitute)?.clear_interactions_expecting(expected)
    }

    /// Forget `substitute`'s calls after checking that exactly `expected` of
    /// them were still unverified.
    pub fn clear_interactions_expecting<S>(&self, substitute: &S,
                                           expected: usize)
        where S: Substitute + ?Sized
    {
        report(self.try_clear_interactions_expecting(substitute, expected))
    }

    /// Forget the calls of every tracked substitute, and the ordering
    /// established by earlier verifications.
    pub fn clear_all_interactions(&self) {
        for state in self.shared.tracked() {
            state.clear_interactions();
        }
        self.order().reset();
    }

    /// Forget the calls and the expectations of every tracked substitute.
    pub fn reset(&self) {
        for state in self.shared.tracked() {
            state.reset();
        }
        self.order().reset();
    }

    fn order(&self) -> MutexGuard<'_, OrderTracker> {
        self.shared.order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return `f()` from unanswered calls returning `T`.
    pub fn provide_default<T, F>(&self, f: F)
        where T: Send + Sync + 'static,
              F: Fn() -> T + Send + Sync + 'static
    {
        self.shared.defaults.write()
            .unwrap_or_else(PoisonError::into_inner)
            .provide(f);
    }

    /// A fresh value of `T`, distinct from every placeholder handed out
    /// before.  Useful as a sentinel for
    /// [`set_argument`](ExpectationBuilder::set_argument).
    pub fn try_placeholder<T: Clone + 'static>(&self) -> Option<T> {
        let n = self.shared.placeholders.fetch_add(1, Ordering::Relaxed);
        self.shared.defaults.read()
            .unwrap_or_else(PoisonError::into_inner)
            .placeholder_for::<T>(n)
    }

    /// # Panics
    ///
    /// If no placeholder generator is registered for `T`.
    pub fn placeholder<T: Clone + 'static>(&self) -> T {
        self.try_placeholder().unwrap_or_else(|| {
            panic!("no placeholder generator for {}",
                   defaults::type_name::<T>())
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("tracked", &self.tracked())
            .finish()
    }
}

fn report(result: Result<(), Failure>) {
    if let Err(failure) = result {
        panic!("{}", failure);
    }
}

/// Adds answers to a registered expectation.
///
/// Answers are handed out in the order they were added; the last one is
/// repeated forever after.
// Holds the index rather than a reference so the state lock is only taken
// for the duration of each builder call.
pub struct ExpectationBuilder {
    state: Arc<MockState>,
    index: usize
}

impl ExpectationBuilder {
    fn update<F: FnOnce(&mut Expectation)>(&mut self, f: F) -> &mut Self {
        // The state was reset out from under us if this misses
        self.state.with_expectation(self.index, f);
        self
    }

    /// Queue a return value.
    pub fn then_return<R>(&mut self, value: R) -> &mut Self
        where R: Send + Sync + 'static
    {
        self.update(|e| e.push_answer(Answer::returning(value)))
    }

    /// Queue several return values, one per call.
    pub fn then_returns<I>(&mut self, values: I) -> &mut Self
        where I: IntoIterator, I::Item: Send + Sync + 'static
    {
        self.update(|e| {
            for v in values {
                e.push_answer(Answer::returning(v));
            }
        })
    }

    /// Queue a stubbed error.
    pub fn then_throw<E>(&mut self, error: E) -> &mut Self
        where E: fmt::Debug + Send + Sync + 'static
    {
        self.update(|e| e.push_answer(Answer::throwing(error)))
    }

    /// Queue several stubbed errors, one per call.
    pub fn then_throws<I>(&mut self, errors: I) -> &mut Self
        where I: IntoIterator, I::Item: fmt::Debug + Send + Sync + 'static
    {
        self.update(|e| {
            for err in errors {
                e.push_answer(Answer::throwing(err));
            }
        })
    }

    /// Queue an answer computed from the call's arguments.
    pub fn then_answer<R, F>(&mut self, f: F) -> &mut Self
        where R: Send + Sync + 'static,
              F: FnMut(&Invocation) -> R + Send + 'static
    {
        self.update(|e| e.push_answer(Answer::computing(f)))
    }

    /// Single-threaded version of [`then_answer`](#method.then_answer).
    ///
    /// It is a runtime error to call the substitute from a different thread
    /// than the one that called this method.
    pub fn then_answer_st<R, F>(&mut self, f: F) -> &mut Self
        where R: Send + Sync + 'static,
              F: FnMut(&Invocation) -> R + 'static
    {
        self.update(|e| e.push_answer(Answer::computing_st(f)))
    }

    /// On every matching call, replace any argument that is the same as
    /// `sentinel` with `value`.
    pub fn set_argument<T, U>(&mut self, sentinel: T, value: U) -> &mut Self
        where T: Value, U: Value
    {
        let setter = Setter::new(ArgTarget::Sentinel(Arg::new(sentinel)),
                                 Arg::new(value));
        self.update(|e| e.push_setter(setter))
    }

    /// Like [`set_argument`](#method.set_argument), with an already-erased
    /// sentinel.  Clones of the same [`Arg`] always match each other.
    pub fn set_argument_arg<U: Value>(&mut self, sentinel: Arg, value: U)
        -> &mut Self
    {
        let setter = Setter::new(ArgTarget::Sentinel(sentinel),
                                 Arg::new(value));
        self.update(|e| e.push_setter(setter))
    }

    /// On every matching call, replace argument `index` with `value`.
    pub fn set_out<U: Value>(&mut self, index: usize, value: U) -> &mut Self {
        let setter = Setter::new(ArgTarget::Position(index), Arg::new(value));
        self.update(|e| e.push_setter(setter))
    }
}

/// A pending verification of one substitute, with its count matcher and
/// ordering mode fixed.  Each [`called`](#method.called) checks one call
/// shape.
pub struct Verification<'s> {
    session: &'s Session,
    target: Result<Arc<MockState>, Failure>,
    times: Times,
    order: Order
}

impl Verification<'_> {
    /// Verify calls of `shape`, returning the failure instead of panicking.
    pub fn check(&self, shape: CallShape) -> Result<(), Failure> {
        let state = self.target.as_ref().map_err(Clone::clone)?;
        state.verify(&shape, self.times, self.order, &self.session.shared.order)
    }

    /// # Panics
    ///
    /// If the number of matching unverified calls is rejected by the count
    /// matcher, or the ordering relation does not hold.
    pub fn called(&self, shape: CallShape) {
        report(self.check(shape))
    }
}
