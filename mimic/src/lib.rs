// vim: tw=80
//! A test-double library for Rust.
//!
//! Mimic creates substitute objects that stand in for a trait, programs them
//! to return values or stubbed errors for particular calls, and afterwards
//! checks which calls happened, how many times, and in what order across
//! several substitutes.
//!
//! Unlike an expect-then-run library, nothing has to be declared up front: an
//! unprogrammed call simply returns a default value.  Verification happens
//! after the code under test has run.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Stubbing`](#stubbing)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Verifying calls`](#verifying-calls)
//! * [`Ordering`](#ordering)
//! * [`Output arguments`](#output-arguments)
//! * [`Spies`](#spies)
//! * [`Default values`](#default-values)
//! * [`Manual substitutes`](#manual-substitutes)
//!
//! ## Getting Started
//! ```
//! use mimic::*;
//!
//! #[substitute]
//! trait Store {
//!     fn get(&self, key: u32) -> u64;
//! }
//!
//! fn double_get(store: &dyn Store, key: u32) -> u64 {
//!     2 * store.get(key)
//! }
//!
//! let session = Session::new();
//! let store = SubstituteStore::new(&session);
//! session.expect(&store, SubstituteStore::get_call(predicate::eq(4)))
//!     .then_return(21u64);
//!
//! assert_eq!(42, double_get(&store, 4));
//! assert_eq!(0, double_get(&store, 5));
//!
//! session.verify(&store, Times::once(), Order::DontCare)
//!     .called(SubstituteStore::get_call(predicate::eq(4)));
//! ```
//!
//! `#[substitute]` leaves the trait alone and adds a `Substitute`-prefixed
//! struct that implements it.  For each method `foo` the struct gets:
//! * a `FOO` associated constant identifying the method, and
//! * an associated function `foo_call` that builds a [`CallShape`] from one
//!   [`Predicate`] per argument.
//!
//! ## Stubbing
//!
//! [`Session::expect`] registers an expectation and returns an
//! [`ExpectationBuilder`] that queues its answers.  Answers are handed out in
//! order, and once the queue runs dry the last one keeps being replayed.
//!
//! ```
//! # use mimic::*;
//! #[substitute]
//! trait Counter {
//!     fn next(&self) -> u32;
//! }
//!
//! let session = Session::new();
//! let c = SubstituteCounter::new(&session);
//! session.expect(&c, SubstituteCounter::next_call())
//!     .then_returns([1u32, 2, 3]);
//! let seen = (0..5).map(|_| c.next()).collect::<Vec<_>>();
//! assert_eq!(vec![1, 2, 3, 3, 3], seen);
//! ```
//!
//! Methods returning a `Result` can be stubbed to fail with
//! [`then_throw`](ExpectationBuilder::then_throw).  The stubbed error is
//! returned as the `Err` variant.  Methods with no error channel panic
//! instead.  Answers can also be computed from the call with
//! [`then_answer`](ExpectationBuilder::then_answer).
//!
//! When several expectations match a call, the one registered first wins.
//! So register specific shapes before catch-all ones.
//!
//! ## Matching arguments
//!
//! A [`CallShape`] is a method plus one matcher per argument.  Any
//! [`predicate`] from the `predicates` crate can be used.  Arguments with no
//! matcher accept anything.  [`CallShape`] can also be built by hand, with
//! plain values for equality:
//!
//! ```
//! # use mimic::*;
//! # #[substitute]
//! # trait Store {
//! #     fn get(&self, key: u32) -> u64;
//! # }
//! # let session = Session::new();
//! # let store = SubstituteStore::new(&session);
//! let shape = CallShape::new(SubstituteStore::GET).arg(7u32);
//! session.expect(&store, shape).then_return(1u64);
//! assert_eq!(1, store.get(7));
//! ```
//!
//! Reference arguments are matched against owned copies: `&str` against
//! `String`, `&[T]` against `Vec<T>` and `&T` against `T`.
//!
//! ## Verifying calls
//!
//! [`Session::verify`] counts the *unverified* calls that match a shape and
//! checks the count against a [`Times`].  Verified calls are consumed: each
//! call can satisfy at most one verification.  Afterwards
//! [`verify_no_more_interactions`](Session::verify_no_more_interactions)
//! fails if anything was left over.
//!
//! ```should_panic
//! # use mimic::*;
//! # #[substitute]
//! # trait Store {
//! #     fn get(&self, key: u32) -> u64;
//! # }
//! let session = Session::new();
//! let store = SubstituteStore::new(&session);
//! store.get(1);
//! store.get(2);
//! session.verify(&store, Times::once(), Order::DontCare)
//!     .called(SubstituteStore::get_call(predicate::eq(1)));
//! // Panics: get(2) was never verified
//! session.verify_no_more_interactions(&store);
//! ```
//!
//! Every panicking check has a `try_` or [`check`](Verification::check)
//! flavour that returns a [`Failure`] instead.
//!
//! ## Ordering
//!
//! Each verification names an [`Order`] relating it to the verification
//! before it, whichever substitute that was about.  Calls are stamped from a
//! clock shared by every substitute of the session, so ordering works across
//! objects.
//!
//! ```
//! # use mimic::*;
//! #[substitute]
//! trait Door {
//!     fn open(&self);
//! }
//! #[substitute]
//! trait Alarm {
//!     fn disarm(&self);
//! }
//!
//! let session = Session::new();
//! let door = SubstituteDoor::new(&session);
//! let alarm = SubstituteAlarm::new(&session);
//! alarm.disarm();
//! door.open();
//!
//! session.verify(&alarm, Times::once(), Order::DontCare)
//!     .called(SubstituteAlarm::disarm_call());
//! session.verify(&door, Times::once(), Order::AfterPrevious)
//!     .called(SubstituteDoor::open_call());
//! ```
//!
//! ## Output arguments
//!
//! `&mut` parameters are output arguments.  Their value at call time is
//! recorded, and [`set_out`](ExpectationBuilder::set_out) arranges for a new
//! value to be written back.  [`set_argument`](ExpectationBuilder::set_argument)
//! does the same for any argument equal to a sentinel, typically one from
//! [`Session::placeholder`].
//!
//! ```
//! # use mimic::*;
//! #[substitute]
//! trait Reader {
//!     fn read(&self, buf: &mut Vec<u8>) -> usize;
//! }
//!
//! let session = Session::new();
//! let r = SubstituteReader::new(&session);
//! session.expect(&r, SubstituteReader::read_call(predicate::always()))
//!     .set_out(0, vec![1u8, 2, 3])
//!     .then_return(3usize);
//! let mut buf = Vec::new();
//! assert_eq!(3, r.read(&mut buf));
//! assert_eq!(vec![1, 2, 3], buf);
//! ```
//!
//! ## Spies
//!
//! A spy wraps a real implementation.  Its calls are recorded like any other
//! substitute's, but calls with no stubbed answer are forwarded to the real
//! object.
//!
//! ## Default values
//!
//! Unanswered calls return the value registered with
//! [`Session::provide_default`] for the return type, if any, and otherwise
//! `Default::default()`.  Return types with neither panic when called
//! unanswered.
//!
//! ## Manual substitutes
//!
//! Anything that owns a [`Binding`] can be a substitute.  Build an
//! [`Invocation`] with [`Binding::invocation`], pass it to
//! [`Binding::intercept`] and apply the resulting [`Call`].  This is what
//! `#[substitute]` generates.
//!
//! [`Predicate`]: trait.Predicate.html
//! [`predicate`]: predicate/index.html

mod answer;
mod binding;
mod defaults;
mod error;
mod expectation;
mod invocation;
mod matcher;
mod order;
mod session;
mod state;
mod times;
mod value;

pub use mimic_derive::substitute;
pub use predicates::prelude::{Predicate, predicate};

pub use crate::{
    answer::{Answer, ArgTarget, Computed, Setter},
    binding::{Binding, Call, Substitute},
    defaults::DefaultValues,
    error::Failure,
    expectation::{Expectation, Expectations},
    invocation::{Invocation, MethodId, SubstituteId},
    matcher::{ArgMatcher, CallShape},
    order::Order,
    session::{ExpectationBuilder, Session, SessionBuilder, Verification},
    times::Times,
    value::{Arg, Fault, Reply, Value}
};

/// Used by code generated by `#[substitute]`
#[doc(hidden)]
pub mod __private {
    pub use crate::binding::structural::{Structural, ViaDefault, ViaNothing};
}
