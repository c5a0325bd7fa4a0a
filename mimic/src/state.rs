// vim: tw=80
//! Per-substitute recording and verification state.

use crate::{
    error::Failure,
    expectation::{Expectation, Expectations},
    invocation::{Invocation, SubstituteId},
    matcher::CallShape,
    order::{Clock, Order, OrderTracker, Span},
    times::Times
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Inner {
    history: Vec<Invocation>,
    expectations: Expectations,
    /// Index of the first unverified call in `history`
    cursor: usize,
    /// Calls recorded since the substitute was created, including cleared ones
    interactions: u64
}

impl Inner {
    fn pending(&self) -> &[Invocation] {
        &self.history[self.cursor..]
    }
}

/// Everything the engine knows about one substitute: its call history, its
/// expectations, and how far verification has progressed.
///
/// All access goes through one lock, so recording and verifying the same
/// substitute from several threads is safe.
#[derive(Debug)]
pub struct MockState {
    id: SubstituteId,
    name: &'static str,
    inner: Mutex<Inner>
}

impl MockState {
    pub fn new(id: SubstituteId, name: &'static str) -> Self {
        MockState { id, name, inner: Mutex::default() }
    }

    pub fn id(&self) -> SubstituteId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Human-readable identity used in failure messages, eg `Store#3`.
    pub fn label(&self) -> String {
        format!("{}{}", self.name, self.id)
    }

    // A test that panicked while holding the lock must not wedge later ones
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an expectation and return its index.
    pub fn register(&self, expectation: Expectation) -> usize {
        debug!(substitute = %self.label(), shape = %expectation.shape(),
               "registering expectation");
        self.lock().expectations.register(expectation)
    }

    /// Modify a previously registered expectation.
    pub fn with_expectation<F, R>(&self, index: usize, f: F) -> Option<R>
        where F: FnOnce(&mut Expectation) -> R
    {
        self.lock().expectations.get_mut(index).map(f)
    }

    /// Resolve `invocation` against the expectations, apply the answer, and
    /// append it to the history.  Returns whether a terminal answer was
    /// applied.
    ///
    /// The answer is applied with the lock released, so a computed answer may
    /// call back into the same substitute.
    pub fn record(&self, invocation: &mut Invocation, clock: &Clock) -> bool {
        let answer = self.lock().expectations
            .resolve(invocation)
            .and_then(|e| e.resolve(invocation));
        let answered = answer.is_some();
        if let Some(answer) = answer {
            trace!(substitute = %self.label(), call = %invocation, ?answer,
                   "answering");
            answer.apply(invocation);
        }
        let mut inner = self.lock();
        // Taken under the lock so history order agrees with position order
        invocation.set_position(clock.tick());
        trace!(substitute = %self.label(), call = %invocation, answered,
               position = ?invocation.position(), "recorded call");
        inner.history.push(invocation.clone());
        inner.interactions += 1;
        answered
    }

    /// Count the unverified calls matching `shape` and check them against
    /// `times` and then `order`.  On success the matched calls become
    /// verified.  On failure nothing changes.
    pub fn verify(&self, shape: &CallShape, times: Times, order: Order,
                  tracker: &Mutex<OrderTracker>) -> Result<(), Failure>
    {
        let mut inner = self.lock();
        let cursor = inner.cursor;
        let matched = inner.pending().iter()
            .enumerate()
            .filter(|(_, inv)| shape.matches(inv))
            .map(|(i, inv)| (cursor + i, inv.position().unwrap_or_default()))
            .collect::<Vec<_>>();
        let observed = matched.len();
        if !times.matches(observed) {
            let candidates = inner.pending().iter()
                .filter(|inv| inv.method() == shape.method())
                .map(|inv| {
                    let why = shape.explain(inv);
                    if why.is_empty() {
                        inv.to_string()
                    } else {
                        format!("{inv}: {}", why.join("; "))
                    }
                }).collect();
            debug!(substitute = %self.label(), call = %shape, %times,
                   observed, "count mismatch");
            return Err(Failure::CountMismatch {
                substitute: self.label(),
                call: shape.to_string(),
                expected: times,
                observed,
                candidates
            });
        }
        let span = match (matched.first(), matched.last()) {
            (Some(first), Some(last)) => Some(Span {
                first: first.1,
                last: last.1
            }),
            _ => None
        };
        {
            let mut tracker = tracker.lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Err(v) = tracker.check(order, span) {
                debug!(substitute = %self.label(), call = %shape, %order,
                       position = v.position, bound = v.bound,
                       "order violation");
                return Err(Failure::OrderViolation {
                    substitute: self.label(),
                    call: shape.to_string(),
                    order,
                    position: v.position,
                    bound: v.bound
                });
            }
            tracker.advance(order, span);
        }
        if let Some((index, _)) = matched.last() {
            inner.cursor = index + 1;
        }
        trace!(substitute = %self.label(), call = %shape, observed,
               cursor = inner.cursor, "verified");
        Ok(())
    }

    /// Fail if any call remains unverified.
    pub fn verify_no_more_interactions(&self) -> Result<(), Failure> {
        let inner = self.lock();
        let pending = inner.pending();
        if pending.is_empty() {
            Ok(())
        } else {
            Err(Failure::UnexpectedInteraction {
                substitute: self.label(),
                calls: pending.iter().map(Invocation::to_string).collect()
            })
        }
    }

    /// Fail if any expectation was never used.  Reports the first one.
    pub fn verify_expectations(&self) -> Result<(), Failure> {
        let inner = self.lock();
        let unused = inner.expectations.iter()
            .find(|e| e.hits() == 0)
            .map(|e| e.shape().to_string());
        match unused {
            Some(call) => Err(Failure::UnusedExpectation {
                substitute: self.label(),
                call
            }),
            None => Ok(())
        }
    }

    /// Forget the call history.  Expectations are kept.
    pub fn clear_interactions(&self) {
        let mut inner = self.lock();
        debug!(substitute = %self.label(), cleared = inner.history.len(),
               "clearing interactions");
        inner.history.clear();
        inner.cursor = 0;
    }

    /// Like [`clear_interactions`](#method.clear_interactions), but first
    /// check that exactly `expected` calls were still unverified.
    pub fn clear_interactions_expecting(&self, expected: usize)
        -> Result<(), Failure>
    {
        let mut inner = self.lock();
        let observed = inner.pending().len();
        if observed != expected {
            return Err(Failure::ClearCountMismatch {
                substitute: self.label(),
                expected,
                observed
            });
        }
        inner.history.clear();
        inner.cursor = 0;
        Ok(())
    }

    /// Forget the call history and every expectation.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.history.clear();
        inner.cursor = 0;
        inner.expectations.checkpoint();
    }

    /// Snapshot of the recorded calls, oldest first.
    pub fn history(&self) -> Vec<Invocation> {
        self.lock().history.clone()
    }

    /// Number of calls not yet verified.
    pub fn unverified(&self) -> usize {
        self.lock().pending().len()
    }

    /// Number of calls ever recorded, including cleared ones.
    pub fn interactions(&self) -> u64 {
        self.lock().interactions
    }
}
