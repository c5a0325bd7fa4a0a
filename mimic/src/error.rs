// vim: tw=80
//! Test-visible failures reported by the engine.

use crate::{
    invocation::SubstituteId,
    order::Order,
    times::Times
};
use std::fmt;

/// Why a verification or self-checking reset failed.
///
/// None of these are fatal to the process.  The panicking flavours of the
/// [`Session`](crate::Session) methods turn them into test failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// The number of matching unverified calls was not acceptable.
    #[error("{substitute}: expected {expected} to {call}, but observed {observed}{}",
            Candidates(.candidates))]
    CountMismatch {
        substitute: String,
        call: String,
        expected: Times,
        observed: usize,
        /// Unverified calls of the same method, with reasons they didn't match
        candidates: Vec<String>
    },

    /// A matched call broke the requested ordering relation.
    #[error("{substitute}: {call} at position {position} was verified \
             {order} but does not come after position {bound}")]
    OrderViolation {
        substitute: String,
        call: String,
        order: Order,
        position: u64,
        bound: u64
    },

    /// Calls remained after the last verified one.
    #[error("{substitute}: unexpected interactions:{}", Candidates(.calls))]
    UnexpectedInteraction {
        substitute: String,
        calls: Vec<String>
    },

    /// `clear_interactions_expecting` found a different number of unverified
    /// calls than it was told to expect.
    #[error("{substitute}: expected {expected} unverified calls before \
             clearing, found {observed}")]
    ClearCountMismatch {
        substitute: String,
        expected: usize,
        observed: usize
    },

    /// The substitute was never registered with this session.
    #[error("substitute {name} ({id}) is not tracked by this session")]
    UnknownSubstitute {
        id: SubstituteId,
        name: &'static str
    },

    /// An expectation was registered but no call ever matched it.
    #[error("{substitute}: expectation {call} was never used")]
    UnusedExpectation {
        substitute: String,
        call: String
    }
}

impl Failure {
    /// Is this a count or ordering mismatch?
    pub fn is_verification_mismatch(&self) -> bool {
        matches!(self, Failure::CountMismatch {..} |
                       Failure::OrderViolation {..})
    }
}

/// Renders a list of calls, one per line.
struct Candidates<'a>(&'a [String]);

impl fmt::Display for Candidates<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for c in self.0 {
            write!(f, "\n    {c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn count_mismatch_message() {
        let f = Failure::CountMismatch {
            substitute: "Store#1".to_owned(),
            call: "Store::get(5)".to_owned(),
            expected: Times::exactly(2),
            observed: 1,
            candidates: vec!["Store::get(6): argument 0: 6 != 5".to_owned()]
        };
        assert_eq!("Store#1: expected exactly 2 calls to Store::get(5), but \
                    observed 1\n    Store::get(6): argument 0: 6 != 5",
                   f.to_string());
        assert!(f.is_verification_mismatch());
    }

    #[test]
    fn unexpected_interaction_message() {
        let f = Failure::UnexpectedInteraction {
            substitute: "Store#1".to_owned(),
            calls: vec!["Store::put(1)".to_owned(), "Store::put(2)".to_owned()]
        };
        assert_eq!("Store#1: unexpected interactions:\n    Store::put(1)\n    \
                    Store::put(2)", f.to_string());
        assert!(!f.is_verification_mismatch());
    }
}
