// vim: tw=80
//! Cross-substitute ordering of verifications.
//!
//! Every recorded call takes the next position from the session's [`Clock`].
//! Verifications that care about ordering compare the positions of the calls
//! they matched against the [`OrderTracker`], which remembers what earlier
//! verifications established regardless of which substitute they targeted.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering}
};

/// How a verification relates to the verification before it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// No ordering check.  The matched calls still become the reference
    /// point for a following `AfterPrevious` verification.
    #[default]
    DontCare,
    /// No ordering check, and the tracker is left untouched.
    Whenever,
    /// Same ordering slot as the previous verification: the matched calls
    /// must satisfy the same lower bound the previous verification had, but
    /// may precede its calls if they were made on another substitute.  On a
    /// single substitute a verification also consumes every earlier call, so
    /// its calls can only be verified in the order they were made.
    WithPrevious,
    /// Every matched call must come strictly after every call matched by the
    /// previous verification.
    AfterPrevious
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Order::DontCare => "don't care",
            Order::Whenever => "whenever",
            Order::WithPrevious => "with previous",
            Order::AfterPrevious => "after previous"
        };
        f.write_str(s)
    }
}

/// Session-wide source of call positions.
#[derive(Debug, Default)]
pub struct Clock(AtomicU64);

impl Clock {
    pub fn tick(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Positions of the first and last call matched by one verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub first: u64,
    pub last: u64
}

/// A failed ordering check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Position of the offending call
    pub position: u64,
    /// The position it had to come after
    pub bound: u64
}

/// Remembers the outcome of previous ordered verifications.
#[derive(Debug, Default)]
pub struct OrderTracker {
    /// Lower bound of the current slot, shared by `WithPrevious` verifications
    floor: Option<u64>,
    /// Latest call matched in the current slot
    frontier: Option<u64>
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `span` against the tracker without changing it.  A verification
    /// that matched nothing has no span and always passes.
    pub fn check(&self, order: Order, span: Option<Span>)
        -> Result<(), Violation>
    {
        let Some(span) = span else {
            return Ok(());
        };
        let bound = match order {
            Order::DontCare | Order::Whenever => None,
            Order::WithPrevious => self.floor,
            Order::AfterPrevious => self.frontier
        };
        match bound {
            Some(bound) if span.first <= bound => Err(Violation {
                position: span.first,
                bound
            }),
            _ => Ok(())
        }
    }

    /// Record a successful verification.
    pub fn advance(&mut self, order: Order, span: Option<Span>) {
        let Some(span) = span else {
            return;
        };
        match order {
            Order::Whenever => (),
            Order::DontCare => {
                self.floor = None;
                self.frontier = Some(span.last);
            },
            Order::AfterPrevious => {
                self.floor = self.frontier;
                self.frontier = Some(span.last);
            },
            Order::WithPrevious => {
                self.frontier = self.frontier.max(Some(span.last));
            }
        }
    }

    /// Forget everything established so far.
    pub fn reset(&mut self) {
        self.floor = None;
        self.frontier = None;
    }
}
