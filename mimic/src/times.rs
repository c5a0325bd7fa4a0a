// vim: tw=80
//! Count matchers used by verification.

use std::fmt;

/// How many matching calls a verification expects to find.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Times {
    /// Exactly this many calls.
    Exactly(usize),
    /// Any number of calls, including none.
    #[default]
    Any,
    /// At least one call.
    AnyButZero
}

impl Times {
    pub fn exactly(n: usize) -> Self {
        Times::Exactly(n)
    }

    pub fn any() -> Self {
        Times::Any
    }

    pub fn at_least_once() -> Self {
        Times::AnyButZero
    }

    /// Shortcut for [`exactly(0)`](#method.exactly).
    pub fn never() -> Self {
        Times::Exactly(0)
    }

    /// Shortcut for [`exactly(1)`](#method.exactly).
    pub fn once() -> Self {
        Times::Exactly(1)
    }

    /// Does an observed `count` satisfy this matcher?
    pub fn matches(&self, count: usize) -> bool {
        match self {
            Times::Exactly(n) => count == *n,
            Times::Any => true,
            Times::AnyButZero => count > 0
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Times::Exactly(0) => f.write_str("no calls"),
            Times::Exactly(1) => f.write_str("exactly 1 call"),
            Times::Exactly(n) => write!(f, "exactly {n} calls"),
            Times::Any => f.write_str("any number of calls"),
            Times::AnyButZero => f.write_str("at least 1 call")
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn exactly() {
        let t = Times::exactly(2);
        assert!(t.matches(2));
        assert!(!t.matches(1));
        assert!(!t.matches(3));
    }

    #[test]
    fn any() {
        assert!(Times::any().matches(0));
        assert!(Times::any().matches(17));
    }

    #[test]
    fn any_but_zero() {
        assert!(!Times::at_least_once().matches(0));
        assert!(Times::at_least_once().matches(1));
        assert!(Times::at_least_once().matches(1000));
    }

    #[test]
    fn default_is_any() {
        assert_eq!(Times::Any, Times::default());
    }

    #[test]
    fn shortcuts() {
        assert_eq!(Times::Exactly(0), Times::never());
        assert_eq!(Times::Exactly(1), Times::once());
    }
}
