// vim: tw=80
//! Argument matchers and the call shapes built from them.

use crate::{
    invocation::{Invocation, MethodId},
    value::{Arg, Value}
};
use predicates::Predicate;
use predicates_tree::CaseTreeExt;
use std::{any, fmt, marker::PhantomData};

trait Check: Send {
    fn eval(&self, value: &dyn Value) -> bool;

    /// Why doesn't `value` match?  `None` if it does.
    fn explain(&self, value: &dyn Value) -> Option<String>;

    fn describe(&self) -> String;
}

struct Anything;

impl Check for Anything {
    fn eval(&self, _value: &dyn Value) -> bool {
        true
    }

    fn explain(&self, _value: &dyn Value) -> Option<String> {
        None
    }

    fn describe(&self) -> String {
        "_".to_owned()
    }
}

struct Equal(Arg);

impl Check for Equal {
    fn eval(&self, value: &dyn Value) -> bool {
        self.0.value().eq_value(value)
    }

    fn explain(&self, value: &dyn Value) -> Option<String> {
        if self.eval(value) {
            None
        } else {
            Some(format!("{value:?} != {:?}", self.0))
        }
    }

    fn describe(&self) -> String {
        format!("{:?}", self.0)
    }
}

/// Adapts a typed [`Predicate`] to type-erased arguments.
// fn(&T) keeps Typed Send regardless of T
struct Typed<T, P> {
    pred: P,
    _t: PhantomData<fn(&T)>
}

impl<T, P> Check for Typed<T, P>
    where T: Value, P: Predicate<T> + Send
{
    fn eval(&self, value: &dyn Value) -> bool {
        value.downcast_ref::<T>()
            .map_or(false, |v| self.pred.eval(v))
    }

    fn explain(&self, value: &dyn Value) -> Option<String> {
        match value.downcast_ref::<T>() {
            Ok(v) => self.pred.find_case(false, v)
                .map(|case| case.tree().to_string()),
            Err(_) => Some(format!("expected a {}, got a {}",
                                   any::type_name::<T>(),
                                   value.value_type_name()))
        }
    }

    fn describe(&self) -> String {
        self.pred.to_string()
    }
}

/// Decides whether one argument position of a call is acceptable.
pub struct ArgMatcher(Box<dyn Check>);

impl ArgMatcher {
    /// Accept any argument at all, of any type.
    pub fn any() -> Self {
        ArgMatcher(Box::new(Anything))
    }

    /// Accept only arguments equal to `value`.
    pub fn equal<T: Value>(value: T) -> Self {
        ArgMatcher(Box::new(Equal(Arg::new(value))))
    }

    /// Accept only arguments equal to an already-erased `arg`.
    pub fn equal_arg(arg: Arg) -> Self {
        ArgMatcher(Box::new(Equal(arg)))
    }

    /// Accept arguments of type `T` that satisfy `pred`.
    ///
    /// # Examples
    /// ```
    /// # use mimic::*;
    /// let m = ArgMatcher::predicate::<u32, _>(predicate::gt(5u32));
    /// assert!(m.matches(&Arg::new(6u32)));
    /// assert!(!m.matches(&Arg::new(5u32)));
    /// ```
    pub fn predicate<T, P>(pred: P) -> Self
        where T: Value, P: Predicate<T> + Send + 'static
    {
        ArgMatcher(Box::new(Typed { pred, _t: PhantomData }))
    }

    pub fn matches(&self, arg: &Arg) -> bool {
        self.0.eval(arg.value())
    }

    /// Explain why `arg` was rejected.  `None` if it was accepted.
    pub fn explain(&self, arg: &Arg) -> Option<String> {
        self.0.explain(arg.value())
    }
}

impl fmt::Debug for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.describe())
    }
}

impl fmt::Display for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.describe())
    }
}

/// Describes which calls an expectation or a verification is about: a method
/// plus one matcher per argument position.
///
/// Positions beyond the last supplied matcher accept anything, which is how
/// trailing variadic or output-only arguments are left unconstrained.
///
/// # Examples
/// ```
/// # use mimic::*;
/// const GET: MethodId = MethodId::new("Store", "get");
/// let shape = CallShape::new(GET)
///     .arg(42u32)
///     .with::<String, _>(predicate::function(|s: &String| s.len() < 3));
/// assert_eq!(GET, shape.method());
/// ```
#[derive(Debug)]
pub struct CallShape {
    method: MethodId,
    matchers: Vec<ArgMatcher>
}

impl CallShape {
    pub fn new(method: MethodId) -> Self {
        CallShape { method, matchers: Vec::new() }
    }

    /// Require the next argument to equal `value`.
    pub fn arg<T: Value>(self, value: T) -> Self {
        self.matching(ArgMatcher::equal(value))
    }

    /// Accept anything for the next argument.
    pub fn any_arg(self) -> Self {
        self.matching(ArgMatcher::any())
    }

    /// Require the next argument to satisfy `pred`.
    pub fn with<T, P>(self, pred: P) -> Self
        where T: Value, P: Predicate<T> + Send + 'static
    {
        self.matching(ArgMatcher::predicate(pred))
    }

    pub fn matching(mut self, matcher: ArgMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    /// Does `invocation` have this shape?  Never looks at the result slots.
    pub fn matches(&self, invocation: &Invocation) -> bool {
        let args = invocation.args();
        invocation.method() == self.method &&
            self.matchers.len() <= args.len() &&
            self.matchers.iter()
                .zip(args)
                .all(|(m, a)| m.matches(a))
    }

    /// List why each rejected argument of `invocation` failed to match.
    pub fn explain(&self, invocation: &Invocation) -> Vec<String> {
        if invocation.method() != self.method {
            return vec![format!("method is {}", invocation.method())];
        }
        let args = invocation.args();
        if self.matchers.len() > args.len() {
            return vec![format!("expected at least {} arguments, got {}",
                                self.matchers.len(), args.len())];
        }
        self.matchers.iter()
            .zip(args)
            .enumerate()
            .filter_map(|(i, (m, a))| {
                m.explain(a).map(|why| format!("argument {i}: {why}"))
            }).collect()
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, m) in self.matchers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{m}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::invocation::SubstituteId;
    use predicates::prelude::predicate;

    const F: MethodId = MethodId::new("Foo", "f");
    const G: MethodId = MethodId::new("Foo", "g");

    fn call(method: MethodId, args: Vec<Arg>) -> Invocation {
        Invocation::new(SubstituteId(0), method, args)
    }

    #[test]
    fn equality_by_default() {
        let shape = CallShape::new(F).arg(1i32);
        assert!(shape.matches(&call(F, vec![Arg::new(1i32)])));
        assert!(!shape.matches(&call(F, vec![Arg::new(2i32)])));
    }

    #[test]
    fn method_must_match() {
        let shape = CallShape::new(F).arg(1i32);
        assert!(!shape.matches(&call(G, vec![Arg::new(1i32)])));
    }

    #[test]
    fn predicate_matcher() {
        let shape = CallShape::new(F)
            .with::<i32, _>(predicate::in_iter(vec![1, 3, 5]));
        assert!(shape.matches(&call(F, vec![Arg::new(3i32)])));
        assert!(!shape.matches(&call(F, vec![Arg::new(4i32)])));
    }

    #[test]
    fn wrong_type_never_matches() {
        let shape = CallShape::new(F).with::<i32, _>(predicate::always());
        assert!(!shape.matches(&call(F, vec![Arg::new(1u64)])));
    }

    #[test]
    fn missing_trailing_matchers_accept_anything() {
        let shape = CallShape::new(F).arg(1i32);
        assert!(shape.matches(&call(F,
            vec![Arg::new(1i32), Arg::new("out".to_owned())])));
    }

    #[test]
    fn too_many_matchers() {
        let shape = CallShape::new(F).any_arg().any_arg();
        assert!(!shape.matches(&call(F, vec![Arg::new(1i32)])));
    }

    #[test]
    fn explain_lists_rejected_positions() {
        let shape = CallShape::new(F)
            .any_arg()
            .with::<u32, _>(predicate::eq(7u32));
        let why = shape.explain(&call(F, vec![Arg::new(1i32), Arg::new(8u32)]));
        assert_eq!(1, why.len());
        assert!(why[0].starts_with("argument 1: "), "{}", why[0]);
    }

    #[test]
    fn display() {
        let shape = CallShape::new(G).arg("a".to_owned()).any_arg();
        assert_eq!("Foo::g(\"a\", _)", shape.to_string());
    }
}
