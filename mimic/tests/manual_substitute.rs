// vim: tw=80
//! Substitutes can be written by hand on top of a Binding.  This is how
//! variadic methods are handled.

use mimic::*;

struct Logger {
    binding: Binding
}

impl Logger {
    const LOG: MethodId = MethodId::new("Logger", "log");
    const LEVEL: MethodId = MethodId::new("Logger", "level");

    fn new(session: &Session) -> Self {
        Logger { binding: session.bind("Logger") }
    }

    /// Logs `parts`, returning how many bytes were written
    fn log(&self, level: u8, parts: &[&str]) -> Result<usize, String> {
        let mut args = vec![Arg::new(level)];
        args.extend(parts.iter().map(|p| Arg::new(p.to_string())));
        let call = self.binding.intercept(self.binding.invocation(Self::LOG, args));
        if let Some(e) = call.error::<String>() {
            return Err(e);
        }
        if call.is_answered() {
            call.output(|| None)
        } else {
            Ok(parts.iter().map(|p| p.len()).sum())
        }
    }

    fn level(&self) -> Option<u8> {
        let call = self.binding.intercept(
            self.binding.invocation(Self::LEVEL, Vec::new()));
        call.raise();
        call.output(|| Some(None))
    }
}

impl Substitute for Logger {
    fn binding(&self) -> &Binding {
        &self.binding
    }
}

#[test]
fn trailing_arguments_are_unconstrained() {
    let session = Session::new();
    let l = Logger::new(&session);
    assert_eq!(Ok(5), l.log(1, &["ab", "cde"]));
    assert_eq!(Ok(0), l.log(1, &[]));
    assert_eq!(Ok(1), l.log(2, &["x"]));
    session.verify(&l, Times::exactly(2), Order::DontCare)
        .called(CallShape::new(Logger::LOG).arg(1u8));
    session.verify(&l, Times::once(), Order::DontCare)
        .called(CallShape::new(Logger::LOG).any_arg().arg("x".to_owned()));
    session.verify_no_more_interactions(&l);
}

#[test]
fn stub_a_variadic_call() {
    let session = Session::new();
    let l = Logger::new(&session);
    session.expect(&l, CallShape::new(Logger::LOG).arg(9u8))
        .then_throw("disk full".to_owned());
    session.expect(&l, CallShape::new(Logger::LOG)
                   .any_arg()
                   .matching(ArgMatcher::equal("secret".to_owned())))
        .then_return(Ok::<usize, String>(0));
    assert_eq!(Err("disk full".to_owned()), l.log(9, &["a"]));
    assert_eq!(Ok(0), l.log(1, &["secret", "stuff"]));
    assert_eq!(Ok(6), l.log(1, &["public"]));
}

#[test]
fn computed_from_the_invocation() {
    let session = Session::new();
    let l = Logger::new(&session);
    session.expect(&l, CallShape::new(Logger::LOG))
        .then_answer(|inv: &Invocation| {
            Ok::<usize, String>(inv.args().len() - 1)
        });
    assert_eq!(Ok(3), l.log(0, &["a", "b", "c"]));
}

#[test]
fn default_for_option() {
    let session = Session::new();
    let l = Logger::new(&session);
    assert_eq!(None, l.level());
    session.expect(&l, CallShape::new(Logger::LEVEL))
        .then_return(Some(3u8));
    assert_eq!(Some(3), l.level());
}

#[test]
fn no_matcher_matches_every_call() {
    let session = Session::new();
    let l = Logger::new(&session);
    l.log(0, &[]).unwrap();
    l.log(7, &["x", "y"]).unwrap();
    session.verify(&l, Times::at_least_once(), Order::DontCare)
        .called(CallShape::new(Logger::LOG));
    assert_eq!(0, l.binding().unverified());
}

#[test]
fn invocation_display() {
    let session = Session::new();
    let l = Logger::new(&session);
    l.log(3, &["a", "b"]).unwrap();
    let history = l.binding().history();
    assert_eq!("Logger::log(3, \"a\", \"b\")", history[0].to_string());
    assert_eq!(Some(&3u8), history[0].arg::<u8>(0));
    assert_eq!(None, history[0].arg::<u32>(0));
}
