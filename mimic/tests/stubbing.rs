// vim: tw=80
//! Programming answers into substitutes

use mimic::*;
use std::{cell::Cell, rc::Rc, sync::Arc};

#[derive(Clone, Debug, PartialEq)]
pub struct Opaque(u8);

#[substitute]
trait Repo {
    fn count(&self, table: &str) -> usize;
    fn fetch(&self, id: u32) -> Result<String, String>;
    fn opaque(&self) -> Opaque;
    fn touch(&self, id: u32);
}

#[test]
fn sticky_replay() {
    let session = Session::new();
    let r = SubstituteRepo::new(&session);
    session.expect(&r, SubstituteRepo::count_call(predicate::always()))
        .then_return(1usize)
        .then_return(2usize);
    assert_eq!(1, r.count("a"));
    assert_eq!(2, r.count("a"));
    assert_eq!(2, r.count("a"));
}

#[test]
fn first_registered_wins() {
    let session = Session::new();
    let r = SubstituteRepo::new(&session);
    session.expect(&r, SubstituteRepo::count_call(predicate::eq("users".to_owned())))
        .then_return(10usize);
    session.expect(&r, SubstituteRepo::count_call(predicate::always()))
        .then_return(99usize);
    assert_eq!(10, r.count("users"));
    assert_eq!(99, r.count("groups"));
}

#[test]
fn unmatched_calls_return_defaults() {
    let session = Session::new();
    let r = SubstituteRepo::new(&session);
    session.expect(&r, SubstituteRepo::count_call(predicate::eq("users".to_owned())))
        .then_return(10usize);
    assert_eq!(0, r.count("groups"));
}

#[test]
fn computed_answer() {
    let session = Session::new();
    let r = SubstituteRepo::new(&session);
    session.expect(&r, SubstituteRepo::fetch_call(predicate::always()))
        .then_answer(|inv: &Invocation| {
            let id = inv.arg::<u32>(0).copied().unwrap_or_default();
            Ok::<String, String>(format!("row {id}"))
        });
    assert_eq!(Ok("row 7".to_owned()), r.fetch(7));
    assert_eq!(Ok("row 8".to_owned()), r.fetch(8));
}

#[test]
fn computed_answer_may_call_the_same_substitute() {
    let session = Session::new();
    let r = Arc::new(SubstituteRepo::new(&session));
    let r2 = r.clone();
    session.expect(&*r, SubstituteRepo::count_call(predicate::eq("base".to_owned())))
        .then_return(10usize);
    session.expect(&*r, SubstituteRepo::fetch_call(predicate::always()))
        .then_answer(move |inv: &Invocation| {
            let id = inv.arg::<u32>(0).copied().unwrap_or_default() as usize;
            Ok::<String, String>((r2.count("base") * id).to_string())
        });
    assert_eq!(Ok("30".to_owned()), r.fetch(3));
    // The nested call finished first, so it was recorded first
    let history = r.binding().history()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    assert_eq!(vec!["Repo::count(\"base\")", "Repo::fetch(3)"], history);
}

#[test]
fn computed_answer_st() {
    let session = Session::new();
    let r = SubstituteRepo::new(&session);
    let calls = Rc::new(Cell::new(0usize));
    let calls2 = calls.clone();
    session.expect(&r, SubstituteRepo::count_call(predicate::always()))
        .then_answer_st(move |_: &Invocation| {
            calls2.set(calls2.get() + 1);
            calls2.get()
        });
    assert_eq!(1, r.count("a"));
    assert_eq!(2, r.count("b"));
    assert_eq!(2, calls.get());
}

mod errors {
    use super::*;

    #[test]
    fn stubbed_error_becomes_err() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        session.expect(&r, SubstituteRepo::fetch_call(predicate::eq(1)))
            .then_throw("gone".to_owned());
        assert_eq!(Err("gone".to_owned()), r.fetch(1));
    }

    #[test]
    fn errors_then_values() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        session.expect(&r, SubstituteRepo::fetch_call(predicate::eq(1)))
            .then_throws(["busy".to_owned(), "still busy".to_owned()])
            .then_return(Ok::<String, String>("row".to_owned()));
        assert_eq!(Err("busy".to_owned()), r.fetch(1));
        assert_eq!(Err("still busy".to_owned()), r.fetch(1));
        assert_eq!(Ok("row".to_owned()), r.fetch(1));
        assert_eq!(Ok("row".to_owned()), r.fetch(1));
    }

    #[test]
    fn unstubbed_result_is_ok_default() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        assert_eq!(Ok(String::new()), r.fetch(1));
    }

    #[test]
    #[should_panic(expected = "Repo::touch(3): stubbed error: \"denied\"")]
    fn no_error_channel() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        session.expect(&r, SubstituteRepo::touch_call(predicate::eq(3)))
            .then_throw("denied");
        r.touch(3);
    }

    #[test]
    #[should_panic(expected = "is a i32, not a alloc::string::String")]
    fn wrong_error_type() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        session.expect(&r, SubstituteRepo::fetch_call(predicate::eq(1)))
            .then_throw(5i32);
        let _ = r.fetch(1);
    }
}

mod defaults {
    use super::*;

    #[test]
    #[should_panic(expected = "Repo::opaque(): no default value for stubbing::Opaque")]
    fn no_default() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        r.opaque();
    }

    #[test]
    fn provided_default() {
        let session = Session::new();
        session.provide_default(|| Opaque(42));
        session.provide_default(|| 7usize);
        let r = SubstituteRepo::new(&session);
        assert_eq!(Opaque(42), r.opaque());
        assert_eq!(7, r.count("x"));
    }

    #[test]
    fn stub_beats_provided_default() {
        let session = Session::new();
        session.provide_default(|| Opaque(42));
        let r = SubstituteRepo::new(&session);
        session.expect(&r, SubstituteRepo::opaque_call())
            .then_return(Opaque(1));
        assert_eq!(Opaque(1), r.opaque());
    }

    #[test]
    #[should_panic(expected = "Repo::count: stubbed return value is a &str, not a usize")]
    fn wrong_return_type() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        session.expect(&r, SubstituteRepo::count_call(predicate::always()))
            .then_return("three");
        r.count("x");
    }
}

mod reset {
    use super::*;

    #[test]
    fn reset_forgets_expectations_and_calls() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        session.expect(&r, SubstituteRepo::count_call(predicate::always()))
            .then_return(5usize);
        assert_eq!(5, r.count("x"));
        session.reset();
        assert_eq!(0, r.binding().unverified());
        assert_eq!(0, r.count("x"));
    }

    #[test]
    fn clear_keeps_expectations() {
        let session = Session::new();
        let r = SubstituteRepo::new(&session);
        session.expect(&r, SubstituteRepo::count_call(predicate::always()))
            .then_return(5usize);
        r.count("x");
        session.clear_all_interactions();
        session.verify_no_more_interactions(&r);
        assert_eq!(5, r.count("x"));
    }
}
