// vim: tw=80
//! Substitutes shared between threads

use mimic::*;
use std::thread;

#[substitute]
trait Counter {
    fn bump(&self, by: u32) -> u32;
}

const THREADS: u32 = 8;
const CALLS: u32 = 100;

#[test]
fn calls_from_many_threads() {
    let session = Session::new();
    let c = SubstituteCounter::new(&session);
    session.expect(&c, SubstituteCounter::bump_call(predicate::always()))
        .then_answer(|inv: &Invocation| {
            inv.arg::<u32>(0).copied().unwrap_or(0)
        });
    thread::scope(|s| {
        for t in 0..THREADS {
            let c = &c;
            s.spawn(move || {
                for _ in 0..CALLS {
                    assert_eq!(t, c.bump(t));
                }
            });
        }
    });
    let history = c.binding().history();
    assert_eq!((THREADS * CALLS) as usize, history.len());

    let mut positions = history.iter()
        .filter_map(Invocation::position)
        .collect::<Vec<_>>();
    // History order agrees with position order
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    positions.dedup();
    assert_eq!((THREADS * CALLS) as usize, positions.len());

    let per_thread = history.iter()
        .filter(|inv| inv.arg::<u32>(0) == Some(&3))
        .count();
    assert_eq!(CALLS as usize, per_thread);

    session.verify(&c, Times::exactly((THREADS * CALLS) as usize),
                   Order::DontCare)
        .called(SubstituteCounter::bump_call(predicate::always()));
    session.verify_no_more_interactions(&c);
}

#[test]
fn substitutes_of_one_session_share_a_clock() {
    let session = Session::new();
    let a = SubstituteCounter::new(&session);
    let b = SubstituteCounter::new(&session);
    thread::scope(|s| {
        s.spawn(|| for _ in 0..CALLS { a.bump(1); });
        s.spawn(|| for _ in 0..CALLS { b.bump(2); });
    });
    let mut positions = a.binding().history().iter()
        .chain(b.binding().history().iter())
        .filter_map(Invocation::position)
        .collect::<Vec<_>>();
    positions.sort_unstable();
    positions.dedup();
    assert_eq!(2 * CALLS as usize, positions.len());
}

#[test]
fn stub_while_calling() {
    let session = Session::new();
    let c = SubstituteCounter::new(&session);
    thread::scope(|s| {
        s.spawn(|| for _ in 0..CALLS { c.bump(0); });
        s.spawn(|| {
            session.expect(&c, SubstituteCounter::bump_call(predicate::eq(0)))
                .then_return(5u32);
        });
    });
    assert_eq!(5, c.bump(0));
    session.verify(&c, Times::exactly(CALLS as usize + 1), Order::DontCare)
        .called(SubstituteCounter::bump_call(predicate::eq(0)));
}

#[test]
fn session_is_send_and_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<Session>();
    is_send_sync::<SubstituteCounter>();
}
