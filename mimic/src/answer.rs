// vim: tw=80
//! The actions an expectation applies to a matched call.

use crate::{
    invocation::Invocation,
    value::{Arg, Fault, Reply}
};
use fragile::Fragile;
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError}
};

/// Return functions for computed answers
enum Rfunc {
    Mut(Box<dyn FnMut(&Invocation) -> Reply + Send>),
    // Only callable from the thread that registered it
    St(Fragile<Box<dyn FnMut(&Invocation) -> Reply>>),
}

impl Rfunc {
    fn call_mut(&mut self, invocation: &Invocation) -> Reply {
        match self {
            Rfunc::Mut(f) => f(invocation),
            Rfunc::St(f) => (f.get_mut())(invocation)
        }
    }
}

/// A shared, replayable return function.
#[derive(Clone)]
pub struct Computed(Arc<Mutex<Rfunc>>);

impl Computed {
    fn call(&self, invocation: &Invocation) -> Reply {
        self.0.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .call_mut(invocation)
    }
}

/// A terminal answer: once applied, nothing else runs for that call.
#[derive(Clone)]
pub enum Answer {
    /// Supply a return value.
    Return(Reply),
    /// Raise a stubbed error.
    Throw(Fault),
    /// Compute the return value from the call's arguments.
    Compute(Computed)
}

impl Answer {
    pub fn returning<R: Send + Sync + 'static>(value: R) -> Self {
        Answer::Return(Reply::new(value))
    }

    pub fn throwing<E>(error: E) -> Self
        where E: fmt::Debug + Send + Sync + 'static
    {
        Answer::Throw(Fault::new(error))
    }

    pub fn computing<R, F>(mut f: F) -> Self
        where R: Send + Sync + 'static,
              F: FnMut(&Invocation) -> R + Send + 'static
    {
        let rfunc = Rfunc::Mut(Box::new(move |inv: &Invocation| {
            Reply::new(f(inv))
        }));
        Answer::Compute(Computed(Arc::new(Mutex::new(rfunc))))
    }

    /// Single-threaded version of [`computing`](#method.computing), for
    /// closures that aren't `Send`.
    ///
    /// It is a runtime error to call the substitute from a different thread
    /// than the one that created this answer.
    pub fn computing_st<R, F>(mut f: F) -> Self
        where R: Send + Sync + 'static,
              F: FnMut(&Invocation) -> R + 'static
    {
        let boxed: Box<dyn FnMut(&Invocation) -> Reply> =
            Box::new(move |inv: &Invocation| Reply::new(f(inv)));
        let rfunc = Rfunc::St(Fragile::new(boxed));
        Answer::Compute(Computed(Arc::new(Mutex::new(rfunc))))
    }

    pub fn apply(&self, invocation: &mut Invocation) {
        match self {
            Answer::Return(reply) => invocation.set_reply(reply.clone()),
            Answer::Throw(fault) => invocation.set_fault(fault.clone()),
            Answer::Compute(computed) => {
                let reply = computed.call(invocation);
                invocation.set_reply(reply);
            }
        }
    }
}

impl fmt::Debug for Answer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Answer::Return(reply) => write!(f, "Return({})", reply.type_name()),
            Answer::Throw(fault) => write!(f, "Throw({fault:?})"),
            Answer::Compute(_) => f.write_str("Compute")
        }
    }
}

/// Which argument a [`Setter`] rewrites.
#[derive(Clone, Debug)]
pub enum ArgTarget {
    /// Every argument that is the same as this sentinel.
    Sentinel(Arg),
    /// The argument at this position.
    Position(usize)
}

/// A non-terminal answer that stages an argument replacement, emulating an
/// output parameter.  It runs before the terminal answer of the same call.
#[derive(Clone, Debug)]
pub struct Setter {
    target: ArgTarget,
    value: Arg
}

impl Setter {
    pub fn new(target: ArgTarget, value: Arg) -> Self {
        Setter { target, value }
    }

    pub fn apply(&self, invocation: &mut Invocation) {
        match &self.target {
            ArgTarget::Sentinel(sentinel) => {
                let hits = invocation.args().iter()
                    .enumerate()
                    .filter(|(_, a)| a.is_same(sentinel))
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>();
                for i in hits {
                    invocation.stage_replacement(i, self.value.clone());
                }
            },
            ArgTarget::Position(i) => {
                if *i < invocation.args().len() {
                    invocation.stage_replacement(*i, self.value.clone());
                }
            }
        }
    }
}
