// vim: tw=80
//! The record of one call made on a substitute.

use crate::value::{Arg, Fault, Reply, Value};
use std::{collections::BTreeMap, fmt};

/// Identifies a method of a capability set, eg `Store::get`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId {
    owner: &'static str,
    name: &'static str
}

impl MethodId {
    pub const fn new(owner: &'static str, name: &'static str) -> Self {
        MethodId { owner, name }
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}::{}", self.owner, self.name)
    }
}

/// Identity of one substitute within a [`Session`](crate::Session).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubstituteId(pub(crate) u64);

impl fmt::Display for SubstituteId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Descriptor of a single call.
///
/// The argument snapshot never changes after construction.  Answers write only
/// to the result slots: the return value, the raised error, and the staged
/// argument replacements that the substitute copies back into its output
/// parameters.
#[derive(Clone, Debug)]
pub struct Invocation {
    substitute: SubstituteId,
    method: MethodId,
    args: Vec<Arg>,
    position: Option<u64>,
    reply: Option<Reply>,
    fault: Option<Fault>,
    replacements: BTreeMap<usize, Arg>
}

impl Invocation {
    pub fn new(substitute: SubstituteId, method: MethodId, args: Vec<Arg>)
        -> Self
    {
        Invocation {
            substitute,
            method,
            args,
            position: None,
            reply: None,
            fault: None,
            replacements: BTreeMap::new()
        }
    }

    pub fn substitute(&self) -> SubstituteId {
        self.substitute
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    /// The arguments as originally passed.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Borrow argument `index` as a `T`.
    pub fn arg<T: Value>(&self, index: usize) -> Option<&T> {
        self.args.get(index).and_then(Arg::downcast_ref)
    }

    /// Position of this call in the session-wide call order.  Assigned when
    /// the call is recorded.
    pub fn position(&self) -> Option<u64> {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: u64) {
        self.position = Some(position);
    }

    pub fn reply(&self) -> Option<&Reply> {
        self.reply.as_ref()
    }

    pub fn set_reply(&mut self, reply: Reply) {
        self.reply = Some(reply);
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn set_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    /// Stage `value` to be written back into argument `index` once the call
    /// has been resolved.
    pub fn stage_replacement(&mut self, index: usize, value: Arg) {
        self.replacements.insert(index, value);
    }

    pub fn replacement(&self, index: usize) -> Option<&Arg> {
        self.replacements.get(&index)
    }

    pub fn replacements(&self) -> impl Iterator<Item=(usize, &Arg)> {
        self.replacements.iter().map(|(i, a)| (*i, a))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg:?}")?;
        }
        f.write_str(")")
    }
}
