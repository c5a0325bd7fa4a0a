// vim: tw=80
//! Expectations: registered match rules bound to a queue of answers.

use crate::{
    answer::{Answer, Setter},
    invocation::Invocation,
    matcher::CallShape
};
use std::collections::VecDeque;

/// One stubbed behavior.
///
/// Answers are consumed in the order they were queued.  Once the queue runs
/// dry the last answer handed out is replayed for every later matching call.
#[derive(Debug)]
pub struct Expectation {
    shape: CallShape,
    setters: Vec<Setter>,
    answers: VecDeque<Answer>,
    last: Option<Answer>,
    /// How many calls has this expectation resolved?
    hits: usize
}

impl Expectation {
    pub fn new(shape: CallShape) -> Self {
        Expectation {
            shape,
            setters: Vec::new(),
            answers: VecDeque::new(),
            last: None,
            hits: 0
        }
    }

    pub fn shape(&self) -> &CallShape {
        &self.shape
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn matches(&self, invocation: &Invocation) -> bool {
        self.shape.matches(invocation)
    }

    pub fn push_answer(&mut self, answer: Answer) {
        self.answers.push_back(answer);
    }

    pub fn push_setter(&mut self, setter: Setter) {
        self.setters.push(setter);
    }

    /// Take the next answer, or replay the last one if the queue is empty.
    pub fn consume(&mut self) -> Option<Answer> {
        match self.answers.pop_front() {
            Some(answer) => {
                self.last = Some(answer.clone());
                Some(answer)
            },
            None => self.last.clone()
        }
    }

    /// Apply this expectation's setters to a matched call and pick its
    /// terminal answer.  The caller applies the answer, so that a computed
    /// answer never runs while the substitute's state is locked.  Returns
    /// `None` if there is no terminal answer, in which case the call falls
    /// through.
    pub fn resolve(&mut self, invocation: &mut Invocation) -> Option<Answer> {
        self.hits += 1;
        for setter in self.setters.iter() {
            setter.apply(invocation);
        }
        self.consume()
    }
}

/// A collection of [`Expectation`]s, searched in registration order.
#[derive(Debug, Default)]
pub struct Expectations(Vec<Expectation>);

impl Expectations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expectation and return its index.
    pub fn register(&mut self, expectation: Expectation) -> usize {
        self.0.push(expectation);
        self.0.len() - 1
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Expectation> {
        self.0.get_mut(index)
    }

    /// Find the first registered expectation that matches `invocation`.
    pub fn resolve(&mut self, invocation: &Invocation)
        -> Option<&mut Expectation>
    {
        self.0.iter_mut().find(|e| e.matches(invocation))
    }

    pub fn iter(&self) -> impl Iterator<Item=&Expectation> {
        self.0.iter()
    }

    /// Drop every expectation.
    pub fn checkpoint(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
