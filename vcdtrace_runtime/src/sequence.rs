use std::{cell::Cell, rc::Rc};

/// A point in sample-order. Samples with equal sequence numbers are coalesced.
pub type Sequence = u64;

/// A shared, externally advanced sample counter.
///
/// Every buffered [`crate::Value`] stamps its samples with the counter's current reading. Clones
/// share the same count.
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter(Rc<Cell<Sequence>>);

impl SequenceCounter {
    pub fn new(start: Sequence) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    pub fn get(&self) -> Sequence {
        self.0.get()
    }

    pub fn set(&self, sequence: Sequence) {
        self.0.set(sequence);
    }

    /// Advance the counter by one and return the new reading.
    pub fn increment(&self) -> Sequence {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }
}
